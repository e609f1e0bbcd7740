//! Player profile records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::progression::Progression;

/// Roster sentinel meaning "no character configured for this spec"
pub const UNSET_CHARACTER: &str = "None";

/// Identity fields for one roster slot, as written in the roster JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CharacterEntry {
    pub player_handle: String,
    pub character_realm: String,
    pub character_name: String,
    pub region: String,
    pub guild: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub special: bool,
}

impl CharacterEntry {
    /// True when the slot carries the `"None"` sentinel (case-sensitive)
    pub fn is_unset(&self) -> bool {
        self.character_name == UNSET_CHARACTER
    }
}

/// A fully assembled player record, read-only once built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub class_name: String,
    pub spec_name: String,
    pub player_handle: String,
    pub character_name: String,
    pub character_realm: String,
    pub region: String,
    pub score: f64,
    pub guild: String,
    pub progression: BTreeMap<String, Progression>,
    pub notes: Option<String>,
    pub special: bool,
}

impl Profile {
    /// `"Name - Realm"`, title-cased, with `" *"` for special entries
    pub fn player_label(&self) -> String {
        let extra = if self.special { " *" } else { "" };
        format!(
            "{} - {}{}",
            title_case(&self.character_name),
            title_case(&self.character_realm),
            extra
        )
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;

    fn profile(special: bool) -> Profile {
        let mut progression = BTreeMap::new();
        progression.insert(
            "castle-nathria".to_string(),
            Progression::new(2, 10, Difficulty::Mythic),
        );
        Profile {
            class_name: "priest".into(),
            spec_name: "holy".into(),
            player_handle: "Vegan".into(),
            character_name: "veganheals".into(),
            character_realm: "barthilas".into(),
            region: "US".into(),
            score: 925.6,
            guild: "Abyssal".into(),
            progression,
            notes: None,
            special,
        }
    }

    #[test]
    fn test_player_label() {
        assert_eq!(profile(false).player_label(), "Veganheals - Barthilas");
        assert_eq!(profile(true).player_label(), "Veganheals - Barthilas *");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("area-52"), "Area-52");
        assert_eq!(title_case("AMAN'THUL"), "Aman'Thul");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_entry_schema() {
        let entry: CharacterEntry = serde_json::from_str(
            r#"{"player_handle": "Erod", "character_realm": "frostmourne",
                "character_name": "None", "region": "US", "guild": "None"}"#,
        )
        .unwrap();
        assert!(entry.is_unset());
        assert!(!entry.special);

        let lowercase_none: CharacterEntry = serde_json::from_str(
            r#"{"player_handle": "Erod", "character_realm": "frostmourne",
                "character_name": "none", "region": "US", "guild": "x"}"#,
        )
        .unwrap();
        assert!(!lowercase_none.is_unset());

        let missing_realm = serde_json::from_str::<CharacterEntry>(
            r#"{"player_handle": "Erod", "character_name": "erod", "region": "US", "guild": "x"}"#,
        );
        assert!(missing_realm.is_err());
    }
}
