//! Dataset selection
//!
//! Maps the user's choice to a roster source, an output tag and the image
//! drawn behind the chart.

use std::path::PathBuf;

use crate::error::Result;
use crate::roster::Roster;

const WOWHEAD_ROSTER: &str = include_str!("../data/wowhead.json");
const ICY_VEINS_ROSTER: &str = include_str!("../data/icy_veins.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dataset {
    /// Authors of the Wowhead class guides
    Wowhead,
    /// Authors of the Icy Veins class guides
    IcyVeins,
    /// A roster file supplied by the user
    User(PathBuf),
}

impl Dataset {
    /// `wowhead` and `icy` pick a bundled roster; anything else is a path
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "wowhead" => Dataset::Wowhead,
            "icy" => Dataset::IcyVeins,
            path => Dataset::User(PathBuf::from(path)),
        }
    }

    /// Output file stem
    pub fn tag(&self) -> &'static str {
        match self {
            Dataset::Wowhead => "wowhead",
            Dataset::IcyVeins => "icy",
            Dataset::User(_) => "user",
        }
    }

    /// Asset stem of the background image
    pub fn background_tag(&self) -> &'static str {
        match self {
            Dataset::Wowhead => "wowhead",
            Dataset::IcyVeins => "icy_veins",
            Dataset::User(_) => "raider_io",
        }
    }

    pub fn roster(&self) -> Result<Roster> {
        match self {
            Dataset::Wowhead => Roster::from_json_str(WOWHEAD_ROSTER),
            Dataset::IcyVeins => Roster::from_json_str(ICY_VEINS_ROSTER),
            Dataset::User(path) => Roster::from_path(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ClassSpecRegistry;

    #[test]
    fn test_tokens() {
        assert_eq!(Dataset::from_token("wowhead"), Dataset::Wowhead);
        assert_eq!(Dataset::from_token(" icy\n"), Dataset::IcyVeins);
        assert_eq!(Dataset::from_token("Icy"), Dataset::User(PathBuf::from("Icy")));

        let user = Dataset::from_token("rosters/mine.json");
        assert_eq!(user.tag(), "user");
        assert_eq!(user.background_tag(), "raider_io");
        assert_eq!(Dataset::IcyVeins.background_tag(), "icy_veins");
    }

    #[test]
    fn test_bundled_rosters_are_valid() {
        let registry = ClassSpecRegistry::default();
        for dataset in [Dataset::Wowhead, Dataset::IcyVeins] {
            let roster = dataset.roster().unwrap();
            roster.validate(&registry).unwrap();
            assert_eq!(roster.len(), 36);
            assert!(roster.slots().iter().any(|s| !s.entry.is_unset()));
        }
    }

    #[test]
    fn test_missing_user_file() {
        let result = Dataset::from_token("/nonexistent/roster.json").roster();
        assert!(result.is_err());
    }
}
