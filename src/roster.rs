//! Roster input
//!
//! A roster is one JSON document mapping class → spec → character entry.
//! Document order is kept so the assembled profiles come out in the order
//! the author wrote them.

use serde_json::{Map, Value};
use std::path::Path;

use crate::classes::ClassSpecRegistry;
use crate::error::{ComparisonError, Result};
use crate::model::CharacterEntry;

/// One (class, spec) slot of a roster
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSlot {
    pub class_name: String,
    pub spec_name: String,
    pub entry: CharacterEntry,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roster {
    slots: Vec<RosterSlot>,
}

impl Roster {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ComparisonError::InvalidRoster(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(contents)?;
        Self::from_value(document)
    }

    pub fn from_value(document: Value) -> Result<Self> {
        let classes = as_object(document, "roster")?;

        let mut slots = Vec::new();
        for (class_name, class_data) in classes {
            let specs = as_object(class_data, &class_name)?;
            for (spec_name, spec_data) in specs {
                let entry: CharacterEntry = serde_json::from_value(spec_data).map_err(|e| {
                    ComparisonError::InvalidRoster(format!("{}/{}: {}", class_name, spec_name, e))
                })?;
                slots.push(RosterSlot {
                    class_name: class_name.clone(),
                    spec_name,
                    entry,
                });
            }
        }
        Ok(Self { slots })
    }

    /// Reject (class, spec) pairs the registry does not know about
    pub fn validate(&self, registry: &ClassSpecRegistry) -> Result<()> {
        for slot in &self.slots {
            if !registry.contains(&slot.class_name, &slot.spec_name) {
                return Err(ComparisonError::InvalidRoster(format!(
                    "unknown class/spec pair {}/{}",
                    slot.class_name, slot.spec_name
                )));
            }
        }
        Ok(())
    }

    pub fn slots(&self) -> &[RosterSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn as_object(value: Value, what: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ComparisonError::InvalidRoster(format!(
            "'{}' must be an object, found {}",
            what,
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"{
        "warrior": {
            "protection": {"player_handle": "A", "character_realm": "r", "character_name": "a",
                           "region": "US", "guild": "g"}
        },
        "priest": {
            "shadow": {"player_handle": "C", "character_realm": "r", "character_name": "c",
                       "region": "US", "guild": "g", "special": true},
            "discipline": {"player_handle": "B", "character_realm": "r", "character_name": "b",
                           "region": "US", "guild": "g", "notes": "guide author"}
        }
    }"#;

    #[test]
    fn test_document_order_preserved() {
        let roster = Roster::from_json_str(ROSTER).unwrap();
        let order: Vec<(&str, &str)> = roster
            .slots()
            .iter()
            .map(|s| (s.class_name.as_str(), s.spec_name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("warrior", "protection"), ("priest", "shadow"), ("priest", "discipline")]
        );
        assert!(roster.slots()[1].entry.special);
        assert_eq!(roster.slots()[2].entry.notes.as_deref(), Some("guide author"));
        roster.validate(&ClassSpecRegistry::default()).unwrap();
    }

    #[test]
    fn test_shape_errors() {
        assert!(matches!(
            Roster::from_json_str("[]"),
            Err(ComparisonError::InvalidRoster(_))
        ));
        assert!(matches!(
            Roster::from_json_str(r#"{"priest": ["holy"]}"#),
            Err(ComparisonError::InvalidRoster(_))
        ));
        assert!(matches!(
            Roster::from_json_str(r#"{"priest": {"holy": {"player_handle": "x"}}}"#),
            Err(ComparisonError::InvalidRoster(_))
        ));
        assert!(matches!(Roster::from_json_str("{"), Err(ComparisonError::Json(_))));
    }

    #[test]
    fn test_unknown_pair_rejected() {
        let roster = Roster::from_json_str(
            r#"{"mage": {"holy": {"player_handle": "x", "character_realm": "r",
                "character_name": "x", "region": "US", "guild": "g"}}}"#,
        )
        .unwrap();
        assert!(roster.validate(&ClassSpecRegistry::default()).is_err());
    }
}
