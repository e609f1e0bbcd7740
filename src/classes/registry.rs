//! Class/Spec Registry
//!
//! Ordered table of playable classes and their specializations. Order is
//! significant: it drives the horizontal layout of the chart.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ComparisonError, Result};

/// One class and its ordered specializations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpecEntry {
    #[serde(rename = "name")]
    pub class_name: String,
    pub specs: Vec<String>,
}

impl ClassSpecEntry {
    pub fn new(class_name: impl Into<String>, specs: &[&str]) -> Self {
        Self {
            class_name: class_name.into(),
            specs: specs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Validated, immutable class/spec table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassSpecRegistry {
    entries: Vec<ClassSpecEntry>,
}

impl ClassSpecRegistry {
    pub fn new(entries: Vec<ClassSpecEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ComparisonError::InvalidConfig(
                "class registry has no classes".to_string(),
            ));
        }

        let mut classes = HashSet::new();
        for entry in &entries {
            if !classes.insert(entry.class_name.as_str()) {
                return Err(ComparisonError::InvalidConfig(format!(
                    "class '{}' listed twice",
                    entry.class_name
                )));
            }
            if entry.specs.is_empty() {
                return Err(ComparisonError::InvalidConfig(format!(
                    "class '{}' has no specs",
                    entry.class_name
                )));
            }
            let mut specs = HashSet::new();
            for spec in &entry.specs {
                if !specs.insert(spec.as_str()) {
                    return Err(ComparisonError::InvalidConfig(format!(
                        "spec '{}' listed twice under class '{}'",
                        spec, entry.class_name
                    )));
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ClassSpecEntry] {
        &self.entries
    }

    pub fn class(&self, class_name: &str) -> Option<&ClassSpecEntry> {
        self.entries.iter().find(|e| e.class_name == class_name)
    }

    pub fn contains(&self, class_name: &str, spec_name: &str) -> bool {
        self.class(class_name)
            .is_some_and(|e| e.specs.iter().any(|s| s == spec_name))
    }

    pub fn class_count(&self) -> usize {
        self.entries.len()
    }

    /// Class-major sequence of every (class, spec) pair
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|e| {
            e.specs
                .iter()
                .map(move |s| (e.class_name.as_str(), s.as_str()))
        })
    }
}

impl Default for ClassSpecRegistry {
    fn default() -> Self {
        Self {
            entries: vec![
                ClassSpecEntry::new("death_knight", &["blood", "frost", "unholy"]),
                ClassSpecEntry::new("demon_hunter", &["havoc", "vengeance"]),
                ClassSpecEntry::new("druid", &["balance", "guardian", "feral", "restoration"]),
                ClassSpecEntry::new("hunter", &["beast_mastery", "marksmanship", "survival"]),
                ClassSpecEntry::new("mage", &["arcane", "fire", "frost"]),
                ClassSpecEntry::new("monk", &["brewmaster", "mistweaver", "windwalker"]),
                ClassSpecEntry::new("paladin", &["holy", "protection", "retribution"]),
                ClassSpecEntry::new("priest", &["discipline", "holy", "shadow"]),
                ClassSpecEntry::new("rogue", &["assassination", "outlaw", "subtlety"]),
                ClassSpecEntry::new("shaman", &["elemental", "enhancement", "restoration"]),
                ClassSpecEntry::new("warlock", &["affliction", "demonology", "destruction"]),
                ClassSpecEntry::new("warrior", &["arms", "fury", "protection"]),
            ],
        }
    }
}

impl<'de> Deserialize<'de> for ClassSpecRegistry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<ClassSpecEntry>::deserialize(deserializer)?;
        ClassSpecRegistry::new(entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_is_valid() {
        let registry = ClassSpecRegistry::default();
        assert!(ClassSpecRegistry::new(registry.entries().to_vec()).is_ok());
        assert_eq!(registry.class_count(), 12);
        assert_eq!(registry.pairs().count(), 36);
        assert!(registry.contains("priest", "holy"));
        assert!(registry.contains("paladin", "holy"));
        assert!(!registry.contains("mage", "holy"));
    }

    #[test]
    fn test_rejects_duplicates() {
        let dup_spec = vec![ClassSpecEntry::new("priest", &["holy", "holy"])];
        assert!(ClassSpecRegistry::new(dup_spec).is_err());

        let dup_class = vec![
            ClassSpecEntry::new("priest", &["holy"]),
            ClassSpecEntry::new("priest", &["shadow"]),
        ];
        assert!(ClassSpecRegistry::new(dup_class).is_err());

        assert!(ClassSpecRegistry::new(vec![]).is_err());
        assert!(ClassSpecRegistry::new(vec![ClassSpecEntry::new("monk", &[])]).is_err());
    }
}
