//! Profile Assembler
//!
//! Turns roster entries plus fetched API responses into `Profile`s. A batch
//! is processed strictly in sequence. A character whose response is bad or
//! unreachable is logged and left out without taking its siblings down.
//! Any other error aborts the batch.

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classes::ClassSpecRegistry;
use crate::error::{ComparisonError, Result};
use crate::fetch::ProfileFetcher;
use crate::model::{compute_score, parse_progression, progression_summary, CharacterEntry, Profile};
use crate::roster::Roster;

/// A character that could not be assembled
#[derive(Debug)]
pub struct BatchFailure {
    pub class_name: String,
    pub spec_name: String,
    pub character_name: String,
    pub error: ComparisonError,
}

/// Outcome of assembling a roster
#[derive(Debug, Default)]
pub struct BatchReport {
    pub profiles: Vec<Profile>,
    /// Slots with a configured character
    pub requested: usize,
    /// Slots carrying the unset sentinel
    pub skipped: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Requested characters that did not make it into `profiles`
    pub fn missing(&self) -> usize {
        self.requested - self.profiles.len()
    }

    pub fn is_complete(&self) -> bool {
        self.missing() == 0
    }
}

pub struct ProfileHandler {
    fetcher: Arc<dyn ProfileFetcher>,
    registry: ClassSpecRegistry,
    raid_id: String,
}

impl ProfileHandler {
    pub fn new(
        fetcher: Arc<dyn ProfileFetcher>,
        registry: ClassSpecRegistry,
        raid_id: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            registry,
            raid_id: raid_id.into(),
        }
    }

    /// Build one profile from identity fields and a profile response
    pub fn assemble(
        &self,
        class_name: &str,
        spec_name: &str,
        entry: &CharacterEntry,
        response: &Value,
    ) -> Result<Profile> {
        let score = compute_score(response)?;
        let summary = progression_summary(response, &self.raid_id)?;
        let progression = parse_progression(&self.raid_id, summary)?;

        Ok(Profile {
            class_name: class_name.to_string(),
            spec_name: spec_name.to_string(),
            player_handle: entry.player_handle.clone(),
            character_name: entry.character_name.clone(),
            character_realm: entry.character_realm.clone(),
            region: entry.region.clone(),
            score,
            guild: entry.guild.clone(),
            progression,
            notes: entry.notes.clone(),
            special: entry.special,
        })
    }

    /// Assemble every configured character of a roster.
    ///
    /// Exactly one of `file` and `data` must be given. Roster shape errors
    /// are returned; per-character failures land in the report.
    pub async fn generate_profiles(
        &self,
        file: Option<&Path>,
        data: Option<Roster>,
    ) -> Result<BatchReport> {
        let roster = match (file, data) {
            (Some(_), Some(_)) => return Err(ComparisonError::DuplicateArgument),
            (None, None) => return Err(ComparisonError::MissingInput),
            (Some(path), None) => Roster::from_path(path)?,
            (None, Some(roster)) => roster,
        };
        roster.validate(&self.registry)?;

        let mut report = BatchReport::default();
        for slot in roster.slots() {
            if slot.entry.is_unset() {
                debug!("Skipping {}/{}: no character configured", slot.class_name, slot.spec_name);
                report.skipped += 1;
                continue;
            }
            report.requested += 1;

            let result = match self.fetcher.fetch(&slot.entry).await {
                Ok(response) => self.assemble(&slot.class_name, &slot.spec_name, &slot.entry, &response),
                Err(e) => Err(e),
            };

            match result {
                Ok(profile) => {
                    info!(
                        "Assembled {} ({}/{}): score {:.1}",
                        profile.character_name, profile.class_name, profile.spec_name, profile.score
                    );
                    report.profiles.push(profile);
                }
                Err(error) if !error.is_per_character() => return Err(error),
                Err(error) => {
                    warn!(
                        "Omitting {} ({}/{}): {}",
                        slot.entry.character_name, slot.class_name, slot.spec_name, error
                    );
                    report.failures.push(BatchFailure {
                        class_name: slot.class_name.clone(),
                        spec_name: slot.spec_name.clone(),
                        character_name: slot.entry.character_name.clone(),
                        error,
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, Progression};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    /// Canned responses keyed by character name; unknown names fail the fetch
    struct CannedFetcher {
        responses: HashMap<String, Value>,
    }

    #[async_trait]
    impl ProfileFetcher for CannedFetcher {
        async fn fetch(&self, entry: &CharacterEntry) -> Result<Value> {
            self.responses
                .get(&entry.character_name)
                .cloned()
                .ok_or_else(|| ComparisonError::missing(format!("profile for {}", entry.character_name)))
        }
    }

    fn response(score: f64, summary: &str) -> Value {
        json!({
            "mythic_plus_scores": {"all": score},
            "raid_progression": {"castle-nathria": {"summary": summary}}
        })
    }

    fn handler(responses: Vec<(&str, Value)>) -> ProfileHandler {
        let fetcher = CannedFetcher {
            responses: responses.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        };
        ProfileHandler::new(Arc::new(fetcher), ClassSpecRegistry::default(), "castle-nathria")
    }

    fn entry(name: &str) -> Value {
        json!({"player_handle": name, "character_realm": "frostmourne",
               "character_name": name, "region": "US", "guild": "Superstars"})
    }

    #[tokio::test]
    async fn test_unset_entries_are_skipped() -> anyhow::Result<()> {
        let roster = Roster::from_value(json!({
            "priest": {"discipline": entry("porige"), "holy": entry("None"), "shadow": entry("erod")}
        }))?;
        let handler = handler(vec![
            ("porige", response(2100.0, "10/10 M")),
            ("erod", response(1500.0, "6/10 M")),
        ]);

        let report = handler.generate_profiles(None, Some(roster)).await?;
        let names: Vec<&str> = report.profiles.iter().map(|p| p.character_name.as_str()).collect();
        assert_eq!(names, vec!["porige", "erod"]);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.requested, 2);
        assert!(report.is_complete());
        Ok(())
    }

    #[tokio::test]
    async fn test_failures_are_isolated() -> anyhow::Result<()> {
        let roster = Roster::from_value(json!({
            "mage": {"arcane": entry("a"), "fire": entry("b"), "frost": entry("c")},
            "rogue": {"outlaw": entry("d")}
        }))?;
        let handler = handler(vec![
            ("a", response(800.0, "12/10 M")),
            ("c", response(900.0, "3/10 H")),
            ("d", json!({"raid_progression": {"castle-nathria": {"summary": "1/10 M"}}})),
        ]);

        let report = handler.generate_profiles(None, Some(roster)).await?;
        assert_eq!(report.profiles.len(), 1);
        assert_eq!(report.profiles[0].character_name, "c");
        assert_eq!(
            report.profiles[0].progression["castle-nathria"],
            Progression::new(3, 10, Difficulty::Heroic)
        );
        assert_eq!(report.requested, 4);
        assert_eq!(report.missing(), 3);
        assert!(matches!(report.failures[0].error, ComparisonError::MalformedProgression { .. }));
        assert!(matches!(report.failures[2].error, ComparisonError::MissingField { .. }));
        assert!(report.failures.iter().all(|f| f.error.is_per_character()));
        Ok(())
    }

    /// Fails every fetch with a configuration error
    struct BrokenFetcher;

    #[async_trait]
    impl ProfileFetcher for BrokenFetcher {
        async fn fetch(&self, _entry: &CharacterEntry) -> Result<Value> {
            Err(ComparisonError::InvalidConfig("api_base_url is not a URL".into()))
        }
    }

    #[tokio::test]
    async fn test_fatal_fetch_error_aborts_batch() -> anyhow::Result<()> {
        let roster = Roster::from_value(json!({
            "priest": {"discipline": entry("porige"), "holy": entry("veganheals")}
        }))?;
        let handler = ProfileHandler::new(
            Arc::new(BrokenFetcher),
            ClassSpecRegistry::default(),
            "castle-nathria",
        );

        let result = handler.generate_profiles(None, Some(roster)).await;
        assert!(matches!(result, Err(ComparisonError::InvalidConfig(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_input_arguments_are_exclusive() {
        let handler = handler(vec![]);
        let both = handler
            .generate_profiles(Some(Path::new("roster.json")), Some(Roster::default()))
            .await;
        assert!(matches!(both, Err(ComparisonError::DuplicateArgument)));

        let neither = handler.generate_profiles(None, None).await;
        assert!(matches!(neither, Err(ComparisonError::MissingInput)));
    }

    #[tokio::test]
    async fn test_unknown_pair_aborts_batch() {
        let roster = Roster::from_value(json!({"mage": {"holy": entry("x")}})).unwrap();
        let result = handler(vec![("x", response(1.0, "1/10 M"))])
            .generate_profiles(None, Some(roster))
            .await;
        assert!(matches!(result, Err(ComparisonError::InvalidRoster(_))));
    }

    #[test]
    fn test_assemble_merges_identity() {
        let handler = handler(vec![]);
        let entry: CharacterEntry = serde_json::from_value(entry("veganheals")).unwrap();
        let profile = handler
            .assemble("priest", "holy", &entry, &response(925.6, "2/10 M"))
            .unwrap();
        assert_eq!(profile.class_name, "priest");
        assert_eq!(profile.spec_name, "holy");
        assert_eq!(profile.guild, "Superstars");
        assert_eq!(profile.score, 925.6);
        assert_eq!(
            profile.progression["castle-nathria"],
            Progression::new(2, 10, Difficulty::Mythic)
        );
    }
}
