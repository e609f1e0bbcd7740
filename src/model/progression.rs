//! Raid progression and Mythic+ score extraction
//!
//! Both read from the Raider.IO profile JSON. Progress arrives as a summary
//! string such as `"2/10 M"`: bosses killed, bosses available, then a
//! single difficulty letter.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ComparisonError, Result};

/// Raid difficulty, keyed by the letter Raider.IO uses in summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Mythic,
    Heroic,
    Normal,
    Lfr,
}

impl Difficulty {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(Difficulty::Mythic),
            'H' => Some(Difficulty::Heroic),
            'N' => Some(Difficulty::Normal),
            'L' => Some(Difficulty::Lfr),
            _ => None,
        }
    }

    pub fn short_code(&self) -> char {
        match self {
            Difficulty::Mythic => 'M',
            Difficulty::Heroic => 'H',
            Difficulty::Normal => 'N',
            Difficulty::Lfr => 'L',
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Mythic => "Mythic",
            Difficulty::Heroic => "Heroic",
            Difficulty::Normal => "Normal",
            Difficulty::Lfr => "LFR",
        };
        f.write_str(name)
    }
}

/// Kill progress in a single raid at its highest cleared difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub bosses_killed: u32,
    pub bosses_available: u32,
    pub difficulty: Difficulty,
}

impl Progression {
    pub fn new(bosses_killed: u32, bosses_available: u32, difficulty: Difficulty) -> Self {
        Self {
            bosses_killed,
            bosses_available,
            difficulty,
        }
    }

    /// Completion fraction, `killed / available`
    pub fn fraction(&self) -> f64 {
        self.bosses_killed as f64 / self.bosses_available as f64
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}{}",
            self.bosses_killed,
            self.bosses_available,
            self.difficulty.short_code()
        )
    }
}

/// Parse a summary like `"2/10M"` or `"2/10 M"` into a one-raid map.
///
/// Only the configured raid is tracked; older tiers are not requested.
pub fn parse_progression(raid_id: &str, summary: &str) -> Result<BTreeMap<String, Progression>> {
    let trimmed = summary.trim();
    let code = trimmed
        .chars()
        .last()
        .ok_or_else(|| ComparisonError::malformed(summary, "empty summary"))?;
    let difficulty = Difficulty::from_code(code)
        .ok_or_else(|| ComparisonError::malformed(summary, format!("unknown difficulty '{}'", code)))?;

    let counts = trimmed[..trimmed.len() - code.len_utf8()].trim_end();
    let (killed, available) = counts
        .split_once('/')
        .ok_or_else(|| ComparisonError::malformed(summary, "expected '<killed>/<available>'"))?;

    let parse_count = |text: &str, what: &str| {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ComparisonError::malformed(
                summary,
                format!("{} count '{}' is not a plain number", what, text),
            ));
        }
        text.parse::<u32>()
            .map_err(|e| ComparisonError::malformed(summary, format!("{} count: {}", what, e)))
    };
    let bosses_killed = parse_count(killed, "killed")?;
    let bosses_available = parse_count(available, "available")?;

    if bosses_available == 0 {
        return Err(ComparisonError::malformed(summary, "raid has no bosses"));
    }
    if bosses_killed > bosses_available {
        return Err(ComparisonError::malformed(
            summary,
            format!("{} kills exceed {} bosses", bosses_killed, bosses_available),
        ));
    }

    let mut progression = BTreeMap::new();
    progression.insert(
        raid_id.to_string(),
        Progression::new(bosses_killed, bosses_available, difficulty),
    );
    Ok(progression)
}

/// Overall Mythic+ score (`mythic_plus_scores.all`)
pub fn compute_score(response: &Value) -> Result<f64> {
    let field = "mythic_plus_scores.all";
    let score = response
        .get("mythic_plus_scores")
        .and_then(|scores| scores.get("all"))
        .and_then(Value::as_f64)
        .ok_or_else(|| ComparisonError::missing(field))?;

    if score < 0.0 || !score.is_finite() {
        return Err(ComparisonError::missing(format!("{} (got {})", field, score)));
    }
    Ok(score)
}

/// Raid summary string (`raid_progression.<raid_id>.summary`)
pub fn progression_summary<'a>(response: &'a Value, raid_id: &str) -> Result<&'a str> {
    response
        .get("raid_progression")
        .and_then(|raids| raids.get(raid_id))
        .and_then(|raid| raid.get("summary"))
        .and_then(Value::as_str)
        .ok_or_else(|| ComparisonError::missing(format!("raid_progression.{}.summary", raid_id)))
}
