//! Record Model
//!
//! Value objects shared by the assembler and the renderer: colours,
//! progression, score extraction and the assembled player profile.

pub mod colors;
pub mod profile;
pub mod progression;

pub use colors::{Color, ColorBucket, ColorBuckets};
pub use profile::{CharacterEntry, Profile, UNSET_CHARACTER};
pub use progression::{compute_score, parse_progression, progression_summary, Difficulty, Progression};
