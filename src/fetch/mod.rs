//! Profile Fetch Module
//!
//! The external data source sits behind [`ProfileFetcher`] so the assembler
//! depends only on the JSON shape of a profile, not on transport details.

mod raider_io;

pub use raider_io::{RaiderIoClient, PROFILE_FIELDS};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::model::CharacterEntry;

/// Source of raw character profile JSON
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    /// Fetch the profile for one roster entry.
    ///
    /// The response must carry `mythic_plus_scores.all` and
    /// `raid_progression.<raid>.summary`; anything else is ignored.
    async fn fetch(&self, entry: &CharacterEntry) -> Result<Value>;
}
