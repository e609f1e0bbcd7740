//! Raider.IO Profile Client
//!
//! Single blocking-in-sequence GET per character. No retry, no caching.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::ProfileFetcher;
use crate::error::Result;
use crate::model::CharacterEntry;

/// Field groups requested from the profile endpoint
pub const PROFILE_FIELDS: &str = "raid_progression,mythic_plus_scores";

pub struct RaiderIoClient {
    client: Client,
    base_url: String,
}

impl RaiderIoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("io_comparison/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Full request URL for one character
    pub fn profile_url(&self, entry: &CharacterEntry) -> String {
        format!(
            "{}?region={}&realm={}&name={}&fields={}",
            self.base_url.trim_end_matches(['?', '/']),
            urlencoding::encode(&entry.region.to_lowercase()),
            urlencoding::encode(&entry.character_realm.to_lowercase()),
            urlencoding::encode(&entry.character_name.to_lowercase()),
            urlencoding::encode(PROFILE_FIELDS)
        )
    }
}

#[async_trait]
impl ProfileFetcher for RaiderIoClient {
    async fn fetch(&self, entry: &CharacterEntry) -> Result<Value> {
        let url = self.profile_url(entry);
        debug!("Fetching profile: {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: Value = response.json().await?;
        Ok(body)
    }
}
