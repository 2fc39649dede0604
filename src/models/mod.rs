//! Data models for card listings, set options and search requests

use serde::{Deserialize, Serialize};

/// Card condition as advertised in the listing name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Near mint, assumed unless the listing says otherwise
    #[default]
    Nm,
    /// Lightly played
    Lp,
}

/// Alternate printing of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Alternative {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "retro")]
    Retro,
    #[serde(rename = "borderless")]
    Borderless,
    #[serde(rename = "extended art")]
    ExtendedArt,
    #[serde(rename = "showcase")]
    Showcase,
}

/// A single card listing scraped from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardRecord {
    pub id: String,
    pub original_name: String,
    pub name: String,
    pub set: String,
    pub set_image_url: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub foil: bool,
    pub rarity: String,
    pub quantity: u64,
    pub price: u64,
    pub condition: Condition,
    pub alternative: Alternative,
    pub image_url: String,
}

/// One option of the set filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetRecord {
    pub set: String,
    pub set_name: String,
}

/// Search fields supplied by the caller
///
/// Every field is optional; absent fields keep the upstream default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub card_name: Option<String>,
    pub rarity: Option<String>,
    pub foil: Option<String>,
}

/// Query parameters understood by the catalog search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParameters {
    /// `akce`
    pub action: String,
    /// `jmenokarty`
    pub card_name: String,
    /// `rarita`
    pub rarity: String,
    /// `limit`, the offset of the first listing on the page
    pub offset: u32,
    /// `foil`
    pub foil: String,
    /// `triditpodle`
    pub sort_by: String,
    /// `submit`
    pub submit: String,
}

impl SearchParameters {
    /// Key/value pairs in the order the site's own search form sends them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("akce", self.action.clone()),
            ("jmenokarty", self.card_name.clone()),
            ("rarita", self.rarity.clone()),
            ("limit", self.offset.to_string()),
            ("foil", self.foil.clone()),
            ("triditpodle", self.sort_by.clone()),
            ("submit", self.submit.clone()),
        ]
    }

    /// Copy of these parameters pointing at a different result offset.
    pub fn with_offset(&self, offset: u32) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }
}

impl Default for SearchParameters {
    fn default() -> Self {
        Self {
            action: "3".to_string(),
            card_name: "XXX".to_string(),
            rarity: "A".to_string(),
            offset: 0,
            foil: "A".to_string(),
            sort_by: "ceny".to_string(),
            submit: "Vyhledej".to_string(),
        }
    }
}
