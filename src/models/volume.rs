//! Google Books volume payloads
//!
//! Field names follow the Books API v1 JSON (camelCase) in both directions, so
//! search results are relayed to clients in the shape the provider sent them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::NewBook;

/// `GET /volumes?q=` response envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeList {
    #[serde(default)]
    pub total_items: u32,
    /// Absent when the provider found nothing
    #[serde(default)]
    pub items: Vec<VolumeSummary>,
}

/// One entry of a search result list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSummary {
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

/// `GET /volumes/{id}` response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDetail {
    pub id: String,
    pub self_link: Option<String>,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub industry_identifiers: Vec<IndustryIdentifier>,
    pub image_links: Option<ImageLinks>,
    pub info_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndustryIdentifier {
    /// ISBN_10, ISBN_13, ISSN or OTHER
    #[serde(rename = "type")]
    pub kind: String,
    pub identifier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
}

/// Column width of `books.title` and `books.subtitle`
const MAX_TITLE_CHARS: usize = 256;

fn clip(value: &str) -> String {
    value.trim().chars().take(MAX_TITLE_CHARS).collect()
}

impl VolumeDetail {
    /// Book record linked to this catalog volume
    pub fn to_new_book(&self, add_item: bool) -> NewBook {
        let title = self
            .volume_info
            .title
            .as_deref()
            .map(clip)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.id.clone());
        NewBook {
            title,
            subtitle: self
                .volume_info
                .subtitle
                .as_deref()
                .map(clip)
                .filter(|s| !s.is_empty()),
            google_id: Some(self.id.clone()),
            add_item,
        }
    }
}
