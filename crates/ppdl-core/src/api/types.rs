//! Wire types for `POST /search/metadata` and the domain [`AssetDescriptor`].

use crate::checksum::Checksum;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::num::ParseIntError;
use uuid::Uuid;

/// Assets requested per search page.
pub const PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetVisibility {
    Archive,
    Timeline,
    Hidden,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    Image,
    Video,
    Audio,
    Other,
}

/// Search filter plus page cursor. Absent optionals are omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAssetsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<AssetVisibility>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<AssetType>,
    /// Compared server-side against upload time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
    pub size: u32,
    /// 1-based.
    pub page: u32,
}

impl SearchAssetsRequest {
    /// Timeline images of one person, first page.
    pub fn person_images(person_id: Uuid, created_after: Option<DateTime<Utc>>) -> Self {
        Self {
            person_ids: Some(vec![person_id]),
            visibility: Some(AssetVisibility::Timeline),
            asset_type: Some(AssetType::Image),
            created_after,
            size: PAGE_SIZE,
            page: 1,
        }
    }
}

/// Asset as returned by the server. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: String,
    /// Standard base64 of a SHA-1 digest.
    pub checksum: String,
    /// When the asset was uploaded.
    pub created_at: DateTime<Utc>,
    /// Capture time in UTC, used for chronological sorting.
    pub file_created_at: DateTime<Utc>,
    /// Wall-clock capture time where the photo was taken.
    pub local_date_time: DateTime<FixedOffset>,
    pub original_file_name: String,
    pub original_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchAssetsResponse {
    pub assets: AssetPage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPage {
    pub items: Vec<AssetRecord>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl AssetPage {
    /// Next page number, or `None` when the listing is exhausted.
    /// An empty token or `"0"` also means exhausted.
    pub fn next_page_number(&self) -> Result<Option<u32>, ParseIntError> {
        match self.next_page.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(token) => token.parse::<u32>().map(|n| (n > 0).then_some(n)),
        }
    }
}

/// Immutable description of one remote asset, consumed by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub id: String,
    pub checksum: Checksum,
    pub created_at: DateTime<Utc>,
    pub file_created_at: DateTime<Utc>,
    /// Capture time as shown on the camera clock; drives directory placement.
    pub local_date_time: NaiveDateTime,
    pub original_file_name: String,
    pub original_path: String,
}

impl TryFrom<AssetRecord> for AssetDescriptor {
    type Error = base64::DecodeError;

    fn try_from(record: AssetRecord) -> Result<Self, Self::Error> {
        Ok(AssetDescriptor {
            checksum: Checksum::from_base64(&record.checksum)?,
            id: record.id,
            created_at: record.created_at,
            file_created_at: record.file_created_at,
            local_date_time: record.local_date_time.naive_local(),
            original_file_name: record.original_file_name,
            original_path: record.original_path,
        })
    }
}
