//! Immich search and download endpoints.
//!
//! The lister and the fetcher only see the [`SearchApi`] and [`AssetSource`]
//! traits; [`ImmichClient`] is the production implementation.

mod types;

pub use types::{
    AssetDescriptor, AssetPage, AssetRecord, AssetType, AssetVisibility, SearchAssetsRequest,
    SearchAssetsResponse, PAGE_SIZE,
};

use crate::transport::{BodySink, ImmichClient, TransportError};
use thiserror::Error;

/// Metadata search endpoint, relative to the API base URL.
pub const SEARCH_METADATA_PATH: &str = "/search/metadata";

/// Path of the original-file download endpoint for `asset_id`.
pub fn original_path(asset_id: &str) -> String {
    format!("/assets/{}/original", asset_id)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("search request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid search payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// One page of the paginated asset search.
pub trait SearchApi {
    fn search_page(&self, request: &SearchAssetsRequest) -> Result<SearchAssetsResponse, ApiError>;
}

/// Byte stream of an asset's original file.
pub trait AssetSource {
    /// Streams the original into `sink`; returns the number of bytes delivered.
    fn download_original(&self, asset_id: &str, sink: &mut BodySink<'_>) -> Result<u64, TransportError>;
}

impl SearchApi for ImmichClient {
    fn search_page(&self, request: &SearchAssetsRequest) -> Result<SearchAssetsResponse, ApiError> {
        let body = serde_json::to_vec(request)?;
        let raw = self.post_json(SEARCH_METADATA_PATH, &body)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

impl AssetSource for ImmichClient {
    fn download_original(&self, asset_id: &str, sink: &mut BodySink<'_>) -> Result<u64, TransportError> {
        self.get_streaming(&original_path(asset_id), sink)
    }
}
