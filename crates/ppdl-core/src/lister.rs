//! Lazy, paginated listing of one person's assets.
//!
//! [`AssetLister`] issues one search request per page, starting at page 1,
//! and yields the items in server order. A page is only requested once the
//! previous one has been fully consumed. Any transport or decoding error ends
//! the listing: it is yielded once and the iterator is exhausted afterwards.

use crate::api::{ApiError, AssetDescriptor, AssetRecord, SearchApi, SearchAssetsRequest};
use crate::config::Settings;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("listing page {page}: {source}")]
    Api {
        page: u32,
        #[source]
        source: ApiError,
    },
    #[error("listing page {page}: asset {asset_id} has an invalid checksum: {source}")]
    Checksum {
        page: u32,
        asset_id: String,
        #[source]
        source: base64::DecodeError,
    },
    #[error("listing page {page}: invalid next page token {token:?}")]
    PageToken { page: u32, token: String },
}

pub struct AssetLister<'a, S: SearchApi + ?Sized> {
    api: &'a S,
    request: SearchAssetsRequest,
    next_page: Option<u32>,
    /// Page the buffered items came from.
    current_page: u32,
    buffer: VecDeque<AssetRecord>,
}

impl<'a, S: SearchApi + ?Sized> AssetLister<'a, S> {
    /// Lister starting at `request.page`.
    pub fn new(api: &'a S, request: SearchAssetsRequest) -> Self {
        Self {
            api,
            next_page: Some(request.page),
            current_page: request.page,
            request,
            buffer: VecDeque::new(),
        }
    }

    /// Timeline images of `settings.person_id` uploaded after the configured cutoff.
    pub fn for_settings(api: &'a S, settings: &Settings) -> Self {
        Self::new(
            api,
            SearchAssetsRequest::person_images(settings.person_id, settings.created_after),
        )
    }

    fn stop(&mut self) {
        self.next_page = None;
        self.buffer.clear();
    }

    fn fetch_page(&mut self, page: u32) -> Result<(), ListError> {
        self.request.page = page;
        let resp = self
            .api
            .search_page(&self.request)
            .map_err(|source| ListError::Api { page, source })?;
        let next = resp
            .assets
            .next_page_number()
            .map_err(|_| ListError::PageToken {
                page,
                token: resp.assets.next_page.clone().unwrap_or_default(),
            })?;
        tracing::debug!(page, items = resp.assets.items.len(), next = ?next, "search page");
        self.current_page = page;
        self.next_page = next;
        self.buffer.extend(resp.assets.items);
        Ok(())
    }
}

impl<S: SearchApi + ?Sized> Iterator for AssetLister<'_, S> {
    type Item = Result<AssetDescriptor, ListError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                let asset_id = record.id.clone();
                return Some(AssetDescriptor::try_from(record).map_err(|source| {
                    let page = self.current_page;
                    self.stop();
                    ListError::Checksum {
                        page,
                        asset_id,
                        source,
                    }
                }));
            }
            let page = self.next_page?;
            if let Err(e) = self.fetch_page(page) {
                self.stop();
                return Some(Err(e));
            }
        }
    }
}

impl<S: SearchApi + ?Sized> FusedIterator for AssetLister<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AssetPage, SearchAssetsResponse};
    use crate::transport::TransportError;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    /// Serves `pages[page - 1]`; the last page has no next token.
    struct ScriptedSearch {
        pages: Vec<Vec<AssetRecord>>,
        requested: Mutex<Vec<u32>>,
        fail_on: Option<u32>,
    }

    impl ScriptedSearch {
        fn new(sizes: &[usize]) -> Self {
            let mut n = 0;
            let pages = sizes
                .iter()
                .map(|&size| {
                    (0..size)
                        .map(|_| {
                            n += 1;
                            record(&format!("asset-{:03}", n))
                        })
                        .collect()
                })
                .collect();
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl SearchApi for ScriptedSearch {
        fn search_page(&self, request: &SearchAssetsRequest) -> Result<SearchAssetsResponse, ApiError> {
            self.requested.lock().unwrap().push(request.page);
            if self.fail_on == Some(request.page) {
                return Err(ApiError::Transport(TransportError::Status(500)));
            }
            let idx = request.page as usize - 1;
            let next_page = (idx + 1 < self.pages.len()).then(|| (request.page + 1).to_string());
            Ok(SearchAssetsResponse {
                assets: AssetPage {
                    items: self.pages[idx].clone(),
                    next_page,
                },
            })
        }
    }

    fn record(id: &str) -> AssetRecord {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        AssetRecord {
            id: id.to_string(),
            checksum: "9XLTlvrpIGYocU+yzgD3LpTyJY8=".to_string(),
            created_at: t,
            file_created_at: t,
            local_date_time: t.fixed_offset(),
            original_file_name: format!("{}.jpg", id),
            original_path: format!("upload/{}.jpg", id),
        }
    }

    fn request() -> SearchAssetsRequest {
        SearchAssetsRequest::person_images(uuid::Uuid::nil(), None)
    }

    #[test]
    fn yields_all_pages_in_order() {
        let api = ScriptedSearch::new(&[50, 50, 20]);
        let ids: Vec<String> = AssetLister::new(&api, request())
            .map(|r| r.unwrap().id)
            .collect();
        assert_eq!(ids.len(), 120);
        let expected: Vec<String> = (1..=120).map(|n| format!("asset-{:03}", n)).collect();
        assert_eq!(ids, expected);
        assert_eq!(api.requested(), vec![1, 2, 3]);
    }

    #[test]
    fn pages_are_requested_lazily() {
        let api = ScriptedSearch::new(&[2, 2]);
        let mut lister = AssetLister::new(&api, request());
        assert!(api.requested().is_empty());
        lister.next().unwrap().unwrap();
        lister.next().unwrap().unwrap();
        assert_eq!(api.requested(), vec![1]);
        lister.next().unwrap().unwrap();
        assert_eq!(api.requested(), vec![1, 2]);
    }

    #[test]
    fn empty_listing_terminates() {
        let api = ScriptedSearch::new(&[0]);
        assert_eq!(AssetLister::new(&api, request()).count(), 0);
    }

    #[test]
    fn transport_error_ends_listing() {
        let mut api = ScriptedSearch::new(&[3, 3, 3]);
        api.fail_on = Some(2);
        let mut lister = AssetLister::new(&api, request());
        for _ in 0..3 {
            assert!(lister.next().unwrap().is_ok());
        }
        assert!(matches!(
            lister.next(),
            Some(Err(ListError::Api { page: 2, .. }))
        ));
        assert!(lister.next().is_none());
        assert_eq!(api.requested(), vec![1, 2]);
    }

    #[test]
    fn bad_checksum_ends_listing() {
        let mut api = ScriptedSearch::new(&[3]);
        api.pages[0][1].checksum = "%%%".to_string();
        let mut lister = AssetLister::new(&api, request());
        assert!(lister.next().unwrap().is_ok());
        match lister.next() {
            Some(Err(ListError::Checksum { asset_id, .. })) => assert_eq!(asset_id, "asset-002"),
            other => panic!("expected checksum error, got {:?}", other),
        }
        assert!(lister.next().is_none());
    }
}
