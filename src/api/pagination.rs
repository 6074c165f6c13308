//! Page-by-page collection of listing endpoints.

use std::future::Future;

use tracing::debug;

use super::error::ApiError;
use super::models::Page;

/// Subfolder listing page size.
pub const FOLDER_PAGE_SIZE: u32 = 100;

/// Item listing page size.
pub const ITEM_PAGE_SIZE: u32 = 25;

/// Number of pages needed to cover `total_records` at `page_size`.
///
/// Always at least one: the first page is what reports the total.
#[must_use]
pub fn page_count(total_records: u64, page_size: u32) -> u64 {
    let page_size = u64::from(page_size.max(1));
    total_records.div_ceil(page_size).max(1)
}

/// Fetches page 1, then every further page implied by its `total_records`,
/// in ascending order, and concatenates the entities.
///
/// Any failing page fails the whole listing; a half-collected listing is
/// never handed to the caller.
///
/// # Errors
///
/// Returns the first [`ApiError`] produced by `fetch_page`.
pub async fn collect_pages<T, F, Fut>(page_size: u32, mut fetch_page: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let first = fetch_page(1).await?;
    let total_records = first.pagination.total_records;
    let pages = page_count(total_records, page_size);
    debug!(total_records, pages, page_size, "paginating listing");

    let mut records = first.entities;
    for page in 2..=pages {
        let page = u32::try_from(page).unwrap_or(u32::MAX);
        let next = fetch_page(page).await?;
        records.extend(next.entities);
    }
    Ok(records)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::api::models::Pagination;

    fn page_of(range: std::ops::Range<u64>, total: u64) -> Page<u64> {
        Page {
            entities: range.collect(),
            pagination: Pagination {
                total_records: total,
            },
        }
    }

    #[test]
    fn test_page_count_boundaries() {
        assert_eq!(page_count(0, 100), 1);
        assert_eq!(page_count(1, 100), 1);
        assert_eq!(page_count(100, 100), 1);
        assert_eq!(page_count(101, 100), 2);
        assert_eq!(page_count(250, 100), 3);
        assert_eq!(page_count(26, 25), 2);
    }

    #[tokio::test]
    async fn test_collect_pages_requests_each_page_once_in_order() {
        let requested = RefCell::new(Vec::new());
        let records = collect_pages(100, |page| {
            requested.borrow_mut().push(page);
            let start = u64::from(page - 1) * 100;
            let end = (start + 100).min(250);
            async move { Ok(page_of(start..end, 250)) }
        })
        .await
        .unwrap();

        assert_eq!(*requested.borrow(), vec![1, 2, 3]);
        assert_eq!(records.len(), 250);
        assert_eq!(records.first(), Some(&0));
        assert_eq!(records.last(), Some(&249));
    }

    #[tokio::test]
    async fn test_collect_pages_empty_listing_is_single_call() {
        let calls = RefCell::new(0);
        let records: Vec<u64> = collect_pages(25, |_| {
            *calls.borrow_mut() += 1;
            async { Ok(page_of(0..0, 0)) }
        })
        .await
        .unwrap();

        assert!(records.is_empty());
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn test_collect_pages_later_page_failure_fails_listing() {
        let result = collect_pages(100, |page| async move {
            if page == 2 {
                Err(ApiError::http_status("items", 500))
            } else {
                Ok(page_of(0..100, 150))
            }
        })
        .await;

        assert!(matches!(
            result,
            Err(ApiError::HttpStatus { status: 500, .. })
        ));
    }
}
