use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// Raw list query string. Everything is optional text so malformed numbers
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Normalized list request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRequest {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl TableRequest {
    pub fn from_params(params: TableParams, pagination: &PaginationConfig) -> Self {
        let page = parse_positive(params.page.as_deref()).unwrap_or(1);
        let limit = parse_positive(params.limit.as_deref())
            .unwrap_or(pagination.default_limit)
            .clamp(1, pagination.max_limit.max(1));

        Self {
            search: non_empty(params.search),
            status: non_empty(params.status),
            page,
            limit,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).filter(|n| *n >= 1)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Derived page window for one list response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    /// 1-based index of the first row shown, 0 when the page is empty.
    pub start: u64,
    pub end: u64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub pages: Vec<u32>,
}

impl PaginationState {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);

        let offset = u64::from(page - 1) * u64::from(limit);
        let (start, end) = if offset < total {
            (offset + 1, (offset + u64::from(limit)).min(total))
        } else {
            (0, 0)
        };

        let has_prev = page > 1;
        let has_next = page < total_pages;

        // Sliding window of up to five page numbers around the current page
        let first = page.saturating_sub(2).max(1);
        let last = page.saturating_add(2).min(total_pages);
        let pages = if total == 0 { Vec::new() } else { (first..=last).collect() };

        Self {
            current_page: page,
            limit,
            total,
            total_pages,
            start,
            end,
            has_prev,
            has_next,
            prev_page: has_prev.then(|| page - 1),
            next_page: has_next.then(|| page + 1),
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig { default_limit: 10, max_limit: 100 }
    }

    fn params(page: Option<&str>, limit: Option<&str>) -> TableParams {
        TableParams {
            page: page.map(String::from),
            limit: limit.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn window_matches_formula() {
        for total in [0u64, 1, 9, 10, 11, 25, 99, 100, 101, 1000] {
            for limit in [1u32, 3, 10, 20, 50, 100] {
                let total_pages = total.div_ceil(u64::from(limit)) as u32;
                for page in 1..=total_pages + 3 {
                    let state = PaginationState::new(page, limit, total);
                    let expected: Vec<u32> = if total == 0 {
                        vec![]
                    } else {
                        (page.saturating_sub(2).max(1)..=(page + 2).min(total_pages)).collect()
                    };
                    assert_eq!(state.pages, expected, "total={} limit={} page={}", total, limit, page);
                    assert_eq!(state.total_pages, total_pages);
                    assert_eq!(state.has_next, page < total_pages);
                }
            }
        }
    }

    #[test]
    fn middle_page() {
        let state = PaginationState::new(5, 10, 95);
        assert_eq!(state.total_pages, 10);
        assert_eq!(state.pages, vec![3, 4, 5, 6, 7]);
        assert_eq!((state.start, state.end), (41, 50));
        assert_eq!(state.prev_page, Some(4));
        assert_eq!(state.next_page, Some(6));
    }

    #[test]
    fn last_partial_page_and_past_the_end() {
        let state = PaginationState::new(3, 10, 25);
        assert_eq!((state.start, state.end), (21, 25));
        assert!(!state.has_next);
        assert_eq!(state.next_page, None);

        let state = PaginationState::new(2, 10, 3);
        assert_eq!(state.pages, vec![1]);
        assert_eq!((state.start, state.end), (0, 0));
        assert!(state.has_prev);
        assert!(!state.has_next);
    }

    #[test]
    fn empty_result() {
        let state = PaginationState::new(1, 10, 0);
        assert!(state.pages.is_empty());
        assert_eq!(state.total_pages, 0);
        assert!(!state.has_prev && !state.has_next);
    }

    #[test]
    fn parses_request_defaults_and_caps() {
        let request = TableRequest::from_params(params(None, None), &config());
        assert_eq!((request.page, request.limit), (1, 10));

        let request = TableRequest::from_params(params(Some("abc"), Some("-4")), &config());
        assert_eq!((request.page, request.limit), (1, 10));

        let request = TableRequest::from_params(params(Some("3"), Some("5000")), &config());
        assert_eq!((request.page, request.limit), (3, 100));
        assert_eq!(request.offset(), 200);

        let request = TableRequest::from_params(params(Some("0"), Some("20")), &config());
        assert_eq!((request.page, request.limit), (1, 20));
    }

    #[test]
    fn blank_search_and_status_are_dropped() {
        let request = TableRequest::from_params(
            TableParams {
                search: Some("  ".into()),
                status: Some(" pending ".into()),
                ..Default::default()
            },
            &config(),
        );
        assert_eq!(request.search, None);
        assert_eq!(request.status.as_deref(), Some("pending"));
    }
}
