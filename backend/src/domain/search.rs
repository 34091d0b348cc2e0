//! Search criteria and pagination envelope for marketplace queries.

use serde::Serialize;
use utoipa::ToSchema;

use super::listing::{Category, ListingType};

/// Hard ceiling on page size regardless of what the client asks for.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Page size applied when the client does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filters and paging for `searchListings`.
///
/// Absent filters match everything. Construction normalises the input:
/// blank text becomes no filter, page defaults to 1, page size is clamped
/// to [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub category: Option<Category>,
    pub listing_type: Option<ListingType>,
    text: Option<String>,
    page: u32,
    page_size: u32,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self::new(None, None, None, None, None)
    }
}

impl SearchCriteria {
    /// Normalise raw request input into usable criteria.
    pub fn new(
        category: Option<Category>,
        listing_type: Option<ListingType>,
        text: Option<String>,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Self {
        let text = text
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        Self {
            category,
            listing_type,
            text,
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Free-text filter, already trimmed; `None` when absent or blank.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// 1-based page number.
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size after clamping.
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Row offset for the current page.
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Row limit for the current page.
    pub const fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// One page of results plus the total match count for pagination UI.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Assemble a page envelope from repository output and the criteria used.
    pub fn new(items: Vec<T>, total: u64, criteria: &SearchCriteria) -> Self {
        Self {
            items,
            total,
            page: criteria.page(),
            page_size: criteria.page_size(),
        }
    }

    /// Map the item type while keeping paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_everything() {
        let criteria = SearchCriteria::default();
        assert_eq!(criteria.category, None);
        assert_eq!(criteria.listing_type, None);
        assert_eq!(criteria.text(), None);
        assert_eq!(criteria.page(), 1);
        assert_eq!(criteria.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(criteria.offset(), 0);
    }

    #[rstest]
    #[case(Some("".to_owned()), None)]
    #[case(Some("   ".to_owned()), None)]
    #[case(Some(" tractor ".to_owned()), Some("tractor"))]
    fn blank_text_is_treated_as_absent(
        #[case] input: Option<String>,
        #[case] expected: Option<&str>,
    ) {
        let criteria = SearchCriteria::new(None, None, input, None, None);
        assert_eq!(criteria.text(), expected);
    }

    #[rstest]
    #[case(Some(0), 1)]
    #[case(Some(3), 3)]
    #[case(None, 1)]
    fn page_is_at_least_one(#[case] page: Option<u32>, #[case] expected: u32) {
        assert_eq!(SearchCriteria::new(None, None, None, page, None).page(), expected);
    }

    #[rstest]
    #[case(Some(500), MAX_PAGE_SIZE)]
    #[case(Some(0), 1)]
    #[case(Some(50), 50)]
    fn page_size_is_clamped(#[case] size: Option<u32>, #[case] expected: u32) {
        assert_eq!(
            SearchCriteria::new(None, None, None, None, size).page_size(),
            expected
        );
    }

    #[test]
    fn offset_accounts_for_page_and_size() {
        let criteria = SearchCriteria::new(None, None, None, Some(3), Some(25));
        assert_eq!(criteria.offset(), 50);
        assert_eq!(criteria.limit(), 25);
    }

    #[test]
    fn page_map_keeps_metadata() {
        let criteria = SearchCriteria::new(None, None, None, Some(2), Some(10));
        let page = Page::new(vec![1, 2, 3], 23, &criteria).map(|n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.total, 23);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 10);
    }
}
