//! Page-number pagination shared by every list endpoint.
//!
//! A [`Paginator`] is built once from an immutable [`PaginationConfig`] and
//! turns raw `page` / `page_size` query values plus a total item count into a
//! [`Page`]: the slice bounds to fetch and the absolute `next` / `previous`
//! links. Links keep every original query parameter and only touch `page`.

use std::ops::Range;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use url::Url;
use utoipa::IntoParams;

use crate::responses::NON_FIELD_ERRORS;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";
const LAST_PAGE: &str = "last";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl PaginationConfig {
    /// Loads the config from a TOML file, or defaults when the file is absent.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if !Path::new(path).exists() {
            tracing::info!("Pagination config not found at {path}, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!(?config, "Loaded pagination config from {path}");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(content).map(Self::normalized)
    }

    /// Keeps `1 <= default_page_size <= max_page_size`.
    pub fn normalized(self) -> Self {
        let max_page_size = self.max_page_size.max(1);
        Self {
            default_page_size: self.default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Requested page lies past the last page.
    #[error("Invalid page.")]
    InvalidPage,

    /// Numeric but non-positive `page` or `page_size`.
    #[error("A valid positive integer is required.")]
    InvalidParameter(&'static str),
}

impl PaginationError {
    /// Envelope key the error is reported under.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidPage => NON_FIELD_ERRORS,
            Self::InvalidParameter(param) => param,
        }
    }
}

/// Raw pagination query parameters.
///
/// Kept as strings so values that are not numbers fall back to the defaults
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number, or `last`.
    pub page: Option<String>,
    /// Items per page, clamped to the configured maximum.
    pub page_size: Option<String>,
}

impl PageParams {
    pub fn new(page: Option<&str>, page_size: Option<&str>) -> Self {
        Self {
            page: page.map(str::to_owned),
            page_size: page_size.map(str::to_owned),
        }
    }

    /// Reads `page` and `page_size` out of a URL's query string.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                PAGE_PARAM => params.page = Some(value.into_owned()),
                PAGE_SIZE_PARAM => params.page_size = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

enum PageNumber {
    Number(u64),
    Last,
}

fn parse_positive(raw: &str, param: &'static str) -> Result<Option<u64>, PaginationError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(Some(n.unsigned_abs())),
        Ok(_) => Err(PaginationError::InvalidParameter(param)),
        Err(_) => Ok(None),
    }
}

fn parse_page(raw: Option<&str>) -> Result<PageNumber, PaginationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(PageNumber::Number(1)),
        Some(LAST_PAGE) => Ok(PageNumber::Last),
        Some(value) => Ok(PageNumber::Number(
            parse_positive(value, PAGE_PARAM)?.unwrap_or(1),
        )),
    }
}

/// One resolved page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
    pub count: u64,
    pub num_pages: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
}

impl Page {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }

    pub fn limit(&self) -> u64 {
        self.size
    }

    /// Index range of this page within a fully materialized listing.
    pub fn range(&self) -> Range<usize> {
        let to_index = |n: u64| usize::try_from(n.min(self.count)).unwrap_or(usize::MAX);
        to_index(self.offset())..to_index(self.offset() + self.size)
    }

    /// Attaches the already-sliced items fetched for this page.
    pub fn into_paged<T>(self, items: Vec<T>) -> Paged<T> {
        Paged {
            count: self.count,
            next: self.next,
            previous: self.previous,
            items,
        }
    }

    /// Cuts this page out of the complete listing.
    pub fn slice<T>(self, items: Vec<T>) -> Paged<T> {
        let range = self.range();
        let items = items
            .into_iter()
            .skip(range.start)
            .take(range.len())
            .collect();
        self.into_paged(items)
    }
}

/// Items of one page together with the listing total and navigation links.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub items: Vec<T>,
}

impl<T> Paged<T> {
    /// Whole listing in one response: `count` is the item count, no links.
    pub fn unpaginated(items: Vec<T>) -> Self {
        Self {
            count: items.len() as u64,
            next: None,
            previous: None,
            items,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Paginator {
    config: PaginationConfig,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> PaginationConfig {
        self.config
    }

    /// Effective page size: default when absent or unreadable, clamped to the max.
    pub fn page_size(&self, params: &PageParams) -> Result<u64, PaginationError> {
        let requested = match params.page_size.as_deref() {
            None => None,
            Some(raw) => parse_positive(raw, PAGE_SIZE_PARAM)?,
        };

        Ok(requested
            .unwrap_or(self.config.default_page_size)
            .min(self.config.max_page_size))
    }

    /// Resolves the requested page against `total` items listed at `url`.
    pub fn paginate(
        &self,
        params: &PageParams,
        total: u64,
        url: &Url,
    ) -> Result<Page, PaginationError> {
        let size = self.page_size(params)?;
        let num_pages = total.div_ceil(size).max(1);

        let number = match parse_page(params.page.as_deref())? {
            PageNumber::Number(n) => n,
            PageNumber::Last => num_pages,
        };
        if number > num_pages {
            return Err(PaginationError::InvalidPage);
        }

        Ok(Page {
            number,
            size,
            count: total,
            num_pages,
            next: (number < num_pages).then(|| page_link(url, number + 1)),
            previous: (number > 1).then(|| page_link(url, number - 1)),
        })
    }
}

/// `url` with `page` replaced. Page 1 drops the parameter entirely.
fn page_link(url: &Url, page: u64) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if page > 1 {
        pairs.push((PAGE_PARAM.to_owned(), page.to_string()));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut link = url.clone();
    link.set_query(None);
    link.set_fragment(None);
    if !pairs.is_empty() {
        link.query_pairs_mut().extend_pairs(pairs);
    }
    link.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://testserver/api/documents/list";

    fn url(query: &str) -> Url {
        if query.is_empty() {
            Url::parse(BASE).unwrap()
        } else {
            Url::parse(&format!("{BASE}?{query}")).unwrap()
        }
    }

    fn paginator() -> Paginator {
        Paginator::new(PaginationConfig::default())
    }

    #[test]
    fn first_of_three_pages() {
        let request = url("page_size=20");
        let page = paginator()
            .paginate(&PageParams::from_url(&request), 42, &request)
            .unwrap();

        assert_eq!(page.count, 42);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.offset(), 0);
        assert_eq!(page.limit(), 20);
        assert_eq!(page.previous, None);
        assert_eq!(page.next.as_deref(), Some(format!("{BASE}?page=2&page_size=20").as_str()));
    }

    #[test]
    fn last_page_has_no_next() {
        let request = url("page=3&page_size=20");
        let page = paginator()
            .paginate(&PageParams::from_url(&request), 42, &request)
            .unwrap();

        assert_eq!(page.offset(), 40);
        assert_eq!(page.range(), 40..42);
        assert_eq!(page.next, None);
        assert_eq!(
            page.previous.as_deref(),
            Some(format!("{BASE}?page=2&page_size=20").as_str())
        );
    }

    #[test]
    fn page_last_keyword_selects_final_page() {
        let request = url("page=last");
        let page = paginator()
            .paginate(&PageParams::from_url(&request), 45, &request)
            .unwrap();
        assert_eq!(page.number, 3);
    }

    #[test]
    fn page_past_the_end_is_invalid() {
        let request = url("page=4&page_size=20");
        let err = paginator()
            .paginate(&PageParams::from_url(&request), 42, &request)
            .unwrap_err();
        assert_eq!(err, PaginationError::InvalidPage);
        assert_eq!(err.field(), NON_FIELD_ERRORS);
    }

    #[test]
    fn oversized_page_size_is_clamped() {
        let params = PageParams::new(None, Some("500"));
        assert_eq!(paginator().page_size(&params).unwrap(), MAX_PAGE_SIZE);
    }

    #[test]
    fn zero_items_is_a_valid_first_page() {
        let request = url("");
        let page = paginator()
            .paginate(&PageParams::default(), 0, &request)
            .unwrap();
        assert_eq!(page.count, 0);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
        assert!(page.range().is_empty());

        let err = paginator()
            .paginate(&PageParams::new(Some("2"), None), 0, &request)
            .unwrap_err();
        assert_eq!(err, PaginationError::InvalidPage);
    }

    #[test]
    fn non_positive_numbers_are_rejected() {
        let request = url("");
        for (page, page_size, field) in [
            (Some("0"), None, PAGE_PARAM),
            (Some("-2"), None, PAGE_PARAM),
            (None, Some("0"), PAGE_SIZE_PARAM),
            (None, Some("-5"), PAGE_SIZE_PARAM),
        ] {
            let err = paginator()
                .paginate(&PageParams::new(page, page_size), 10, &request)
                .unwrap_err();
            assert_eq!(err, PaginationError::InvalidParameter(field));
            assert_eq!(err.field(), field);
        }
    }

    #[test]
    fn unreadable_values_fall_back_to_defaults() {
        let request = url("");
        let page = paginator()
            .paginate(&PageParams::new(Some("abc"), Some("lots")), 100, &request)
            .unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn links_keep_other_query_parameters() {
        let request = url("status=pending&search=budget+report&page=2&page_size=5");
        let page = paginator()
            .paginate(&PageParams::from_url(&request), 30, &request)
            .unwrap();

        let next = Url::parse(page.next.as_deref().unwrap()).unwrap();
        let pairs: Vec<(String, String)> = next.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("page".to_owned(), "3".to_owned()),
                ("page_size".to_owned(), "5".to_owned()),
                ("search".to_owned(), "budget report".to_owned()),
                ("status".to_owned(), "pending".to_owned()),
            ]
        );
        assert_eq!(next.path(), "/api/documents/list");
    }

    #[test]
    fn following_next_then_previous_returns_to_start() {
        let start = url("page_size=10");
        let first = paginator()
            .paginate(&PageParams::from_url(&start), 25, &start)
            .unwrap();

        let next = Url::parse(first.next.as_deref().unwrap()).unwrap();
        let second = paginator()
            .paginate(&PageParams::from_url(&next), 25, &next)
            .unwrap();

        assert_eq!(second.previous.as_deref(), Some(start.as_str()));
    }

    #[test]
    fn slice_cuts_in_memory_listing() {
        let request = url("page=2&page_size=4");
        let items: Vec<u32> = (1..=10).collect();
        let page = paginator()
            .paginate(&PageParams::from_url(&request), items.len() as u64, &request)
            .unwrap();
        let paged = page.slice(items);
        assert_eq!(paged.items, vec![5, 6, 7, 8]);
        assert_eq!(paged.count, 10);
    }

    #[test]
    fn config_is_normalized() {
        let config = PaginationConfig::from_toml("default_page_size = 500\nmax_page_size = 50")
            .unwrap();
        assert_eq!(config.default_page_size, 50);

        let config = PaginationConfig::from_toml("").unwrap();
        assert_eq!(config, PaginationConfig::default());
    }
}
