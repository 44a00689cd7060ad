//! Contract with the data-fetching side of the application.
//!
//! The live client only ever calls [`Invalidate::invalidate`]. Paginated
//! fetching ([`DataFetcher::fetch`]) is owned by the surrounding application;
//! it is described here so both halves agree on request and page shapes.

use crate::freshness::Tier;
use crate::types::constants::{FREE_ROW_LIMIT, PREMIUM_ROW_LIMIT};
use crate::types::{LiveError, Result};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::broadcast;

const DEFAULT_BUS_CAPACITY: usize = 64;

/// Portion of cached data an invalidation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Paginated stock lists
    Stocks,
    /// Everything cached
    All,
}

impl CacheScope {
    /// Whether invalidating `self` also invalidates `other`
    pub fn covers(self, other: CacheScope) -> bool {
        self == CacheScope::All || self == other
    }
}

/// Cache-bust signal. Implementations must not block; ordering relative to
/// in-flight fetches is not guaranteed.
pub trait Invalidate: Send + Sync {
    fn invalidate(&self, scope: CacheScope);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort order in `key:direction` form, e.g. `changePercent:desc`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl FromStr for SortSpec {
    type Err = LiveError;

    fn from_str(s: &str) -> Result<Self> {
        let (key, direction) = s
            .split_once(':')
            .ok_or_else(|| LiveError::Config(format!("sort spec '{}' is not key:direction", s)))?;
        if key.is_empty() {
            return Err(LiveError::Config(format!("sort spec '{}' has no key", s)));
        }
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => {
                return Err(LiveError::Config(format!(
                    "unknown sort direction '{}'",
                    other
                )));
            }
        };
        Ok(Self {
            key: key.to_string(),
            direction,
        })
    }
}

impl std::fmt::Display for SortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}:{}", self.key, direction)
    }
}

/// Page size per tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLimits {
    pub free: u32,
    pub premium: u32,
}

impl Default for RowLimits {
    fn default() -> Self {
        Self {
            free: FREE_ROW_LIMIT,
            premium: PREMIUM_ROW_LIMIT,
        }
    }
}

impl RowLimits {
    pub fn for_tier(&self, tier: Tier) -> u32 {
        if tier.is_premium() {
            self.premium
        } else {
            self.free
        }
    }
}

/// One paginated list request. Pages are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: u32,
    /// Rows per page
    pub limit: u32,
    pub filters: serde_json::Map<String, serde_json::Value>,
    pub sort: Option<SortSpec>,
    pub tier: Tier,
}

impl PageRequest {
    /// First page, sized by the default [`RowLimits`] for `tier`
    pub fn first(tier: Tier) -> Self {
        Self {
            page: 1,
            limit: RowLimits::default().for_tier(tier),
            filters: serde_json::Map::new(),
            sort: None,
            tier,
        }
    }

    pub fn with_limits(mut self, limits: RowLimits) -> Self {
        self.limit = limits.for_tier(self.tier);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.filters.insert(key.into(), value);
        self
    }

    /// Request for the page after `page`, if there is one
    pub fn next<T>(&self, page: &Page<T>) -> Option<Self> {
        page.next_page().map(|next| Self {
            page: next,
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn next_page(&self) -> Option<u32> {
        self.page.checked_add(1).filter(|_| self.has_more)
    }
}

/// Paginated source of list data that can also be told its cache is stale
pub trait DataFetcher: Invalidate {
    type Item: Send;

    fn fetch<'a>(&'a self, request: &'a PageRequest) -> BoxFuture<'a, Result<Page<Self::Item>>>;
}

/// Fan-out of invalidation signals to any number of listeners.
///
/// Sending never blocks and never fails: with no listeners the signal is
/// dropped, and slow listeners observe `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct InvalidationBus {
    tx: broadcast::Sender<CacheScope>,
}

impl InvalidationBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheScope> {
        self.tx.subscribe()
    }
}

impl Default for InvalidationBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl Invalidate for InvalidationBus {
    fn invalidate(&self, scope: CacheScope) {
        match self.tx.send(scope) {
            Ok(listeners) => {
                tracing::debug!("Invalidated {:?} for {} listener(s)", scope, listeners)
            }
            Err(_) => tracing::trace!("Invalidated {:?} with no listeners", scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_coverage() {
        assert!(CacheScope::All.covers(CacheScope::Stocks));
        assert!(CacheScope::Stocks.covers(CacheScope::Stocks));
        assert!(!CacheScope::Stocks.covers(CacheScope::All));
    }

    #[test]
    fn test_sort_spec_parse() {
        let spec: SortSpec = "changePercent:desc".parse().unwrap();
        assert_eq!(spec.key, "changePercent");
        assert_eq!(spec.direction, SortDirection::Desc);
        assert_eq!(spec.to_string(), "changePercent:desc");

        assert!("price".parse::<SortSpec>().is_err());
        assert!(":asc".parse::<SortSpec>().is_err());
        assert!("price:up".parse::<SortSpec>().is_err());
    }

    #[test]
    fn test_page_request_follows_has_more() {
        let request = PageRequest::first(Tier::Free)
            .with_filter("search", json!("app"))
            .with_sort("price:asc".parse().unwrap());

        let more = Page {
            items: vec![1, 2],
            page: 1,
            has_more: true,
        };
        let next = request.next(&more).unwrap();
        assert_eq!(next.page, 2);
        assert_eq!(next.filters.get("search"), Some(&json!("app")));
        assert_eq!(next.sort, request.sort);

        let last = Page {
            items: vec![3],
            page: 2,
            has_more: false,
        };
        assert!(next.next(&last).is_none());
    }

    #[test]
    fn test_last_representable_page_has_no_successor() {
        let page = Page::<u8> {
            items: Vec::new(),
            page: u32::MAX,
            has_more: true,
        };
        assert_eq!(page.next_page(), None);
        assert!(PageRequest::first(Tier::Free).next(&page).is_none());
    }

    #[test]
    fn test_page_size_follows_tier() {
        assert_eq!(PageRequest::first(Tier::Free).limit, 25);
        assert_eq!(PageRequest::first(Tier::Premium).limit, 50);
        assert_eq!(PageRequest::first(Tier::Enterprise).limit, 50);

        let custom = RowLimits {
            free: 10,
            premium: 100,
        };
        assert_eq!(PageRequest::first(Tier::Free).with_limits(custom).limit, 10);

        let more = Page {
            items: vec![1],
            page: 1,
            has_more: true,
        };
        let next = PageRequest::first(Tier::Premium).next(&more).unwrap();
        assert_eq!(next.limit, 50);
    }

    #[tokio::test]
    async fn test_bus_delivers_to_subscribers() {
        let bus = InvalidationBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.invalidate(CacheScope::Stocks);

        assert_eq!(first.recv().await.unwrap(), CacheScope::Stocks);
        assert_eq!(second.recv().await.unwrap(), CacheScope::Stocks);
    }

    #[test]
    fn test_bus_without_listeners_drops_signal() {
        let bus = InvalidationBus::new(4);
        bus.invalidate(CacheScope::All);

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }
}
