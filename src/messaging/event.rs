use crate::fetcher::CacheScope;
use crate::types::constants::update_kinds;
use serde::{Deserialize, Serialize};

/// Type-safe update kinds carried by the envelope `type` tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateKind {
    /// Quote data changed; cached stock lists are stale
    StockUpdate,

    /// Market opened, closed or halted
    MarketStatus,

    /// News item for a tracked symbol
    News,

    /// Tag this client does not know about
    Other(String),
}

impl UpdateKind {
    /// Parse a tag into an UpdateKind
    pub fn from_str(s: &str) -> Self {
        match s {
            update_kinds::STOCK_UPDATE => Self::StockUpdate,
            update_kinds::MARKET_STATUS => Self::MarketStatus,
            update_kinds::NEWS => Self::News,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Convert kind to its wire tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::StockUpdate => update_kinds::STOCK_UPDATE,
            Self::MarketStatus => update_kinds::MARKET_STATUS,
            Self::News => update_kinds::NEWS,
            Self::Other(s) => s,
        }
    }

    /// Cache scope this kind of update makes stale, if any
    pub fn invalidates(&self) -> Option<CacheScope> {
        match self {
            Self::StockUpdate => Some(CacheScope::Stocks),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for UpdateKind {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for UpdateKind {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

impl From<UpdateKind> for String {
    fn from(kind: UpdateKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
