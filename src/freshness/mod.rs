//! Data-freshness policy: poll on a tier-dependent timer while no push channel
//! is connected, rely on push invalidation while one is.

mod policy;
mod refresh;

pub use policy::{FreshnessDecision, FreshnessPolicy, Tier, decide};
pub use refresh::RefreshLoop;
