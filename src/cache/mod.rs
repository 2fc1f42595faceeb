//! # Cache Module
//!
//! Expiry-driven caching for upstream data that is expensive to fetch.
//!
//! Unlike a TTL cache, every provider here manages exactly **one** logical
//! resource (today's track, one audience's access token) and asks the value
//! itself whether it is still fresh.
//!
//! ## Providers
//!
//! - [`ExpiringCacheProvider`]: generic get-or-refresh over a
//!   [`DurableStore`](crate::storage::DurableStore) slot
//! - [`TokenCacheProvider`]: access tokens, with the expiry derived once from
//!   either `expires_in` or the token's own `exp` claim
//!
//! ## Guarantees
//!
//! - A value for which `is_expired` was true is never returned
//! - Concurrent callers share a single in-flight refresh
//! - Refresh failures surface as [`CacheError::RefreshFailed`]; nothing stale
//!   is served in their place
//! - A missing or unreadable stored value is just a miss
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trackmania_bot::cache::ExpiringCacheProvider;
//! use trackmania_bot::storage::MemoryStore;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = ExpiringCacheProvider::json(
//!     "motd.json",
//!     Arc::new(MemoryStore::new()),
//!     |motd: &String| motd.is_empty(),
//!     || async { Ok::<_, anyhow::Error>("hello".to_string()) },
//! );
//!
//! let motd = provider.get_data().await?;
//! # Ok(())
//! # }
//! ```

pub mod provider;
pub mod token;

pub use provider::{CacheError, ExpiringCacheProvider, Fetcher};
pub use token::{CachedToken, FetchedToken, OAuthToken, SignedToken, TokenCacheProvider};
