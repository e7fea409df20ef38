//! Query-evaluation kernel for a local file-content aggregator.
//!
//! Given a content blob and a compiled query, decides whether it matches:
//! literal or regex terms, fuzzy fallback on near-misses, and a NEAR operator
//! for word-proximity clauses. Every public entry point is synchronous and
//! total — the only error this crate ever returns is [`Error::InvalidRegex`],
//! raised once at term-compilation time; everything downstream of that
//! (timeouts, internal matcher failures, malformed input) degrades to
//! `false`/empty rather than propagating.
//!
//! [`Engine`] is the facade: construct one (or use [`Engine::default`]),
//! then call [`Engine::search`], [`Engine::evaluate_near`], or compile a
//! [`query::Node`] tree and run it with [`query::evaluate`].

pub mod cache;
pub mod cache_registry;
pub mod circuit_breaker;
pub mod config;
pub mod deadline;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod fuzzy;
pub mod memory_pool;
pub mod metrics;
pub mod near;
pub mod query;
pub mod term;
pub mod word_index;

pub use cache::{BoundedCache, CacheStats};
pub use cache_registry::{CacheInfo, CacheRegistry, NamedCache};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerStats};
pub use config::{CacheSpec, CacheSpecs, EngineConfig};
pub use deadline::Deadline;
pub use engine::{Engine, PersistedSnapshot};
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use fuzzy::{FuzzyOptions, FuzzyResult};
pub use memory_pool::{MemoryPool, MemoryPoolStats, PooledArray};
pub use metrics::{Metrics, MetricsSnapshot};
pub use near::NearEvaluator;
pub use query::{evaluate as evaluate_query, Node as QueryNode};
pub use term::{MatchOptions, Term};
pub use word_index::{boundaries, word_index_of, Span};
