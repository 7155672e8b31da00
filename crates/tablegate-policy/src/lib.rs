//! Tablegate access-control policy.
//!
//! A [`PolicyDocument`] maps principals (plus a `default` fallback) to a
//! [`RuleSet`]: the operations a principal may run and the tables it may touch
//! in each dataset. The document is loaded once at startup and wrapped in a
//! [`PolicyEngine`], which answers authorization questions without locking.
//!
//! ```json
//! {
//!   "default": { "operations": ["SELECT"], "datasets": { "public": ["*"] } },
//!   "principals": {
//!     "etl@example.com": {
//!       "operations": ["SELECT", "INSERT", "UPDATE"],
//!       "datasets": { "sales": ["orders", "order_items"] }
//!     }
//!   }
//! }
//! ```

pub mod document;
pub mod engine;
pub mod error;

pub use document::{PolicyDocument, RuleSet, WILDCARD};
pub use engine::{PolicyEngine, normalize_principal};
pub use error::{DenialKind, PolicyDenial, PolicyLoadError};
