//! # tablegate-core
//!
//! Types shared by every Tablegate crate:
//!
//! - [`Identifier`]: a dataset, table or column name that passed the
//!   identifier whitelist. Only identifiers ever reach query text.
//! - [`ExecuteArgs`]: one structured data-manipulation request, validated when
//!   it is constructed.
//! - [`ParamValue`]: a literal destined for a bound query parameter, tagged with
//!   its kind so the store type can be inferred without guessing.
//! - [`config`]: the process configuration loaded once at startup.

pub mod args;
pub mod config;
pub mod error;
pub mod ident;
pub mod value;

pub use args::{DEFAULT_LIMIT, ExecuteArgs, FieldMode, FieldType, Operation, TableField};
pub use config::{
    AuthConfig, AuthMode, ConfigError, GuardrailsConfig, PolicyConfig, ServerConfig, StoreConfig,
    TablegateConfig,
};
pub use error::ValidationError;
pub use ident::{Identifier, MAX_IDENTIFIER_LEN, validate_identifier};
pub use value::{ParamType, ParamValue};
