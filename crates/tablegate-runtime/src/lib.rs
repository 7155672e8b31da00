//! Tablegate runtime.
//!
//! - [`store`]: the [`Store`] trait every backend implements, plus the query
//!   types that cross it.
//! - [`translator`]: builds parameterized store calls from validated
//!   arguments.
//! - [`gateway`]: the [`ExecutionGateway`] pipeline shared by all transports.

pub mod error;
pub mod gateway;
pub mod result;
pub mod store;
pub mod translator;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::GatewayError;
pub use gateway::ExecutionGateway;
pub use result::ExecuteResult;
pub use store::{
    BoundQuery, CreateTableRequest, Dialect, QueryOutcome, QueryParameter, Row, Store, StoreError,
};
pub use translator::{OperationTranslator, Plan};
pub use value::{StoreValue, normalize_row};
