//! Concrete query handlers
//!
//! Handlers turn built models into effects on an external service. The HTTP
//! handlers are available with the `api-backend` feature.

#[cfg(feature = "api-backend")]
pub mod api;

#[cfg(feature = "api-backend")]
pub use api::{ApiClient, ApiDropHandler, ApiInsertHandler, ApiTableHandler, api_dispatcher};
