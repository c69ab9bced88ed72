//! Claims Adjudicator HTTP Service
//!
//! Exposes an [`Adjudicator`](crate::adjudicator::Adjudicator) behind the
//! fixed API contract.
//!
//! ## Endpoints (relative to the mount prefix)
//!
//! - `GET /` - List the concepts claims can be made about
//! - `PUT /` - Verify a batch of keyed claim-sets
//! - `POST /` - Same as `PUT /`
//!
//! [`create_app`] adds, at the root:
//!
//! - `GET /health` - Service health and contract version
//! - `GET /health/live` - Liveness probe

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

pub use config::{ConfigError, LogFormat, ServiceConfig};
pub use error::{contract_error_handler, ApiError};
pub use middleware::{metrics_middleware, record_claims_metrics, request_logging_middleware};
pub use routes::{build_middleware, create_app, mount, AppState, ContractJson};
