//! Axum routes for the claims middleware.
//!
//! The routes are not hard-coded: [`build_middleware`] walks the bindings of
//! the embedded API description and attaches the controller operation each
//! one names. Request bodies pass through [`ContractJson`] before a handler
//! sees them, so a contract violation short-circuits to the error stage.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, MethodFilter, MethodRouter},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::adjudicator::Adjudicator;
use crate::contract::{ContractEnforcer, ContractError, ContractViolation, Operation};
use crate::controller::{BatchSummary, ClaimsController, ClaimsResponse, ConceptListing};
use crate::types::{ClaimsRequest, Metadata, MetadataEnvelope};

use super::config::ServiceConfig;
use super::error::ApiError;
use super::middleware::{metrics_middleware, record_claims_metrics, request_logging_middleware};

/// Shared state of the claims routes.
#[derive(Clone)]
pub struct AppState {
    /// Controller over the injected adjudicator.
    pub controller: ClaimsController<dyn Adjudicator>,
    /// Compiled API contract.
    pub contract: Arc<ContractEnforcer>,
}

/// Service health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` when the service answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Version of the embedded API contract.
    pub api_version: String,
    /// Concepts the adjudicator exposed at startup.
    pub concept_count: usize,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

// ============================================================================
// Contract extractor
// ============================================================================

/// JSON body checked against the API contract before deserialization.
///
/// The operation is resolved from the request's method and path. Rejection
/// is an [`ApiError`], so violations are rendered by the error stage.
#[derive(Debug, Clone)]
pub struct ContractJson<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for ContractJson<T>
where
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let operation = state
            .contract
            .operation(&method, &path)
            .ok_or_else(|| ApiError::Internal(format!("no contract operation for {} {}", method, path)))?;

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ContractViolation::single(format!("request body could not be read: {}", e)))?;

        let value = state
            .contract
            .validate_request(operation, &body)?
            .ok_or_else(|| ContractViolation::single("request body is required"))?;

        serde_json::from_value(value)
            .map(ContractJson)
            .map_err(|e| ContractViolation::single(e.to_string()).into())
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// List the adjudicator's concepts.
async fn list_concepts_handler(State(state): State<AppState>) -> Json<ConceptListing> {
    let listing = state.controller.list_concepts();
    check_response(&state.contract, Operation::GetConcepts, &listing);
    Json(listing)
}

/// Verify a batch of claim-sets.
async fn validate_claims_handler(
    State(state): State<AppState>,
    ContractJson(request): ContractJson<ClaimsRequest>,
) -> Result<Json<ClaimsResponse>, ApiError> {
    let start = Instant::now();
    let response = state.controller.validate_claims(&request).await?;

    record_claims_metrics(BatchSummary::of(&response), start.elapsed());
    check_response(&state.contract, Operation::ValidateClaims, &response);

    Ok(Json(response))
}

/// Envelope for paths the contract does not define.
async fn not_found_handler() -> (StatusCode, Json<MetadataEnvelope>) {
    (StatusCode::NOT_FOUND, Json(Metadata::new(404).into()))
}

/// Log, but do not fail, when a response drifts from the contract.
fn check_response<T: Serialize>(contract: &ContractEnforcer, operation: Operation, body: &T) {
    let Ok(value) = serde_json::to_value(body) else {
        return;
    };
    if let Err(violation) = contract.validate_response(operation, &value) {
        warn!(operation = %operation, error = %violation, "Response does not match contract");
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Build the claims middleware: the contract's routes bound to a controller
/// over `adjudicator`, ready to be mounted at any prefix.
pub fn build_middleware<A: Adjudicator + 'static>(adjudicator: Arc<A>) -> Result<Router, ContractError> {
    let contract = Arc::new(ContractEnforcer::embedded()?);
    assemble(contract, adjudicator)
}

/// Bind the routes of an already compiled `contract`.
fn assemble(contract: Arc<ContractEnforcer>, adjudicator: Arc<dyn Adjudicator>) -> Result<Router, ContractError> {
    // Group bindings by path so each path gets a single method router
    let mut by_path: BTreeMap<String, Vec<(Method, Operation)>> = BTreeMap::new();
    for (path, method, operation) in contract.bindings() {
        by_path
            .entry(path.to_string())
            .or_default()
            .push((method.clone(), operation));
    }

    let mut router = Router::new();
    for (path, bindings) in by_path {
        let mut method_router: MethodRouter<AppState> = MethodRouter::new();
        for (method, operation) in bindings {
            let filter = MethodFilter::try_from(method.clone())
                .map_err(|_| ContractError::InvalidDocument(format!("unsupported method {}", method)))?;
            method_router = match operation {
                Operation::GetConcepts => method_router.on(filter, list_concepts_handler),
                Operation::ValidateClaims => method_router.on(filter, validate_claims_handler),
            };
        }
        router = router.route(&path, method_router);
    }

    let state = AppState {
        controller: ClaimsController::new(adjudicator),
        contract,
    };

    Ok(router
        .fallback(not_found_handler)
        .layer(middleware::from_fn(metrics_middleware))
        .with_state(state))
}

/// Mount the claims middleware under `prefix`.
///
/// Both `/claims` and `/claims/` reach the middleware root.
pub fn mount<A: Adjudicator + 'static>(prefix: &str, adjudicator: Arc<A>) -> Result<Router, ContractError> {
    Ok(nest_at(prefix, build_middleware(adjudicator)?))
}

fn nest_at(prefix: &str, claims: Router) -> Router {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return claims;
    }

    let root = claims.clone().map_request(to_middleware_root);
    Router::new()
        .nest(prefix, claims)
        .route_service(&format!("{}/", prefix), root)
}

/// Rewrite a request for `<prefix>/` to the middleware root, keeping the query.
fn to_middleware_root(mut request: Request) -> Request {
    let root = match request.uri().query() {
        Some(query) => format!("/?{}", query),
        None => "/".to_string(),
    };
    if let Ok(uri) = root.parse() {
        *request.uri_mut() = uri;
    }
    request
}

/// Create the full service: claims routes under the configured prefix,
/// health checks, request logging, tracing and CORS.
pub fn create_app<A: Adjudicator + 'static>(config: &ServiceConfig, adjudicator: Arc<A>) -> Result<Router, ContractError> {
    let concept_count = adjudicator.concepts().len();
    let contract = Arc::new(ContractEnforcer::embedded()?);
    let api_version = contract.version().to_string();
    let claims = nest_at(&config.prefix, assemble(contract, adjudicator)?);

    let health = move || {
        let api_version = api_version.clone();
        async move {
            Json(HealthResponse {
                status: "healthy".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                api_version,
                concept_count,
            })
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/health/live", get(liveness_handler))
        .merge(claims)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

/// Liveness probe endpoint.
async fn liveness_handler() -> impl IntoResponse {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}
