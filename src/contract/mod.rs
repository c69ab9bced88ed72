//! API contract enforcement.
//!
//! The middleware is bound to a fixed OpenAPI description (`api.json`,
//! embedded at compile time). [`ContractEnforcer`] reads the document once,
//! resolves which operation answers each method/path pair, and compiles the
//! referenced component schemas with the `jsonschema` crate.
//!
//! Request bodies that do not satisfy the contract produce a
//! [`ContractViolation`] listing every failure; the service turns it into a
//! 400 envelope.

use std::collections::HashMap;

use axum::http::Method;
use serde_json::{json, Value};

/// The fixed API description the middleware enforces.
pub const API_DESCRIPTION: &str = include_str!("api.json");

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Operations declared by the API description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List registered concepts.
    GetConcepts,
    /// Verify a batch of claim-sets.
    ValidateClaims,
}

impl Operation {
    /// The `operationId` used in the API description.
    pub fn operation_id(&self) -> &'static str {
        match self {
            Self::GetConcepts => "getConcepts",
            Self::ValidateClaims => "validateClaims",
        }
    }

    /// Look up an operation by `operationId`.
    ///
    /// `validateClaimsPost` is the POST alias of `validateClaims`.
    pub fn from_operation_id(id: &str) -> Option<Self> {
        match id {
            "getConcepts" => Some(Self::GetConcepts),
            "validateClaims" | "validateClaimsPost" => Some(Self::ValidateClaims),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.operation_id())
    }
}

/// Error building the enforcer from an API description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// The description is not usable.
    #[error("Invalid API description: {0}")]
    InvalidDocument(String),
    /// A `$ref` names a schema the description does not define.
    #[error("Unknown schema reference: {0}")]
    UnknownSchema(String),
    /// A referenced schema does not compile.
    #[error("Schema {name} does not compile: {message}")]
    InvalidSchema {
        /// Component schema name.
        name: String,
        /// Compiler message.
        message: String,
    },
}

/// A request that does not match the contract.
///
/// Carries one human readable message per violated field or rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("request violates the API contract: {}", .violations.join("; "))]
pub struct ContractViolation {
    /// Violations, in the order they were found.
    pub violations: Vec<String>,
}

impl ContractViolation {
    /// A violation with a single message.
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            violations: vec![message.into()],
        }
    }
}

/// Declared operation bound to a method and path.
#[derive(Debug, Clone)]
struct RouteBinding {
    method: Method,
    path: String,
    operation: Operation,
    body_required: bool,
}

/// Compiled view of the API description.
#[derive(Debug)]
pub struct ContractEnforcer {
    title: String,
    version: String,
    routes: Vec<RouteBinding>,
    request_schemas: HashMap<Operation, jsonschema::Validator>,
    response_schemas: HashMap<Operation, jsonschema::Validator>,
}

impl ContractEnforcer {
    /// Build the enforcer for the embedded [`API_DESCRIPTION`].
    pub fn embedded() -> Result<Self, ContractError> {
        let document: Value = serde_json::from_str(API_DESCRIPTION)
            .map_err(|e| ContractError::InvalidDocument(e.to_string()))?;
        Self::from_document(&document)
    }

    /// Build an enforcer from an OpenAPI document.
    ///
    /// Only `get`, `put` and `post` operations whose `operationId` is a known
    /// [`Operation`] are bound; everything else in the document is ignored.
    pub fn from_document(document: &Value) -> Result<Self, ContractError> {
        let paths = document
            .get("paths")
            .and_then(Value::as_object)
            .ok_or_else(|| ContractError::InvalidDocument("missing paths".to_string()))?;
        let components = document.get("components").cloned().unwrap_or_else(|| json!({}));

        let mut routes = Vec::new();
        let mut request_schemas = HashMap::new();
        let mut response_schemas = HashMap::new();

        for (path, item) in paths {
            for (method_name, method) in [("get", Method::GET), ("put", Method::PUT), ("post", Method::POST)] {
                let Some(op) = item.get(method_name) else {
                    continue;
                };
                let Some(operation) = op
                    .get("operationId")
                    .and_then(Value::as_str)
                    .and_then(Operation::from_operation_id)
                else {
                    continue;
                };

                let request_body = op.get("requestBody");
                let body_required = request_body
                    .and_then(|b| b.get("required"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);

                if let Some(name) = request_body.and_then(json_schema_ref) {
                    if !request_schemas.contains_key(&operation) {
                        request_schemas.insert(operation, compile(name, &components)?);
                    }
                }
                if let Some(name) = op.pointer("/responses/200").and_then(json_schema_ref) {
                    if !response_schemas.contains_key(&operation) {
                        response_schemas.insert(operation, compile(name, &components)?);
                    }
                }

                routes.push(RouteBinding {
                    method,
                    path: path.clone(),
                    operation,
                    body_required,
                });
            }
        }

        if routes.is_empty() {
            return Err(ContractError::InvalidDocument("no known operations".to_string()));
        }

        Ok(Self {
            title: document
                .pointer("/info/title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            version: document
                .pointer("/info/version")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            routes,
            request_schemas,
            response_schemas,
        })
    }

    /// API title from the description.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// API version from the description.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Operation bound to `method` on `path`, if any.
    pub fn operation(&self, method: &Method, path: &str) -> Option<Operation> {
        self.routes
            .iter()
            .find(|r| r.method == *method && r.path == path)
            .map(|r| r.operation)
    }

    /// Every `(path, method, operation)` binding, in document order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Method, Operation)> + '_ {
        self.routes
            .iter()
            .map(|r| (r.path.as_str(), &r.method, r.operation))
    }

    /// Methods bound on `path`.
    pub fn methods(&self, path: &str) -> Vec<Method> {
        self.routes
            .iter()
            .filter(|r| r.path == path)
            .map(|r| r.method.clone())
            .collect()
    }

    /// Check a raw request body for `operation`.
    ///
    /// Returns the parsed body, or `None` when the body is empty and not
    /// required.
    pub fn validate_request(&self, operation: Operation, body: &[u8]) -> Result<Option<Value>, ContractViolation> {
        let required = self
            .routes
            .iter()
            .any(|r| r.operation == operation && r.body_required);

        if body.iter().all(u8::is_ascii_whitespace) {
            return if required {
                Err(ContractViolation::single("request body is required"))
            } else {
                Ok(None)
            };
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ContractViolation::single(format!("request body is not valid JSON: {}", e)))?;

        if let Some(validator) = self.request_schemas.get(&operation) {
            check(validator, &value)?;
        }
        Ok(Some(value))
    }

    /// Check a successful response body for `operation`.
    pub fn validate_response(&self, operation: Operation, body: &Value) -> Result<(), ContractViolation> {
        match self.response_schemas.get(&operation) {
            Some(validator) => check(validator, body),
            None => Ok(()),
        }
    }
}

/// Schema name referenced by `<node>.content."application/json".schema.$ref`.
fn json_schema_ref(node: &Value) -> Option<&str> {
    node.pointer("/content/application~1json/schema/$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX))
}

/// Compile a component schema, keeping the components alongside so local
/// `$ref`s resolve.
fn compile(name: &str, components: &Value) -> Result<jsonschema::Validator, ContractError> {
    if components.pointer(&format!("/schemas/{}", name)).is_none() {
        return Err(ContractError::UnknownSchema(name.to_string()));
    }

    let schema = json!({
        "$ref": format!("{}{}", SCHEMA_REF_PREFIX, name),
        "components": components,
    });

    jsonschema::options()
        .build(&schema)
        .map_err(|e| ContractError::InvalidSchema {
            name: name.to_string(),
            message: e.to_string(),
        })
}

fn check(validator: &jsonschema::Validator, value: &Value) -> Result<(), ContractViolation> {
    let violations: Vec<String> = validator
        .iter_errors(value)
        .map(|error| {
            let path = error.instance_path.to_string();
            if path.is_empty() {
                format!("$: {}", error)
            } else {
                format!("${}: {}", path, error)
            }
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ContractViolation { violations })
    }
}
