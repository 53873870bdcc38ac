//! Agent message routing and domain registry
//!
//! Routes incoming agent requests of the form `"Domain.method"` to registered
//! domain handlers and serializes their responses.

use agent_types::{AgentError, AgentRequest, AgentResponse};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Trait that all domain handlers must implement
///
/// Each handler serves the methods of one domain (e.g. `HeapDiff`).
#[async_trait]
pub trait DomainHandler: Send + Sync {
    /// Returns the name of this domain
    fn name(&self) -> &str;

    /// Handle a method call for this domain
    ///
    /// # Arguments
    /// * `method` - The method name without the domain prefix
    /// * `params` - Optional parameters for the method
    async fn handle_method(&self, method: &str, params: Option<Value>)
        -> Result<Value, AgentError>;
}

/// Routes agent requests to the matching domain handler
pub struct ProtocolHandler {
    /// Registry of domain handlers, keyed by domain name
    domains: Arc<DashMap<String, Arc<dyn DomainHandler>>>,
}

impl ProtocolHandler {
    /// Create a new ProtocolHandler
    ///
    /// # Example
    /// ```
    /// use protocol_handler::ProtocolHandler;
    ///
    /// let handler = ProtocolHandler::new();
    /// assert!(handler.registered_domains().is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            domains: Arc::new(DashMap::new()),
        }
    }

    /// Register a domain handler, replacing any handler with the same name
    pub fn register_domain(&self, handler: Arc<dyn DomainHandler>) {
        let name = handler.name().to_string();
        debug!("Registering domain handler: {}", name);
        self.domains.insert(name, handler);
    }

    /// Names of all registered domains, sorted
    pub fn registered_domains(&self) -> Vec<String> {
        let mut names: Vec<String> = self.domains.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Handle an incoming JSON message and return the JSON response
    pub async fn handle_message(&self, message: &str) -> String {
        let request = match self.parse_request(message) {
            Ok(req) => req,
            Err(error) => return self.serialize_response(AgentResponse::failure(0, error)),
        };

        let response = match self.route_request(&request).await {
            Ok(result) => AgentResponse::success(request.id, result),
            Err(error) => AgentResponse::failure(request.id, error),
        };
        self.serialize_response(response)
    }

    /// Route an already-parsed request
    pub async fn route_request(&self, request: &AgentRequest) -> Result<Value, AgentError> {
        let (domain_name, method_name) = parse_method(&request.method)?;

        debug!(
            "Routing request {} to domain: {}, method: {}",
            request.id, domain_name, method_name
        );

        let handler = self
            .domains
            .get(domain_name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                warn!("Domain not found: {}", domain_name);
                AgentError::method_not_found(&request.method)
            })?;

        handler
            .handle_method(method_name, request.params.clone())
            .await
    }

    /// Parse JSON into a request, telling malformed JSON apart from a bad shape
    fn parse_request(&self, message: &str) -> Result<AgentRequest, AgentError> {
        let value: Value = serde_json::from_str(message).map_err(|e| {
            error!("Invalid JSON: {}", e);
            AgentError::parse_error()
        })?;

        serde_json::from_value::<AgentRequest>(value).map_err(|e| {
            error!("Invalid request structure: {}", e);
            AgentError::invalid_request()
        })
    }

    fn serialize_response(&self, response: AgentResponse) -> String {
        let id = response.id;
        serde_json::to_string(&response).unwrap_or_else(|e| {
            error!("Failed to serialize response: {}", e);
            format!(
                r#"{{"id":{},"error":{{"code":-32603,"message":"Internal error"}}}}"#,
                id
            )
        })
    }
}

impl Default for ProtocolHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Split `"Domain.method"` into its two halves
pub fn parse_method(method: &str) -> Result<(&str, &str), AgentError> {
    match method.split_once('.') {
        Some((domain, name)) if !domain.is_empty() && !name.is_empty() => Ok((domain, name)),
        _ => {
            warn!("Invalid method format (expected Domain.method): {}", method);
            Err(AgentError::invalid_request())
        }
    }
}
