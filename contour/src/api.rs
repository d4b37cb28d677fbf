//! A named collection of endpoints sharing one configuration layer.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::ApiConfig;
use crate::endpoint::builder_state::Missing;
use crate::endpoint::{Endpoint, EndpointBuilder};
use crate::endpoint_id::EndpointId;
use crate::error::ConfigError;

/// An API: its shared settings and the endpoints defined against them.
///
/// ## Examples
///
/// ```rust
/// use contour::{Api, ApiConfig, RestMethod, ShapeBuilder};
///
/// let config = ApiConfig::new().with_base_url("https://api.example.com").unwrap();
/// let mut api = Api::new("example", config);
///
/// let list_users = api
///     .endpoint()
///     .id("list_users")
///     .method(RestMethod::Get)
///     .path("/users")
///     .response(ShapeBuilder::new().top_level_array(true).integer("id"))
///     .build()
///     .unwrap();
/// api.register(list_users).unwrap();
///
/// assert!(api.get("list_users").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Api {
    name: String,
    config: Arc<ApiConfig>,
    endpoints: IndexMap<EndpointId, Arc<Endpoint>>,
}

impl Api {
    /// Creates an API with no endpoints.
    pub fn new(name: impl Into<String>, config: ApiConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            endpoints: IndexMap::new(),
        }
    }

    /// The API name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The shared configuration layer.
    pub fn config(&self) -> &Arc<ApiConfig> {
        &self.config
    }

    /// An endpoint builder whose configuration inherits from this API.
    pub fn endpoint(&self) -> EndpointBuilder<Missing, Missing, Missing> {
        Endpoint::builder().parent(Arc::clone(&self.config))
    }

    /// Adds an endpoint.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::DuplicateEndpoint`] when the id is taken.
    pub fn register(&mut self, endpoint: Endpoint) -> Result<Arc<Endpoint>, ConfigError> {
        if self.endpoints.contains_key(endpoint.id()) {
            return Err(ConfigError::DuplicateEndpoint {
                id: endpoint.id().to_string(),
            });
        }
        let endpoint = Arc::new(endpoint);
        self.endpoints
            .insert(endpoint.id().clone(), Arc::clone(&endpoint));
        Ok(endpoint)
    }

    /// Looks an endpoint up by id.
    pub fn get(&self, id: &str) -> Option<&Arc<Endpoint>> {
        self.endpoints.get(id)
    }

    /// Endpoints in registration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        self.endpoints.values()
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` when no endpoint is registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::RestMethod;
    use serde_json::json;

    fn api() -> Api {
        Api::new(
            "example",
            ApiConfig::new()
                .with_base_url("https://api.example.com/v3")
                .unwrap(),
        )
    }

    #[test]
    fn test_endpoints_inherit_api_config() {
        let mut api = api();
        let endpoint = api
            .endpoint()
            .id("get_order")
            .method(RestMethod::Get)
            .path("/orders/{id}")
            .build()
            .unwrap();
        let endpoint = api.register(endpoint).unwrap();
        let request = endpoint.prepare(&json!({"id": 5})).unwrap();
        assert_eq!(request.url().as_str(), "https://api.example.com/v3/orders/5");
    }

    #[test]
    fn test_duplicate_endpoint_rejected() {
        let mut registry = api();
        let ping = || {
            api()
                .endpoint()
                .id("ping")
                .method(RestMethod::Get)
                .path("/ping")
                .build()
                .unwrap()
        };
        registry.register(ping()).unwrap();
        let err = registry.register(ping()).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateEndpoint { id } if id == "ping"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registration_order() {
        let mut api = api();
        for id in ["b_second", "a_first"] {
            let endpoint = api
                .endpoint()
                .id(id)
                .method(RestMethod::Get)
                .path("/x")
                .build()
                .unwrap();
            api.register(endpoint).unwrap();
        }
        let ids: Vec<&str> = api.endpoints().map(|e| e.id().as_str()).collect();
        assert_eq!(ids, vec!["b_second", "a_first"]);
        assert!(api.get("missing").is_none());
    }
}
