//! Endpoint definition with type-state builder pattern.
//!
//! An [`Endpoint`] ties a method and path template to a parameter shape, a
//! set of response shapes keyed by scenario, and its own configuration layer.
//! The [`EndpointBuilder`] tracks the required id, method and path in its
//! type parameters, so `build` only exists once all three are set; everything
//! that can still be wrong (identifier syntax, template syntax, shapes) is
//! reported by `build` as a [`ConfigError`].

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::auth::AuthStrategy;
use crate::builder::ShapeBuilder;
use crate::config::ApiConfig;
use crate::endpoint_id::EndpointId;
use crate::error::{ApiError, ConfigError, RequestError, ValidationError};
use crate::method::RestMethod;
use crate::path::Path;
use crate::processor::Processor;
use crate::request::{PathTemplate, PreparedRequest};
use crate::scenario::{Dispatched, ResponseDispatcher, ScenarioLabel, ScenarioSelector};

/// Marker types for builder state tracking.
pub mod builder_state {
    /// Marker for a field that has not been set.
    #[derive(Debug)]
    pub struct Missing;
    /// Marker for a field that has been set.
    #[derive(Debug)]
    pub struct Present;
}

use builder_state::{Missing, Present};

/// A declared API endpoint.
///
/// ## Examples
///
/// ```rust
/// use contour::{Endpoint, RestMethod, ShapeBuilder};
/// use serde_json::json;
///
/// let get_user = Endpoint::builder()
///     .id("get_user")
///     .method(RestMethod::Get)
///     .path("/users/{id}")
///     .base_url("https://api.example.com")
///     .params(ShapeBuilder::new().integer("id"))
///     .response(ShapeBuilder::new().integer("id").string("name"))
///     .build()
///     .unwrap();
///
/// let request = get_user.prepare(&json!({"id": "42"})).unwrap();
/// assert_eq!(request.url().as_str(), "https://api.example.com/users/42");
///
/// let shaped = get_user.process(200, &json!({"id": 42, "name": "Ada", "admin": true})).unwrap();
/// assert_eq!(shaped.value.into_json(), json!({"id": 42, "name": "Ada"}));
/// ```
#[derive(Debug, Clone)]
pub struct Endpoint {
    id: EndpointId,
    method: RestMethod,
    template: PathTemplate,
    description: Option<String>,
    params: Option<Arc<Processor>>,
    config: ApiConfig,
}

impl Endpoint {
    /// Creates a new endpoint builder.
    pub fn builder() -> EndpointBuilder<Missing, Missing, Missing> {
        EndpointBuilder::new()
    }

    /// The endpoint's identifier.
    pub fn id(&self) -> &EndpointId {
        &self.id
    }

    /// The request method.
    pub fn method(&self) -> RestMethod {
        self.method
    }

    /// The path template as written.
    pub fn path(&self) -> &str {
        self.template.as_str()
    }

    /// Placeholder names of the path template, in order.
    pub fn path_params(&self) -> Vec<&str> {
        self.template.params().collect()
    }

    /// The optional description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The endpoint's configuration layer (its parents are reachable from it).
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The parameter shape, if one was declared.
    pub fn params_shape(&self) -> Option<&Arc<Processor>> {
        self.params.as_ref()
    }

    /// Validates `params` and builds the request.
    ///
    /// `params` must be an object, or null when the endpoint takes none. When a
    /// parameter shape is declared the parameters are run through it first, so
    /// renames, casts and defaults apply to what is sent.
    ///
    /// ## Errors
    ///
    /// - [`ApiError::Request`] for non-object parameters and unfillable paths
    /// - [`ApiError::Validation`] when the parameters do not match their shape
    /// - [`ApiError::Config`] when no base URL is configured along the chain
    pub fn prepare(&self, params: &Value) -> Result<PreparedRequest, ApiError> {
        let raw = match params {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => params.clone(),
            _ => return Err(RequestError::ParamsNotObject.into()),
        };

        let checked = match &self.params {
            Some(shape) => shape.execute(&raw, &Path::root(), None)?.into_json(),
            None => raw,
        };
        let Value::Object(values) = checked else {
            return Err(RequestError::ParamsNotObject.into());
        };

        let base_url = self
            .config
            .base_url()
            .ok_or_else(|| ConfigError::missing_field("base_url"))?;
        Ok(PreparedRequest::build(
            self.method,
            base_url,
            &self.template,
            values,
        )?)
    }

    /// Runs a decoded response body through the scenario pipeline.
    ///
    /// ## Errors
    ///
    /// Returns the first [`ValidationError`] raised by the selected tree.
    pub fn process(&self, status: u16, body: &Value) -> Result<Dispatched, ValidationError> {
        ResponseDispatcher::dispatch(&self.config, status, body)
    }
}

/// Type-state builder for [`Endpoint`].
///
/// ## Type Parameters
///
/// - `I`: state of the id (`Missing` or `Present`).
/// - `M`: state of the method.
/// - `P`: state of the path.
pub struct EndpointBuilder<I, M, P> {
    id: Option<String>,
    method: Option<RestMethod>,
    path: Option<String>,
    description: Option<String>,
    params: Option<ShapeBuilder>,
    scenarios: Vec<(ScenarioLabel, ShapeBuilder)>,
    base_url: Option<String>,
    layer: ApiConfig,
    _state: PhantomData<(I, M, P)>,
}

impl EndpointBuilder<Missing, Missing, Missing> {
    /// Creates a builder with nothing set.
    pub fn new() -> Self {
        Self {
            id: None,
            method: None,
            path: None,
            description: None,
            params: None,
            scenarios: Vec::new(),
            base_url: None,
            layer: ApiConfig::new(),
            _state: PhantomData,
        }
    }
}

impl Default for EndpointBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, M, P> EndpointBuilder<I, M, P> {
    fn transition<I2, M2, P2>(self) -> EndpointBuilder<I2, M2, P2> {
        EndpointBuilder {
            id: self.id,
            method: self.method,
            path: self.path,
            description: self.description,
            params: self.params,
            scenarios: self.scenarios,
            base_url: self.base_url,
            layer: self.layer,
            _state: PhantomData,
        }
    }

    /// Sets a description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares the parameter shape.
    #[must_use]
    pub fn params(mut self, shape: ShapeBuilder) -> Self {
        self.params = Some(shape);
        self
    }

    /// Declares the `default` response shape.
    #[must_use]
    pub fn response(self, shape: ShapeBuilder) -> Self {
        self.scenario(ScenarioLabel::DEFAULT, shape)
    }

    /// Declares the response shape for a scenario such as `http_404`.
    #[must_use]
    pub fn scenario(mut self, label: impl Into<ScenarioLabel>, shape: ShapeBuilder) -> Self {
        self.scenarios.push((label.into(), shape));
        self
    }

    /// Inherits settings and scenarios from `parent`.
    #[must_use]
    pub fn parent(mut self, parent: Arc<ApiConfig>) -> Self {
        self.layer = self.layer.with_parent(parent);
        self
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.layer = self.layer.with_timeout(timeout);
        self
    }

    /// Adds a header for this endpoint.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.layer = self.layer.with_header(name, value);
        self
    }

    /// Overrides authentication.
    #[must_use]
    pub fn auth(mut self, auth: AuthStrategy) -> Self {
        self.layer = self.layer.with_auth(auth);
        self
    }

    /// Overrides the scenario selection policy.
    #[must_use]
    pub fn selector(mut self, selector: impl ScenarioSelector + 'static) -> Self {
        self.layer = self.layer.with_selector(selector);
        self
    }

    /// Overrides response key normalization.
    #[must_use]
    pub fn normalize_keys(mut self, normalize: bool) -> Self {
        self.layer = self.layer.with_normalize_keys(normalize);
        self
    }
}

impl<M, P> EndpointBuilder<Missing, M, P> {
    /// Sets the endpoint id.
    pub fn id(mut self, id: impl Into<String>) -> EndpointBuilder<Present, M, P> {
        self.id = Some(id.into());
        self.transition()
    }
}

impl<I, P> EndpointBuilder<I, Missing, P> {
    /// Sets the request method.
    pub fn method(mut self, method: RestMethod) -> EndpointBuilder<I, Present, P> {
        self.method = Some(method);
        self.transition()
    }
}

impl<I, M> EndpointBuilder<I, M, Missing> {
    /// Sets the path template; placeholders are written `{name}`.
    pub fn path(mut self, path: impl Into<String>) -> EndpointBuilder<I, M, Present> {
        self.path = Some(path.into());
        self.transition()
    }
}

impl EndpointBuilder<Present, Present, Present> {
    /// Builds the endpoint.
    ///
    /// ## Errors
    ///
    /// Returns a [`ConfigError`] for an invalid id, path template or base URL,
    /// and for any shape that fails to build.
    pub fn build(self) -> Result<Endpoint, ConfigError> {
        let id = EndpointId::new(self.id.ok_or_else(|| ConfigError::missing_field("id"))?)?;
        let method = self
            .method
            .ok_or_else(|| ConfigError::missing_field("method"))?;
        let path = self.path.ok_or_else(|| ConfigError::missing_field("path"))?;
        let template = PathTemplate::parse(&path)?;

        let params = self
            .params
            .map(|shape| shape.build().map(Arc::new))
            .transpose()?;

        let mut config = self.layer;
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url)?;
        }
        for (label, shape) in self.scenarios {
            config = config.with_scenario(label, shape.build()?);
        }

        Ok(Endpoint {
            id,
            method,
            template,
            description: self.description,
            params,
            config,
        })
    }
}
