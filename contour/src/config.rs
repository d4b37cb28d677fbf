//! Hierarchical configuration.
//!
//! Settings live in layers. An endpoint's layer points at its API's layer,
//! which may point at a shared organisation-wide layer, and so on. Every
//! getter walks the chain from the nearest layer outwards and returns the
//! first value found; headers and scenarios are merged with nearer layers
//! winning.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use url::Url;

use crate::auth::AuthStrategy;
use crate::error::ConfigError;
use crate::processor::Processor;
use crate::scenario::{ScenarioLabel, ScenarioSelector, StatusScenarioSelector};

static DEFAULT_SELECTOR: StatusScenarioSelector = StatusScenarioSelector;

/// One configuration layer.
///
/// ## Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use contour::ApiConfig;
///
/// let api = Arc::new(
///     ApiConfig::new()
///         .with_base_url("https://api.example.com/v1")
///         .unwrap()
///         .with_timeout(Duration::from_secs(10))
///         .with_header("accept", "application/json"),
/// );
/// let endpoint = ApiConfig::child_of(&api).with_header("accept", "text/csv");
///
/// assert_eq!(endpoint.base_url().unwrap().as_str(), "https://api.example.com/v1");
/// assert_eq!(endpoint.timeout(), Some(Duration::from_secs(10)));
/// assert_eq!(endpoint.headers()["accept"], "text/csv");
/// ```
#[derive(Clone, Default)]
pub struct ApiConfig {
    parent: Option<Arc<ApiConfig>>,
    base_url: Option<Url>,
    timeout: Option<Duration>,
    headers: IndexMap<String, String>,
    auth: Option<AuthStrategy>,
    selector: Option<Arc<dyn ScenarioSelector>>,
    normalize_keys: Option<bool>,
    scenarios: IndexMap<ScenarioLabel, Arc<Processor>>,
}

impl ApiConfig {
    /// An empty root layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty layer inheriting from `parent`.
    pub fn child_of(parent: &Arc<ApiConfig>) -> Self {
        Self {
            parent: Some(Arc::clone(parent)),
            ..Self::default()
        }
    }

    /// Loads a root layer from a YAML document.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and
    /// [`ConfigError::InvalidUrl`] for a bad `base_url`.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str::<ApiSettings>(yaml)?.into_config()
    }

    /// Loads a root layer from a JSON document.
    ///
    /// ## Errors
    ///
    /// Same as [`ApiConfig::from_yaml_str`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<ApiSettings>(json)?.into_config()
    }

    /// Sets the parent layer.
    #[must_use]
    pub fn with_parent(mut self, parent: Arc<ApiConfig>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Sets the base URL.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when `url` does not parse.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.base_url = Some(Url::parse(url)?);
        Ok(self)
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a header; it overrides a header of the same name in parent layers.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the authentication strategy.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthStrategy) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Replaces the scenario selection policy.
    #[must_use]
    pub fn with_selector(mut self, selector: impl ScenarioSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    /// Sets whether response keys are converted to snake_case before shaping.
    #[must_use]
    pub fn with_normalize_keys(mut self, normalize: bool) -> Self {
        self.normalize_keys = Some(normalize);
        self
    }

    /// Registers the response tree for a scenario.
    #[must_use]
    pub fn with_scenario(
        mut self,
        label: impl Into<ScenarioLabel>,
        tree: impl Into<Arc<Processor>>,
    ) -> Self {
        self.scenarios.insert(label.into(), tree.into());
        self
    }

    /// The parent layer.
    pub fn parent(&self) -> Option<&Arc<ApiConfig>> {
        self.parent.as_ref()
    }

    /// Layers from this one outwards.
    pub fn layers(&self) -> impl Iterator<Item = &ApiConfig> {
        std::iter::successors(Some(self), |layer| layer.parent.as_deref())
    }

    /// The first value `get` finds, searching from this layer outwards.
    pub fn lookup<'a, T>(&'a self, get: impl Fn(&'a ApiConfig) -> Option<T>) -> Option<T> {
        self.layers().find_map(get)
    }

    /// The nearest base URL.
    pub fn base_url(&self) -> Option<&Url> {
        self.lookup(|layer| layer.base_url.as_ref())
    }

    /// The nearest timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.lookup(|layer| layer.timeout)
    }

    /// The nearest authentication strategy.
    pub fn auth(&self) -> Option<&AuthStrategy> {
        self.lookup(|layer| layer.auth.as_ref())
    }

    /// Whether response keys are normalized; `false` unless a layer enables it.
    pub fn normalize_keys(&self) -> bool {
        self.lookup(|layer| layer.normalize_keys).unwrap_or(false)
    }

    /// The nearest selector, or [`StatusScenarioSelector`].
    pub fn selector(&self) -> &dyn ScenarioSelector {
        self.lookup(|layer| layer.selector.as_deref())
            .unwrap_or(&DEFAULT_SELECTOR)
    }

    /// Headers of every layer merged; nearer layers override outer ones.
    pub fn headers(&self) -> IndexMap<String, String> {
        let layers: Vec<&ApiConfig> = self.layers().collect();
        let mut merged = IndexMap::new();
        for layer in layers.into_iter().rev() {
            for (name, value) in &layer.headers {
                merged.insert(name.clone(), value.clone());
            }
        }
        merged
    }

    /// The tree for `label`, searching from this layer outwards.
    pub fn scenario(&self, label: &ScenarioLabel) -> Option<&Arc<Processor>> {
        self.lookup(|layer| layer.scenarios.get(label))
    }

    /// Every scenario label declared along the chain, nearest first, without repeats.
    pub fn scenario_labels(&self) -> Vec<ScenarioLabel> {
        let mut labels: Vec<ScenarioLabel> = Vec::new();
        for label in self.layers().flat_map(|layer| layer.scenarios.keys()) {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
        labels
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("auth", &self.auth)
            .field("custom_selector", &self.selector.is_some())
            .field("normalize_keys", &self.normalize_keys)
            .field("scenarios", &self.scenarios.keys().collect::<Vec<_>>())
            .field("parent", &self.parent)
            .finish()
    }
}

/// The serializable part of an API-level layer.
///
/// Response shapes and selectors are code, so they are attached to the
/// resulting [`ApiConfig`] afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    /// Base URL all endpoint paths are appended to.
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Headers sent with every request.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Authentication strategy.
    pub auth: Option<AuthStrategy>,
    /// Convert response keys to snake_case.
    pub normalize_keys: Option<bool>,
}

impl ApiSettings {
    /// Converts the settings into a root configuration layer.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] for a bad `base_url`.
    pub fn into_config(self) -> Result<ApiConfig, ConfigError> {
        let mut config = ApiConfig::new();
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url)?;
        }
        config.timeout = self.timeout_secs.map(Duration::from_secs);
        for (name, value) in self.headers {
            config = config.with_header(name, value);
        }
        config.auth = self.auth;
        config.normalize_keys = self.normalize_keys;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ApiAuthMethod;
    use crate::builder::ShapeBuilder;

    #[test]
    fn test_getters_walk_the_chain() {
        let root = Arc::new(
            ApiConfig::new()
                .with_base_url("https://example.com")
                .unwrap()
                .with_normalize_keys(true),
        );
        let middle = Arc::new(ApiConfig::child_of(&root).with_timeout(Duration::from_secs(5)));
        let leaf = ApiConfig::child_of(&middle).with_timeout(Duration::from_secs(1));

        assert_eq!(leaf.base_url().unwrap().host_str(), Some("example.com"));
        assert_eq!(leaf.timeout(), Some(Duration::from_secs(1)));
        assert!(leaf.normalize_keys());
        assert_eq!(leaf.layers().count(), 3);
        assert!(leaf.auth().is_none());
    }

    #[test]
    fn test_headers_merge_with_child_override() {
        let root = Arc::new(
            ApiConfig::new()
                .with_header("X-Client", "contour")
                .with_header("Accept", "application/json"),
        );
        let leaf = ApiConfig::child_of(&root).with_header("accept", "text/plain");
        let headers = leaf.headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["x-client"], "contour");
        assert_eq!(headers["accept"], "text/plain");
    }

    #[test]
    fn test_scenario_labels_cover_chain_without_repeats() {
        let tree = Arc::new(ShapeBuilder::new().string("a").build().unwrap());
        let root = Arc::new(
            ApiConfig::new()
                .with_scenario("http_4xx", Arc::clone(&tree))
                .with_scenario(ScenarioLabel::DEFAULT, Arc::clone(&tree)),
        );
        let leaf = ApiConfig::child_of(&root).with_scenario(ScenarioLabel::DEFAULT, tree);
        let labels: Vec<String> = leaf
            .scenario_labels()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(labels, vec!["default", "http_4xx"]);
        assert!(leaf.scenario(&ScenarioLabel::from("http_4xx")).is_some());
        assert!(leaf.scenario(&ScenarioLabel::from("http_5xx")).is_none());
    }

    #[test]
    fn test_from_yaml() {
        let config = ApiConfig::from_yaml_str(
            r"
base_url: https://api.example.com/v2
timeout_secs: 15
headers:
  User-Agent: contour-tests
auth:
  method: bearer_token
  env: [EXAMPLE_TOKEN]
normalize_keys: true
",
        )
        .unwrap();
        assert_eq!(config.base_url().unwrap().path(), "/v2");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.headers()["user-agent"], "contour-tests");
        assert_eq!(config.auth().unwrap().method(), &ApiAuthMethod::BearerToken);
        assert!(config.normalize_keys());
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            ApiConfig::from_json_str(r#"{"base_url": "not a url"}"#),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiConfig::from_json_str(r#"{"unknown": 1}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
