//! Scenario selection and response dispatch.
//!
//! An endpoint can declare a different response shape per *scenario*: one for
//! success, one for `404`, one for any `5xx`, and so on. After an exchange the
//! [`ResponseDispatcher`] asks the configured [`ScenarioSelector`] for a label,
//! finds the tree registered under it anywhere along the configuration chain
//! and runs it over the decoded body.

use std::borrow::Cow;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ValidationError;
use crate::path::Path;
use crate::sink::Materialize;
use crate::value::ShapedValue;

/// Name of a response scenario.
///
/// ## Examples
///
/// ```rust
/// use contour::ScenarioLabel;
///
/// assert_eq!(ScenarioLabel::for_status(404).as_str(), "http_404");
/// assert_eq!(ScenarioLabel::for_status_class(404).as_str(), "http_4xx");
/// assert!(ScenarioLabel::from("default").is_default());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub struct ScenarioLabel(Cow<'static, str>);

impl ScenarioLabel {
    /// The fallback scenario.
    pub const DEFAULT: Self = Self(Cow::Borrowed("default"));

    /// Creates a label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(Cow::Owned(label.into()))
    }

    /// The exact-status label, e.g. `http_404`.
    pub fn for_status(status: u16) -> Self {
        Self::new(format!("http_{status}"))
    }

    /// The status-class label, e.g. `http_4xx`.
    pub fn for_status_class(status: u16) -> Self {
        Self::new(format!("http_{}xx", status / 100))
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for [`ScenarioLabel::DEFAULT`].
    pub fn is_default(&self) -> bool {
        self.0 == "default"
    }
}

impl fmt::Display for ScenarioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScenarioLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for ScenarioLabel {
    fn from(label: String) -> Self {
        Self::new(label)
    }
}

/// Picks the scenario for a completed exchange.
///
/// Any `Fn(u16, &[ScenarioLabel]) -> ScenarioLabel` is a selector.
pub trait ScenarioSelector: Send + Sync {
    /// Chooses a label given the status and the labels declared along the
    /// configuration chain.
    fn select(&self, status: u16, available: &[ScenarioLabel]) -> ScenarioLabel;
}

impl<F> ScenarioSelector for F
where
    F: Fn(u16, &[ScenarioLabel]) -> ScenarioLabel + Send + Sync,
{
    fn select(&self, status: u16, available: &[ScenarioLabel]) -> ScenarioLabel {
        self(status, available)
    }
}

/// Exact status first, then status class, then `default`.
///
/// ## Examples
///
/// ```rust
/// use contour::{ScenarioLabel, ScenarioSelector, StatusScenarioSelector};
///
/// let available = [ScenarioLabel::from("http_4xx"), ScenarioLabel::DEFAULT];
/// assert_eq!(StatusScenarioSelector.select(403, &available).as_str(), "http_4xx");
/// assert_eq!(StatusScenarioSelector.select(200, &available), ScenarioLabel::DEFAULT);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusScenarioSelector;

impl ScenarioSelector for StatusScenarioSelector {
    fn select(&self, status: u16, available: &[ScenarioLabel]) -> ScenarioLabel {
        [
            ScenarioLabel::for_status(status),
            ScenarioLabel::for_status_class(status),
        ]
        .into_iter()
        .find(|candidate| available.contains(candidate))
        .unwrap_or(ScenarioLabel::DEFAULT)
    }
}

/// Outcome of dispatching one response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// The selected scenario.
    pub scenario: ScenarioLabel,
    /// The shaped value, or the raw body converted verbatim.
    pub value: ShapedValue,
    /// `false` when no tree was registered for the scenario.
    pub processed: bool,
}

/// Outcome of dispatching one response body into a typed object.
#[derive(Debug)]
pub struct DispatchedInto<T> {
    /// The selected scenario.
    pub scenario: ScenarioLabel,
    /// The materialized object; `None` when the body was blank.
    pub value: Option<T>,
    /// `false` when no tree was registered for the scenario.
    pub processed: bool,
}

/// Outcome of dispatching an array body into one typed object per element.
#[derive(Debug)]
pub struct DispatchedCollect<T> {
    /// The selected scenario.
    pub scenario: ScenarioLabel,
    /// One object per element, in input order.
    pub values: Vec<T>,
    /// `false` when no tree was registered for the scenario.
    pub processed: bool,
}

/// Runs the scenario pipeline over decoded bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDispatcher;

impl ResponseDispatcher {
    /// Selects the scenario for `status` and shapes `body` with its tree.
    ///
    /// When no tree is registered for the selected scenario the body is
    /// returned unprocessed.
    ///
    /// ## Errors
    ///
    /// Returns the first [`ValidationError`] raised by the tree.
    pub fn dispatch(
        config: &ApiConfig,
        status: u16,
        body: &Value,
    ) -> Result<Dispatched, ValidationError> {
        let scenario = Self::select(config, status);
        Self::shape(config, scenario, body)
    }

    /// Like [`ResponseDispatcher::dispatch`], but materializes into `T`.
    ///
    /// ## Errors
    ///
    /// Returns the first [`ValidationError`]; rejected assignments on an
    /// unprocessed body are reported as coercion failures at the root.
    pub fn dispatch_into<T: Materialize + Default>(
        config: &ApiConfig,
        status: u16,
        body: &Value,
    ) -> Result<DispatchedInto<T>, ValidationError> {
        let scenario = Self::select(config, status);
        Self::shape_into(config, scenario, body)
    }

    /// Like [`ResponseDispatcher::dispatch_into`], for array bodies: each
    /// element is materialized into its own `T`.
    ///
    /// ## Errors
    ///
    /// Returns the first [`ValidationError`]; element failures carry the
    /// element index in their path.
    pub fn dispatch_collect<T: Materialize + Default>(
        config: &ApiConfig,
        status: u16,
        body: &Value,
    ) -> Result<DispatchedCollect<T>, ValidationError> {
        let scenario = Self::select(config, status);
        Self::shape_collect(config, scenario, body)
    }

    /// Asks the configured selector for the scenario of `status`.
    pub fn select(config: &ApiConfig, status: u16) -> ScenarioLabel {
        let available = config.scenario_labels();
        let scenario = config.selector().select(status, &available);
        debug!(%scenario, status, "selected response scenario");
        scenario
    }

    /// Shapes `body` with the tree of an already selected scenario.
    ///
    /// ## Errors
    ///
    /// Returns the first [`ValidationError`] raised by the tree.
    pub fn shape(
        config: &ApiConfig,
        scenario: ScenarioLabel,
        body: &Value,
    ) -> Result<Dispatched, ValidationError> {
        let Some(tree) = config.scenario(&scenario) else {
            debug!(%scenario, "no response shape for scenario, returning raw body");
            return Ok(Dispatched {
                scenario,
                value: ShapedValue::from(body.clone()),
                processed: false,
            });
        };
        let value = tree.execute(body, &Path::root(), None)?;
        Ok(Dispatched {
            scenario,
            value,
            processed: true,
        })
    }

    /// Materializes `body` with the tree of an already selected scenario.
    ///
    /// ## Errors
    ///
    /// Same as [`ResponseDispatcher::dispatch_into`].
    pub fn shape_into<T: Materialize + Default>(
        config: &ApiConfig,
        scenario: ScenarioLabel,
        body: &Value,
    ) -> Result<DispatchedInto<T>, ValidationError> {
        let root = Path::root();
        let Some(tree) = config.scenario(&scenario) else {
            debug!(%scenario, "no response shape for scenario, materializing raw body");
            let value = ShapedValue::from(body.clone())
                .materialize::<T>()
                .map_err(|reason| ValidationError::CoercionFailure {
                    path: root.to_string(),
                    reason,
                    input: body.clone(),
                })?;
            return Ok(DispatchedInto {
                scenario,
                value,
                processed: false,
            });
        };

        let mut target = T::default();
        let assigned = tree.execute_into(body, &root, None, &mut target)?;
        Ok(DispatchedInto {
            scenario,
            value: assigned.then_some(target),
            processed: true,
        })
    }

    /// Materializes every element of an array body with the tree of an
    /// already selected scenario.
    ///
    /// ## Errors
    ///
    /// Same as [`ResponseDispatcher::dispatch_collect`].
    pub fn shape_collect<T: Materialize + Default>(
        config: &ApiConfig,
        scenario: ScenarioLabel,
        body: &Value,
    ) -> Result<DispatchedCollect<T>, ValidationError> {
        let root = Path::root();
        if let Some(tree) = config.scenario(&scenario) {
            let values = tree.execute_collect(body, &root)?;
            return Ok(DispatchedCollect {
                scenario,
                values,
                processed: true,
            });
        }

        debug!(%scenario, "no response shape for scenario, materializing raw elements");
        let items = match body {
            Value::Null => &[][..],
            Value::Array(items) => items.as_slice(),
            other => {
                return Err(ValidationError::TypeMismatch {
                    path: root.to_string(),
                    expected: "array",
                    input: other.clone(),
                });
            }
        };
        let values = items
            .iter()
            .enumerate()
            .map(|(index, element)| {
                ShapedValue::from(element.clone())
                    .materialize::<T>()
                    .map(Option::unwrap_or_default)
                    .map_err(|reason| ValidationError::CoercionFailure {
                        path: root.index(index).to_string(),
                        reason,
                        input: element.clone(),
                    })
            })
            .collect::<Result<Vec<T>, _>>()?;
        Ok(DispatchedCollect {
            scenario,
            values,
            processed: false,
        })
    }
}
