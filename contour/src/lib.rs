//! Declarative response shaping for REST API clients.
//!
//! The `contour` crate describes the shape an API response is expected to
//! have and turns loosely typed JSON into validated, coerced values. Shapes
//! are trees of [`Processor`]s built with a [`ShapeBuilder`]; endpoints
//! attach shapes to response scenarios and inherit settings such as base
//! URL, headers and authentication through a chain of [`ApiConfig`] layers.
//!
//! ## Features
//!
//! - **Shape trees**: primitives, booleans, dates and times, custom casts,
//!   nested hashes and arrays, with per-field pre/post filters and value maps
//! - **Precise errors**: every validation failure carries the path that
//!   failed (`items[1]->id`) and the offending input
//! - **Scenarios**: per-status response shapes selected by a pluggable
//!   [`ScenarioSelector`]
//! - **Layered configuration**: endpoint settings fall back to their API's
//!   settings, loadable from YAML or JSON
//! - **Async HTTP client**: built on `reqwest`, instrumented with `tracing`
//!
//! ## Example
//!
//! ```rust
//! use contour::{Path, ShapeBuilder, ShapedValue};
//! use serde_json::json;
//!
//! let shape = ShapeBuilder::new()
//!     .integer("id")
//!     .string("name")
//!     .array_of_values("tags")
//!     .build()
//!     .unwrap();
//!
//! let shaped = shape
//!     .execute(&json!({"id": "7", "name": "Ada", "tags": ["x"], "extra": 1}), &Path::root(), None)
//!     .unwrap();
//! assert_eq!(shaped.get("id"), Some(&ShapedValue::Integer(7)));
//! assert!(shaped.get("extra").is_none());
//! ```

pub mod api;
pub mod auth;
pub mod builder;
pub mod client;
pub mod config;
pub mod decode;
pub mod endpoint;
pub mod endpoint_id;
pub mod error;
pub mod filter;
pub mod library;
pub mod method;
pub mod path;
pub mod processor;
pub mod request;
pub mod scenario;
pub mod sink;
pub mod value;

// Re-exports for convenience
pub use api::Api;
pub use auth::{ApiAuthMethod, AuthStrategy};
pub use builder::{Defaults, FieldSpec, FieldType, ShapeBuilder};
pub use client::{ApiClient, ApiClientBuilder, ShapedResponse};
pub use config::{ApiConfig, ApiSettings};
pub use endpoint::{Endpoint, EndpointBuilder};
pub use endpoint_id::{EndpointId, EndpointIdError};
pub use error::{
    ApiError, AuthError, ClientError, ConfigError, RequestError, ValidationError,
};
pub use filter::{Postfilter, Prefilter, ValueMap};
pub use library::ShapeLibrary;
pub use method::RestMethod;
pub use path::Path;
pub use processor::{
    ArrayNode, BooleanOptions, HashNode, PrimitiveCast, Processor, ProcessorKind, TemporalKind,
    TemporalOptions, TypedCast,
};
pub use request::{PathTemplate, PreparedRequest};
pub use scenario::{
    Dispatched, DispatchedCollect, DispatchedInto, ResponseDispatcher, ScenarioLabel, ScenarioSelector,
    StatusScenarioSelector,
};
pub use sink::{FieldSink, MapSink, Materialize, MaterializeSink};
pub use value::{ShapedMap, ShapedValue};
