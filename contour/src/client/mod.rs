//! HTTP client module.
//!
//! This module provides the async HTTP client that executes endpoints: it
//! prepares the request from the endpoint definition, applies configured
//! headers and authentication, and shapes the response through the
//! endpoint's scenario pipeline, all inside an `api_request` tracing span.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use contour::{ApiAuthMethod, ApiClient, ApiConfig, AuthStrategy, Endpoint, RestMethod, ShapeBuilder};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(
//!     ApiConfig::new()
//!         .with_base_url("https://api.example.com")?
//!         .with_auth(AuthStrategy::from_env(ApiAuthMethod::BearerToken, ["EXAMPLE_TOKEN"])),
//! );
//!
//! let list_orders = Endpoint::builder()
//!     .id("list_orders")
//!     .method(RestMethod::Get)
//!     .path("/orders")
//!     .parent(api)
//!     .response(ShapeBuilder::new().top_level_array(true).integer("id").float("total"))
//!     .build()?;
//!
//! let client = ApiClient::new()?;
//! let orders = client.execute(&list_orders, &json!({"status": "open"})).await?;
//! # Ok(())
//! # }
//! ```

mod executor;

pub use executor::{ApiClient, ApiClientBuilder, ShapedResponse};
