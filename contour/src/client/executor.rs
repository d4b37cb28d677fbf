//! Request execution with tracing instrumentation.
//!
//! This module provides the [`ApiClient`] struct, which sends a prepared
//! endpoint request, decodes the body and runs it through the endpoint's
//! scenario pipeline.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, instrument, Span};

use crate::decode::{decode_body, normalize_keys};
use crate::endpoint::Endpoint;
use crate::error::{ApiError, AuthError, ClientError, ConfigError};
use crate::scenario::{ResponseDispatcher, ScenarioLabel};
use crate::sink::Materialize;
use crate::value::ShapedValue;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A shaped response.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedResponse {
    /// HTTP status code.
    pub status: u16,
    /// The scenario whose shape was applied.
    pub scenario: ScenarioLabel,
    /// The shaped body, or the decoded body verbatim when `processed` is false.
    pub value: ShapedValue,
    /// `false` when the scenario had no declared shape.
    pub processed: bool,
}

/// A decoded exchange, before shaping.
struct Exchange {
    status: u16,
    scenario: ScenarioLabel,
    body: Value,
}

/// Builder for configuring an [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    timeout: Duration,
    default_headers: HeaderMap,
}

impl ApiClientBuilder {
    fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
        }
    }

    /// Sets the timeout used when the endpoint's configuration has none.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use contour::ApiClient;
    ///
    /// let client = ApiClient::builder()
    ///     .timeout(Duration::from_secs(60))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(client.timeout(), Duration::from_secs(60));
    /// ```
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if the header name or value is
    /// invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ApiError> {
        let name = name.as_ref();
        let header_name =
            HeaderName::try_from(name).map_err(|e| ConfigError::invalid_header(name, e))?;
        let header_value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| ConfigError::invalid_header(name, e))?;
        self.default_headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Builds the [`ApiClient`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(ClientError::Request)?;

        Ok(ApiClient {
            client,
            timeout: self.timeout,
        })
    }
}

/// Async HTTP client that executes endpoints.
///
/// The client holds only transport concerns (connection pool, fallback
/// timeout, global headers). Base URL, per-API headers, authentication and
/// response shapes come from each endpoint's configuration chain, so one
/// client serves any number of APIs.
///
/// ## Examples
///
/// ```rust,no_run
/// use contour::{ApiClient, Endpoint, RestMethod, ShapeBuilder};
/// use serde_json::json;
///
/// # async fn run() -> Result<(), contour::ApiError> {
/// let get_user = Endpoint::builder()
///     .id("get_user")
///     .method(RestMethod::Get)
///     .path("/users/{id}")
///     .base_url("https://api.example.com")
///     .response(ShapeBuilder::new().integer("id").string("name"))
///     .build()?;
///
/// let client = ApiClient::new()?;
/// let user = client.execute(&get_user, &json!({"id": 1})).await?;
/// println!("{:?}", user.value.get("name"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ApiClient {
    /// Creates a new builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Creates a client with default settings.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    /// The fallback timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Executes an endpoint and shapes the response.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - the parameters are invalid or the request cannot be built
    /// - the credential cannot be resolved
    /// - the request fails (network, timeout)
    /// - the server returns a non-success status and the endpoint declares no
    ///   scenario for it (401 and 403 become [`AuthError`]s)
    /// - the body does not match the scenario's shape
    pub async fn execute(
        &self,
        endpoint: &Endpoint,
        params: &Value,
    ) -> Result<ShapedResponse, ApiError> {
        let exchange = self.exchange(endpoint, params).await?;
        let dispatched =
            ResponseDispatcher::shape(endpoint.config(), exchange.scenario, &exchange.body)?;
        Ok(ShapedResponse {
            status: exchange.status,
            scenario: dispatched.scenario,
            value: dispatched.value,
            processed: dispatched.processed,
        })
    }

    /// Executes an endpoint and materializes the response into `T`.
    ///
    /// Returns `None` when the shaped body is blank.
    ///
    /// ## Errors
    ///
    /// Same as [`ApiClient::execute`]; rejected assignments are reported as
    /// coercion failures.
    pub async fn execute_into<T: Materialize + Default>(
        &self,
        endpoint: &Endpoint,
        params: &Value,
    ) -> Result<Option<T>, ApiError> {
        let exchange = self.exchange(endpoint, params).await?;
        let dispatched = ResponseDispatcher::shape_into::<T>(
            endpoint.config(),
            exchange.scenario,
            &exchange.body,
        )?;
        Ok(dispatched.value)
    }

    /// Executes an endpoint whose response is an array and materializes one
    /// `T` per element.
    ///
    /// ## Errors
    ///
    /// Same as [`ApiClient::execute`]; an element failure reports the
    /// element's index in its path.
    pub async fn execute_collect<T: Materialize + Default>(
        &self,
        endpoint: &Endpoint,
        params: &Value,
    ) -> Result<Vec<T>, ApiError> {
        let exchange = self.exchange(endpoint, params).await?;
        let dispatched = ResponseDispatcher::shape_collect::<T>(
            endpoint.config(),
            exchange.scenario,
            &exchange.body,
        )?;
        Ok(dispatched.values)
    }

    /// Sends the request, decodes the body and selects the scenario.
    #[instrument(
        name = "api_request",
        skip(self, endpoint, params),
        fields(
            api.endpoint = %endpoint.id(),
            http.method = tracing::field::Empty,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            api.scenario = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    async fn exchange(&self, endpoint: &Endpoint, params: &Value) -> Result<Exchange, ApiError> {
        let config = endpoint.config();
        let prepared = endpoint.prepare(params)?;

        Span::current().record("http.method", prepared.method().to_string().as_str());
        Span::current().record("http.url", prepared.url().as_str());

        let timeout = config.timeout().unwrap_or(self.timeout);
        let mut request = self
            .client
            .request(prepared.method().into(), prepared.url().clone())
            .timeout(timeout);
        for (name, value) in config.headers() {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = prepared.body() {
            request = request.json(body);
        }
        if let Some(auth) = config.auth() {
            request = auth.apply(request)?;
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout))?;

        let status = response.status();
        let status_code = status.as_u16();
        Span::current().record("http.status_code", status_code);

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout))?;

        let scenario = ResponseDispatcher::select(config, status_code);
        Span::current().record("api.scenario", scenario.as_str());

        if !status.is_success() && scenario.is_default() {
            let otel_status = if status.is_server_error() {
                "ERROR"
            } else {
                "UNSET"
            };
            Span::current().record("otel.status_code", otel_status);

            let message = if bytes.is_empty() {
                status.to_string()
            } else {
                String::from_utf8_lossy(&bytes).into_owned()
            };
            if status_code == 401 {
                return Err(AuthError::AuthenticationFailed { message }.into());
            }
            if status_code == 403 {
                return Err(AuthError::InsufficientPermissions {
                    operation: endpoint.id().to_string(),
                }
                .into());
            }
            return Err(ClientError::HttpStatus {
                status: status_code,
                message,
            }
            .into());
        }

        Span::current().record("otel.status_code", "OK");

        let mut body = decode_body(&bytes, content_type.as_deref())?;
        if config.normalize_keys() {
            body = normalize_keys(body);
        }
        debug!(bytes = bytes.len(), "decoded response body");

        Ok(Exchange {
            status: status_code,
            scenario,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::auth::{ApiAuthMethod, AuthStrategy};
    use crate::builder::ShapeBuilder;
    use crate::config::ApiConfig;
    use crate::error::ValidationError;
    use crate::method::RestMethod;

    fn user_endpoint(server: &MockServer) -> Endpoint {
        Endpoint::builder()
            .id("get_user")
            .method(RestMethod::Get)
            .path("/users/{id}")
            .base_url(server.uri())
            .response(ShapeBuilder::new().integer("id").string("name"))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_execute_shapes_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "1", "name": "Alice", "role": "admin"})),
            )
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        let response = client
            .execute(&user_endpoint(&mock_server), &json!({"id": 1}))
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert!(response.processed);
        assert_eq!(response.value.into_json(), json!({"id": 1, "name": "Alice"}));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(body_json(json!({"name": "Bob"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
            .mount(&mock_server)
            .await;

        let endpoint = Endpoint::builder()
            .id("create_user")
            .method(RestMethod::Post)
            .path("/users")
            .base_url(mock_server.uri())
            .params(ShapeBuilder::new().string("name"))
            .response(ShapeBuilder::new().integer("id"))
            .build()
            .unwrap();

        let client = ApiClient::new().unwrap();
        let response = client
            .execute(&endpoint, &json!({"name": "Bob"}))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.value.get("id"), Some(&ShapedValue::Integer(2)));
    }

    #[tokio::test]
    async fn test_config_headers_and_bearer_auth() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("x-team", "core"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&mock_server)
            .await;

        let api = Arc::new(
            ApiConfig::new()
                .with_base_url(&mock_server.uri())
                .unwrap()
                .with_header("X-Team", "core")
                .with_auth(AuthStrategy::with_secret(ApiAuthMethod::BearerToken, "test-token")),
        );
        let endpoint = Endpoint::builder()
            .id("me")
            .method(RestMethod::Get)
            .path("/me")
            .parent(api)
            .build()
            .unwrap();

        let client = ApiClient::new().unwrap();
        let response = client.execute(&endpoint, &Value::Null).await.unwrap();
        assert!(!response.processed);
        assert_eq!(response.value.into_json(), json!({"id": 1}));
    }

    #[tokio::test]
    async fn test_query_param_auth() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("key", "query-key"))
            .and(query_param("q", "rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&mock_server)
            .await;

        let endpoint = Endpoint::builder()
            .id("search")
            .method(RestMethod::Get)
            .path("/search")
            .base_url(mock_server.uri())
            .auth(AuthStrategy::with_secret(
                ApiAuthMethod::QueryParam("key".to_string()),
                "query-key",
            ))
            .build()
            .unwrap();

        let client = ApiClient::new().unwrap();
        let response = client.execute(&endpoint, &json!({"q": "rust"})).await.unwrap();
        assert_eq!(response.value, ShapedValue::Array(Vec::new()));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_sending() {
        let mock_server = MockServer::start().await;
        let endpoint = Endpoint::builder()
            .id("secret")
            .method(RestMethod::Get)
            .path("/secret")
            .base_url(mock_server.uri())
            .auth(AuthStrategy::from_env(
                ApiAuthMethod::BearerToken,
                ["CONTOUR_EXECUTOR_TEST_UNSET"],
            ))
            .build()
            .unwrap();

        let client = ApiClient::new().unwrap();
        let result = client.execute(&endpoint, &Value::Null).await;
        assert!(matches!(
            result,
            Err(ApiError::Auth(AuthError::MissingCredential { .. }))
        ));
    }

    #[tokio::test]
    async fn test_http_error_401() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        let result = client
            .execute(&user_endpoint(&mock_server), &json!({"id": 1}))
            .await;
        assert!(matches!(
            result,
            Err(ApiError::Auth(AuthError::AuthenticationFailed { message })) if message == "Invalid token"
        ));
    }

    #[tokio::test]
    async fn test_http_error_403() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        let result = client
            .execute(&user_endpoint(&mock_server), &json!({"id": 1}))
            .await;
        assert!(matches!(
            result,
            Err(ApiError::Auth(AuthError::InsufficientPermissions { operation })) if operation == "get_user"
        ));
    }

    #[tokio::test]
    async fn test_http_error_500() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        let result = client
            .execute(&user_endpoint(&mock_server), &json!({"id": 1}))
            .await;
        assert!(matches!(
            result,
            Err(ApiError::Client(ClientError::HttpStatus { status: 500, .. }))
        ));
    }

    #[tokio::test]
    async fn test_declared_error_scenario_is_shaped() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/404"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"errorCode": "NOT_FOUND", "detail": "no user"})),
            )
            .mount(&mock_server)
            .await;

        let endpoint = Endpoint::builder()
            .id("get_user")
            .method(RestMethod::Get)
            .path("/users/{id}")
            .base_url(mock_server.uri())
            .normalize_keys(true)
            .response(ShapeBuilder::new().integer("id"))
            .scenario("http_4xx", ShapeBuilder::new().symbol("error_code"))
            .build()
            .unwrap();

        let client = ApiClient::new().unwrap();
        let response = client.execute(&endpoint, &json!({"id": 404})).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.scenario.as_str(), "http_4xx");
        assert_eq!(
            response.value.get("error_code"),
            Some(&ShapedValue::Symbol("NOT_FOUND".to_string()))
        );
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{oops", "application/json"))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        let result = client
            .execute(&user_endpoint(&mock_server), &json!({"id": 1}))
            .await;
        assert!(matches!(
            result,
            Err(ApiError::Validation(ValidationError::BodyDecode(_)))
        ));
    }

    #[tokio::test]
    async fn test_shape_violation_carries_path() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        let err = client
            .execute(&user_endpoint(&mock_server), &json!({"id": 1}))
            .await
            .unwrap_err();
        assert_eq!(err.as_validation().and_then(ValidationError::path), Some("name"));
    }

    #[test]
    fn test_invalid_default_header_is_config_error() {
        let err = ApiClient::builder()
            .default_header("bad header", "value")
            .unwrap_err();
        assert!(matches!(
            &err,
            ApiError::Config(ConfigError::InvalidHeader { name, .. }) if name == "bad header"
        ));

        let err = ApiClient::builder()
            .default_header("x-ok", "line\nbreak")
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::InvalidHeader { .. })));
    }

    #[tokio::test]
    async fn test_refused_connection_is_retryable() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let endpoint = Endpoint::builder()
            .id("ping")
            .method(RestMethod::Get)
            .path("/ping")
            .base_url(format!("http://127.0.0.1:{port}"))
            .build()
            .unwrap();

        let client = ApiClient::new().unwrap();
        let err = client.execute(&endpoint, &Value::Null).await.unwrap_err();
        let client_err = match err {
            ApiError::Client(client_err) => client_err,
            other => panic!("expected a client error, got {other:?}"),
        };
        assert!(matches!(client_err, ClientError::Connection(_)));
        assert!(client_err.is_retryable());
    }

    #[tokio::test]
    async fn test_default_header() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .and(header("x-custom-header", "custom-value"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Header"})),
            )
            .mount(&mock_server)
            .await;

        let client = ApiClient::builder()
            .default_header("X-Custom-Header", "custom-value")
            .unwrap()
            .build()
            .unwrap();
        let response = client
            .execute(&user_endpoint(&mock_server), &json!({"id": 1}))
            .await
            .unwrap();
        assert_eq!(
            response.value.get("name"),
            Some(&ShapedValue::String("Header".to_string()))
        );
    }

    #[tokio::test]
    async fn test_execute_into() {
        #[derive(Debug, Default)]
        struct User {
            id: i64,
            name: String,
        }
        impl Materialize for User {
            fn assign(&mut self, field: &str, value: ShapedValue) -> Result<(), String> {
                match field {
                    "id" => self.id = value.as_i64().unwrap_or_default(),
                    "name" => self.name = value.as_str().unwrap_or_default().to_string(),
                    other => return Err(format!("unknown field {other}")),
                }
                Ok(())
            }
        }

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "Cleo"})),
            )
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        let user: User = client
            .execute_into(&user_endpoint(&mock_server), &json!({"id": 3}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.name, "Cleo");
    }

    #[tokio::test]
    async fn test_execute_collect_array_body() {
        #[derive(Debug, Default, PartialEq)]
        struct Tag {
            label: String,
        }
        impl Materialize for Tag {
            fn assign(&mut self, field: &str, value: ShapedValue) -> Result<(), String> {
                match field {
                    "label" => self.label = value.as_str().unwrap_or_default().to_string(),
                    other => return Err(format!("unknown field {other}")),
                }
                Ok(())
            }
        }

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tags"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"label": "red", "hex": "f00"}, {"label": "blue"}])),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken-tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"label": "ok"}, {}])))
            .mount(&mock_server)
            .await;

        let endpoint = |id: &str, route: &str| {
            Endpoint::builder()
                .id(id)
                .method(RestMethod::Get)
                .path(route)
                .base_url(mock_server.uri())
                .response(ShapeBuilder::new().top_level_array(true).string("label"))
                .build()
                .unwrap()
        };

        let client = ApiClient::new().unwrap();
        let tags: Vec<Tag> = client
            .execute_collect(&endpoint("list_tags", "/tags"), &Value::Null)
            .await
            .unwrap();
        assert_eq!(
            tags,
            vec![
                Tag { label: "red".to_string() },
                Tag { label: "blue".to_string() },
            ]
        );

        let err = client
            .execute_collect::<Tag>(&endpoint("broken_tags", "/broken-tags"), &Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.as_validation().and_then(ValidationError::path), Some("[1]->label"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_request_span_records_scenario() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "Traced"})),
            )
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        client
            .execute(&user_endpoint(&mock_server), &json!({"id": 1}))
            .await
            .unwrap();
        assert!(logs_contain("selected response scenario"));
        assert!(logs_contain("api_request"));
    }
}
