//! Request construction: path templates and prepared requests.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{ConfigError, RequestError};
use crate::method::RestMethod;
use crate::value::stringify;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Param(String),
}

/// A parsed endpoint path such as `/users/{user_id}/posts`.
///
/// ## Examples
///
/// ```rust
/// use contour::PathTemplate;
///
/// let template = PathTemplate::parse("/users/{user_id}/posts/{post_id}").unwrap();
/// assert_eq!(template.params().collect::<Vec<_>>(), vec!["user_id", "post_id"]);
/// assert!(PathTemplate::parse("/users/{user_id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Vec<Piece>>,
}

impl PathTemplate {
    /// Parses a template.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidPathTemplate`] for unbalanced or nested
    /// braces and for empty or non-identifier placeholder names.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let segments = raw
            .trim_start_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| parse_segment(raw, segment))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Placeholder names in order of appearance.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().flatten().filter_map(|piece| match piece {
            Piece::Param(name) => Some(name.as_str()),
            Piece::Literal(_) => None,
        })
    }

    /// Fills the placeholders, removing the used values from `params`.
    ///
    /// ## Errors
    ///
    /// Returns [`RequestError::MissingPathParam`] for absent or null values
    /// and [`RequestError::NonScalarPathParam`] for arrays and objects.
    pub fn render(&self, params: &mut Map<String, Value>) -> Result<Vec<String>, RequestError> {
        self.segments
            .iter()
            .map(|pieces| {
                let mut segment = String::new();
                for piece in pieces {
                    match piece {
                        Piece::Literal(text) => segment.push_str(text),
                        Piece::Param(name) => segment.push_str(&take_param(params, name)?),
                    }
                }
                Ok(segment)
            })
            .collect()
    }
}

fn parse_segment(raw: &str, segment: &str) -> Result<Vec<Piece>, ConfigError> {
    let mut pieces = Vec::new();
    let mut rest = segment;
    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                pieces.push(Piece::Literal(rest.to_string()));
                break;
            }
            Some(at) if rest[at..].starts_with('}') => {
                return Err(ConfigError::invalid_path(format!(
                    "unmatched '}}' in {raw:?}"
                )));
            }
            Some(open) => {
                if open > 0 {
                    pieces.push(Piece::Literal(rest[..open].to_string()));
                }
                let after = &rest[open + 1..];
                let close = after.find('}').ok_or_else(|| {
                    ConfigError::invalid_path(format!("unclosed '{{' in {raw:?}"))
                })?;
                let name = &after[..close];
                if name.is_empty()
                    || name.contains('{')
                    || !name.chars().all(|c| c.is_alphanumeric() || c == '_')
                {
                    return Err(ConfigError::invalid_path(format!(
                        "invalid placeholder {{{name}}} in {raw:?}"
                    )));
                }
                pieces.push(Piece::Param(name.to_string()));
                rest = &after[close + 1..];
            }
        }
    }
    Ok(pieces)
}

fn take_param(params: &mut Map<String, Value>, name: &str) -> Result<String, RequestError> {
    match params.remove(name) {
        None | Some(Value::Null) => Err(RequestError::MissingPathParam {
            name: name.to_string(),
        }),
        Some(Value::Array(_) | Value::Object(_)) => Err(RequestError::NonScalarPathParam {
            name: name.to_string(),
        }),
        Some(scalar) => Ok(stringify(&scalar)),
    }
}

/// A request ready to be sent: final URL (query included) and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    method: RestMethod,
    url: Url,
    body: Option<Value>,
}

impl PreparedRequest {
    /// Assembles the request.
    ///
    /// Path segments are percent-encoded individually. Leftover parameters go
    /// into the JSON body for methods with a body and into the query string
    /// otherwise; null values are dropped from the query and array values
    /// repeat the key.
    ///
    /// ## Errors
    ///
    /// Returns an error when a placeholder cannot be filled or the base URL
    /// cannot take path segments.
    pub fn build(
        method: RestMethod,
        base_url: &Url,
        template: &PathTemplate,
        mut params: Map<String, Value>,
    ) -> Result<Self, RequestError> {
        let segments = template.render(&mut params)?;

        let mut url = base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RequestError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);

        if method.has_body() {
            let body = (!params.is_empty()).then_some(Value::Object(params));
            return Ok(Self { method, url, body });
        }

        if params.values().any(|v| !v.is_null()) {
            let mut query = url.query_pairs_mut();
            for (key, value) in &params {
                match value {
                    Value::Null => {}
                    Value::Array(items) => {
                        for item in items {
                            query.append_pair(key, &stringify(item));
                        }
                    }
                    other => {
                        query.append_pair(key, &stringify(other));
                    }
                }
            }
        }
        Ok(Self {
            method,
            url,
            body: None,
        })
    }

    /// The request method.
    pub fn method(&self) -> RestMethod {
        self.method
    }

    /// The final URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The JSON body, if any.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}
