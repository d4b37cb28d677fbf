//! Response body decoding.

use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Decodes a response body into a JSON value.
///
/// An empty body is null. A body declared as JSON must parse; anything else
/// is parsed when it happens to be JSON and otherwise kept as a string.
///
/// ## Errors
///
/// Returns [`ValidationError::BodyDecode`] when a JSON content type carries an
/// unparseable body.
///
/// ## Examples
///
/// ```rust
/// use contour::decode::decode_body;
/// use serde_json::json;
///
/// assert_eq!(decode_body(b"", None).unwrap(), json!(null));
/// assert_eq!(decode_body(br#"{"a":1}"#, None).unwrap(), json!({"a": 1}));
/// assert_eq!(decode_body(b"pong", Some("text/plain")).unwrap(), json!("pong"));
/// assert!(decode_body(b"pong", Some("application/json")).is_err());
/// ```
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<Value, ValidationError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Ok(value),
        Err(err) if content_type.is_some_and(is_json_content_type) => {
            Err(ValidationError::BodyDecode(err))
        }
        Err(_) => Ok(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Rewrites every object key in `value` to snake_case, recursively.
///
/// When two keys collide after conversion the later one wins.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (to_snake_case(&key), normalize_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Converts camelCase, PascalCase, kebab-case and spaced keys to snake_case.
///
/// ## Examples
///
/// ```rust
/// use contour::decode::to_snake_case;
///
/// assert_eq!(to_snake_case("firstName"), "first_name");
/// assert_eq!(to_snake_case("HTTPStatus"), "http_status");
/// assert_eq!(to_snake_case("created-at"), "created_at");
/// ```
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '_' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whitespace_body_is_null() {
        assert_eq!(decode_body(b"  \n", Some("application/json")).unwrap(), Value::Null);
    }

    #[test]
    fn test_json_with_charset_parameter() {
        let err = decode_body(b"{broken", Some("application/json; charset=utf-8")).unwrap_err();
        assert!(matches!(err, ValidationError::BodyDecode(_)));
        assert!(decode_body(b"{broken", Some("application/problem+json")).is_err());
    }

    #[test]
    fn test_snake_case_conversions() {
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("address2Line"), "address2_line");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("Content Type"), "content_type");
        assert_eq!(to_snake_case("__private"), "private");
    }

    #[test]
    fn test_normalize_keys_recurses() {
        let raw = json!({"userName": "ada", "pastOrders": [{"orderId": 1}]});
        assert_eq!(
            normalize_keys(raw),
            json!({"user_name": "ada", "past_orders": [{"order_id": 1}]})
        );
    }
}
