//! Response shaping behavior through the public builder API.

use contour::{
    ApiConfig, FieldSpec, Path, ResponseDispatcher, ScenarioLabel, ShapeBuilder, ShapedValue,
    ValidationError,
};
use serde_json::{json, Value};

fn shape(builder: ShapeBuilder, input: Value) -> Result<ShapedValue, ValidationError> {
    builder
        .build()
        .expect("shape should build")
        .execute(&input, &Path::root(), None)
}

#[test]
fn test_unconstrained_string_passes_through() {
    let out = shape(ShapeBuilder::new().string("name"), json!({"name": "Ada"})).unwrap();
    assert_eq!(out.into_json(), json!({"name": "Ada"}));
}

#[test]
fn test_missing_required_field_fails() {
    let err = shape(ShapeBuilder::new().integer("id"), json!({})).unwrap_err();
    assert!(matches!(err, ValidationError::MissingKey { .. }));
    assert!(err.path().unwrap().contains("id"));
}

#[test]
fn test_optional_absent_field_is_null() {
    let builder = ShapeBuilder::new().field(FieldSpec::integer("id").optional(true));
    let out = shape(builder, json!({})).unwrap();
    assert_eq!(out.into_json(), json!({"id": null}));
}

#[test]
fn test_array_of_objects_keeps_order_and_count() {
    let builder = ShapeBuilder::new().array("items", |b| b.string("name"));
    let out = shape(builder, json!({"items": [{"name": "a"}, {"name": "b"}]})).unwrap();
    let items = out.get("items").and_then(ShapedValue::as_array).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(
        out.into_json(),
        json!({"items": [{"name": "a"}, {"name": "b"}]})
    );
}

#[test]
fn test_ambiguous_boolean_is_null() {
    let out = shape(ShapeBuilder::new().boolean("flag"), json!({"flag": "maybe"})).unwrap();
    assert_eq!(out.get("flag"), Some(&ShapedValue::Null));
}

#[test]
fn test_nested_array_error_names_element() {
    let builder = ShapeBuilder::new().array("items", |b| b.integer("id"));
    let err = shape(builder, json!({"items": [{"id": 1}, {}]})).unwrap_err();
    assert_eq!(err.path(), Some("items[1]->id"));
    assert_eq!(err.input(), Some(&json!({})));
}

#[test]
fn test_empty_array_skips_element_validation() {
    let builder = ShapeBuilder::new().array("items", |b| b.integer("id"));
    let out = shape(builder, json!({"items": []})).unwrap();
    assert_eq!(out.into_json(), json!({"items": []}));
}

#[test]
fn test_scenario_precedence() {
    let tree = |key: &str| ShapeBuilder::new().string(key).build().unwrap();
    let config = ApiConfig::new()
        .with_scenario("http_404", tree("missing"))
        .with_scenario("http_4xx", tree("client_error"))
        .with_scenario(ScenarioLabel::DEFAULT, tree("ok"));

    assert_eq!(ResponseDispatcher::select(&config, 404).as_str(), "http_404");
    assert_eq!(ResponseDispatcher::select(&config, 403).as_str(), "http_4xx");
    assert_eq!(ResponseDispatcher::select(&config, 200), ScenarioLabel::DEFAULT);

    let dispatched =
        ResponseDispatcher::dispatch(&config, 403, &json!({"client_error": "denied"})).unwrap();
    assert!(dispatched.processed);
    assert_eq!(dispatched.value.into_json(), json!({"client_error": "denied"}));
}

#[test]
fn test_endpoint_scenarios_override_api_scenarios() {
    use std::sync::Arc;

    let fault = ShapeBuilder::new().string("fault").build().unwrap();
    let api = Arc::new(ApiConfig::new().with_scenario("http_5xx", fault));
    let record = ShapeBuilder::new().integer("id").build().unwrap();
    let endpoint = ApiConfig::child_of(&api).with_scenario(ScenarioLabel::DEFAULT, record);

    let server_error =
        ResponseDispatcher::dispatch(&endpoint, 503, &json!({"fault": "down"})).unwrap();
    assert_eq!(server_error.scenario.as_str(), "http_5xx");

    let ok = ResponseDispatcher::dispatch(&endpoint, 200, &json!({"id": "9"})).unwrap();
    assert_eq!(ok.value.get("id"), Some(&ShapedValue::Integer(9)));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Field {
        Id,
        Name,
        Score,
        Active,
        Tags,
    }

    fn declare(builder: ShapeBuilder, field: Field) -> ShapeBuilder {
        match field {
            Field::Id => builder.integer("id"),
            Field::Name => builder.string("name"),
            Field::Score => builder.float("score"),
            Field::Active => builder.boolean("active"),
            Field::Tags => builder.array("tags", |b| b.string("label")),
        }
    }

    fn input_strategy() -> impl Strategy<Value = Value> {
        (
            any::<i32>(),
            "[a-z]{1,12}",
            -1.0e6f64..1.0e6,
            any::<bool>(),
            prop::collection::vec("[a-z]{1,6}", 0..4),
        )
            .prop_map(|(id, name, score, active, tags)| {
                let tags: Vec<Value> = tags.into_iter().map(|t| json!({"label": t})).collect();
                json!({
                    "id": id,
                    "name": name,
                    "score": score,
                    "active": active,
                    "tags": tags,
                    "ignored": "x",
                })
            })
    }

    proptest! {
        #[test]
        fn test_declaration_order_does_not_change_output(
            order in Just(vec![Field::Id, Field::Name, Field::Score, Field::Active, Field::Tags]).prop_shuffle(),
            input in input_strategy(),
        ) {
            let canonical = [Field::Id, Field::Name, Field::Score, Field::Active, Field::Tags]
                .into_iter()
                .fold(ShapeBuilder::new(), declare);
            let shuffled = order.into_iter().fold(ShapeBuilder::new(), declare);

            let expected = shape(canonical, input.clone()).unwrap().into_json();
            let actual = shape(shuffled, input).unwrap().into_json();
            prop_assert_eq!(expected, actual);
        }

        #[test]
        fn test_building_twice_gives_identical_output(input in input_strategy()) {
            let builder = ShapeBuilder::new()
                .integer("id")
                .string("name")
                .array("tags", |b| b.string("label"));
            let first = builder.build().unwrap();
            let second = builder.build().unwrap();

            let root = Path::root();
            prop_assert_eq!(
                first.execute(&input, &root, None).unwrap(),
                second.execute(&input, &root, None).unwrap()
            );
        }
    }
}
