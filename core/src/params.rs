//! Query-string construction for `findAll`/`search` filters.
//!
//! Filters are a JSON object whose entries are emitted in insertion order.
//! Entries with a falsy value (`null`, `false`, `0`, `""`) are dropped, the
//! rest are rendered as `key=value` and joined with `&`. The result always
//! starts with `?`, even when nothing survives, because existing consumers
//! match on that exact shape. Values are not percent-encoded.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::ApiError;

/// Filter mapping, iterated in insertion order.
pub type Params = Map<String, Value>;

/// Filter applied by `find_all` when the caller supplies none.
pub fn default_page_params() -> Params {
    let mut params = Map::new();
    params.insert("page".to_string(), Value::from(1));
    params.insert("sort".to_string(), Value::from(""));
    params
}

/// Build `?k=v&...` from a filter mapping.
pub fn generate_param(params: &Params) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter(|(_, value)| is_truthy(value))
        .map(|(key, value)| format!("{key}={}", render(value)))
        .collect();
    format!("?{}", pairs.join("&"))
}

/// Serialize any map-like value into a filter mapping. `null` (and `()`)
/// count as "no filters".
pub fn to_params<P>(params: &P) -> Result<Params, ApiError>
where
    P: Serialize + ?Sized,
{
    match serde_json::to_value(params).map_err(|e| ApiError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ApiError::InvalidParams(other.to_string())),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => render_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

// `2.0` prints as `2`, matching how integral floats appear in URLs.
fn render_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn empty_filter_yields_bare_question_mark() {
        assert_eq!(generate_param(&Map::new()), "?");
    }

    #[test]
    fn default_filter_drops_empty_sort() {
        assert_eq!(generate_param(&default_page_params()), "?page=1");
    }

    #[test]
    fn pairs_keep_insertion_order() {
        assert_eq!(generate_param(&params(json!({"a": 1, "b": 2}))), "?a=1&b=2");
        assert_eq!(generate_param(&params(json!({"b": 2, "a": 1}))), "?b=2&a=1");
    }

    #[test]
    fn falsy_values_are_skipped() {
        let filter = params(json!({
            "empty": "",
            "zero": 0,
            "fzero": 0.0,
            "none": null,
            "no": false,
            "title": "abc",
        }));
        assert_eq!(generate_param(&filter), "?title=abc");
    }

    #[test]
    fn all_falsy_still_yields_question_mark() {
        assert_eq!(generate_param(&params(json!({"page": 0, "sort": ""}))), "?");
    }

    #[test]
    fn values_render_like_plain_strings() {
        let filter = params(json!({
            "active": true,
            "ratio": 1.5,
            "whole": 3.0,
            "neg": -2,
            "ids": [1, 2, 3],
            "empty_list": [],
        }));
        assert_eq!(
            generate_param(&filter),
            "?active=true&ratio=1.5&whole=3&neg=-2&ids=1,2,3&empty_list="
        );
    }

    #[test]
    fn values_are_not_encoded() {
        let filter = params(json!({"q": "a b&c"}));
        assert_eq!(generate_param(&filter), "?q=a b&c");
    }

    #[derive(Serialize)]
    struct Filter<'a> {
        title: &'a str,
        page: u32,
        sort: &'a str,
    }

    #[test]
    fn structs_serialize_in_field_order() {
        let filter = to_params(&Filter {
            title: "abc",
            page: 1,
            sort: "title",
        })
        .unwrap();
        assert_eq!(generate_param(&filter), "?title=abc&page=1&sort=title");
    }

    #[test]
    fn unit_means_no_filters() {
        assert!(to_params(&()).unwrap().is_empty());
    }

    #[test]
    fn non_mapping_params_are_rejected() {
        let err = to_params(&[1, 2]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParams(_)));
    }
}
