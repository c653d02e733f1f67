//! Conversion of raw, string-typed request fragments into schema-typed JSON.
//!
//! Coercion never fails: when a value cannot be converted safely it is kept as
//! a string and the schema matcher reports the type error afterwards.

use serde_json::{Map, Number, Value};

/// Suffix marking a query key as a sequence (`tags[]=a&tags[]=b`).
pub const ARRAY_KEY_SUFFIX: &str = "[]";

/// Composition keywords searched for a typed branch when `type` is absent.
const COMPOSITE_KEYWORDS: [&str; 3] = ["allOf", "oneOf", "anyOf"];

fn is_null_type(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
}

/// The (sub)schema that carries the `type` keyword for `schema`.
///
/// A schema without `type` is searched through `allOf`, `oneOf` and `anyOf`,
/// preferring the first branch that is not `{type: null}`, so both
/// `oneOf: [{type: integer}, {type: null}]` and `allOf: [{type: integer}]`
/// resolve to the integer branch.
#[must_use]
pub fn typed_schema(schema: Option<&Value>) -> Option<&Value> {
    let schema = schema?;
    if schema.get("type").is_some() {
        return Some(schema);
    }
    let branches: Vec<&Value> = COMPOSITE_KEYWORDS
        .iter()
        .filter_map(|k| schema.get(*k).and_then(Value::as_array))
        .flatten()
        .collect();
    branches
        .iter()
        .filter(|b| !is_null_type(b))
        .find_map(|b| typed_schema(Some(*b)))
        .or_else(|| branches.iter().find_map(|b| typed_schema(Some(*b))))
}

/// The primitive type a schema declares.
///
/// For OAS 3.1 type lists (`["integer", "null"]`) the first non-`null` entry wins.
/// Composite schemas use the type of their first typed branch.
#[must_use]
pub fn declared_type(schema: Option<&Value>) -> Option<&str> {
    match typed_schema(schema)?.get("type")? {
        Value::String(ty) => Some(ty.as_str()),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null")
            .or_else(|| types.iter().find_map(Value::as_str)),
        _ => None,
    }
}

/// Item schema of an array schema, looking through composition.
fn items_schema(schema: Option<&Value>) -> Option<&Value> {
    typed_schema(schema)?.get("items")
}

/// Schema of a named property of an object schema.
#[must_use]
pub fn property_schema<'a>(schema: &'a Value, name: &str) -> Option<&'a Value> {
    schema.get("properties")?.get(name)
}

fn parse_integer(raw: &str) -> Option<Value> {
    raw.parse::<i64>()
        .map(Value::from)
        .or_else(|_| raw.parse::<u64>().map(Value::from))
        .ok()
}

fn convert_primitive(raw: &str, schema: Option<&Value>) -> Value {
    match declared_type(schema) {
        Some("integer") => {
            parse_integer(raw.trim()).unwrap_or_else(|| Value::String(raw.to_string()))
        }
        Some("number") => {
            let trimmed = raw.trim();
            parse_integer(trimmed)
                .or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .map(Value::Number)
                })
                .unwrap_or_else(|| Value::String(raw.to_string()))
        }
        Some("boolean") => {
            if raw.eq_ignore_ascii_case("true") {
                Value::Bool(true)
            } else if raw.eq_ignore_ascii_case("false") {
                Value::Bool(false)
            } else {
                Value::String(raw.to_string())
            }
        }
        Some("null") if raw.is_empty() || raw.eq_ignore_ascii_case("null") => Value::Null,
        _ => Value::String(raw.to_string()),
    }
}

/// Coerce one raw value to the type `schema` declares.
///
/// A single raw value for an array becomes a one-element sequence; it is never
/// split. Objects are accepted as inline JSON. Strings (including `date` and
/// `date-time` formats) pass through verbatim.
#[must_use]
pub fn coerce_value(raw: &str, schema: Option<&Value>) -> Value {
    match declared_type(schema) {
        Some("array") => Value::Array(vec![convert_primitive(raw, items_schema(schema))]),
        Some("object") => {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        }
        _ => convert_primitive(raw, schema),
    }
}

/// Group raw key/value pairs by key and coerce them against an object schema.
///
/// Repeated keys and keys ending in `[]` collapse into one ordered sequence
/// under the bare key. Keys the schema declares as arrays always become
/// sequences. Everything else is coerced with its property's declared type.
#[must_use]
pub fn coerce_pairs<I>(pairs: I, schema: &Value) -> Value
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut grouped: Vec<(String, Vec<String>, bool)> = Vec::new();
    for (raw_key, value) in pairs {
        let marked = raw_key.len() > ARRAY_KEY_SUFFIX.len()
            && raw_key.ends_with(ARRAY_KEY_SUFFIX)
            && property_schema(schema, &raw_key).is_none();
        let key = if marked {
            raw_key[..raw_key.len() - ARRAY_KEY_SUFFIX.len()].to_string()
        } else {
            raw_key
        };
        match grouped.iter_mut().find(|(k, _, _)| *k == key) {
            Some((_, values, is_seq)) => {
                values.push(value);
                *is_seq = true;
            }
            None => grouped.push((key, vec![value], marked)),
        }
    }

    let mut out = Map::new();
    for (key, values, is_seq) in grouped {
        let prop = property_schema(schema, &key);
        let coerced = if is_seq {
            let item_schema = if declared_type(prop) == Some("array") {
                items_schema(prop)
            } else {
                prop
            };
            Value::Array(
                values
                    .iter()
                    .map(|v| convert_primitive(v, item_schema))
                    .collect(),
            )
        } else {
            coerce_value(&values[0], prop)
        };
        out.insert(key, coerced);
    }
    Value::Object(out)
}
