use serde_json::{Map, Value};

/// Handlebars-style truthiness: null, `false`, `0`, `""`, `[]` and `{}` are falsy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Structural equality; numbers compare by value regardless of representation.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// Text used when a value is printed or compared as a string.
#[must_use]
pub fn string_form(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(string_form).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// A `some` constraint with its argument already evaluated.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate<'a> {
    Equals { field: &'a str, value: Value },
    StartsWith { field: &'a str, prefix: String },
    NotStartsWithAnyOf {
        field: &'a str,
        prefixes: Vec<String>,
    },
}

impl Predicate<'_> {
    pub(crate) fn split_prefixes(list: &Value) -> Vec<String> {
        string_form(list)
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn matches(&self, element: &Value) -> bool {
        match self {
            Self::Equals { field, value } => element.get(*field).is_some_and(|actual| {
                values_equal(actual, value)
                    || (value.is_string() && string_form(actual) == string_form(value))
            }),
            Self::StartsWith { field, prefix } => {
                field_text(element, field).starts_with(prefix.as_str())
            }
            Self::NotStartsWithAnyOf { field, prefixes } => {
                let text = field_text(element, field);
                !prefixes.iter().any(|p| text.starts_with(p.as_str()))
            }
        }
    }
}

/// True iff `sequence` is an array with an element satisfying every predicate.
pub(crate) fn any_element_matches(sequence: &Value, predicates: &[Predicate<'_>]) -> bool {
    let Value::Array(items) = sequence else {
        return false;
    };
    items
        .iter()
        .any(|item| predicates.iter().all(|p| p.matches(item)))
}

/// String form of a field looked up case-insensitively; missing fields read as "".
fn field_text(element: &Value, field: &str) -> String {
    element
        .as_object()
        .and_then(|map| lookup_ci(map, field))
        .map(string_form)
        .unwrap_or_default()
}

fn lookup_ci<'m>(map: &'m Map<String, Value>, field: &str) -> Option<&'m Value> {
    map.get(field).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    })
}
