//! Query-string shaping for list endpoints.
//!
//! Tool arguments arrive as a JSON object. Only non-null values become query pairs: the
//! upstream API treats `?customer=` (empty) differently from an absent filter, so a null must
//! never reach the wire.

use serde_json::{Map, Value};

/// An ordered list of query pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build query pairs from an argument object, skipping null values.
    ///
    /// Arrays are exploded into repeated keys (`?state=OK&state=ERRED`); nested objects are
    /// serialized as JSON text.
    #[must_use]
    pub fn from_object(args: &Map<String, Value>) -> Self {
        let mut params = Self::new();
        for (key, value) in args {
            params.push_value(key, value);
        }
        params
    }

    /// Append a single pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Append a JSON value under `key`, following the same rules as [`Self::from_object`].
    pub fn push_value(&mut self, key: &str, value: &Value) {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    self.push(key, value_to_string(item));
                }
            }
            other => self.push(key, value_to_string(other)),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// First value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::QueryParams;
    use serde_json::json;

    #[test]
    fn null_filters_never_become_pairs() {
        let args = json!({"name": "foo", "customer": null, "page": 2});
        let params = QueryParams::from_object(args.as_object().expect("object"));

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("name"), Some("foo"));
        assert_eq!(params.get("page"), Some("2"));
        assert_eq!(params.get("customer"), None);
    }

    #[test]
    fn arrays_explode_and_scalars_stringify() {
        let args = json!({"state": ["OK", null, "ERRED"], "archived": false});
        let params = QueryParams::from_object(args.as_object().expect("object"));

        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert!(pairs.contains(&("state", "OK")));
        assert!(pairs.contains(&("state", "ERRED")));
        assert!(pairs.contains(&("archived", "false")));
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn empty_strings_are_forwarded() {
        let args = json!({"name": ""});
        let params = QueryParams::from_object(args.as_object().expect("object"));
        assert_eq!(params.get("name"), Some(""));
    }
}
