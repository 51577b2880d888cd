use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::SqlValue;

/// One entry of a write payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// A value that can be bound as a query parameter.
    Scalar(SqlValue),
    /// An array or object; never written to a column.
    Nested(JsonValue),
}

impl From<JsonValue> for Field {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Field::Scalar(SqlValue::Null),
            JsonValue::Bool(b) => Field::Scalar(SqlValue::Bool(b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Field::Scalar(SqlValue::Int64(i)),
                None => Field::Scalar(n.as_f64().map_or(SqlValue::Null, SqlValue::Float64)),
            },
            JsonValue::String(s) => Field::Scalar(SqlValue::Text(s)),
            nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Field::Nested(nested),
        }
    }
}

/// Column → value mapping used as insert/update payload.
///
/// Keys are kept sorted so generated SQL has a stable column order.
/// Typed records convert into this with a `From` impl; untrusted input
/// deserializes from a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, JsonValue>")]
pub struct Values {
    fields: BTreeMap<String, Field>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value.
    pub fn set<V: Into<SqlValue>>(mut self, column: impl Into<String>, value: V) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column only when a value is present, for partial updates.
    pub fn set_opt<V: Into<SqlValue>>(self, column: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    pub fn insert<V: Into<SqlValue>>(&mut self, column: impl Into<String>, value: V) {
        self.fields.insert(column.into(), Field::Scalar(value.into()));
    }

    pub fn insert_field(&mut self, column: impl Into<String>, field: Field) {
        self.fields.insert(column.into(), field);
    }

    pub fn remove(&mut self, column: &str) -> Option<Field> {
        self.fields.remove(column)
    }

    pub fn field(&self, column: &str) -> Option<&Field> {
        self.fields.get(column)
    }

    /// The scalar value of a column, if present and not nested.
    pub fn scalar(&self, column: &str) -> Option<&SqlValue> {
        match self.fields.get(column) {
            Some(Field::Scalar(v)) => Some(v),
            _ => None,
        }
    }

    /// True when the column is absent, nested, or holds an empty value.
    pub fn is_empty_at(&self, column: &str) -> bool {
        self.scalar(column).map_or(true, SqlValue::is_empty)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Scalar entries only, in column order.
    pub fn scalars(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().filter_map(|(k, v)| match v {
            Field::Scalar(s) => Some((k.as_str(), s)),
            Field::Nested(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, JsonValue>> for Values {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self {
            fields: map.into_iter().map(|(k, v)| (k, Field::from(v))).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_from_json() {
        let values: Values = serde_json::from_value(json!({
            "name": "Widget",
            "price": 9.99,
            "qty": 3,
            "active": true,
            "note": null,
            "tags": ["a", "b"],
            "meta": {"k": "v"}
        }))
        .unwrap();

        assert_eq!(values.scalar("name"), Some(&SqlValue::Text("Widget".into())));
        assert_eq!(values.scalar("price"), Some(&SqlValue::Float64(9.99)));
        assert_eq!(values.scalar("qty"), Some(&SqlValue::Int64(3)));
        assert_eq!(values.scalar("active"), Some(&SqlValue::Bool(true)));
        assert_eq!(values.scalar("note"), Some(&SqlValue::Null));
        assert!(matches!(values.field("tags"), Some(Field::Nested(_))));
        assert!(matches!(values.field("meta"), Some(Field::Nested(_))));
        assert_eq!(values.scalars().count(), 5);
    }

    #[test]
    fn test_set_opt_skips_none() {
        let values = Values::new()
            .set("id", 5)
            .set_opt("name", Some("Updated"))
            .set_opt("price", None::<f64>);

        assert_eq!(values.keys().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_is_empty_at() {
        let values = Values::new().set("a", "").set("b", 0).set("c", 7);
        assert!(values.is_empty_at("a"));
        assert!(values.is_empty_at("b"));
        assert!(!values.is_empty_at("c"));
        assert!(values.is_empty_at("missing"));
    }
}
