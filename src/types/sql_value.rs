use std::fmt;

/// Represents a SQL parameter value in a driver-agnostic way.
/// Drivers are responsible for converting these to their native types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
}

impl SqlValue {
    /// Whether the value counts as "empty" for primary-key checks.
    ///
    /// `Null`, `""`, `"0"`, zero numbers and `false` are empty, so a form
    /// that posts `id = ""` or `id = 0` is treated as a new row.
    pub fn is_empty(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::Text(s) => s.is_empty() || s == "0",
            SqlValue::Int32(i) => *i == 0,
            SqlValue::Int64(i) => *i == 0,
            SqlValue::Float64(f) => *f == 0.0,
            SqlValue::Bool(b) => !*b,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Int32(i) => write!(f, "{}", i),
            SqlValue::Int64(i) => write!(f, "{}", i),
            SqlValue::Float64(v) => write!(f, "{}", v),
            SqlValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int32(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int64(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float64(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(SqlValue::Null.is_empty());
        assert!(SqlValue::from("").is_empty());
        assert!(SqlValue::from("0").is_empty());
        assert!(SqlValue::from(0).is_empty());
        assert!(SqlValue::from(0i64).is_empty());
        assert!(SqlValue::from(0.0).is_empty());
        assert!(SqlValue::from(false).is_empty());
    }

    #[test]
    fn test_non_empty_values() {
        assert!(!SqlValue::from("5").is_empty());
        assert!(!SqlValue::from("00").is_empty());
        assert!(!SqlValue::from(5).is_empty());
        assert!(!SqlValue::from(-1i64).is_empty());
        assert!(!SqlValue::from(true).is_empty());
    }
}
