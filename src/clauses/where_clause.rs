use crate::error::{PgTableError, Result};
use crate::traits::{Column, ColumnRef, DatabaseDriver};
use crate::types::SqlValue;

/// Represents a WHERE clause condition.
/// Supports basic comparison operations, raw conditions and logical combinations.
#[derive(Debug, Clone)]
pub enum WhereClause {
    /// column = value
    Eq(ColumnRef, SqlValue),
    /// column != value
    Ne(ColumnRef, SqlValue),
    /// Hand-written condition with `?` placeholders, or a bare column name
    /// compared for equality against a single parameter.
    Raw(String, Vec<SqlValue>),
    /// clause AND clause
    And(Box<WhereClause>, Box<WhereClause>),
    /// clause OR clause
    Or(Box<WhereClause>, Box<WhereClause>),
}

impl WhereClause {
    /// Creates an equality condition: column = value
    pub fn eq<C: Column, V: Into<SqlValue>>(column: &C, value: V) -> Self {
        WhereClause::Eq(ColumnRef::from_column(column), value.into())
    }

    /// Creates an inequality condition: column != value
    pub fn ne<C: Column, V: Into<SqlValue>>(column: &C, value: V) -> Self {
        WhereClause::Ne(ColumnRef::from_column(column), value.into())
    }

    /// Creates a raw condition such as `"price > ? AND price < ?"` or `"email"`.
    pub fn raw(condition: impl Into<String>, params: impl IntoIterator<Item = SqlValue>) -> Self {
        WhereClause::Raw(condition.into(), params.into_iter().collect())
    }

    /// Combines this clause with another using AND
    pub fn and(self, other: WhereClause) -> Self {
        WhereClause::And(Box::new(self), Box::new(other))
    }

    /// Combines this clause with another using OR
    pub fn or(self, other: WhereClause) -> Self {
        WhereClause::Or(Box::new(self), Box::new(other))
    }

    /// Builds the SQL string and collects parameters.
    /// Returns the SQL fragment and updates the params vector.
    /// Column references are quoted by `driver`; raw conditions are copied as written.
    /// `param_offset` is the starting parameter number (1-indexed for PostgreSQL).
    pub fn build_sql(
        &self,
        driver: &dyn DatabaseDriver,
        param_offset: usize,
        params: &mut Vec<SqlValue>,
    ) -> Result<String> {
        match self {
            WhereClause::Eq(col, value) => {
                params.push(value.clone());
                Ok(format!(
                    "{} = ${}",
                    col.quoted(driver),
                    param_offset + params.len()
                ))
            }
            WhereClause::Ne(col, value) => {
                params.push(value.clone());
                Ok(format!(
                    "{} != ${}",
                    col.quoted(driver),
                    param_offset + params.len()
                ))
            }
            WhereClause::Raw(condition, values) => {
                build_raw(condition, values, param_offset, params)
            }
            WhereClause::And(left, right) => {
                let left_sql = left.build_sql(driver, param_offset, params)?;
                let right_sql = right.build_sql(driver, param_offset, params)?;
                Ok(format!("({}) AND ({})", left_sql, right_sql))
            }
            WhereClause::Or(left, right) => {
                let left_sql = left.build_sql(driver, param_offset, params)?;
                let right_sql = right.build_sql(driver, param_offset, params)?;
                Ok(format!("({}) OR ({})", left_sql, right_sql))
            }
        }
    }
}

fn is_bare_column(condition: &str) -> bool {
    !condition.is_empty()
        && condition
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Number of `?` placeholders outside single-quoted literals.
fn placeholder_count(condition: &str) -> usize {
    let mut in_literal = false;
    condition
        .chars()
        .filter(|&c| {
            if c == '\'' {
                in_literal = !in_literal;
            }
            c == '?' && !in_literal
        })
        .count()
}

fn build_raw(
    condition: &str,
    values: &[SqlValue],
    param_offset: usize,
    params: &mut Vec<SqlValue>,
) -> Result<String> {
    if is_bare_column(condition) {
        return match values {
            [SqlValue::Null] => Ok(format!("{} IS NULL", condition)),
            [value] => {
                params.push(value.clone());
                Ok(format!("{} = ${}", condition, param_offset + params.len()))
            }
            _ => Err(PgTableError::ParameterMismatch {
                expected: 1,
                actual: values.len(),
            }),
        };
    }

    let expected = placeholder_count(condition);
    if expected != values.len() {
        return Err(PgTableError::ParameterMismatch {
            expected,
            actual: values.len(),
        });
    }

    let mut sql = String::with_capacity(condition.len() + 8);
    let mut values = values.iter();
    let mut in_literal = false;
    for c in condition.chars() {
        match c {
            '\'' => {
                in_literal = !in_literal;
                sql.push(c);
            }
            '?' if !in_literal => {
                if let Some(value) = values.next() {
                    params.push(value.clone());
                }
                sql.push('$');
                sql.push_str(&(param_offset + params.len()).to_string());
            }
            _ => sql.push(c),
        }
    }
    Ok(sql)
}
