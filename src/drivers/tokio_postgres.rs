use std::error::Error;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio_postgres::types::{to_sql_checked, Format, FromSql, IsNull, Kind, ToSql, Type};
use tokio_postgres::{Client, NoTls, Statement};
use tracing::{debug, error};

use crate::error::{PgTableError, Result};
use crate::traits::DatabaseDriver;
use crate::types::{RawQueryResult, SqlValue};

type BoxError = Box<dyn Error + Sync + Send>;
type Param = Box<dyn ToSql + Sync + Send>;

/// PostgreSQL driver implementation using tokio-postgres.
///
/// Every statement is prepared first so parameters can be converted to the
/// types the server expects for them.
pub struct TokioPostgresDriver {
    client: Client,
}

impl TokioPostgresDriver {
    /// Connect to a PostgreSQL database.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| PgTableError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        debug!("connected to PostgreSQL");
        Ok(Self { client })
    }

    async fn prepare(&self, sql: &str, params: &[SqlValue]) -> Result<(Statement, Vec<Param>)> {
        let statement = self
            .client
            .prepare(sql)
            .await
            .map_err(|e| PgTableError::QueryFailed(e.to_string()))?;

        if statement.params().len() != params.len() {
            return Err(PgTableError::ParameterMismatch {
                expected: statement.params().len(),
                actual: params.len(),
            });
        }

        let bound = params
            .iter()
            .zip(statement.params())
            .map(|(value, ty)| bind_param(value, ty))
            .collect();
        Ok((statement, bound))
    }
}

fn param_refs(params: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|b| b.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<RawQueryResult> {
        let (statement, bound) = self.prepare(sql, params).await?;

        let rows = self
            .client
            .query(&statement, &param_refs(&bound))
            .await
            .map_err(|e| PgTableError::QueryFailed(e.to_string()))?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let result_rows = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| {
                        row_value_to_string(row, i, col.type_()).map_err(|e| {
                            PgTableError::QueryFailed(format!("column {}: {}", col.name(), e))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RawQueryResult::new(columns, result_rows))
    }

    async fn execute_statement(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        let (statement, bound) = self.prepare(sql, params).await?;

        self.client
            .execute(&statement, &param_refs(&bound))
            .await
            .map_err(|e| PgTableError::QueryFailed(e.to_string()))
    }
}

/// A parameter sent in text format; the server parses it as the declared type.
#[derive(Debug)]
struct TextParam(Option<String>);

impl ToSql for TextParam {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match &self.0 {
            Some(text) => {
                out.extend_from_slice(text.as_bytes());
                Ok(IsNull::No)
            }
            None => Ok(IsNull::Yes),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn encode_format(&self, _ty: &Type) -> Format {
        Format::Text
    }

    to_sql_checked!();
}

fn as_i64(value: &SqlValue) -> Option<i64> {
    match value {
        SqlValue::Int32(i) => Some(i64::from(*i)),
        SqlValue::Int64(i) => Some(*i),
        SqlValue::Float64(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
        SqlValue::Float64(_) => None,
        SqlValue::Bool(b) => Some(i64::from(*b)),
        SqlValue::Text(s) => s.trim().parse().ok(),
        SqlValue::Null => None,
    }
}

fn as_f64(value: &SqlValue) -> Option<f64> {
    match value {
        SqlValue::Int32(i) => Some(f64::from(*i)),
        SqlValue::Int64(i) => Some(*i as f64),
        SqlValue::Float64(f) => Some(*f),
        SqlValue::Text(s) => s.trim().parse().ok(),
        SqlValue::Bool(_) | SqlValue::Null => None,
    }
}

fn boxed<T: ToSql + Sync + Send + 'static>(value: T) -> Param {
    Box::new(value)
}

/// Convert a SqlValue to a parameter of the type the server declared for it.
///
/// Integers are widened or narrowed, numeric text is parsed, and anything that
/// does not convert is sent as text so the server reports the bad input.
fn bind_param(value: &SqlValue, ty: &Type) -> Param {
    if let SqlValue::Null = value {
        return boxed(TextParam(None));
    }

    let native = match *ty {
        Type::BOOL => match value {
            SqlValue::Bool(b) => Some(boxed(*b)),
            SqlValue::Int32(_) | SqlValue::Int64(_) => as_i64(value).map(|i| boxed(i != 0)),
            _ => None,
        },
        Type::INT2 => as_i64(value)
            .and_then(|i| i16::try_from(i).ok())
            .map(boxed),
        Type::INT4 => as_i64(value)
            .and_then(|i| i32::try_from(i).ok())
            .map(boxed),
        Type::INT8 => as_i64(value).map(boxed),
        Type::OID => as_i64(value)
            .and_then(|i| u32::try_from(i).ok())
            .map(boxed),
        Type::FLOAT4 => as_f64(value).map(|f| boxed(f as f32)),
        Type::FLOAT8 => as_f64(value).map(boxed),
        _ => None,
    };

    native.unwrap_or_else(|| boxed(TextParam(Some(value.to_string()))))
}

/// Column value decoded to its text form for types without a native mapping.
struct TextValue(String);

impl<'a> FromSql<'a> for TextValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        match *ty {
            Type::NUMERIC => decode_numeric(raw).map(TextValue),
            _ if is_textual(ty) => Ok(TextValue(std::str::from_utf8(raw)?.to_string())),
            _ => Err(format!("cannot decode type {}; select it with a ::text cast", ty).into()),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn is_textual(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN | Type::XML
    ) || matches!(ty.kind(), Kind::Enum(_))
        || ty.name() == "citext"
}

/// Render PostgreSQL's binary NUMERIC (base-10000 digits) as decimal text.
fn decode_numeric(raw: &[u8]) -> std::result::Result<String, BoxError> {
    if raw.len() < 8 {
        return Err("numeric value too short".into());
    }
    let word = |i: usize| u16::from_be_bytes([raw[i], raw[i + 1]]);
    let ndigits = usize::from(word(0));
    let weight = i32::from(word(2) as i16);
    let sign = word(4);
    let dscale = usize::from(word(6));

    match sign {
        0x0000 | 0x4000 => {}
        0xC000 => return Ok("NaN".to_string()),
        0xD000 => return Ok("Infinity".to_string()),
        0xF000 => return Ok("-Infinity".to_string()),
        _ => return Err(format!("invalid numeric sign {:#x}", sign).into()),
    }
    if raw.len() != 8 + ndigits * 2 {
        return Err("numeric digit count does not match length".into());
    }

    let digit = |i: i32| -> u16 {
        if i >= 0 && (i as usize) < ndigits {
            word(8 + i as usize * 2)
        } else {
            0
        }
    };

    let mut out = String::new();
    if sign == 0x4000 {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        for i in 0..=weight {
            if i == 0 {
                out.push_str(&digit(i).to_string());
            } else {
                out.push_str(&format!("{:04}", digit(i)));
            }
        }
    }

    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let groups = (dscale + 3) / 4;
        for k in 1..=groups as i32 {
            fraction.push_str(&format!("{:04}", digit(weight + k)));
        }
        fraction.truncate(dscale);
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(out)
}

fn to_text<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

/// Convert a row value at a given index to text. SQL NULL becomes `None`.
fn row_value_to_string(
    row: &tokio_postgres::Row,
    index: usize,
    type_: &Type,
) -> std::result::Result<Option<String>, tokio_postgres::Error> {
    match *type_ {
        Type::BOOL => row.try_get::<_, Option<bool>>(index).map(to_text),
        Type::INT2 => row.try_get::<_, Option<i16>>(index).map(to_text),
        Type::INT4 => row.try_get::<_, Option<i32>>(index).map(to_text),
        Type::INT8 => row.try_get::<_, Option<i64>>(index).map(to_text),
        Type::OID => row.try_get::<_, Option<u32>>(index).map(to_text),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(index).map(to_text),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(index).map(to_text),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(index)
            .map(to_text),
        Type::TIME => row
            .try_get::<_, Option<chrono::NaiveTime>>(index)
            .map(to_text),
        Type::TIMESTAMP => row
            .try_get::<_, Option<chrono::NaiveDateTime>>(index)
            .map(to_text),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(index)
            .map(|v| v.map(|t| t.to_rfc3339())),
        Type::UUID => row.try_get::<_, Option<uuid::Uuid>>(index).map(to_text),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(index)
            .map(to_text),
        _ => row
            .try_get::<_, Option<TextValue>>(index)
            .map(|v| v.map(|t| t.0)),
    }
}
