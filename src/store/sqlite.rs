use std::{fmt::Debug, str::FromStr};

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Pool, Row as SqlxRow, Sqlite, TypeInfo, ValueRef};
use tracing::debug;

use crate::implement_executor;

use super::{
    dialect::{Bind, Dialect, Statement},
    interface::{Error, Executor, Result},
    value::{Row, Value},
};

#[derive(Debug)]
pub struct SqliteStore {
    pub executor: Pool<Sqlite>,
}

impl SqliteStore {
    pub const DIALECT: Dialect = Dialect::Sqlite;

    pub async fn try_new(
        dsn: &str,
        max_connections: u32,
    ) -> std::result::Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { executor: pool })
    }

    pub fn interpret_error(error: sqlx::Error) -> Error {
        if let sqlx::Error::Database(ref d) = error {
            // Reference: https://www.sqlite.org/rescode.html
            // Both come back as a generic SQLITE_ERROR, so match on the message
            let message = d.message();
            if message.contains("no such table") || message.contains("no such column") {
                return Error::UndefinedObject(error);
            }
        }
        Error::SqlxError(error)
    }

    /// SQLite is dynamically typed: go by the declared column type where
    /// there is one, otherwise by the storage class of the value itself.
    pub fn decode_row(row: &SqliteRow) -> Result<Row> {
        let mut result = Row::new();

        for (index, column) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                result.push(column.name(), Value::Null);
                continue;
            }

            let type_name = raw.type_info().name().to_ascii_uppercase();
            let value = match type_name.as_str() {
                "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => {
                    Value::Integer(row.try_get_unchecked::<i64, _>(index)?)
                }
                "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
                    Value::Real(row.try_get_unchecked::<f64, _>(index)?)
                }
                "BLOB" => Value::Blob(row.try_get_unchecked::<Vec<u8>, _>(index)?),
                // TEXT, DATETIME, DATE, TIME and friends
                _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
            };
            result.push(column.name(), value);
        }

        Ok(result)
    }
}

implement_executor!(SqliteStore, Sqlite);
