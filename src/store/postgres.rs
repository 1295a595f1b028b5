use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{
    migrate::MigrateDatabase,
    postgres::{PgPoolOptions, PgRow},
    Column, Executor as _, PgPool, Postgres, Row as SqlxRow, TypeInfo,
};
use tracing::debug;

use crate::implement_executor;

use super::{
    dialect::{Bind, Dialect, Statement},
    interface::{Error, Executor, Result},
    value::{Row, Value},
};

#[derive(Debug)]
pub struct PostgresStore {
    pub executor: PgPool,
    pub schema_name: String,
}

impl PostgresStore {
    pub const DIALECT: Dialect = Dialect::Postgres;

    pub async fn try_new(
        dsn: String,
        schema_name: String,
        max_connections: u32,
    ) -> std::result::Result<Self, sqlx::Error> {
        if !Postgres::database_exists(&dsn).await? {
            let _ = Postgres::create_database(&dsn).await;
        }

        let store = PostgresStore::connect(dsn, schema_name.clone(), max_connections).await?;

        store
            .executor
            .execute(format!("CREATE SCHEMA IF NOT EXISTS {schema_name};").as_str())
            .await?;

        Ok(store)
    }

    pub async fn connect(
        dsn: String,
        schema_name: String,
        max_connections: u32,
    ) -> std::result::Result<Self, sqlx::Error> {
        let schema_name_2 = schema_name.clone();

        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .idle_timeout(Duration::from_millis(30000))
            .test_before_acquire(true)
            .after_connect(move |c, _m| {
                let schema_name = schema_name.to_owned();
                Box::pin(async move {
                    let query = format!("SET search_path TO {schema_name},public;");
                    c.execute(sqlx::query(&query)).await?;
                    Ok(())
                })
            })
            .connect(&dsn)
            .await?;

        Ok(Self {
            executor: pool,
            schema_name: schema_name_2,
        })
    }

    pub fn interpret_error(error: sqlx::Error) -> Error {
        if let sqlx::Error::Database(ref d) = error {
            // Reference: https://www.postgresql.org/docs/current/errcodes-appendix.html
            if let Some(code) = d.code() {
                // undefined_table, undefined_column
                if code == "42P01" || code == "42703" {
                    return Error::UndefinedObject(error);
                }
            }
        }
        Error::SqlxError(error)
    }

    pub fn decode_row(row: &PgRow) -> Result<Row> {
        let mut result = Row::new();

        for (index, column) in row.columns().iter().enumerate() {
            let type_name = column.type_info().name();
            let value: Value = match type_name {
                "BOOL" => row
                    .try_get::<Option<bool>, _>(index)?
                    .map(|b| Value::Integer(b as i64))
                    .into(),
                "INT2" => row.try_get::<Option<i16>, _>(index)?.map(i64::from).into(),
                "INT4" => row.try_get::<Option<i32>, _>(index)?.map(i64::from).into(),
                "INT8" => row.try_get::<Option<i64>, _>(index)?.into(),
                "FLOAT4" => row.try_get::<Option<f32>, _>(index)?.map(f64::from).into(),
                "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.into(),
                "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => {
                    row.try_get::<Option<String>, _>(index)?.into()
                }
                "BYTEA" => row.try_get::<Option<Vec<u8>>, _>(index)?.into(),
                _ => {
                    return Err(Error::UnsupportedColumnType {
                        column: column.name().to_string(),
                        type_name: type_name.to_string(),
                    })
                }
            };
            result.push(column.name(), value);
        }

        Ok(result)
    }
}

implement_executor!(PostgresStore, Postgres);

pub mod testutils {
    use rand::Rng;

    use super::PostgresStore;

    pub fn get_random_schema() -> String {
        // Generate a random schema (taken from IOx)
        let mut rng = rand::thread_rng();
        (&mut rng)
            .sample_iter(rand::distributions::Alphanumeric)
            .filter(|c| c.is_ascii_alphabetic())
            .take(20)
            .map(char::from)
            .collect::<String>()
    }

    pub async fn make_store(dsn: &str) -> PostgresStore {
        let schema_name = get_random_schema();

        PostgresStore::try_new(dsn.to_string(), schema_name, 4)
            .await
            .expect("Error setting up the database")
    }
}
