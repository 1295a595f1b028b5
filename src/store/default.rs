/// Default implementation of [`Executor`](super::interface::Executor) shared
/// between the SQLite and Postgres stores.
///
/// Usage:
///
/// The struct has to have certain fields, since this macro relies on them:
///
/// ```ignore
/// pub struct MyStore {
///     pub executor: sqlx::Pool<sqlx::SqlxDatabaseType>
/// }
///
/// impl MyStore {
///     pub const DIALECT: Dialect = Dialect::Sqlite;
///     pub fn interpret_error(error: sqlx::Error) -> Error {
///         // Turn database-specific error codes into Error variants
///     }
///     pub fn decode_row(row: &SqlxRowType) -> Result<Row> {
///         // Map the database's column types onto Value
///     }
/// }
///
/// implement_executor!(MyStore, SqlxDatabaseType);
/// ```
///
/// A `Pool<Any>` or an implementation
/// generic over `sqlx::Database` needs a pile of `where` clauses on the
/// argument and row types, so the code lives in a macro instead.
#[macro_export]
macro_rules! implement_executor {
    ($store: ident, $db: ty) => {
impl $store {
    fn prepare<'q>(
        statement: &'q Statement<'q>,
    ) -> sqlx::query::Query<'q, $db, <$db as sqlx::database::HasArguments<'q>>::Arguments> {
        let mut query = sqlx::query(&statement.sql);
        for bind in &statement.binds {
            query = match *bind {
                Bind::Bytes(bytes) => query.bind(bytes),
                Bind::Integer(value) => query.bind(value),
                Bind::Text(text) => query.bind(text),
            };
        }
        query
    }
}

#[async_trait]
impl Executor for $store {
    fn dialect(&self) -> Dialect {
        $store::DIALECT
    }

    async fn execute(&self, statement: &Statement<'_>) -> Result<u64> {
        debug!("Executing {statement}");
        let mut conn = self.executor.acquire().await?;
        let result = $store::prepare(statement)
            .execute(&mut *conn)
            .await
            .map_err($store::interpret_error)?;

        Ok(result.rows_affected())
    }

    async fn execute_in_transaction(&self, statements: &[Statement<'_>]) -> Result<Vec<u64>> {
        let mut tx = self.executor.begin().await?;
        let mut affected = Vec::with_capacity(statements.len());

        for statement in statements {
            debug!("Executing {statement} in transaction");
            match $store::prepare(statement).execute(&mut *tx).await {
                Ok(result) => affected.push(result.rows_affected()),
                Err(error) => {
                    tx.rollback().await?;
                    return Err($store::interpret_error(error));
                }
            }
        }

        tx.commit().await?;
        Ok(affected)
    }

    async fn fetch_bytes(&self, statement: &Statement<'_>) -> Result<Option<Vec<u8>>> {
        debug!("Fetching {statement}");
        let mut conn = self.executor.acquire().await?;
        let row = $store::prepare(statement)
            .fetch_optional(&mut *conn)
            .await
            .map_err($store::interpret_error)?;

        match row {
            Some(row) => Ok(row.try_get::<Option<Vec<u8>>, _>(0)?),
            None => Ok(None),
        }
    }

    async fn fetch_text(&self, statement: &Statement<'_>) -> Result<Option<String>> {
        debug!("Fetching {statement}");
        let mut conn = self.executor.acquire().await?;
        let row = $store::prepare(statement)
            .fetch_optional(&mut *conn)
            .await
            .map_err($store::interpret_error)?;

        match row {
            Some(row) => Ok(row.try_get::<Option<String>, _>(0)?),
            None => Ok(None),
        }
    }

    async fn fetch_page(
        &self,
        rows: &Statement<'_>,
        count: &Statement<'_>,
    ) -> Result<(Vec<Row>, i64)> {
        debug!("Fetching page {rows}");
        let mut conn = self.executor.acquire().await?;

        let content = $store::prepare(rows)
            .fetch(&mut *conn)
            .map_err($store::interpret_error)
            .and_then(|row| futures::future::ready($store::decode_row(&row)))
            .try_collect::<Vec<Row>>()
            .await?;

        let total: i64 = $store::prepare(count)
            .fetch_one(&mut *conn)
            .await
            .map_err($store::interpret_error)?
            .try_get(0)?;

        Ok((content, total))
    }
}
    };
}
