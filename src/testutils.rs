use std::sync::Mutex;

use async_trait::async_trait;

use crate::format::Format;
use crate::store::dialect::{Bind, Dialect, Statement};
use crate::store::interface::{Error, Executor, Result};
use crate::store::value::Row;

/// Content the mock pretends is stored in the container of its one record.
#[derive(Debug, Clone)]
pub struct StoredContainer {
    pub format: Format,
    pub bytes: Vec<u8>,
    pub reference: Option<String>,
}

impl StoredContainer {
    pub fn new(format: Format, bytes: &[u8]) -> Self {
        Self {
            format,
            bytes: bytes.to_vec(),
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: &str) -> Self {
        self.reference = Some(reference.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct Log {
    statements: Vec<String>,
    transactions: Vec<Vec<String>>,
    bound_text: Vec<String>,
}

/// Executor that answers FileMaker statements from canned state and keeps
/// a log of everything it was asked to run.
#[derive(Debug)]
pub struct MockExecutor {
    dialect: Dialect,
    record_exists: bool,
    fail: bool,
    container: Option<StoredContainer>,
    content_type: Option<String>,
    page: (Vec<Row>, i64),
    log: Mutex<Log>,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self {
            dialect: Dialect::FileMaker,
            record_exists: true,
            fail: false,
            container: None,
            content_type: None,
            page: (vec![], 0),
            log: Mutex::new(Log::default()),
        }
    }
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn without_record(mut self) -> Self {
        self.record_exists = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_container(mut self, container: StoredContainer) -> Self {
        self.container = Some(container);
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_page(mut self, rows: Vec<Row>, total: i64) -> Self {
        self.page = (rows, total);
        self
    }

    /// Statements run outside of transactions, in order.
    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().statements.clone()
    }

    pub fn transactions(&self) -> Vec<Vec<String>> {
        self.log.lock().unwrap().transactions.clone()
    }

    pub fn bound_text(&self) -> Vec<String> {
        self.log.lock().unwrap().bound_text.clone()
    }

    fn record(&self, statement: &Statement<'_>) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.statements.push(statement.sql.clone());
        Self::record_binds(&mut log, statement);
        self.check()
    }

    fn record_binds(log: &mut Log, statement: &Statement<'_>) {
        for bind in &statement.binds {
            if let Bind::Text(text) = bind {
                log.bound_text.push(text.to_string());
            }
        }
    }

    fn check(&self) -> Result<()> {
        if self.fail {
            Err(Error::SqlxError(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn requested_format(sql: &str) -> Option<Format> {
        let start = sql.find("GetAs(")?;
        let rest = &sql[start..];
        let open = rest.find('\'')?;
        let close = rest.rfind("')")?;
        Some(Format::normalize(&rest[open + 1..close]))
    }
}

#[async_trait]
impl Executor for MockExecutor {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, statement: &Statement<'_>) -> Result<u64> {
        self.record(statement)?;
        Ok(self.record_exists as u64)
    }

    async fn execute_in_transaction(&self, statements: &[Statement<'_>]) -> Result<Vec<u64>> {
        {
            let mut log = self.log.lock().unwrap();
            log.transactions
                .push(statements.iter().map(|s| s.sql.clone()).collect());
            for statement in statements {
                Self::record_binds(&mut log, statement);
            }
        }
        self.check()?;
        Ok(vec![self.record_exists as u64; statements.len()])
    }

    async fn fetch_bytes(&self, statement: &Statement<'_>) -> Result<Option<Vec<u8>>> {
        self.record(statement)?;
        if !self.record_exists {
            return Ok(None);
        }

        let requested = Self::requested_format(&statement.sql);
        Ok(self
            .container
            .as_ref()
            .filter(|c| requested.as_ref() == Some(&c.format))
            .map(|c| c.bytes.clone()))
    }

    async fn fetch_text(&self, statement: &Statement<'_>) -> Result<Option<String>> {
        self.record(statement)?;
        if !self.record_exists {
            return Ok(None);
        }

        if statement.sql.contains("CAST(") {
            Ok(self.container.as_ref().and_then(|c| c.reference.clone()))
        } else {
            Ok(self.content_type.clone())
        }
    }

    async fn fetch_page(
        &self,
        rows: &Statement<'_>,
        count: &Statement<'_>,
    ) -> Result<(Vec<Row>, i64)> {
        self.record(rows)?;
        self.record(count)?;
        Ok(self.page.clone())
    }
}
