//! Statement screening and execution against the read-only store

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use duckdb::{AccessMode, Config, Connection, Result as DuckResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;
use tracing::{debug, info, warn};

use crate::table::{value_ref_to_json, ResultTable};
use crate::{ExecutionError, ExecutionResult, GuardError};

/// Mutating keywords refused anywhere in a statement (substring match)
pub const BLOCKED_KEYWORDS: [&str; 5] = ["DROP", "DELETE", "INSERT", "UPDATE", "ALTER"];

/// Screen a statement without touching the store
///
/// Checks run in order:
/// 1. the trimmed, upper-cased text must start with `SELECT`
/// 2. none of [`BLOCKED_KEYWORDS`] may occur anywhere in it
/// 3. if `sqlparser` understands it, it must be exactly one query
///
/// Statements the parser cannot read are passed on; the engine reports its own error for them.
pub fn validate(sql: &str) -> Result<(), ExecutionError> {
    let normalized = sql.trim().to_uppercase();

    if !normalized.starts_with("SELECT") {
        return Err(ExecutionError::NotSelect);
    }

    if let Some(keyword) = BLOCKED_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| normalized.contains(keyword))
    {
        return Err(ExecutionError::DangerousOperation { keyword });
    }

    match Parser::parse_sql(&DuckDbDialect {}, sql) {
        Ok(statements) => match statements.as_slice() {
            [Statement::Query(_)] => Ok(()),
            _ => Err(ExecutionError::NotSingleQuery),
        },
        Err(e) => {
            debug!(error = %e, "sqlparser could not parse statement, deferring to engine");
            Ok(())
        }
    }
}

/// Single read-only connection plus the safety gate in front of it
pub struct QueryGuard {
    conn: Mutex<Connection>,
    executed: AtomicU64,
}

impl QueryGuard {
    /// Open a DuckDB database file in read-only access mode
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GuardError> {
        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path.as_ref(), config)?;
        info!(path = %path.as_ref().display(), "Opened analytical store (read-only)");
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            executed: AtomicU64::new(0),
        }
    }

    /// Validate and run one statement, always returning a structured outcome
    pub fn execute(&self, sql: &str) -> ExecutionResult {
        if let Err(rejection) = validate(sql) {
            warn!(%sql, reason = %rejection, "Statement rejected");
            return Err(rejection);
        }

        let table = self.run(sql).map_err(|e| {
            warn!(%sql, error = %e, "Query failed");
            e
        })?;

        if table.is_empty() {
            debug!(%sql, "Query returned no rows");
            return Err(ExecutionError::NoData);
        }

        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "Query succeeded"
        );
        Ok(table)
    }

    fn run(&self, sql: &str) -> Result<ResultTable, ExecutionError> {
        let conn = self.lock();
        self.executed.fetch_add(1, Ordering::Relaxed);

        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let columns = rows
            .as_ref()
            .map(|stmt| stmt.column_names())
            .unwrap_or_default();
        let column_count = columns.len();

        let mut result_rows = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(value_ref_to_json(row.get_ref(i)?));
            }
            result_rows.push(values);
        }

        Ok(ResultTable::new(columns, result_rows))
    }

    /// Names from `relations` that the store exposes neither as a table nor as a view
    pub fn missing_relations(&self, relations: &[&str]) -> Result<Vec<String>, GuardError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'main'",
        )?;
        let present: HashSet<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|name| name.map(|n| n.to_lowercase()))
            .collect::<DuckResult<_>>()?;

        Ok(relations
            .iter()
            .filter(|name| !present.contains(&name.to_lowercase()))
            .map(|name| name.to_string())
            .collect())
    }

    /// Number of statements that reached the engine
    pub fn queries_executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// A panic mid-query leaves nothing half-written on a read-only connection,
    /// so a poisoned lock is taken over rather than failing every later query
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
