//! Minimal async persistence layer for gigboard (sqlite + sqlx)
//!
//! Usage:
//! let db = Db::connect("sqlite::memory:").await?;
//! auto_migrate(Arc::new(db.clone()), MIGRATIONS).await?;
//! let rows: Vec<(i64,)> = db.fetch_all("SELECT id FROM venue").await?;
use crate::error::Result;
pub use futures::future::BoxFuture;
use log::{debug, info};
use sha2::{Digest, Sha256};
pub use sqlx::FromRow;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};
use std::fs;
use std::str::FromStr;
use std::sync::Arc;
use walkdir::WalkDir;

const MIGRATIONS_TABLE: &str = "__gigboard_migrations";

/// An async database pool wrapper.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

/// Migration function pointer for a model.
pub type MigrationFn = fn(Arc<Db>) -> BoxFuture<'static, std::result::Result<(), sqlx::Error>>;

/// One entry of a model migration list, see `models::MIGRATIONS`.
pub struct Migration(pub MigrationFn);

#[async_trait::async_trait]
pub trait Model: Send + Sync {
    fn table_name() -> &'static str;
    fn create_table_sql() -> String;
    fn columns() -> Vec<(String, String)>;

    async fn migrate(db: Arc<Db>) -> std::result::Result<(), sqlx::Error> {
        let table_name = Self::table_name();
        let create_sql = Self::create_table_sql();
        let schema_hash = hash(&create_sql);

        ensure_migrations_table(&db).await?;

        let recorded: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT hash FROM {} WHERE table_name = ?",
            MIGRATIONS_TABLE
        ))
        .bind(table_name)
        .fetch_optional(db.pool())
        .await?;

        let Some((recorded_hash,)) = recorded else {
            db.execute(&create_sql).await?;
            sqlx::query(&format!(
                "INSERT INTO {} (table_name, schema_sql, hash) VALUES (?, ?, ?)",
                MIGRATIONS_TABLE
            ))
            .bind(table_name)
            .bind(&create_sql)
            .bind(&schema_hash)
            .execute(db.pool())
            .await?;
            log::info!(
                "Migrated `{}` (table created, initial schema applied).",
                table_name
            );
            return Ok(());
        };

        if recorded_hash == schema_hash {
            log::info!("No schema changes detected for `{}`.", table_name);
            return Ok(());
        }

        // Get existing cols from DB
        let pragma_sql = format!("PRAGMA table_info({})", table_name);
        let cols: Vec<String> = sqlx::query(&pragma_sql)
            .fetch_all(db.pool())
            .await?
            .into_iter()
            .map(|row: SqliteRow| row.get::<String, _>("name"))
            .collect();

        let mut added = Vec::new();
        for (name, sqltype) in Self::columns() {
            if !cols.contains(&name) {
                let statement = format!(
                    "ALTER TABLE {} ADD COLUMN {} {};",
                    table_name, name, sqltype
                );
                db.execute(&statement).await?;
                added.push((name, sqltype));
            }
        }

        if added.is_empty() {
            log::info!("Schema of `{}` changed but no columns were missing.", table_name);
        } else {
            log::info!(
                "Schema changes detected for `{}`; the following columns were added:",
                table_name
            );
            for (name, sqltype) in &added {
                log::info!("  - {} {}", name, sqltype);
            }
        }
        sqlx::query(&format!(
            "UPDATE {} SET schema_sql = ?, hash = ?, applied_at = CURRENT_TIMESTAMP \
             WHERE table_name = ?",
            MIGRATIONS_TABLE
        ))
        .bind(&create_sql)
        .bind(&schema_hash)
        .bind(table_name)
        .execute(db.pool())
        .await?;
        Ok(())
    }
}

// Model and file migrations share one bookkeeping table
async fn ensure_migrations_table(db: &Db) -> std::result::Result<(), sqlx::Error> {
    db.execute(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT UNIQUE,
            table_name TEXT UNIQUE,
            schema_sql TEXT,
            hash TEXT,
            applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        MIGRATIONS_TABLE
    ))
    .await
}

// Helper function to hash a SQL string
fn hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_memory(uri: &str) -> bool {
    uri.contains(":memory:") || uri.contains("mode=memory")
}

impl Db {
    /// Connect (or create) a SQLite database at the given URI with foreign keys enforced.
    pub async fn connect(uri: &str) -> std::result::Result<Self, sqlx::Error> {
        info!("Connecting to SQLite database at URI: {}", uri);
        let options = SqliteConnectOptions::from_str(uri)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = if is_memory(uri) {
            // An in-memory database lives and dies with its connection.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };
        info!("Connected to SQLite database: {}", uri);
        Ok(Db { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction; dropping it without `commit` rolls back.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Execute an arbitrary SQL statement, e.g. DDL.
    pub async fn execute(&self, sql: &str) -> std::result::Result<(), sqlx::Error> {
        debug!("Executing SQL: {}", sql);
        let result = self.pool.execute(sql).await;
        match &result {
            Ok(_) => debug!("SQL executed successfully"),
            Err(e) => log::error!("SQL execution failed: {}", e),
        }
        result.map(|_| ())
    }

    /// Fetch all rows and map to a type implementing `FromRow`.
    pub async fn fetch_all<T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin>(
        &self,
        sql: &str,
    ) -> std::result::Result<Vec<T>, sqlx::Error> {
        debug!("Fetching rows with SQL: {}", sql);
        let result = sqlx::query_as(sql).fetch_all(&self.pool).await;
        match &result {
            Ok(rows) => debug!("Fetched {} rows successfully", rows.len()),
            Err(e) => log::error!("Row fetch failed: {}", e),
        }
        result
    }
}

/// Run every migration in order.
pub async fn auto_migrate(
    db: Arc<Db>,
    migrations: &[Migration],
) -> std::result::Result<(), sqlx::Error> {
    info!("Starting auto migration of all registered models...");
    for m in migrations {
        if let Err(e) = (m.0)(db.clone()).await {
            log::error!("Auto-migration failed for a model: {}", e);
            return Err(e);
        }
    }
    info!("Auto migration completed for {} models.", migrations.len());
    Ok(())
}

/// Applies file-based migrations located in the `migrations_dir` directory.
/// Each migration file should be a *.sql file.
/// Already-applied migrations are skipped based on filename tracking.
pub async fn apply_migration_files(db: Arc<Db>, migrations_dir: &str) -> Result<usize> {
    ensure_migrations_table(&db).await?;

    // List .sql files in migrations directory, sorted by filename
    let mut files: Vec<_> = WalkDir::new(migrations_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|f| f.file_type().is_file())
        .filter(|f| f.path().extension().map(|e| e == "sql").unwrap_or(false))
        .collect();
    files.sort_by_key(|f| f.file_name().to_os_string());

    let mut applied_count = 0;
    for entry in files {
        let filename = entry.file_name().to_string_lossy().to_string();
        let applied: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT filename FROM {} WHERE filename = ?",
            MIGRATIONS_TABLE
        ))
        .bind(&filename)
        .fetch_optional(db.pool())
        .await?;
        if applied.is_some() {
            log::info!("Migration `{}` already applied.", filename);
            continue;
        }

        let sql = fs::read_to_string(entry.path())?;
        log::info!("Applying migration file: {}", filename);
        let mut tx = db.begin().await?;
        (&mut *tx).execute(sql.as_str()).await?;
        sqlx::query(&format!(
            "INSERT INTO {} (filename) VALUES (?)",
            MIGRATIONS_TABLE
        ))
        .bind(&filename)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        applied_count += 1;
        log::info!("Migration `{}` applied.", filename);
    }

    Ok(applied_count)
}
