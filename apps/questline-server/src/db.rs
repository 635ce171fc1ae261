use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use runtime::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use url::Url;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Detect DB backend from URL scheme.
pub fn detect_backend(dsn: &str) -> Result<&'static str> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }
    let url = Url::parse(dsn).map_err(|e| anyhow!("Invalid database DSN '{}': {}", dsn, e))?;
    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Adds `mode=rwc` so a fresh home directory gets its database file.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) if q.contains("mode=") => {
            out.push('?');
            out.push_str(q);
        }
        Some(q) => {
            out.push('?');
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

/// Open the pool described by `cfg`, or an in-memory sqlite when `mock` is set.
pub async fn connect(cfg: &DatabaseConfig, base_dir: &Path, mock: bool) -> Result<DatabaseConnection> {
    let configured = cfg.url.trim();
    if configured.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let dsn = if mock { MEMORY_DSN } else { configured };
    let backend = detect_backend(dsn)?;
    let dsn = if backend == "sqlite" {
        absolutize_sqlite_dsn(dsn, base_dir, true)?
    } else {
        dsn.to_string()
    };

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if dsn == MEMORY_DSN {
        // Every pooled connection would otherwise get its own empty database.
        opts.max_connections(1).min_connections(1);
    } else if let Some(max) = cfg.max_conns {
        opts.max_connections(max);
    }
    if backend == "sqlite" {
        let busy = Duration::from_millis(u64::from(cfg.busy_timeout_ms.unwrap_or(5000)));
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy));
    }

    tracing::info!("Connecting to {} database: {}", backend, redact(&dsn));
    Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to {backend} database"))
}

/// Hide credentials before a DSN reaches the logs.
fn redact(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => dsn.to_string(),
    }
}
