use std::str::FromStr;
use std::time::Duration;

use crossdump_core::Dialect;
use crossdump_introspect::{MySqlAdapter, PostgresAdapter, SourceAdapter, SqliteAdapter};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::CliError;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Source dialect named by the URL scheme.
pub fn detect_dialect(conn: &str) -> Result<Dialect, CliError> {
    let scheme = conn
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .unwrap_or_default();
    match scheme.as_str() {
        "sqlite" => Ok(Dialect::Sqlite),
        "mysql" | "mariadb" => Ok(Dialect::Mysql),
        "postgres" | "postgresql" => Ok(Dialect::Postgresql),
        _ => Err(CliError::UnsupportedEngine(scheme_or_input(conn))),
    }
}

fn scheme_or_input(conn: &str) -> String {
    match conn.split_once(':') {
        Some((scheme, _)) => format!("{scheme}:"),
        None => "connection string without a scheme".to_string(),
    }
}

/// `mariadb://` is spelled `mysql://` for the driver.
fn driver_url(conn: &str) -> String {
    match conn.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("mariadb") => {
            format!("mysql://{rest}")
        }
        _ => conn.to_string(),
    }
}

/// Open a pool for `conn` and wrap it in the matching adapter.
///
/// SQLite sources are opened read-only.
pub async fn connect(conn: &str) -> Result<Box<dyn SourceAdapter>, CliError> {
    let url = driver_url(conn);
    let adapter: Box<dyn SourceAdapter> = match detect_dialect(conn)? {
        Dialect::Sqlite => {
            let options = SqliteConnectOptions::from_str(&url)?.read_only(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect_with(options)
                .await?;
            Box::new(SqliteAdapter::new(pool))
        }
        Dialect::Mysql => {
            let pool = MySqlPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect(&url)
                .await?;
            Box::new(MySqlAdapter::new(pool))
        }
        Dialect::Postgresql => {
            let pool = PgPoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .connect(&url)
                .await?;
            Box::new(PostgresAdapter::new(pool))
        }
    };
    Ok(adapter)
}
