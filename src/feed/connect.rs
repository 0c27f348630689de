//! Materialize connection setup.
//!
//! Materialize speaks the Postgres wire protocol, so `tokio-postgres` drives
//! both connections: the long-lived SUBSCRIBE cursor and the autocommit
//! checkpoint connection.

use crate::models::{Config, Result, SslMode};
use std::future::Future;
use tokio_postgres::{Client, Connection, NoTls};
use tracing::{error, info};

/// Open one connection to Materialize.
///
/// `purpose` only labels log lines ("subscribe", "checkpoint").
pub async fn connect(config: &Config, purpose: &'static str) -> Result<Client> {
    let source = &config.source;
    let password = config.resolve_password()?;

    let mut pg = tokio_postgres::Config::new();
    pg.host(&source.host)
        .port(source.port)
        .user(&source.user)
        .password(password)
        .dbname(&source.database)
        .options(&format!("--cluster={}", source.cluster))
        .application_name("mz-notify");

    info!(
        purpose,
        host = %source.host,
        cluster = %source.cluster,
        "Connecting to Materialize"
    );

    match source.ssl_mode {
        SslMode::Disable => {
            pg.ssl_mode(tokio_postgres::config::SslMode::Disable);
            let (client, connection) = pg.connect(NoTls).await?;
            spawn_connection(connection, purpose);
            Ok(client)
        }
        SslMode::Require => {
            pg.ssl_mode(tokio_postgres::config::SslMode::Require);
            let connector = native_tls::TlsConnector::builder().build()?;
            let tls = postgres_native_tls::MakeTlsConnector::new(connector);
            let (client, connection) = pg.connect(tls).await?;
            spawn_connection(connection, purpose);
            Ok(client)
        }
    }
}

/// Drive the connection I/O on its own task until the client is dropped.
fn spawn_connection<S, T>(connection: Connection<S, T>, purpose: &'static str)
where
    Connection<S, T>: Future<Output = std::result::Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(purpose, error = %e, "Materialize connection closed with error");
        }
    });
}
