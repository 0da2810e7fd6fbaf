//! The reset driver (§4.5): given a leased connection descriptor, drop and
//! recreate that database from the configured template, transferring
//! ownership of the database and its `public` schema to the tenant role.
//!
//! The driver is pure: it takes only the connection descriptor and its own
//! configuration. It never consults the pool's Available/Leased state.

use async_trait::async_trait;
use broker_core::{ConnectionDescriptor, ResetConfig};
use tracing::{debug, warn};

use crate::error::ResetError;

pub struct PostgresResetDriver {
    config: ResetConfig,
}

impl PostgresResetDriver {
    pub fn new(config: ResetConfig) -> Self {
        Self { config }
    }

    async fn reset_inner(&self, connection: &ConnectionDescriptor) -> Result<(), ResetError> {
        let parts = connection
            .parts()
            .ok_or_else(|| ResetError::MalformedDescriptor(connection.as_str().to_string()))?;

        let admin_conn_str = format!(
            "host={} port={} user={} password={} dbname={}",
            parts.host, parts.port, parts.user, parts.password, self.config.admin_database
        );
        let (admin_client, admin_conn) = tokio_postgres::connect(&admin_conn_str, tokio_postgres::NoTls)
            .await
            .map_err(|e| ResetError::AdminConnect(self.config.admin_database.clone(), e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = admin_conn.await {
                warn!(error = %e, "admin connection to reset driver terminated with error");
            }
        });

        // Step 2: terminate other sessions on D. Best-effort: a lack of rows
        // to terminate, or the function being unavailable, is not fatal.
        let terminate_sql = format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity \
             WHERE datname = '{}' AND pid <> pg_backend_pid()",
            parts.dbname
        );
        if let Err(e) = admin_client.execute(&terminate_sql, &[]).await {
            debug!(dbname = parts.dbname, error = %e, "best-effort session termination failed");
        }

        // Step 3: drop D if it exists.
        let drop_sql = format!("DROP DATABASE IF EXISTS \"{}\"", parts.dbname);
        admin_client
            .execute(&drop_sql, &[])
            .await
            .map_err(|e| ResetError::Drop(parts.dbname.to_string(), e.to_string()))?;

        // Step 4: create D from the configured template, encoding, and locale.
        let create_sql = format!(
            "CREATE DATABASE \"{}\" TEMPLATE \"{}\" ENCODING '{}' LC_COLLATE '{}' LC_CTYPE '{}'",
            parts.dbname, self.config.template, self.config.encoding, self.config.locale, self.config.locale
        );
        admin_client
            .execute(&create_sql, &[])
            .await
            .map_err(|e| ResetError::Create(parts.dbname.to_string(), self.config.template.clone(), e.to_string()))?;

        // Step 5: transfer ownership of D to the tenant role.
        let alter_owner_sql = format!(
            "ALTER DATABASE \"{}\" OWNER TO \"{}\"",
            parts.dbname, self.config.tenant_role
        );
        admin_client
            .execute(&alter_owner_sql, &[])
            .await
            .map_err(|e| {
                ResetError::AlterOwner(parts.dbname.to_string(), self.config.tenant_role.clone(), e.to_string())
            })?;

        // Step 6: connect to D and transfer ownership of the public schema.
        let target_conn_str = format!(
            "host={} port={} user={} password={} dbname={}",
            parts.host, parts.port, parts.user, parts.password, parts.dbname
        );
        let (target_client, target_conn) = tokio_postgres::connect(&target_conn_str, tokio_postgres::NoTls)
            .await
            .map_err(|e| ResetError::TargetConnect(parts.dbname.to_string(), e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = target_conn.await {
                warn!(error = %e, "target connection to reset driver terminated with error");
            }
        });

        let alter_schema_sql = format!("ALTER SCHEMA public OWNER TO \"{}\"", self.config.tenant_role);
        target_client
            .execute(&alter_schema_sql, &[])
            .await
            .map_err(|e| {
                ResetError::AlterSchemaOwner(parts.dbname.to_string(), self.config.tenant_role.clone(), e.to_string())
            })?;

        debug!(connection = %connection, "reset complete");
        Ok(())
    }
}

#[async_trait]
impl broker_pool::ResetDriver for PostgresResetDriver {
    async fn reset(&self, connection: &ConnectionDescriptor) -> Result<(), String> {
        self.reset_inner(connection).await.map_err(|e| e.to_string())
    }
}
