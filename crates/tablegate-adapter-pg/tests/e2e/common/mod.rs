//! Shared infrastructure for the PostgreSQL end-to-end tests.
//!
//! Starts a throwaway `postgres:16-alpine` container on a non-standard port and
//! wires a [`PgStore`] into an [`ExecutionGateway`].

use sqlx::PgPool;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tablegate_adapter_pg::{PgStore, PgStoreOptions};
use tablegate_core::GuardrailsConfig;
use tablegate_policy::PolicyEngine;
use tablegate_runtime::ExecutionGateway;

// =============================================================================
// DOCKER CONTAINER CONFIGURATION
// =============================================================================

pub const CONTAINER_NAME: &str = "tablegate_test_postgres";
pub const POSTGRES_PORT: u16 = 5433;
pub const POSTGRES_PASSWORD: &str = "tablegate_test_password";
pub const DATABASE_NAME: &str = "tablegate_test";

pub const WRITER: &str = "writer@example.com";
pub const READER: &str = "reader@example.com";

pub fn database_url() -> String {
    format!(
        "postgres://postgres:{}@localhost:{}/{}",
        POSTGRES_PASSWORD, POSTGRES_PORT, DATABASE_NAME
    )
}

// =============================================================================
// DOCKER CONTAINER MANAGEMENT
// =============================================================================

pub fn start_postgres_container() -> Result<(), String> {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output()
        .map_err(|e| format!("Docker is not available: {}", e))?;

    let status = Command::new("docker")
        .args([
            "run",
            "-d",
            "--name",
            CONTAINER_NAME,
            "-e",
            &format!("POSTGRES_PASSWORD={}", POSTGRES_PASSWORD),
            "-e",
            &format!("POSTGRES_DB={}", DATABASE_NAME),
            "-p",
            &format!("{}:5432", POSTGRES_PORT),
            "postgres:16-alpine",
        ])
        .status()
        .map_err(|e| format!("Failed to start container: {}", e))?;

    if !status.success() {
        return Err("Failed to start PostgreSQL container".to_string());
    }
    Ok(())
}

pub fn stop_postgres_container() {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output();
}

pub async fn wait_for_postgres() -> Result<PgPool, String> {
    for attempt in 1..=30 {
        if let Ok(pool) = PgPool::connect(&database_url()).await {
            if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                println!("✅ PostgreSQL ready after {} attempts", attempt);
                return Ok(pool);
            }
        } else if attempt % 5 == 0 {
            println!("⏳ Waiting for PostgreSQL... (attempt {})", attempt);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Err("PostgreSQL did not become ready in time".to_string())
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

const POLICY: &str = r#"{
    "default": {"operations": ["SELECT"], "datasets": {"sales": ["orders"]}},
    "principals": {
        "writer@example.com": {
            "operations": ["SELECT", "CREATE_TABLE", "INSERT", "UPDATE", "DELETE"],
            "datasets": {"sales": ["*"]}
        }
    }
}"#;

pub struct TestContext {
    pub pool: PgPool,
    pub gateway: ExecutionGateway,
}

impl TestContext {
    pub async fn setup() -> Result<Self, String> {
        start_postgres_container()?;
        let pool = wait_for_postgres().await?;
        sqlx::query("CREATE SCHEMA IF NOT EXISTS sales")
            .execute(&pool)
            .await
            .map_err(|e| format!("Failed to create schema: {}", e))?;

        let store = PgStore::connect(&database_url(), PgStoreOptions::default())
            .await
            .map_err(|e| e.to_string())?;
        let policy = PolicyEngine::load(POLICY).map_err(|e| e.to_string())?;
        let gateway = ExecutionGateway::new(
            Arc::new(policy),
            Arc::new(store),
            GuardrailsConfig::default(),
        );
        Ok(Self { pool, gateway })
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        stop_postgres_container();
        println!("🧹 Cleaned up PostgreSQL container");
    }
}
