//! Database test utilities.
//!
//! One PostgreSQL container is started for the whole test run; every test
//! gets its own freshly-migrated database inside it. Service methods commit
//! their own transactions normally, so clean state comes from the per-test
//! database, not from rollback tricks.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};

const DB_USER: &str = "trolley_test";
const DB_PASSWORD: &str = "trolley_test_password";

/// Shared PostgreSQL container that starts once and is reused across tests.
static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

/// Channel feeding the background drop-database task.
static CLEANUP_SENDER: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

async fn init_postgres_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(DB_USER)
        .with_password(DB_PASSWORD)
        .with_db_name("trolley_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

async fn init_cleanup_task() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(db_name) = receiver.recv().await {
            if let Err(err) = drop_database(&db_name).await {
                eprintln!("Failed to cleanup database '{db_name}': {err}");
            }
        }
    });

    sender
}

async fn server_url() -> String {
    let container = POSTGRES_CONTAINER
        .get_or_init(init_postgres_container)
        .await;

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    format!("postgresql://{DB_USER}:{DB_PASSWORD}@{host}:{port}")
}

async fn drop_database(db_name: &str) -> Result<(), sqlx::Error> {
    let base_url = format!("{}/postgres", server_url().await);

    let mut conn = PgConnection::connect(&base_url).await?;

    // Names are generated by `TestDb::new`, never caller-supplied.
    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\""))
        .execute(&mut conn)
        .await?;

    conn.close().await
}

/// An isolated, migrated test database. Dropped in the background when the
/// value goes out of scope.
#[derive(Debug, Clone)]
pub(crate) struct TestDb {
    pool: PgPool,
    name: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = CLEANUP_SENDER.get() {
            let _ = sender.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub(crate) async fn new() -> Self {
        let _cleanup_sender = CLEANUP_SENDER.get_or_init(init_cleanup_task).await;

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock before unix epoch")
            .as_nanos();

        let thread_id = std::thread::current().id();

        let name =
            format!("trolley_test_{nanos}_{thread_id:?}").replace([':', ' ', '(', ')'], "");

        let server = server_url().await;

        let mut conn = PgConnection::connect(&format!("{server}/postgres"))
            .await
            .expect("Failed to connect to postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut conn)
            .await
            .expect("Failed to create test database");

        conn.close()
            .await
            .expect("Failed to close admin connection");

        let pool = PgPool::connect(&format!("{server}/{name}"))
            .await
            .expect("Failed to create pool for test database");

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations on test database");

        Self { pool, name }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn container_starts_and_migrations_apply() {
        let test_db = TestDb::new().await;

        let carts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts")
            .fetch_one(test_db.pool())
            .await
            .expect("Failed to query migrated schema");

        assert_eq!(carts, 0);
    }
}
