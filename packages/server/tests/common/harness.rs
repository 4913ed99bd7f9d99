//! Postgres-backed test harness.
//!
//! One container per test binary. Migrations run once into a template
//! database; every test then gets its own database cloned from that
//! template, so tests never see each other's rows (the jobs table included).

use anyhow::{Context, Result};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

const TEMPLATE_DB: &str = "procurement_template";

struct Container {
    /// Server URL without a database name
    base_url: String,
    _postgres: ContainerAsync<Postgres>,
}

static CONTAINER: OnceCell<Container> = OnceCell::const_new();

/// Run a `CREATE DATABASE` statement against the maintenance database. Each
/// test has its own runtime, so the admin pool lives only for this call.
async fn create_database(base_url: &str, statement: &str) -> Result<()> {
    let admin = PgPool::connect(&format!("{}/postgres", base_url)).await?;
    let created = sqlx::raw_sql(statement).execute(&admin).await;
    admin.close().await;
    created?;
    Ok(())
}

impl Container {
    async fn start() -> Result<Self> {
        // RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;
        let base_url = format!(
            "postgresql://postgres:postgres@{}:{}",
            postgres.get_host().await?,
            postgres.get_host_port_ipv4(5432).await?
        );

        create_database(&base_url, &format!("CREATE DATABASE {}", TEMPLATE_DB))
            .await
            .context("Failed to create template database")?;

        // The pool must be closed before the template can be copied
        let template = PgPool::connect(&format!("{}/{}", base_url, TEMPLATE_DB)).await?;
        sqlx::migrate!("./migrations")
            .run(&template)
            .await
            .context("Failed to run migrations")?;
        template.close().await;

        Ok(Self {
            base_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        CONTAINER
            .get_or_init(|| async {
                Self::start()
                    .await
                    .expect("Failed to start test database container")
            })
            .await
    }

    async fn fresh_database(&self) -> Result<PgPool> {
        let name = format!("test_{}", Uuid::now_v7().simple());

        let create = format!("CREATE DATABASE {} TEMPLATE {}", name, TEMPLATE_DB);
        create_database(&self.base_url, &create)
            .await
            .with_context(|| format!("Failed to create database {}", name))?;

        PgPool::connect(&format!("{}/{}", self.base_url, name))
            .await
            .context("Failed to connect to test database")
    }
}

/// A migrated, empty database for one test.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn stores_suppliers(ctx: &TestHarness) {
///     let store = ctx.store();
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let db_pool = Container::get().await.fresh_database().await?;
        Ok(Self { db_pool })
    }

    pub fn store(&self) -> procurement_core::kernel::PostgresStore {
        procurement_core::kernel::PostgresStore::new(self.db_pool.clone())
    }
}
