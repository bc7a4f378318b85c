use crate::entities::{leads, status_history, users};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::env;
use std::time::Duration;
use tracing::info;

pub async fn setup_database() -> anyhow::Result<DatabaseConnection> {
    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://leads.db?mode=rwc".to_string());

    info!("📂 Database: {}", db_url);

    let mut opt = ConnectOptions::new(&db_url);
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    run_migrations(&db).await?;
    crate::infrastructure::seed::seed_initial_data(&db).await?;

    Ok(db)
}

/// Create the schema from the entity definitions. Safe to run repeatedly.
pub async fn run_migrations(db: &DatabaseConnection) -> anyhow::Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmts = vec![
        schema
            .create_table_from_entity(users::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(leads::Entity)
            .if_not_exists()
            .to_owned(),
        schema
            .create_table_from_entity(status_history::Entity)
            .if_not_exists()
            .to_owned(),
    ];

    for stmt in stmts {
        let stmt = builder.build(&stmt);
        let _ = db.execute(stmt).await;
    }

    // Triage queries filter on these constantly
    let _ = db
        .execute(sea_orm::Statement::from_string(
            builder,
            "CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status);".to_string(),
        ))
        .await;
    let _ = db
        .execute(sea_orm::Statement::from_string(
            builder,
            "CREATE INDEX IF NOT EXISTS idx_status_history_lead_id ON status_history(lead_id);"
                .to_string(),
        ))
        .await;

    Ok(())
}
