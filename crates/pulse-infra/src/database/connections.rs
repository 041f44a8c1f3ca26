use std::time::Duration;

#[cfg(feature = "sqlite")]
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr, Schema};

/// Configuration for the post database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pulse.db?mode=rwc".to_string(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DatabaseConfig {
    /// A private in-memory database. Every SQLite connection to
    /// `:memory:` sees its own database, so the pool holds exactly one.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

/// Open the database and make sure the schema exists.
#[cfg(feature = "sqlite")]
pub async fn connect(config: &DatabaseConfig) -> Result<DbConn, DbErr> {
    tracing::info!(url = %config.url, "Opening post database");

    let max_connections = if config.is_in_memory() {
        1
    } else {
        config.max_connections
    };

    let opts = ConnectOptions::new(&config.url)
        .max_connections(max_connections)
        .min_connections(config.min_connections.min(max_connections))
        .connect_timeout(config.connect_timeout)
        .sqlx_logging(false)
        .to_owned();

    let db = Database::connect(opts).await?;
    ensure_schema(&db).await?;

    tracing::info!(pool = max_connections, "Post database ready");
    Ok(db)
}

/// Create the `posts` table and its indexes if they are missing.
#[cfg(feature = "sqlite")]
pub async fn ensure_schema(db: &DbConn) -> Result<(), DbErr> {
    use super::entity::post;

    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(post::Entity);
    db.execute(backend.build(table.if_not_exists())).await?;

    for mut index in schema.create_index_from_entity(post::Entity) {
        db.execute(backend.build(index.if_not_exists())).await?;
    }

    Ok(())
}
