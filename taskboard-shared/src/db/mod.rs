/// Database layer for Taskboard
///
/// Each service owns a separate PostgreSQL database. There is no migration
/// runner: on start-up a service calls its model's `initialize`, which issues
/// `CREATE TABLE IF NOT EXISTS` for the one table it owns.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = create_pool(DatabaseConfig::from_env()?).await?;
///     Ok(())
/// }
/// ```

pub mod pool;
