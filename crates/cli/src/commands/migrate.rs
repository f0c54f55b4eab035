//! `migrate` - apply pending database migrations.

use libro_reclamaciones_server::db;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;
    db::run_migrations(&pool).await?;
    println!("Migrations applied");
    Ok(())
}
