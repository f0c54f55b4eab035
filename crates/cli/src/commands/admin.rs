//! `create-admin` - provision an admin panel account.

use clap::Args;
use libro_reclamaciones_core::{AdminRole, Email};
use libro_reclamaciones_server::db::AdminUserRepository;

#[derive(Args)]
pub struct CreateAdminArgs {
    /// Login username
    #[arg(long)]
    pub username: String,

    /// Account email address
    #[arg(long)]
    pub email: String,

    /// Plaintext password; hashed with bcrypt before storage
    #[arg(long)]
    pub password: String,

    /// Display name
    #[arg(long)]
    pub full_name: Option<String>,

    /// Role: super_admin, admin, or viewer
    #[arg(long, default_value = "admin")]
    pub role: String,
}

pub async fn run(args: CreateAdminArgs) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(&args.email)?;
    let role = args.role.parse::<AdminRole>()?;
    if args.password.len() < 8 {
        return Err("password must be at least 8 characters".into());
    }

    let password_hash = bcrypt::hash(&args.password, bcrypt::DEFAULT_COST)?;

    let pool = super::connect().await?;
    let id = AdminUserRepository::new(&pool)
        .create(
            &args.username,
            &email,
            &password_hash,
            args.full_name.as_deref(),
            role,
        )
        .await?;

    println!("Created admin user {} (id {id})", args.username);
    Ok(())
}
