//! Operator commands that run against the configured database and catalog
//! without starting the HTTP server.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinemax_api::{
    config::Config,
    services::auth::{self, AdminProvision},
    AppState,
};

#[derive(Parser)]
#[command(name = "cinemax-admin")]
#[command(about = "CineMax maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an admin account, or promote the existing user with this email
    CreateAdmin {
        email: String,
        password: String,
        first_name: Option<String>,
        last_name: Option<String>,
    },
    /// Give an existing user the admin role
    MakeAdmin { email: String },
    /// Import movies from TMDB into the catalog file
    FetchMovies {
        /// Keep the current catalog and only add movies it does not have yet
        #[arg(long, default_value_t = false)]
        append: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::new(config).await.context("failed to open database")?;

    match cli.command {
        Commands::CreateAdmin { email, password, first_name, last_name } => {
            let (user, how) =
                auth::ensure_admin(&state.db.pool, &email, &password, first_name.as_deref(), last_name.as_deref())
                    .await?;
            match how {
                AdminProvision::Created => println!("Created admin user {} (id {})", user.email, user.id),
                AdminProvision::Promoted => println!("User {} already existed and is now an admin", user.email),
            }
        }
        Commands::MakeAdmin { email } => {
            let user = auth::promote_to_admin(&state.db.pool, &email).await?;
            println!("User {} is now an admin", user.email);
        }
        Commands::FetchMovies { append } => {
            let summary = state.tmdb.import(&state.catalog, append).await?;
            println!(
                "Imported {} movies ({} failed); catalog {} now holds {}",
                summary.success,
                summary.failed,
                state.catalog.path().display(),
                summary.movies
            );
        }
    }
    Ok(())
}
