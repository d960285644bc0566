//! User Service - operator CLI for user management.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use domain::{Login, User};
use user_service_lib::config::UserServiceConfig;

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "User management service")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user
    Create {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        postal_code: Option<i16>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Plaintext password, hashed before storage
        #[arg(long)]
        password: Option<String>,
    },
    /// Get a user by ID
    Get { id: String },
    /// List all users
    List,
    /// Replace a user with the JSON record in a file
    Update {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Delete a user by ID
    Delete { id: String },
    /// Verify an email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "USER_SERVICE_LOGIN_PASSWORD")]
        password: String,
    },
    /// Check that MongoDB answers
    Ping,
    /// Print service name, version and host
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = UserServiceConfig::load();

    // Initialize tracing
    let default_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.service.log_level.clone()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Version => print_json(&user_service_lib::service_info(&config))?,
        Commands::Ping => {
            user_service_lib::ping(&config.mongo).await?;
            print_json(&serde_json::json!({ "ok": true }))?;
        }
        command => run(command, &config).await?,
    }

    Ok(())
}

async fn run(command: Commands, config: &UserServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = user_service_lib::build_service(config).await?;

    match command {
        Commands::Create {
            first_name,
            last_name,
            address,
            postal_code,
            city,
            email,
            phone,
            password,
        } => {
            let user = User {
                first_name,
                last_name,
                address,
                postal_code,
                city,
                email_address: email,
                phone_number: phone,
                password,
                ..Default::default()
            };
            print_json(&service.create_user(user).await?)?;
        }
        Commands::Get { id } => match service.get_user(&id).await? {
            Some(user) => print_json(&user)?,
            None => return Err(format!("User {} not found", id).into()),
        },
        Commands::List => print_json(&service.list_users().await?)?,
        Commands::Update { id, file } => {
            let content = std::fs::read_to_string(&file)?;
            let user: User = serde_json::from_str(&content)?;
            match service.update_user(&id, user).await? {
                Some(user) => print_json(&user)?,
                None => return Err(format!("User {} not found", id).into()),
            }
        }
        Commands::Delete { id } => {
            let deleted = service.delete_user(&id).await?;
            print_json(&serde_json::json!({ "deleted": deleted }))?;
        }
        Commands::Login { email, password } => {
            let result = service.login(&Login::new(email, password)).await?;
            print_json(&result)?;
        }
        Commands::Ping | Commands::Version => {}
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
