use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;

use coverage_api::{
    config,
    db::{self, DbPool},
    migrator::Migrator,
    repositories::UserRepository,
    services::{CredentialService, CredentialStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;

    let outcome = match cli.command {
        Commands::Migrate(command) => handle_migrate_command(&pool, command, cli.json).await,
        Commands::Users(command) => handle_users_command(&pool, command, cli.json).await,
    };

    db::close_pool(pool)
        .await
        .context("failed to close the database pool")?;
    outcome
}

#[derive(Parser)]
#[command(
    name = "coverage-cli",
    about = "Operator tooling for the coverage API database",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Migrate(MigrateCommands),
    #[command(subcommand)]
    Users(UsersCommands),
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Apply pending migrations
    Up(StepsArgs),
    /// Roll back applied migrations
    Down(StepsArgs),
    /// List applied and pending migrations
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

#[derive(Args)]
struct StepsArgs {
    #[arg(long, help = "Number of migrations to apply or roll back (default: all for up, 1 for down)")]
    steps: Option<u32>,
}

#[derive(Subcommand)]
enum UsersCommands {
    Create(UserCreateArgs),
}

#[derive(Args)]
struct UserCreateArgs {
    #[arg(long, help = "Login name, unique and case-sensitive")]
    username: String,
    #[arg(long, help = "Plain-text password; stored as an argon2 hash")]
    password: String,
    #[arg(long, help = "Role label stored with the user")]
    role: String,
}

#[derive(Serialize)]
struct MigrationReport {
    action: &'static str,
    pending: Vec<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn pending_names(pool: &DbPool) -> Result<Vec<String>> {
    let pending = Migrator::get_pending_migrations(pool)
        .await
        .context("failed to read migration state")?;
    Ok(pending.iter().map(|m| m.name().to_string()).collect())
}

async fn handle_migrate_command(pool: &DbPool, command: MigrateCommands, json: bool) -> Result<()> {
    let action = match command {
        MigrateCommands::Up(args) => {
            Migrator::up(pool, args.steps).await.context("migration up failed")?;
            "up"
        }
        MigrateCommands::Down(args) => {
            Migrator::down(pool, Some(args.steps.unwrap_or(1)))
                .await
                .context("migration down failed")?;
            "down"
        }
        MigrateCommands::Status => {
            Migrator::status(pool).await.context("migration status failed")?;
            "status"
        }
        MigrateCommands::Fresh => {
            Migrator::fresh(pool).await.context("migration fresh failed")?;
            "fresh"
        }
    };

    let report = MigrationReport {
        action,
        pending: pending_names(pool).await?,
    };
    if json {
        print_json(&report)?;
    } else if report.pending.is_empty() {
        println!("migrate {}: schema is up to date", report.action);
    } else {
        println!(
            "migrate {}: {} pending ({})",
            report.action,
            report.pending.len(),
            report.pending.join(", ")
        );
    }
    Ok(())
}

async fn handle_users_command(pool: &DbPool, command: UsersCommands, json: bool) -> Result<()> {
    match command {
        UsersCommands::Create(args) => {
            let store = CredentialService::new(UserRepository::new(Arc::new(pool.clone())));
            let user = store
                .create_if_absent(&args.username, &args.password, &args.role)
                .await
                .context("failed to create user")?;

            if json {
                print_json(&user)?;
            } else {
                println!("User {} created with role {}", user.username, user.role);
            }
        }
    }
    Ok(())
}
