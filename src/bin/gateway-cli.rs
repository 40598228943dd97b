use std::path::PathBuf;
use std::process::ExitCode;

use auth_gateway::auth::token::{mint, TokenSpec};
use auth_gateway::config::load_or_default;
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator tooling for the authentication gateway", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a development token signed with the configured secret
    Token {
        /// Subject (username)
        #[arg(long)]
        sub: String,
        #[arg(long)]
        user_id: Option<Uuid>,
        #[arg(long)]
        organization_id: Option<Uuid>,
        #[arg(long)]
        department_id: Option<Uuid>,
        #[arg(long)]
        team_id: Option<Uuid>,
        /// Repeatable
        #[arg(long = "authority")]
        authorities: Vec<String>,
        /// Repeatable
        #[arg(long = "role")]
        roles: Vec<String>,
    },
    /// Load and validate the configuration, then print it
    CheckConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Token {
            sub,
            user_id,
            organization_id,
            department_id,
            team_id,
            authorities,
            roles,
        } => {
            let spec = TokenSpec {
                subject: sub,
                user_id,
                organization_id,
                department_id,
                team_id,
                authorities,
                roles,
            };
            match mint(&config.jwt, &spec) {
                Ok(token) => println!("{}", token),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        Commands::CheckConfig => {
            let mut shown = config.clone();
            shown.jwt.secret = "<redacted>".into();
            match toml::to_string_pretty(&shown) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            eprintln!("Configuration OK");
        }
    }

    ExitCode::SUCCESS
}
