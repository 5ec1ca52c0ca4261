use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use smartsni_panel::api::NewUser;
use smartsni_panel::cli::{self, OutputFormat, Reported};
use smartsni_panel::config::{self, schema::PanelConfig};
use smartsni_panel::dashboard::PasswordChange;

#[derive(Debug, Parser)]
#[command(name = "smartsni-panel")]
#[command(about = "Admin dashboard for the SmartSNI DoH/SNI proxy")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in to the panel and show the dashboard
    Login {
        #[arg(long, short)]
        username: Option<String>,
        /// Read from stdin when omitted
        #[arg(long, short)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Validate the stored session and show the dashboard once
    Status,
    /// Show the dashboard and keep refreshing metrics and health
    Watch {
        /// Stop after N refresh ticks
        #[arg(long)]
        ticks: Option<u32>,
    },
    /// Manage SNI domain mappings
    Domains {
        #[command(subcommand)]
        action: DomainsAction,
    },
    /// Manage proxy users
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Ask the proxy to reload its configuration
    Reload,
    /// Change the admin password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// Change the admin username (ends the session)
    Username {
        /// Current password
        #[arg(long)]
        password: String,
        #[arg(long = "new")]
        new_username: String,
    },
    /// Show admin actions recorded in the audit log
    History {
        /// Only include the last N days
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum DomainsAction {
    /// List configured domains
    List,
    /// Add a domain
    Add { domain: String },
    /// Remove a domain
    Remove { domain: String },
}

#[derive(Debug, Subcommand)]
enum UsersAction {
    /// List users
    List,
    /// Create a user and print its register link
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Maximum number of registered IPs (1-100)
        #[arg(long, default_value = "1")]
        max_ips: u32,
        /// Validity in days (1-365)
        #[arg(long, default_value = "30")]
        days: u32,
    },
    /// Extend a user's validity
    Extend {
        id: String,
        #[arg(long)]
        days: u32,
    },
    /// Deactivate a user
    Deactivate { id: String },
    /// Delete a user
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a config value, e.g. `panel.base_url http://10.0.0.1:8088`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

fn init_tracing(config: &PanelConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let app = App::parse();
    let config = config::load();
    init_tracing(&config);

    match run(app.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        // Already shown by the dashboard renderer.
        Err(e) if e.is::<Reported>() => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &PanelConfig) -> Result<()> {
    match command {
        Commands::Login { username, password } => cli::run_login(config, username, password),
        Commands::Logout => cli::run_logout(config),
        Commands::Status => cli::run_status(config),
        Commands::Watch { ticks } => cli::run_watch(config, ticks),
        Commands::Domains { action } => match action {
            DomainsAction::List => cli::run_domains_list(config),
            DomainsAction::Add { domain } => cli::run_domains_add(config, &domain),
            DomainsAction::Remove { domain } => cli::run_domains_remove(config, &domain),
        },
        Commands::Users { action } => match action {
            UsersAction::List => cli::run_users_list(config),
            UsersAction::Create {
                name,
                description,
                max_ips,
                days,
            } => cli::run_users_create(
                config,
                &NewUser {
                    name,
                    description,
                    max_ips,
                    valid_days: days,
                },
            ),
            UsersAction::Extend { id, days } => cli::run_users_extend(config, &id, days),
            UsersAction::Deactivate { id } => cli::run_users_deactivate(config, &id),
            UsersAction::Delete { id } => cli::run_users_delete(config, &id),
        },
        Commands::Reload => cli::run_reload(config),
        Commands::Password {
            current,
            new,
            confirm,
        } => cli::run_change_password(
            config,
            &PasswordChange {
                current,
                new,
                confirm,
            },
        ),
        Commands::Username {
            password,
            new_username,
        } => cli::run_change_username(config, &password, &new_username),
        Commands::History { days, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_history(config, fmt, days)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
