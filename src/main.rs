use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use barman_web::config::{self, AppConfig, DEFAULT_HOST, DEFAULT_PORT};
use barman_web::gateway::{BarmanGateway, CommandGateway};
use barman_web::models::AppState;
use barman_web::services::{ensure_admin_account, CredentialDirectory, JsonCredentialStore, ServerRegistry};
use clap::{Parser, Subcommand};
use comfy_table::{modifiers, presets, ContentArrangement, Table};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "barman-web",
    author,
    version,
    about = "Web dashboard for the barman backup tool",
    long_about = r#"barman-web serves a small administration dashboard on top of the barman command-line tool.

Every page runs `barman -f json <command>` (optionally behind a prefix such as `sudo -u barman`) and renders the result. Configuration comes from environment variables or a `.env` file; see `check-config`.

Examples:
  1) Run the dashboard:
      barman-web serve --host 0.0.0.0 --port 5555
  2) Validate the configuration and barman access:
      barman-web check-config --env-file /etc/barman-web.env
"#,
    after_help = "Use `barman-web <subcommand> --help` to get subcommand specific options."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Disable colorized output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Host to bind to
        #[arg(long, default_value_t = String::from(DEFAULT_HOST))]
        host: String,
        /// Port to bind to
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Path to .env file
        #[arg(long)]
        env_file: Option<String>,
    },
    /// Validate configuration and run `list-server` once
    #[command(
        about = "Validate configuration and barman access.",
        long_about = "Load and validate the configuration, then run `barman -f json list-server` with the configured prefix to confirm the dashboard can reach barman."
    )]
    CheckConfig {
        #[arg(long)]
        env_file: Option<String>,
    },
    /// Print the servers barman knows about
    Servers {
        #[arg(long)]
        env_file: Option<String>,
    },
    /// Inspect local accounts
    Users {
        #[command(subcommand)]
        sub: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    #[command(about = "List accounts", long_about = "List accounts stored in the credential file with their roles.")]
    List {
        #[arg(long)]
        env_file: Option<String>,
    },
}

fn load_config(env_file: Option<&str>) -> AppConfig {
    config::load_env_file(env_file);
    match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(%e, "Invalid configuration");
            eprintln!("{}: {}", yansi::Paint::red("Invalid configuration"), e);
            process::exit(1);
        }
    }
}

fn open_credentials(cfg: &AppConfig) -> Arc<JsonCredentialStore> {
    match JsonCredentialStore::open(&cfg.users_file) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(%e, "Failed to open credential file");
            eprintln!("{}: {}", yansi::Paint::red("Failed to open credential file"), e);
            process::exit(1);
        }
    }
}

async fn build_state(cfg: &AppConfig) -> AppState {
    let credentials = open_credentials(cfg);
    if let Err(e) = ensure_admin_account(credentials.as_ref(), &cfg.admin_username, &cfg.admin_password) {
        tracing::error!(%e, "Failed to create the bootstrap admin account");
        eprintln!("{}: {}", yansi::Paint::red("Failed to create the admin account"), e);
        process::exit(1);
    }

    let gateway: Arc<dyn CommandGateway> = Arc::new(BarmanGateway::from_config(cfg));
    let registry = Arc::new(ServerRegistry::new(gateway.clone()));
    // The dashboard still starts when barman is unreachable; the menu stays
    // empty until someone refreshes it.
    if let Err(e) = registry.refresh().await {
        tracing::warn!(%e, "Initial server list could not be loaded");
    }

    AppState::new(
        credentials,
        gateway,
        registry,
        cfg.app_name.clone(),
        cfg.session_ttl_hours,
    )
}

async fn start_server(state: AppState, host: &str, port: u16) {
    let addr: SocketAddr = match format!("{}:{}", host, port).parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(%e, "Invalid host/port format");
            eprintln!("{}: {}", yansi::Paint::red("Invalid host/port format"), e);
            process::exit(1);
        }
    };
    let app = barman_web::build_router(state);
    tracing::info!(%addr, "Starting barman-web server");
    println!(
        "{} {}",
        yansi::Paint::new("Web server running on").green(),
        yansi::Paint::new(format!("http://{}", addr)).cyan()
    );
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(%e, "Server encountered an error while running");
                eprintln!("{}: {}", yansi::Paint::new("Server error").red(), e);
                process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!(%e, "Failed to bind to address; is the port already in use?");
            eprintln!(
                "{}: {}\n{}",
                yansi::Paint::new(format!("Failed to bind to {}", addr)).red(),
                e,
                yansi::Paint::new("Stop the process using this port, or pass a different --port value.").yellow()
            );
            process::exit(1);
        }
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.no_color {
        yansi::whenever(yansi::Condition::NEVER);
    }

    // Serve the dashboard when no command is given
    let command = cli.command.unwrap_or(Commands::Serve {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
        env_file: None,
    });

    match command {
        Commands::Serve { host, port, env_file } => {
            let cfg = load_config(env_file.as_deref());
            let state = build_state(&cfg).await;
            start_server(state, &host, port).await;
        }
        Commands::CheckConfig { env_file } => {
            let cfg = load_config(env_file.as_deref());
            let gateway = BarmanGateway::from_config(&cfg);
            println!("barman command: {}", gateway.command_line("list-server", &[]).join(" "));
            let registry = ServerRegistry::new(Arc::new(gateway));
            match registry.refresh().await {
                Ok(count) => {
                    println!(
                        "{}",
                        yansi::Paint::new(format!("Configuration looks valid ({} servers reported)", count)).green()
                    );
                }
                Err(e) => {
                    eprintln!("{}: {}", yansi::Paint::new("barman could not be queried").red(), e);
                    process::exit(1);
                }
            }
        }
        Commands::Servers { env_file } => {
            let cfg = load_config(env_file.as_deref());
            let registry = ServerRegistry::new(Arc::new(BarmanGateway::from_config(&cfg)));
            if let Err(e) = registry.refresh().await {
                eprintln!("{}: {}", yansi::Paint::new("barman could not be queried").red(), e);
                process::exit(1);
            }
            let mut table = new_table();
            table.set_header(vec!["Server", "Description"]);
            for server in registry.current().iter() {
                table.add_row(vec![server.name.clone(), server.description.clone().unwrap_or_default()]);
            }
            println!("{table}");
        }
        Commands::Users { sub } => match sub {
            UserCommands::List { env_file } => {
                let cfg = load_config(env_file.as_deref());
                let store = open_credentials(&cfg);
                let accounts = match store.list_accounts() {
                    Ok(accounts) => accounts,
                    Err(e) => {
                        eprintln!("{}: {}", yansi::Paint::red("Failed to read accounts"), e);
                        process::exit(1);
                    }
                };
                let mut table = new_table();
                table.set_header(vec!["Username", "Active", "Roles", "Confirmed at"]);
                for (user, roles) in accounts {
                    let roles = roles.into_iter().map(|r| r.name).collect::<Vec<_>>().join(", ");
                    let confirmed = user
                        .email_confirmed_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                        .unwrap_or_default();
                    table.add_row(vec![user.username, user.active.to_string(), roles, confirmed]);
                }
                println!("{table}");
            }
        },
    }
}
