use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trellis_cli::{commands, CliResource, SessionOptions};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[arg(long, global = true, env = "TRELLIS_API_BASE", default_value = trellis_config::DEFAULT_API_BASE)]
    api_base: String,
    #[arg(long, global = true, env = "TRELLIS_COOKIE", help = "Cookie header to read the CSRF token from")]
    cookie: Option<String>,
    #[arg(long, global = true, env = trellis_config::SESSION_DIR_ENV, help = "Persist the store snapshot in this directory")]
    session_dir: Option<Utf8PathBuf>,
    #[arg(long, global = true, env = trellis_config::SESSION_ID_ENV, help = "Resume the session with this id")]
    session: Option<String>,
    #[arg(long, global = true, env = trellis_config::SESSIONS_ROOT_ENV, help = "Directory holding one folder per session id")]
    sessions_root: Option<Utf8PathBuf>,
    #[arg(long, global = true, help = "Redirect anonymous visitors away from protected routes")]
    enforce_auth: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the route table
    Routes,
    /// Navigate through one or more paths and print the resulting metadata
    Navigate {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Load resources from the backend into the store
    Load {
        #[arg(required = true, value_enum)]
        resources: Vec<CliResource>,
    },
    /// Submit a workflow JSON file as a new run
    SubmitRun { workflow: Utf8PathBuf },
    /// Print the snapshot stored in the session directory
    Snapshot,
    /// Create a new session and print its id
    NewSession,
    /// Log out and delete the stored session
    EndSession,
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let opts = SessionOptions {
        api_base: cli.api_base,
        cookie: cli.cookie,
        session_dir: cli.session_dir,
        session: cli.session,
        sessions_root: cli.sessions_root,
        enforce_auth: cli.enforce_auth,
    };

    match cli.command {
        Commands::Routes => commands::cmd_routes()?,
        Commands::Navigate { paths } => {
            commands::cmd_navigate(&paths, &opts)?;
        }
        Commands::Load { resources } => {
            commands::cmd_load(&resources, &opts).await?;
        }
        Commands::SubmitRun { workflow } => {
            commands::cmd_submit_run(&workflow, &opts).await?;
        }
        Commands::Snapshot => {
            let storage = commands::session_storage(&opts)?.ok_or_else(|| {
                anyhow::anyhow!("--session or --session-dir is required for snapshot")
            })?;
            commands::cmd_snapshot(storage.dir())?;
        }
        Commands::NewSession => {
            commands::cmd_new_session(&opts)?;
        }
        Commands::EndSession => commands::cmd_end_session(&opts)?,
    }

    Ok(())
}
