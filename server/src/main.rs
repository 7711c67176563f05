use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use ffw_checkin_server::cli_error::CliError;
use log::warn;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    let result: Result<(), CliError> = match args.command {
        Command::Serve => ffw_checkin_server::web::serve(),
        Command::ListSessions { all } => {
            ffw_checkin_server::cli::list_sessions::print_session_list(all)
        }
        Command::CheckBackend => ffw_checkin_server::cli::backend_status::check_backend(),
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

/// Kiosk and admin web front end for the fire brigade attendance system
#[derive(Debug, Parser)]
#[clap(name = "ffw-checkin", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the kiosk and admin web application
    Serve,
    /// Print the sessions known to the backend
    ListSessions {
        /// Include ended sessions
        #[clap(long)]
        all: bool,
    },
    /// Check that the backend is reachable and print its version
    CheckBackend,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
