use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use evently_server::cli_error::CliError;
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
    if dotenv_result.is_err() {
        warn!("Could not read .env file: {}", dotenv_result.unwrap_err());
    }

    if let Err(e) = run_command(args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => {
            evently_server::cli::database_migration::check_migration_state()?;
            evently_server::web::serve()
        }
        Command::MigrateDatabase => evently_server::cli::database_migration::run_migrations(),
        Command::CheckMigrations => {
            evently_server::cli::database_migration::check_migration_state()
        }
        Command::ListEvents => evently_server::cli::manage_events::print_event_list(),
        Command::PurgeEvent { event_id } => {
            evently_server::cli::manage_events::purge_event(event_id)
        }
        Command::ListUsers => evently_server::cli::manage_users::print_user_list(),
        Command::AddUser => evently_server::cli::manage_users::add_user(),
    }
}

/// Management interface and web server of the evently event directory
#[derive(Debug, Parser)]
#[clap(name = "evently-server", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the evently web API
    Serve,
    /// Apply pending database schema migrations
    MigrateDatabase,
    /// Check whether the database schema is up to date
    CheckMigrations,
    /// Print a table of all active events
    ListEvents,
    /// Permanently delete an event and its audit trail
    PurgeEvent {
        /// The numeric id of the event to purge
        event_id: i32,
    },
    /// Print a table of all user accounts
    ListUsers,
    /// Interactively create a new user account
    AddUser,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
