mod categorizer;
mod cli;
mod columns;
mod db;
mod error;
mod fmt;
mod importer;
mod ledger;
mod models;
mod reconciler;
mod reports;
mod rules;
mod session;
mod settings;
mod store;

use clap::Parser;

use cli::{Cli, Commands, RulesCommands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import {
            file,
            period,
            replace,
        } => cli::import::run(&file, period, replace),
        Commands::Rules { command } => match command {
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Sync { period } => cli::rules::sync(period),
        },
        Commands::Classify { period } => cli::classify::run(period),
        Commands::View { period, categories } => cli::view::run(period, categories),
        Commands::Edit { sets, dry_run } => cli::edit::run(&sets, dry_run),
        Commands::Report { period } => cli::report::run(period),
        Commands::Periods => cli::periods::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
