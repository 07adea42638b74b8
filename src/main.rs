use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_dotenv::dotenv::DotEnv;
use surrealdb::{Surreal, engine::any::Any};

mod config;
mod core;
mod error;
mod files;
mod fixtures;
mod ledger;
mod loader;
mod logging;
mod scaffold;
mod seed;
mod setup;
mod status;

use config::{DbCfg, SeedCfg, connect};
use loader::{count_documents, read_collection};
use seed::SeedOpts;
use setup::run_setup;
use status::status;

#[derive(Parser, Debug)]
#[command(version, about = "Reset SurrealDB collections to fixture data")]
pub struct Cli {
	/// Increase output
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Create database/fixtures with an example fixture file
	Init,
	/// Apply database/setup.surql and define the seed ledger
	Setup,
	/// Reset every fixture collection to its fixture data
	Seed {
		/// Only seed the named collection (repeatable)
		#[arg(long = "only", value_name = "COLLECTION")]
		only: Vec<String>,
		/// Ignore fixture files, seed built-in sets only
		#[arg(long)]
		no_files: bool,
		/// Validate and report without connecting
		#[arg(long)]
		dry_run: bool,
	},
	/// Reset one collection from a fixture file
	Load { path: PathBuf },
	/// List the available fixture sets
	List {
		#[arg(long)]
		no_files: bool,
	},
	/// Print the number of documents in a collection
	Count { collection: String },
	/// Print every document in a collection as JSON
	Dump { collection: String },
	/// Show what was last seeded into each collection
	Status,
}

fn load_env() -> DotEnv {
	// Load .env in CWD if present, ignore missing
	DotEnv::new("")
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Cli::parse();
	logging::init_cli_logger(args.verbose);

	match run(args.command).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			tracing::error!("{err:#}");
			ExitCode::FAILURE
		}
	}
}

async fn run(command: Commands) -> Result<()> {
	let env = load_env();
	let seed_cfg = SeedCfg::from_env(&env)?;

	match command {
		Commands::Init => scaffold::scaffold(Path::new("."))?,
		Commands::Setup => {
			let db = connect_from_env(&env).await?;
			run_setup(&db, &seed_cfg.setup_file).await?;
			println!("setup applied");
		}
		Commands::Seed {
			only,
			no_files,
			dry_run,
		} => {
			let opts = SeedOpts {
				only,
				include_files: !no_files,
				dry_run,
			};
			if dry_run {
				seed::seed(None, &seed_cfg, &opts).await?;
			} else {
				let db = connect_from_env(&env).await?;
				seed::seed(Some(&db), &seed_cfg, &opts).await?;
			}
		}
		Commands::Load { path } => {
			let db = connect_from_env(&env).await?;
			seed::load_file(&db, &seed_cfg, &path).await?;
		}
		Commands::List { no_files } => seed::list(&seed_cfg, !no_files)?,
		Commands::Count { collection } => {
			let db = connect_from_env(&env).await?;
			let n = count_documents(&db, &collection).await?;
			println!("{collection}: {n} record(s)");
		}
		Commands::Dump { collection } => {
			let db = connect_from_env(&env).await?;
			let rows = read_collection(&db, &collection).await?;
			println!("{}", serde_json::to_string_pretty(&rows)?);
		}
		Commands::Status => {
			let db = connect_from_env(&env).await?;
			status(&db).await?;
		}
	}

	Ok(())
}

async fn connect_from_env(env: &DotEnv) -> Result<Surreal<Any>> {
	let cfg = DbCfg::from_env(env);
	Ok(connect(&cfg).await?)
}
