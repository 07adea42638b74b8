use std::path::PathBuf;

use anyhow::{Result, bail};
use rust_dotenv::dotenv::DotEnv;
use surrealdb::{Surreal, engine::any::Any, opt::auth::Root};
use tracing::debug;

use crate::core::create_surreal_client;
use crate::error::SeedError;

pub const DEFAULT_FIXTURES_DIR: &str = "database/fixtures";
pub const DEFAULT_SETUP_FILE: &str = "database/setup.surql";
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct DbCfg {
	host: String,
	ns: String,
	db: String,
	user: String,
	pass: String,
}

impl DbCfg {
	pub fn from_env(env: &DotEnv) -> Self {
		Self::from_lookup(|key| env.get_var(key.to_string()))
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

		Self {
			host: var("PUBLIC_DATABASE_HOST", "http://localhost:8000"),
			ns: var("PUBLIC_DATABASE_NAMESPACE", "db"),
			db: var("PUBLIC_DATABASE_NAME", "test"),
			user: var("DATABASE_USER", "root"),
			pass: var("DATABASE_PASSWORD", "root"),
		}
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn ns(&self) -> &str {
		&self.ns
	}

	pub fn db(&self) -> &str {
		&self.db
	}

	/// Embedded in-memory stores have no users to sign in as.
	pub fn requires_signin(&self) -> bool {
		!self.host.starts_with("mem://")
	}
}

#[derive(Debug, Clone)]
pub struct SeedCfg {
	pub fixtures_dir: PathBuf,
	pub setup_file: PathBuf,
	pub batch_size: usize,
}

impl SeedCfg {
	pub fn from_env(env: &DotEnv) -> Result<Self> {
		Self::from_lookup(|key| env.get_var(key.to_string()))
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let fixtures_dir = lookup("SEEDKIT_FIXTURES_DIR")
			.filter(|dir| !dir.trim().is_empty())
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURES_DIR));
		let setup_file = lookup("SEEDKIT_SETUP_FILE")
			.filter(|file| !file.trim().is_empty())
			.map(PathBuf::from)
			.unwrap_or_else(|| PathBuf::from(DEFAULT_SETUP_FILE));

		let batch_size = match lookup("SEEDKIT_BATCH_SIZE") {
			None => DEFAULT_BATCH_SIZE,
			Some(raw) => match raw.trim().parse::<usize>() {
				Ok(n) if n > 0 => n,
				_ => bail!("SEEDKIT_BATCH_SIZE must be a positive integer, got '{raw}'"),
			},
		};

		Ok(Self {
			fixtures_dir,
			setup_file,
			batch_size,
		})
	}
}

pub async fn connect(cfg: &DbCfg) -> Result<Surreal<Any>, SeedError> {
	let unreachable = |err: surrealdb::Error| SeedError::Connection {
		target: cfg.host.clone(),
		message: err.to_string(),
	};

	let db = create_surreal_client(&cfg.host).await.map_err(unreachable)?;

	if cfg.requires_signin() {
		db.signin(Root {
			username: cfg.user.to_string(),
			password: cfg.pass.to_string(),
		})
		.await
		.map_err(|err| SeedError::Connection {
			target: cfg.host.clone(),
			message: format!("signin failed: {err}"),
		})?;
	}

	db.use_ns(&cfg.ns)
		.use_db(&cfg.db)
		.await
		.map_err(|err| SeedError::Connection {
			target: cfg.host.clone(),
			message: format!("use_ns/use_db failed for ns={} db={}: {err}", cfg.ns, cfg.db),
		})?;

	debug!(host = cfg.host(), ns = cfg.ns(), db = cfg.db(), "connected");
	Ok(db)
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn db_cfg_falls_back_to_defaults() {
		let cfg = DbCfg::from_lookup(lookup(&[]));
		assert_eq!(cfg.host(), "http://localhost:8000");
		assert_eq!(cfg.ns(), "db");
		assert_eq!(cfg.db(), "test");
		assert!(cfg.requires_signin());
	}

	#[test]
	fn db_cfg_reads_overrides() {
		let cfg = DbCfg::from_lookup(lookup(&[
			("PUBLIC_DATABASE_HOST", "mem://"),
			("PUBLIC_DATABASE_NAMESPACE", "campus"),
			("PUBLIC_DATABASE_NAME", "university"),
		]));
		assert_eq!(cfg.host(), "mem://");
		assert_eq!(cfg.ns(), "campus");
		assert_eq!(cfg.db(), "university");
		assert!(!cfg.requires_signin());
	}

	#[test]
	fn seed_cfg_parses_batch_size() {
		let cfg = SeedCfg::from_lookup(lookup(&[])).expect("defaults are valid");
		assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
		assert_eq!(cfg.fixtures_dir, PathBuf::from(DEFAULT_FIXTURES_DIR));
		assert_eq!(cfg.setup_file, PathBuf::from(DEFAULT_SETUP_FILE));

		let cfg = SeedCfg::from_lookup(lookup(&[
			("SEEDKIT_BATCH_SIZE", " 25 "),
			("SEEDKIT_FIXTURES_DIR", "seed/data"),
		]))
		.expect("overrides are valid");
		assert_eq!(cfg.batch_size, 25);
		assert_eq!(cfg.fixtures_dir, PathBuf::from("seed/data"));
	}

	#[test]
	fn seed_cfg_rejects_bad_batch_size() {
		assert!(SeedCfg::from_lookup(lookup(&[("SEEDKIT_BATCH_SIZE", "0")])).is_err());
		assert!(SeedCfg::from_lookup(lookup(&[("SEEDKIT_BATCH_SIZE", "many")])).is_err());
	}

	#[tokio::test]
	async fn unknown_scheme_is_a_connection_error() {
		let cfg = DbCfg::from_lookup(lookup(&[("PUBLIC_DATABASE_HOST", "bogus://nowhere")]));
		match connect(&cfg).await {
			Err(SeedError::Connection { target, .. }) => assert_eq!(target, "bogus://nowhere"),
			Err(other) => panic!("expected connection error, got {other:?}"),
			Ok(_) => panic!("scheme is not supported"),
		}
	}

	#[tokio::test]
	async fn connects_to_memory_store() {
		let cfg = DbCfg::from_lookup(lookup(&[("PUBLIC_DATABASE_HOST", "mem://")]));
		connect(&cfg).await.expect("in-memory store is available in tests");
	}
}
