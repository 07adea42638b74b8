use std::path::Path;

use anyhow::{Context, Result, bail};
use surrealdb::{Surreal, engine::any::Any};
use tracing::{info, warn};

use crate::config::SeedCfg;
use crate::core::display;
use crate::files::{FixtureFile, load_fixture_dir, load_fixture_file};
use crate::fixtures::FixtureSet;
use crate::ledger::{last_hash, record_seed};
use crate::loader::{reset_collection, validate_records};
use crate::setup::{ensure_ledger, run_setup};

#[derive(Debug, Clone, Default)]
pub struct SeedOpts {
	pub only: Vec<String>,
	pub include_files: bool,
	pub dry_run: bool,
}

/// One collection's worth of fixture data, wherever it came from.
#[derive(Debug, Clone)]
pub enum Source {
	Builtin(FixtureSet),
	File(FixtureFile),
}

impl Source {
	pub fn collection(&self) -> &str {
		match self {
			Self::Builtin(set) => set.collection(),
			Self::File(file) => file.collection.as_str(),
		}
	}

	pub fn origin(&self) -> String {
		match self {
			Self::Builtin(_) => "built-in".to_string(),
			Self::File(file) => display(&file.path),
		}
	}

	pub fn len(&self) -> usize {
		match self {
			Self::Builtin(set) => set.len(),
			Self::File(file) => file.records.len(),
		}
	}

	pub fn fingerprint(&self) -> Result<String> {
		match self {
			Self::Builtin(set) => set
				.fingerprint()
				.with_context(|| format!("hashing built-in {}", set.collection())),
			Self::File(file) => file.fingerprint(),
		}
	}

	/// Checks everything that can be checked without a database.
	pub fn validate(&self, batch_size: usize) -> Result<usize> {
		let checked = match self {
			Self::Builtin(set) => set.validate().map(|()| set.len()),
			Self::File(file) => validate_records(&file.target(batch_size), &file.records),
		};
		checked.with_context(|| format!("validating {} ({})", self.collection(), self.origin()))
	}

	pub async fn load(&self, db: &Surreal<Any>, batch_size: usize) -> Result<usize> {
		let loaded = match self {
			Self::Builtin(set) => set.load(db, batch_size).await,
			Self::File(file) => reset_collection(db, &file.target(batch_size), &file.records).await,
		};
		loaded.with_context(|| format!("seeding {} ({})", self.collection(), self.origin()))
	}
}

/// Resolves which collections a seed run touches. Fixture files override
/// built-in sets that target the same collection.
pub fn plan(cfg: &SeedCfg, opts: &SeedOpts) -> Result<Vec<Source>> {
	let mut sources: Vec<Source> = FixtureSet::ALL.into_iter().map(Source::Builtin).collect();

	if opts.include_files {
		for file in load_fixture_dir(&cfg.fixtures_dir)? {
			if let Some(slot) = sources
				.iter_mut()
				.find(|s| s.collection() == file.collection)
			{
				let shown = display(&file.path);
				warn!(
					collection = %file.collection,
					file = %shown,
					"fixture file replaces built-in set"
				);
				*slot = Source::File(file);
			} else {
				sources.push(Source::File(file));
			}
		}
	}

	if opts.only.is_empty() {
		return Ok(sources);
	}

	for name in &opts.only {
		if !sources.iter().any(|s| s.collection() == name.as_str()) {
			bail!("no fixture set named `{name}`");
		}
	}
	sources.retain(|s| opts.only.iter().any(|name| name.as_str() == s.collection()));
	Ok(sources)
}

pub async fn seed(db: Option<&Surreal<Any>>, cfg: &SeedCfg, opts: &SeedOpts) -> Result<()> {
	let sources = plan(cfg, opts)?;
	if sources.is_empty() {
		println!("No fixture sets to seed");
		return Ok(());
	}

	if opts.dry_run {
		for source in &sources {
			let n = source.validate(cfg.batch_size)?;
			println!(
				"DRY RUN: would reset {} with {} record(s) from {}",
				source.collection(),
				n,
				source.origin()
			);
		}
		return Ok(());
	}

	let Some(db) = db else {
		bail!("a database connection is required unless --dry-run is set");
	};

	prepare(db, &cfg.setup_file).await?;
	for source in &sources {
		seed_source(db, source, cfg.batch_size).await?;
	}
	Ok(())
}

pub async fn load_file(db: &Surreal<Any>, cfg: &SeedCfg, path: &Path) -> Result<()> {
	let file = load_fixture_file(path)?;
	prepare(db, &cfg.setup_file).await?;
	seed_source(db, &Source::File(file), cfg.batch_size).await?;
	Ok(())
}

/// Prints the available fixture sets without touching a database.
pub fn list(cfg: &SeedCfg, include_files: bool) -> Result<()> {
	let opts = SeedOpts {
		include_files,
		..SeedOpts::default()
	};
	for source in plan(cfg, &opts)? {
		println!(
			"{} {} record(s) ({})",
			source.collection(),
			source.len(),
			source.origin()
		);
	}
	Ok(())
}

async fn prepare(db: &Surreal<Any>, setup_file: &Path) -> Result<()> {
	if setup_file.exists() {
		run_setup(db, setup_file).await
	} else {
		ensure_ledger(db).await
	}
}

async fn seed_source(db: &Surreal<Any>, source: &Source, batch_size: usize) -> Result<usize> {
	let collection = source.collection();
	let hash = source.fingerprint()?;
	let previous = last_hash(db, collection).await?;

	let count = source.load(db, batch_size).await?;
	if count != source.len() {
		warn!(
			collection,
			expected = source.len(),
			actual = count,
			"document count differs from fixture size"
		);
	}

	record_seed(db, collection, &hash, count)
		.await
		.with_context(|| format!("recording seed of {collection}"))?;

	let unchanged = previous.as_deref() == Some(hash.as_str());
	info!(collection, count, unchanged, "seeded");
	println!(
		"seeded {collection}: {count} record(s){}",
		if unchanged { " (content unchanged)" } else { "" }
	);
	Ok(count)
}
