use anyhow::{Context, Result};
use std::{fs, path::Path};
use surrealdb::{Surreal, engine::any::Any};

use crate::core::{display, exec_surql};
use crate::scaffold::DEFAULT_SETUP;

/// Applies the project's setup file, creating it first if missing, then makes
/// sure the ledger table exists.
pub async fn run_setup(db: &Surreal<Any>, setup_file: &Path) -> Result<()> {
	if !setup_file.exists() {
		if let Some(parent) = setup_file.parent() {
			fs::create_dir_all(parent).context("creating setup file directory")?;
		}

		fs::write(setup_file, DEFAULT_SETUP)
			.with_context(|| format!("writing {}", display(setup_file)))?;
	}

	let sql = fs::read_to_string(setup_file)
		.with_context(|| format!("reading {}", display(setup_file)))?;

	exec_surql(db, &sql)
		.await
		.with_context(|| format!("applying {}", display(setup_file)))?;
	ensure_ledger(db).await
}

pub async fn ensure_ledger(db: &Surreal<Any>) -> Result<()> {
	exec_surql(db, LEDGER_SETUP)
		.await
		.context("defining _seed_ledger")
}

const LEDGER_SETUP: &str = r#"
DEFINE TABLE OVERWRITE _seed_ledger SCHEMAFULL
	PERMISSIONS NONE;

DEFINE FIELD OVERWRITE collection ON _seed_ledger
	TYPE string;

DEFINE FIELD OVERWRITE hash ON _seed_ledger
	TYPE string;

DEFINE FIELD OVERWRITE records ON _seed_ledger
	TYPE int;

DEFINE FIELD OVERWRITE seeded_at ON _seed_ledger
	TYPE string;

DEFINE INDEX OVERWRITE by_collection ON _seed_ledger
	FIELDS collection
	UNIQUE;
"#;
