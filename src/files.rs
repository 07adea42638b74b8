use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::core::display;
use crate::loader::{Target, fingerprint};

/// On-disk shape of a fixture file, in either JSON or TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFileSpec {
	collection: Option<String>,
	key: Option<String>,
	#[serde(default)]
	records: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct FixtureFile {
	pub path: PathBuf,
	pub collection: String,
	pub key: Option<String>,
	pub records: Vec<Value>,
}

impl FixtureFile {
	pub fn target(&self, batch_size: usize) -> Target {
		let target = Target::new(&self.collection).with_batch_size(batch_size);
		match &self.key {
			Some(key) => target.unique_by(key),
			None => target,
		}
	}

	pub fn fingerprint(&self) -> Result<String> {
		fingerprint(&self.records).with_context(|| format!("hashing {}", display(&self.path)))
	}
}

pub fn collect_fixture_files(dir: &Path) -> Vec<PathBuf> {
	let mut files: Vec<PathBuf> = WalkDir::new(dir)
		.follow_links(true)
		.into_iter()
		.filter_map(|e| e.ok())
		.filter(|e| e.file_type().is_file())
		.map(|e| e.into_path())
		.filter(|p| matches!(extension(p), Some("json") | Some("toml")))
		.collect();
	files.sort();
	files
}

pub fn load_fixture_dir(dir: &Path) -> Result<Vec<FixtureFile>> {
	let fixtures = collect_fixture_files(dir)
		.iter()
		.map(|path| load_fixture_file(path))
		.collect::<Result<Vec<_>>>()?;

	for (i, fixture) in fixtures.iter().enumerate() {
		if let Some(other) = fixtures[..i]
			.iter()
			.find(|f| f.collection == fixture.collection)
		{
			bail!(
				"{} and {} both target collection `{}`",
				display(&other.path),
				display(&fixture.path),
				fixture.collection
			);
		}
	}
	Ok(fixtures)
}

pub fn load_fixture_file(path: &Path) -> Result<FixtureFile> {
	let raw = fs::read_to_string(path).with_context(|| format!("reading {}", display(path)))?;
	let spec: FixtureFileSpec = match extension(path) {
		Some("json") => {
			serde_json::from_str(&raw).with_context(|| format!("parsing {}", display(path)))?
		}
		Some("toml") => toml::from_str(&raw).with_context(|| format!("parsing {}", display(path)))?,
		_ => bail!("{} is not a .json or .toml fixture file", display(path)),
	};

	let collection = match spec.collection {
		Some(name) => name,
		None => path
			.file_stem()
			.and_then(|s| s.to_str())
			.map(str::to_string)
			.ok_or_else(|| anyhow!("cannot derive a collection name from {}", display(path)))?,
	};

	Ok(FixtureFile {
		path: path.to_path_buf(),
		collection,
		key: spec.key,
		records: spec.records,
	})
}

fn extension(path: &Path) -> Option<&str> {
	path.extension().and_then(|s| s.to_str())
}
