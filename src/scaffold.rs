use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::core::display;

pub fn scaffold(root: &Path) -> Result<()> {
	let database_dir = root.join("database");
	let fixtures_dir = database_dir.join("fixtures");

	fs::create_dir_all(&fixtures_dir)
		.with_context(|| format!("creating {}", display(&fixtures_dir)))?;

	let example_path = fixtures_dir.join("auditoriums.json");
	if !example_path.exists() {
		fs::write(&example_path, EXAMPLE_FIXTURE)
			.with_context(|| format!("writing {}", display(&example_path)))?;
	}

	let setup_path = database_dir.join("setup.surql");
	if !setup_path.exists() {
		fs::write(&setup_path, DEFAULT_SETUP)
			.with_context(|| format!("writing {}", display(&setup_path)))?;
	}

	println!(
		"Scaffolded {}, {}, {}",
		display(&fixtures_dir),
		display(&example_path),
		display(&setup_path)
	);
	Ok(())
}

pub const DEFAULT_SETUP: &str = r#"---
--- Applied before every seed. Define the tables, fields and indexes
--- your fixtures rely on here.
---
DEFINE TABLE IF NOT EXISTS universities SCHEMALESS;
DEFINE TABLE IF NOT EXISTS courses SCHEMALESS;
"#;

const EXAMPLE_FIXTURE: &str = r#"{
  "key": "room_id",
  "records": [
    { "room_id": 101, "building": "A", "seats": 120, "equipment": ["projector", "microphone"] },
    { "room_id": 214, "building": "B", "seats": 24, "equipment": ["workstations"] }
  ]
}
"#;

#[cfg(test)]
mod tests {
	use super::*;
	use crate::files::load_fixture_dir;

	#[test]
	fn scaffold_creates_loadable_fixture_dir() {
		let tmp = tempfile::tempdir().expect("tempdir");
		scaffold(tmp.path()).expect("scaffold");

		let fixtures = load_fixture_dir(&tmp.path().join("database/fixtures")).expect("loads");
		assert_eq!(fixtures.len(), 1);
		assert_eq!(fixtures[0].collection, "auditoriums");
		assert_eq!(fixtures[0].records.len(), 2);
		assert!(tmp.path().join("database/setup.surql").exists());
	}

	#[test]
	fn scaffold_keeps_existing_files() {
		let tmp = tempfile::tempdir().expect("tempdir");
		let setup = tmp.path().join("database/setup.surql");
		fs::create_dir_all(setup.parent().expect("parent")).expect("mkdir");
		fs::write(&setup, "-- mine\n").expect("write");

		scaffold(tmp.path()).expect("scaffold");
		assert_eq!(fs::read_to_string(&setup).expect("read"), "-- mine\n");
	}
}
