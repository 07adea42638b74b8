//! Built-in fixture data and the record types it is made of.

mod courses;
mod universities;

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use surrealdb::{Surreal, engine::any::Any};

use crate::error::{Result, SeedError};
use crate::loader::{Target, fingerprint, reset_collection};

pub use courses::courses;
pub use universities::universities;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
	pub university_id: i64,
	pub name: String,
	#[serde(default)]
	pub institutes: Vec<Institute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institute {
	pub institute_id: i64,
	pub name: String,
	#[serde(default)]
	pub departments: Vec<Department>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
	pub department_id: i64,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub head: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
	pub course_id: i64,
	pub title: String,
	pub department: String,
	pub tech_requirements: String,
	#[serde(default)]
	pub program: Vec<ProgramModule>,
	#[serde(default)]
	pub semester_plan: Vec<SemesterWeek>,
	#[serde(default)]
	pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramModule {
	pub module: String,
	#[serde(default)]
	pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterWeek {
	pub week: u32,
	pub topic: String,
	pub hours: u32,
}

/// A data set compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureSet {
	Universities,
	Courses,
}

impl FixtureSet {
	pub const ALL: [FixtureSet; 2] = [FixtureSet::Universities, FixtureSet::Courses];

	pub fn collection(self) -> &'static str {
		match self {
			Self::Universities => "universities",
			Self::Courses => "courses",
		}
	}

	pub fn key(self) -> &'static str {
		match self {
			Self::Universities => "university_id",
			Self::Courses => "course_id",
		}
	}

	pub fn target(self, batch_size: usize) -> Target {
		Target::new(self.collection())
			.unique_by(self.key())
			.with_batch_size(batch_size)
	}

	pub fn len(self) -> usize {
		match self {
			Self::Universities => universities().len(),
			Self::Courses => courses().len(),
		}
	}

	/// Checks the invariants a flat key check cannot see.
	pub fn validate(self) -> Result<()> {
		match self {
			Self::Universities => check_nested_ids(&universities()),
			Self::Courses => Ok(()),
		}
	}

	pub fn fingerprint(self) -> std::result::Result<String, serde_json::Error> {
		match self {
			Self::Universities => fingerprint(&universities()),
			Self::Courses => fingerprint(&courses()),
		}
	}

	pub async fn load(self, db: &Surreal<Any>, batch_size: usize) -> Result<usize> {
		self.validate()?;
		let target = self.target(batch_size);
		match self {
			Self::Universities => reset_collection(db, &target, &universities()).await,
			Self::Courses => reset_collection(db, &target, &courses()).await,
		}
	}
}

/// Institute and department ids must be unique across every university, not
/// just within their parent.
pub fn check_nested_ids(universities: &[University]) -> Result<()> {
	let mut institutes: HashMap<i64, i64> = HashMap::new();
	let mut departments: HashMap<i64, i64> = HashMap::new();

	for university in universities {
		for institute in &university.institutes {
			if let Some(owner) = institutes.insert(institute.institute_id, university.university_id) {
				return Err(nested_duplicate(
					"institute_id",
					institute.institute_id,
					format!("universities {owner} and {}", university.university_id),
				));
			}
			for department in &institute.departments {
				if let Some(owner) = departments.insert(department.department_id, institute.institute_id)
				{
					return Err(nested_duplicate(
						"department_id",
						department.department_id,
						format!("institutes {owner} and {}", institute.institute_id),
					));
				}
			}
		}
	}
	Ok(())
}

fn nested_duplicate(key: &str, id: i64, owners: String) -> SeedError {
	SeedError::DuplicateKey {
		collection: FixtureSet::Universities.collection().to_string(),
		key: key.to_string(),
		details: format!("{key} = {id} appears under {owners}"),
	}
}
