use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
	#[error("cannot reach database at {target}: {message}")]
	Connection { target: String, message: String },

	#[error("duplicate {key} in `{collection}`: {details}")]
	DuplicateKey {
		collection: String,
		key: String,
		details: String,
	},

	#[error("invalid fixture for `{collection}`{}: {message}", record_suffix(.index))]
	Validation {
		collection: String,
		index: Option<usize>,
		message: String,
	},

	#[error("{operation} failed on `{collection}`: {source}")]
	Store {
		collection: String,
		operation: &'static str,
		#[source]
		source: surrealdb::Error,
	},
}

pub type Result<T> = std::result::Result<T, SeedError>;

impl SeedError {
	pub fn validation(collection: &str, index: Option<usize>, message: impl Into<String>) -> Self {
		Self::Validation {
			collection: collection.to_string(),
			index,
			message: message.into(),
		}
	}

	/// Maps a driver error onto the loader's taxonomy by inspecting its message.
	pub fn from_store(collection: &str, operation: &'static str, err: surrealdb::Error) -> Self {
		let msg = err.to_string().to_ascii_lowercase();
		if msg.contains("already contains") || msg.contains("already exists") {
			Self::DuplicateKey {
				collection: collection.to_string(),
				key: "unique index".to_string(),
				details: err.to_string(),
			}
		} else if msg.contains("couldn't coerce") {
			Self::Validation {
				collection: collection.to_string(),
				index: None,
				message: err.to_string(),
			}
		} else if is_connection_message(&msg) {
			Self::Connection {
				target: collection.to_string(),
				message: err.to_string(),
			}
		} else {
			Self::Store {
				collection: collection.to_string(),
				operation,
				source: err,
			}
		}
	}
}

pub(crate) fn is_connection_message(msg: &str) -> bool {
	msg.contains("connection")
		|| msg.contains("unreachable")
		|| msg.contains("refused")
		|| msg.contains("timed out")
		|| msg.contains("authentication")
}

/// The store reports reads of a table (or database) nothing has been written to
/// yet as missing rather than empty.
pub(crate) fn is_missing_table(err: &surrealdb::Error) -> bool {
	let msg = err.to_string().to_ascii_lowercase();
	(msg.contains("the table '") || msg.contains("the database '")) && msg.contains("does not exist")
}

/// Statements rolled back alongside the one that actually failed carry this.
pub(crate) fn is_not_executed(err: &surrealdb::Error) -> bool {
	err.to_string().to_ascii_lowercase().contains("not executed")
}

fn record_suffix(index: &Option<usize>) -> String {
	match index {
		Some(i) => format!(" (record {i})"),
		None => String::new(),
	}
}
