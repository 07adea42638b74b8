//! Resetting a collection to an exact set of fixture records.
//!
//! A reset is destructive: the collection is emptied and then refilled. Records
//! are checked up front (shape, key presence, key uniqueness) so that anything
//! detectable fails before the previous contents are touched. The delete and the
//! inserts run in one transaction, so a record the store itself refuses (a
//! schema the table already carries, say) rolls the whole reset back.
//!
//! Resets are not atomic across collections, and two loaders resetting the same
//! collection at once race between their delete and insert phases. The last
//! writer wins; no locking is attempted.

use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use surrealdb::{Surreal, engine::any::Any};
use tracing::{debug, info};

use crate::config::DEFAULT_BATCH_SIZE;
use crate::core::{is_identifier, quote_ident};
use crate::error::{Result, SeedError, is_missing_table, is_not_executed};

/// Prefix reserved for seedkit's own bookkeeping tables.
pub const RESERVED_PREFIX: &str = "_seed_";

/// Field the store uses for record ids. Fixture records may not set it.
const RECORD_ID_FIELD: &str = "id";

/// The collection a reset writes to, and the field that identifies its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
	collection: String,
	key: Option<String>,
	batch_size: usize,
}

impl Target {
	pub fn new(collection: impl Into<String>) -> Self {
		Self {
			collection: collection.into(),
			key: None,
			batch_size: DEFAULT_BATCH_SIZE,
		}
	}

	/// Declares `key` as unique across the collection.
	pub fn unique_by(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	pub fn with_batch_size(mut self, size: usize) -> Self {
		self.batch_size = size.max(1);
		self
	}

	pub fn collection(&self) -> &str {
		&self.collection
	}

	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	pub fn batch_size(&self) -> usize {
		self.batch_size
	}
}

/// Replaces the contents of `target`'s collection with `records` and returns the
/// resulting document count.
///
/// Calling this twice with the same arguments leaves the same contents behind.
/// An empty `records` slice empties the collection. The delete and the inserts
/// share one transaction, so a record the store refuses leaves the previous
/// contents in place.
pub async fn reset_collection<T: Serialize>(
	db: &Surreal<Any>,
	target: &Target,
	records: &[T],
) -> Result<usize> {
	let documents = prepare_documents(target, records)?;
	let collection = target.collection();
	let table = quote_ident(collection);

	let mut sql = String::from("BEGIN TRANSACTION;\n");
	sql.push_str(&format!("DEFINE TABLE IF NOT EXISTS {table} SCHEMALESS;\n"));
	if let Some(key) = target.key() {
		let index = quote_ident(&format!("{collection}_{key}_unique"));
		let field = quote_ident(key);
		sql.push_str(&format!(
			"DEFINE INDEX OVERWRITE {index} ON TABLE {table} FIELDS {field} UNIQUE;\n"
		));
	}
	sql.push_str(&format!("DELETE {table};\n"));

	// Record ids are the input positions so a refused record can be named.
	let batches: Vec<Value> = documents
		.chunks(target.batch_size())
		.enumerate()
		.map(|(n, chunk)| {
			let offset = n * target.batch_size();
			Value::Array(
				chunk
					.iter()
					.enumerate()
					.map(|(i, doc)| with_record_id(doc, offset + i))
					.collect(),
			)
		})
		.collect();
	if !batches.is_empty() {
		sql.push_str(&format!("FOR $batch IN $batches {{ INSERT INTO {table} $batch; }};\n"));
	}
	sql.push_str("COMMIT TRANSACTION;\n");

	debug!(
		collection,
		records = documents.len(),
		batches = batches.len(),
		"resetting collection"
	);

	let mut resp = db
		.query(sql)
		.bind(("batches", Value::Array(batches)))
		.await
		.map_err(|err| SeedError::from_store(collection, "reset", err))?;
	if let Some(err) = root_cause(resp.take_errors()) {
		return Err(refused_record(collection, SeedError::from_store(collection, "reset", err)));
	}

	let count = count_documents(db, collection).await?;
	info!(collection, count, "collection reset");
	Ok(count)
}

/// Returns every document in `collection`, without the store-assigned record id.
/// A collection that was never written to reads as empty.
pub async fn read_collection(db: &Surreal<Any>, collection: &str) -> Result<Vec<Value>> {
	check_collection_name(collection)?;

	let sql = format!("SELECT * OMIT id FROM {};", quote_ident(collection));
	let rows = db
		.query(sql)
		.await
		.and_then(|mut resp| resp.take::<Vec<Value>>(0));
	match rows {
		Ok(rows) => Ok(rows),
		Err(err) if is_missing_table(&err) => Ok(Vec::new()),
		Err(err) => Err(SeedError::from_store(collection, "read", err)),
	}
}

pub async fn count_documents(db: &Surreal<Any>, collection: &str) -> Result<usize> {
	check_collection_name(collection)?;

	let sql = format!("SELECT count() AS count FROM {} GROUP ALL;", quote_ident(collection));
	let row = db
		.query(sql)
		.await
		.and_then(|mut resp| resp.take::<Option<Value>>(0));
	let row = match row {
		Ok(row) => row,
		Err(err) if is_missing_table(&err) => None,
		Err(err) => return Err(SeedError::from_store(collection, "count", err)),
	};

	let count = row
		.as_ref()
		.and_then(|v| v.get("count"))
		.and_then(|v| v.as_u64())
		.unwrap_or(0);
	Ok(count as usize)
}

/// Picks the statement error that aborted a transaction over the "not executed"
/// markers on its siblings.
fn root_cause(errors: HashMap<usize, surrealdb::Error>) -> Option<surrealdb::Error> {
	let mut errors: Vec<(usize, surrealdb::Error)> = errors.into_iter().collect();
	if errors.is_empty() {
		return None;
	}
	errors.sort_by_key(|(at, _)| *at);
	let pos = errors
		.iter()
		.position(|(_, err)| !is_not_executed(err))
		.unwrap_or(0);
	Some(errors.swap_remove(pos).1)
}

/// Fills in which record a store-side validation failure was about, using the
/// positional record id the reset assigned.
fn refused_record(collection: &str, err: SeedError) -> SeedError {
	match err {
		SeedError::Validation {
			collection: name,
			index: None,
			message,
		} => {
			let index = record_index(collection, &message);
			SeedError::Validation {
				collection: name,
				index,
				message,
			}
		}
		other => other,
	}
}

fn record_index(collection: &str, message: &str) -> Option<usize> {
	let pattern = format!(r"{}[`⟩]?:(\d+)", regex::escape(collection));
	Regex::new(&pattern)
		.ok()?
		.captures(message)?
		.get(1)?
		.as_str()
		.parse()
		.ok()
}

fn with_record_id(doc: &Value, index: usize) -> Value {
	let mut doc = doc.clone();
	if let Value::Object(fields) = &mut doc {
		fields.insert(RECORD_ID_FIELD.to_string(), Value::from(index));
	}
	doc
}

/// Content fingerprint of a record sequence, stable across runs.
pub fn fingerprint<T: Serialize>(records: &[T]) -> std::result::Result<String, serde_json::Error> {
	let encoded = serde_json::to_vec(records)?;
	let mut hasher = Sha256::new();
	hasher.update(&encoded);
	Ok(hex::encode(hasher.finalize()))
}

/// Runs every check `reset_collection` performs before touching the store and
/// returns how many records would be loaded.
pub fn validate_records<T: Serialize>(target: &Target, records: &[T]) -> Result<usize> {
	prepare_documents(target, records).map(|docs| docs.len())
}

pub fn check_collection_name(collection: &str) -> Result<()> {
	if collection.is_empty() {
		return Err(SeedError::validation(collection, None, "collection name is empty"));
	}
	if !is_identifier(collection) {
		return Err(SeedError::validation(
			collection,
			None,
			"collection name must be letters, digits and underscores, not starting with a digit",
		));
	}
	if collection.starts_with(RESERVED_PREFIX) {
		return Err(SeedError::validation(
			collection,
			None,
			format!("collection names starting with {RESERVED_PREFIX} are reserved"),
		));
	}
	Ok(())
}

/// Serializes and checks every record. Nothing in the store is touched here.
fn prepare_documents<T: Serialize>(target: &Target, records: &[T]) -> Result<Vec<Value>> {
	let collection = target.collection();
	check_collection_name(collection)?;
	if let Some(key) = target.key() {
		if !is_identifier(key) {
			return Err(SeedError::validation(
				collection,
				None,
				format!("key field '{key}' is not a plain field name"),
			));
		}
	}

	let mut documents = Vec::with_capacity(records.len());
	let mut seen: HashMap<String, usize> = HashMap::new();

	for (index, record) in records.iter().enumerate() {
		let value = serde_json::to_value(record)
			.map_err(|err| SeedError::validation(collection, Some(index), err.to_string()))?;
		let fields = match value {
			Value::Object(fields) => fields,
			other => {
				return Err(SeedError::validation(
					collection,
					Some(index),
					format!("record must be an object, got {}", kind_of(&other)),
				));
			}
		};
		if fields.contains_key(RECORD_ID_FIELD) {
			return Err(SeedError::validation(
				collection,
				Some(index),
				"field 'id' is reserved for the store's record id",
			));
		}

		if let Some(field) = oversized_integer(&fields) {
			return Err(SeedError::validation(
				collection,
				Some(index),
				format!("field '{field}' holds an integer above {}", i64::MAX),
			));
		}

		if let Some(key) = target.key() {
			let key_value = key_of(collection, key, index, &fields)?;
			if let Some(first) = seen.insert(key_value.clone(), index) {
				return Err(SeedError::DuplicateKey {
					collection: collection.to_string(),
					key: key.to_string(),
					details: format!("records {first} and {index} share {key} = {key_value}"),
				});
			}
		}

		documents.push(Value::Object(fields));
	}

	Ok(documents)
}

fn key_of(collection: &str, key: &str, index: usize, fields: &Map<String, Value>) -> Result<String> {
	match fields.get(key) {
		Some(Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
		Some(Value::String(s)) => Ok(format!("{s:?}")),
		Some(other) => Err(SeedError::validation(
			collection,
			Some(index),
			format!("key field '{key}' must be an integer or a string, got {}", kind_of(other)),
		)),
		None => Err(SeedError::validation(
			collection,
			Some(index),
			format!("missing key field '{key}'"),
		)),
	}
}

/// The store keeps integers as signed 64-bit values; anything larger would come
/// back as a float. Returns the dotted path of the first such value.
fn oversized_integer(fields: &Map<String, Value>) -> Option<String> {
	fields.iter().find_map(|(name, value)| {
		oversized_in(value).map(|rest| match rest {
			Some(rest) => format!("{name}.{rest}"),
			None => name.clone(),
		})
	})
}

fn oversized_in(value: &Value) -> Option<Option<String>> {
	match value {
		Value::Number(n) if n.is_u64() && !n.is_i64() => Some(None),
		Value::Array(items) => items.iter().enumerate().find_map(|(i, item)| {
			oversized_in(item).map(|rest| match rest {
				Some(rest) => Some(format!("{i}.{rest}")),
				None => Some(i.to_string()),
			})
		}),
		Value::Object(fields) => oversized_integer(fields).map(Some),
		_ => None,
	}
}

fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::core::{create_surreal_client, exec_surql};

	async fn memory_db() -> Surreal<Any> {
		let db = create_surreal_client("mem://")
			.await
			.expect("in-memory store should start");
		db.use_ns("seedkit").use_db("loader").await.expect("ns/db selection");
		db
	}

	fn sorted_by(mut rows: Vec<Value>, key: &str) -> Vec<Value> {
		rows.sort_by_key(|row| row.get(key).and_then(|v| v.as_i64()).unwrap_or_default());
		rows
	}

	fn labs() -> Vec<Value> {
		vec![
			json!({ "lab_id": 2, "name": "Optics", "rooms": ["204", "205"] }),
			json!({ "lab_id": 1, "name": "Robotics", "equipment": { "arms": 3 } }),
			json!({ "lab_id": 3, "name": "Acoustics", "rooms": [] }),
		]
	}

	#[tokio::test]
	async fn reset_then_read_back_returns_the_records() {
		let db = memory_db().await;
		let target = Target::new("labs").unique_by("lab_id");

		let count = reset_collection(&db, &target, &labs()).await.expect("reset");
		assert_eq!(count, 3);

		let rows = read_collection(&db, "labs").await.expect("read back");
		assert_eq!(sorted_by(rows, "lab_id"), sorted_by(labs(), "lab_id"));
	}

	#[tokio::test]
	async fn reset_is_idempotent() {
		let db = memory_db().await;
		let target = Target::new("labs").unique_by("lab_id");

		reset_collection(&db, &target, &labs()).await.expect("first reset");
		let count = reset_collection(&db, &target, &labs()).await.expect("second reset");
		assert_eq!(count, 3);

		let rows = read_collection(&db, "labs").await.expect("read back");
		assert_eq!(sorted_by(rows, "lab_id"), sorted_by(labs(), "lab_id"));
	}

	#[tokio::test]
	async fn reset_leaves_no_residue() {
		let db = memory_db().await;
		let target = Target::new("labs").unique_by("lab_id");
		reset_collection(&db, &target, &labs()).await.expect("first reset");

		let replacement = vec![json!({ "lab_id": 9, "name": "Cryogenics" })];
		let count = reset_collection(&db, &target, &replacement)
			.await
			.expect("second reset");
		assert_eq!(count, 1);

		let rows = read_collection(&db, "labs").await.expect("read back");
		assert_eq!(rows, replacement);
	}

	#[tokio::test]
	async fn empty_input_empties_the_collection() {
		let db = memory_db().await;
		let target = Target::new("labs").unique_by("lab_id");
		reset_collection(&db, &target, &labs()).await.expect("seeded");

		let none: Vec<Value> = Vec::new();
		let count = reset_collection(&db, &target, &none).await.expect("empty reset");
		assert_eq!(count, 0);
		assert!(read_collection(&db, "labs").await.expect("read back").is_empty());
	}

	#[tokio::test]
	async fn small_batches_load_everything() {
		let db = memory_db().await;
		let target = Target::new("labs").unique_by("lab_id").with_batch_size(1);

		let count = reset_collection(&db, &target, &labs()).await.expect("reset");
		assert_eq!(count, 3);
	}

	#[tokio::test]
	async fn duplicate_keys_are_rejected_before_anything_is_dropped() {
		let db = memory_db().await;
		let target = Target::new("labs").unique_by("lab_id");
		reset_collection(&db, &target, &labs()).await.expect("seeded");

		let clashing = vec![
			json!({ "lab_id": 7, "name": "Plasma" }),
			json!({ "lab_id": 8, "name": "Vacuum" }),
			json!({ "lab_id": 7, "name": "Plasma again" }),
		];
		let err = reset_collection(&db, &target, &clashing)
			.await
			.expect_err("duplicate keys must fail");
		match err {
			SeedError::DuplicateKey { key, details, .. } => {
				assert_eq!(key, "lab_id");
				assert_eq!(details, "records 0 and 2 share lab_id = 7");
			}
			other => panic!("expected duplicate key error, got {other:?}"),
		}

		assert_eq!(count_documents(&db, "labs").await.expect("count"), 3);
	}

	#[tokio::test]
	async fn string_keys_are_compared_by_value() {
		let db = memory_db().await;
		let target = Target::new("rooms").unique_by("code");
		let rooms = vec![json!({ "code": "A-1" }), json!({ "code": "A-1" })];

		let err = reset_collection(&db, &target, &rooms).await.expect_err("duplicate");
		assert!(matches!(err, SeedError::DuplicateKey { .. }), "got {err:?}");
	}

	#[tokio::test]
	async fn malformed_records_fail_validation() {
		let db = memory_db().await;
		let target = Target::new("labs").unique_by("lab_id");

		let cases: Vec<(Vec<Value>, usize)> = vec![
			(vec![json!({ "lab_id": 1 }), json!(5)], 1),
			(vec![json!({ "name": "no key" })], 0),
			(vec![json!({ "lab_id": 1.5 })], 0),
			(vec![json!({ "lab_id": 1, "id": "labs:1" })], 0),
		];
		for (records, bad_index) in cases {
			let err = reset_collection(&db, &target, &records)
				.await
				.expect_err("malformed record must fail");
			match err {
				SeedError::Validation { index, .. } => assert_eq!(index, Some(bad_index)),
				other => panic!("expected validation error, got {other:?}"),
			}
		}
	}

	#[test]
	fn integers_beyond_i64_fail_validation() {
		let target = Target::new("labs").unique_by("lab_id");
		let records = vec![
			json!({ "lab_id": 1, "budget": 10 }),
			json!({ "lab_id": 2, "budget": 18446744073709551615u64 }),
		];
		match validate_records(&target, &records) {
			Err(SeedError::Validation { index, message, .. }) => {
				assert_eq!(index, Some(1));
				assert!(message.contains("'budget'"), "{message}");
			}
			other => panic!("expected validation error, got {other:?}"),
		}

		let nested = vec![json!({ "lab_id": 1, "meters": [{ "serial": u64::MAX }] })];
		match validate_records(&target, &nested) {
			Err(SeedError::Validation { message, .. }) => {
				assert!(message.contains("'meters.0.serial'"), "{message}");
			}
			other => panic!("expected validation error, got {other:?}"),
		}

		let edge = vec![json!({ "lab_id": i64::MAX })];
		assert_eq!(validate_records(&target, &edge).expect("i64::MAX fits"), 1);
	}

	#[tokio::test]
	async fn keyword_collection_names_load() {
		let db = memory_db().await;
		for name in ["select", "none", "from"] {
			let target = Target::new(name).unique_by("value");
			let records = vec![json!({ "value": 1 }), json!({ "value": 2 })];

			let count = reset_collection(&db, &target, &records).await.expect("reset");
			assert_eq!(count, 2, "{name}");
			assert_eq!(count_documents(&db, name).await.expect("count"), 2);
			let rows = read_collection(&db, name).await.expect("read back");
			assert_eq!(sorted_by(rows, "value"), records);
		}
	}

	#[tokio::test]
	async fn refused_record_keeps_previous_contents() {
		let db = memory_db().await;
		exec_surql(
			&db,
			"DEFINE TABLE gauges SCHEMAFULL;
			DEFINE FIELD k ON gauges TYPE int;
			DEFINE FIELD v ON gauges TYPE int;",
		)
		.await
		.expect("schema");
		let target = Target::new("gauges").unique_by("k");
		let before = vec![json!({ "k": 1, "v": 10 }), json!({ "k": 2, "v": 20 })];
		reset_collection(&db, &target, &before).await.expect("seeded");

		let bad = vec![json!({ "k": 3, "v": 30 }), json!({ "k": 4, "v": "x" })];
		match reset_collection(&db, &target, &bad).await {
			Err(SeedError::Validation { index, message, .. }) => {
				assert_eq!(index, Some(1), "{message}");
			}
			other => panic!("expected validation error, got {other:?}"),
		}

		let rows = read_collection(&db, "gauges").await.expect("read back");
		assert_eq!(sorted_by(rows, "k"), before);
	}

	#[tokio::test]
	async fn unseeded_collection_reads_as_empty() {
		let db = memory_db().await;
		reset_collection(&db, &Target::new("labs"), &labs()).await.expect("seeded");

		assert_eq!(count_documents(&db, "nowhere").await.expect("count"), 0);
		assert!(read_collection(&db, "nowhere").await.expect("read").is_empty());
	}

	#[test]
	fn refused_records_are_located_by_record_id() {
		let message = "Couldn't coerce value for field `v` of `gauges:4`: Expected `int`";
		assert_eq!(record_index("gauges", message), Some(4));
		assert_eq!(record_index("select", "field `v` of `⟨select⟩:7`"), Some(7));
		assert_eq!(record_index("gauges", "no record here"), None);
	}

	#[test]
	fn unserializable_records_fail_validation() {
		let mut bad = std::collections::BTreeMap::new();
		bad.insert(vec![1u8], "non-string map key");

		let err = prepare_documents(&Target::new("labs"), &[bad]).expect_err("must fail");
		assert!(matches!(err, SeedError::Validation { index: Some(0), .. }), "got {err:?}");
	}

	#[test]
	fn collection_names_are_checked() {
		assert!(check_collection_name("universities").is_ok());
		assert!(check_collection_name("").is_err());
		assert!(check_collection_name("labs; REMOVE TABLE labs").is_err());
		assert!(check_collection_name("_seed_ledger").is_err());
	}

	#[test]
	fn validation_without_store_matches_reset_checks() {
		let target = Target::new("labs").unique_by("lab_id");
		assert_eq!(validate_records(&target, &labs()).expect("valid"), 3);

		let clashing = vec![json!({ "lab_id": 1 }), json!({ "lab_id": 1 })];
		assert!(matches!(
			validate_records(&target, &clashing),
			Err(SeedError::DuplicateKey { .. })
		));
	}

	#[test]
	fn keyless_targets_accept_repeated_values() {
		let records = vec![json!({ "n": 1 }), json!({ "n": 1 })];
		let docs = prepare_documents(&Target::new("notes"), &records).expect("no key, no clash");
		assert_eq!(docs.len(), 2);
	}

	#[test]
	fn fingerprint_tracks_content() {
		let a = fingerprint(&labs()).expect("hash");
		let b = fingerprint(&labs()).expect("hash");
		assert_eq!(a, b);
		assert_eq!(a.len(), 64);

		let mut changed = labs();
		changed[0]["name"] = json!("Lasers");
		assert_ne!(a, fingerprint(&changed).expect("hash"));
	}
}
