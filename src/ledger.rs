use anyhow::Result;
use surrealdb::{Surreal, engine::any::Any};
use surrealdb_types::SurrealValue;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// What was last loaded into a collection.
#[derive(serde::Deserialize, Debug, Clone, PartialEq, SurrealValue)]
pub struct LedgerEntry {
	pub collection: String,
	pub hash: String,
	pub records: i64,
	pub seeded_at: String,
}

pub async fn record_seed(
	db: &Surreal<Any>,
	collection: &str,
	hash: &str,
	records: usize,
) -> Result<()> {
	let seeded_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
	db.query(
		"DELETE _seed_ledger WHERE collection = $collection; \
		 CREATE _seed_ledger CONTENT { collection: $collection, hash: $hash, records: $records, seeded_at: $seeded_at };",
	)
	.bind(("collection", collection.to_string()))
	.bind(("hash", hash.to_string()))
	.bind(("records", records as i64))
	.bind(("seeded_at", seeded_at))
	.await?
	.check()?;
	Ok(())
}

pub async fn load_ledger(db: &Surreal<Any>) -> Result<Vec<LedgerEntry>> {
	let mut resp = db
		.query("SELECT collection, hash, records, seeded_at FROM _seed_ledger ORDER BY collection;")
		.await?;
	let rows: Vec<LedgerEntry> = resp.take(0)?;
	Ok(rows)
}

pub async fn last_hash(db: &Surreal<Any>, collection: &str) -> Result<Option<String>> {
	let mut resp = db
		.query("SELECT hash FROM _seed_ledger WHERE collection = $collection LIMIT 1;")
		.bind(("collection", collection.to_string()))
		.await?;
	let row: Option<serde_json::Value> = resp.take(0)?;
	Ok(row
		.as_ref()
		.and_then(|v| v.get("hash"))
		.and_then(|v| v.as_str())
		.map(str::to_string))
}
