use anyhow::Result;
use surrealdb::{Surreal, engine::any::Any};

use crate::ledger::{LedgerEntry, load_ledger};
use crate::setup::ensure_ledger;

pub async fn status(db: &Surreal<Any>) -> Result<()> {
	ensure_ledger(db).await?;
	let rows = load_ledger(db).await?;
	print!("{}", render_status(&rows));
	Ok(())
}

fn render_status(rows: &[LedgerEntry]) -> String {
	if rows.is_empty() {
		return "No seeds recorded\n".to_string();
	}

	let mut out = String::from("Seeded collections:\n");
	for row in rows {
		out.push_str(&format!(
			"{} {} {} record(s) {}\n",
			row.seeded_at,
			row.collection,
			row.records,
			short_hash(&row.hash)
		));
	}
	out
}

fn short_hash(hash: &str) -> &str {
	hash.get(..12).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_ledger_says_so() {
		assert_eq!(render_status(&[]), "No seeds recorded\n");
	}

	#[test]
	fn rows_show_count_and_short_hash() {
		let rows = vec![LedgerEntry {
			collection: "courses".to_string(),
			hash: "0123456789abcdef0123".to_string(),
			records: 3,
			seeded_at: "2026-10-18T09:00:00Z".to_string(),
		}];
		assert_eq!(
			render_status(&rows),
			"Seeded collections:\n2026-10-18T09:00:00Z courses 3 record(s) 0123456789ab\n"
		);
	}
}
