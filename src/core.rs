use std::{path::Path, sync::LazyLock};

use regex::Regex;
use surrealdb::{
	Surreal,
	engine::any::{Any, connect},
	opt::{Config, capabilities::Capabilities},
};

pub async fn create_surreal_client(address: &str) -> Result<Surreal<Any>, surrealdb::Error> {
	let config = Config::new().capabilities(Capabilities::all());

	connect((address, config)).await
}

pub async fn exec_surql(db: &Surreal<Any>, sql: &str) -> anyhow::Result<()> {
	db.query(sql).await?.check()?;
	Ok(())
}

pub fn display(p: &Path) -> String {
	p.to_string_lossy().replace('\\', "/")
}

/// True when `name` is a plain word that can be spliced into a statement once quoted.
pub fn is_identifier(name: &str) -> bool {
	IDENTIFIER.is_match(name)
}

/// Backtick-quotes an identifier so keywords such as `select` or `none` still
/// parse as table and field names. Only call this on names `is_identifier` accepts.
pub fn quote_ident(name: &str) -> String {
	format!("`{name}`")
}

static IDENTIFIER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));
