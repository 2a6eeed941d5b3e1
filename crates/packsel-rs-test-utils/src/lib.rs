//! Various helper functions for testing
//!
//! functions in this module should use results and not use any panics to avoid confusion in callers

use std::io::Write;

use packsel_rs::catalog::{CatalogSource, InstallerDefinition, JsonSource};
use packsel_rs::{InstallerContext, SessionOptions};

/// An editor with plugins, an SDK, platform launchers and themes.
///
/// Install groups `user` and `developer`, documentation becomes available with `DOCS=yes` or the developer group.
pub const EDITOR_SUITE: &str = include_str!("../test-data/editor-suite.json");
/// Three packs depending on each other in a loop and one standalone pack.
pub const CYCLIC: &str = include_str!("../test-data/cyclic.json");

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("packsel-rs error: {0}")]
	Packsel(#[from] packsel_rs::Error),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
}

/// Reads a fixture, checking it against the definition schema.
pub fn get_definition(json: &str) -> Result<InstallerDefinition, Error> {
	Ok(JsonSource::new(json).with_validation(true).read_definition()?)
}

/// An [`InstallerContext`] for the [`EDITOR_SUITE`] with default options.
pub fn get_context() -> Result<InstallerContext, Error> {
	get_context_with(EDITOR_SUITE, SessionOptions::default())
}

pub fn get_context_with(json: &str, options: SessionOptions) -> Result<InstallerContext, Error> {
	Ok(InstallerContext::new(get_definition(json)?, options)?)
}

/// Writes `contents` to a temporary file which is removed when dropped.
pub fn write_temp_file(contents: &str) -> Result<tempfile::NamedTempFile, Error> {
	let mut f = tempfile::NamedTempFile::new()?;
	f.write_all(contents.as_bytes())?;
	f.flush()?;
	Ok(f)
}
