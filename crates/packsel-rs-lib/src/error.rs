//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

/// Renders a list of names as `a -> b -> c` for cycle reports.
fn chain(names: &[String]) -> String {
	names.join(" -> ")
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("parsing error: {0}")]
	Parse(String),
	#[error("validation error: {0}")]
	Validation(String),

	/* Catalog */
	#[error("pack `{0}` is defined more than once")]
	DuplicatePack(String),
	/// `referenced_by` is `None` when the name came from a request rather than another pack.
	#[error("unknown pack `{name}`{}", .referenced_by.as_ref().map(|r| format!(" referenced by `{r}`")).unwrap_or_default())]
	UnknownPackReference { name: String, referenced_by: Option<String> },

	/* Rules */
	#[error("condition `{0}` is defined more than once")]
	DuplicateCondition(String),
	#[error("unknown condition `{0}`")]
	UnknownConditionReference(String),
	#[error("cyclic condition reference: {}", chain(.0))]
	CyclicCondition(Vec<String>),

	/* Resolver */
	#[error("cyclic dependency: {}", chain(.0))]
	CyclicDependency(Vec<String>),
	#[error("packs {packs:?} are in the same exclude group `{group}`")]
	MutualExclusionViolation { group: String, packs: Vec<String> },
	#[error("pack `{0}` is not available for installation")]
	PackUnavailable(String),

	/* Session */
	#[error("pack `{0}` is required and can't be deselected")]
	PackIsRequired(String),
	#[error("pack `{pack}` is needed by {dependents:?}")]
	PackRequiredBy { pack: String, dependents: Vec<String> },
	#[error("unknown install group `{0}`")]
	UnknownInstallGroup(String),
	#[error("validator rejected pack `{0}`")]
	PackValidation(String),
}
