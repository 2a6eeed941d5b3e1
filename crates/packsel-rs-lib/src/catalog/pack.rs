use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::rules::Expression;

/// A single installable unit.
///
/// Packs are identified by their `name` which is unique within a [`Catalog`](super::Catalog).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "super::import::PackDefinition")]
pub struct Pack {
	pub name: String,
	/// Stable id, used to look up the pack's condition. Falls back to `name` when absent.
	pub id: Option<String>,
	pub description: String,
	/// Can't be deselected.
	pub required: bool,
	/// Checked when the selection is first shown.
	pub preselected: bool,
	/// Stored outside the payload bundle.
	pub loose: bool,
	/// At most one pack of an exclude group may be selected.
	pub exclude_group: Option<String>,
	/// Empty means the pack belongs to every install group.
	pub install_groups: BTreeSet<String>,
	/// Names of packs that must be installed alongside this one.
	pub dependencies: Vec<String>,
	pub condition: Option<Expression>,
	/// Not shown to the user but may still be selected through a dependency.
	pub hidden: bool,
	/// Only used to nest packs when displayed, not a dependency.
	pub parent: Option<String>,
	/// Installed size in bytes.
	pub size: u64,
}

impl Pack {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			id: None,
			description: String::new(),
			required: false,
			preselected: true,
			loose: false,
			exclude_group: None,
			install_groups: BTreeSet::new(),
			dependencies: Vec::new(),
			condition: None,
			hidden: false,
			parent: None,
			size: 0,
		}
	}

	/// The key the pack's condition is registered under.
	pub fn key(&self) -> &str {
		self.id.as_deref().unwrap_or(&self.name)
	}

	/// `true` when the pack has no install groups or lists `group`.
	pub fn is_in_install_group(&self, group: &str) -> bool {
		self.install_groups.is_empty() || self.install_groups.contains(group)
	}

	/* Builder style setters, mostly for constructing catalogs in code */

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}

	pub fn preselected(mut self, preselected: bool) -> Self {
		self.preselected = preselected;
		self
	}

	pub fn loose(mut self) -> Self {
		self.loose = true;
		self
	}

	/// Also clears `preselected` as a member of an exclude group isn't checked by default.
	pub fn with_exclude_group(mut self, group: impl Into<String>) -> Self {
		self.exclude_group = Some(group.into());
		self.preselected = false;
		self
	}

	pub fn with_install_group(mut self, group: impl Into<String>) -> Self {
		self.install_groups.insert(group.into());
		self
	}

	pub fn depends_on(mut self, dependencies: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.dependencies.extend(dependencies.into_iter().map(Into::into));
		self
	}

	pub fn with_condition(mut self, condition: Expression) -> Self {
		self.condition = Some(condition);
		self
	}

	pub fn hidden(mut self) -> Self {
		self.hidden = true;
		self
	}

	pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
		self.parent = Some(parent.into());
		self
	}

	pub fn with_size(mut self, size: u64) -> Self {
		self.size = size;
		self
	}
}

impl std::hash::Hash for Pack {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.name.hash(state);
	}
}

impl std::cmp::Ord for Pack {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		self.name.cmp(&other.name)
	}
}

impl std::cmp::PartialOrd for Pack {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl std::cmp::PartialEq for Pack {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name
	}
}

impl std::cmp::Eq for Pack {}

impl AsRef<str> for Pack {
	fn as_ref(&self) -> &str {
		&self.name
	}
}

impl std::fmt::Display for Pack {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name)
	}
}
