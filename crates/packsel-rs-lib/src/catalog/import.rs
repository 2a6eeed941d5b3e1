//! Reading installer definitions.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use try_map::FallibleMapExt;

use super::Pack;
use crate::rules::{Condition, Expression, InstallerRequirement, Variables};
use crate::Error::Validation;

/// Everything the engine needs to know about an installer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallerDefinition {
	pub packs: Vec<Pack>,
	/// Named conditions, referred to by id from pack conditions and requirements.
	#[serde(default)]
	pub conditions: BTreeMap<String, Condition>,
	#[serde(default)]
	pub requirements: Vec<InstallerRequirement>,
	/// Initial variable values.
	#[serde(default)]
	pub variables: Variables,
}

/// Anything that can produce an [`InstallerDefinition`].
pub trait CatalogSource {
	fn read_definition(&self) -> crate::Result<InstallerDefinition>;
}

impl CatalogSource for InstallerDefinition {
	fn read_definition(&self) -> crate::Result<InstallerDefinition> {
		Ok(self.clone())
	}
}

/// A JSON installer definition.
#[derive(Debug, Clone)]
pub struct JsonSource {
	json: String,
	validate: bool,
}

impl JsonSource {
	pub fn new(json: impl Into<String>) -> Self {
		Self { json: json.into(), validate: false }
	}

	pub fn from_path(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
		log::debug!("Reading installer definition from {}", path.as_ref().display());
		Ok(Self::new(std::fs::read_to_string(path)?))
	}

	/// Check the document against the installer definition schema before deserializing.
	///
	/// Gives far better messages for malformed documents than serde alone.
	pub fn with_validation(mut self, validate: bool) -> Self {
		self.validate = validate;
		self
	}
}

impl CatalogSource for JsonSource {
	fn read_definition(&self) -> crate::Result<InstallerDefinition> {
		let json: serde_json::Value = serde_json::from_str(&self.json)?;

		if self.validate {
			let schema = compile_schema()?;
			let result = schema.validate(&json).map_err(|errors| errors.map(|e| e.to_string()).collect::<Vec<_>>());
			if let Err(messages) = result {
				return Err(Validation(messages.join("; ")));
			}
		}

		let definition: InstallerDefinition = serde_json::from_value(json)?;
		log::debug!(
			"Read installer definition with {} packs and {} conditions",
			definition.packs.len(), definition.conditions.len()
		);
		Ok(definition)
	}
}

fn compile_schema() -> crate::Result<jsonschema::JSONSchema> {
	let schema: serde_json::Value = serde_json::from_str(include_str!("installer-definition.schema.json"))?;
	jsonschema::JSONSchema::compile(&schema).map_err(|e| Validation(format!("schema doesn't compile: {}", e)))
}

/// The on-disk form of a [`Pack`].
///
/// Differs in that `preselected` is optional and the condition is unparsed.
#[derive(Debug, Deserialize)]
pub(crate) struct PackDefinition {
	name: String,
	#[serde(default)]
	id: Option<String>,
	#[serde(default)]
	description: String,
	#[serde(default)]
	required: bool,
	#[serde(default)]
	preselected: Option<bool>,
	#[serde(default)]
	loose: bool,
	#[serde(default)]
	exclude_group: Option<String>,
	#[serde(default)]
	install_groups: BTreeSet<String>,
	#[serde(default)]
	dependencies: Vec<String>,
	#[serde(default)]
	condition: Option<String>,
	#[serde(default)]
	hidden: bool,
	#[serde(default)]
	parent: Option<String>,
	#[serde(default)]
	size: u64,
}

impl TryFrom<PackDefinition> for Pack {
	type Error = crate::Error;

	fn try_from(def: PackDefinition) -> Result<Self, Self::Error> {
		Ok(Pack {
			/* Packs in an exclude group start unchecked unless stated otherwise */
			preselected: def.preselected.unwrap_or(def.exclude_group.is_none()),
			condition: def.condition.as_deref().try_map(Expression::parse)?,
			name: def.name,
			id: def.id,
			description: def.description,
			required: def.required,
			loose: def.loose,
			exclude_group: def.exclude_group,
			install_groups: def.install_groups,
			dependencies: def.dependencies,
			hidden: def.hidden,
			parent: def.parent,
			size: def.size,
		})
	}
}
