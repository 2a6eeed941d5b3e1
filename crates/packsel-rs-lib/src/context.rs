//! Everything known about the installer, passed explicitly to whatever needs it.

use crate::catalog::{Catalog, CatalogSource, InstallerDefinition, Pack};
use crate::config::SessionOptions;
use crate::install_groups::InstallGroups;
use crate::rules::{RulesEngine, VariableProvider, Variables};
use crate::selection::{Open, SelectionSession};

#[derive(Debug, Clone)]
pub struct InstallerContext {
	catalog: Catalog,
	rules: RulesEngine,
	options: SessionOptions,
	variables: Variables,
}

impl InstallerContext {
	/// Builds the catalog and rules from `definition` and checks every reference between them.
	///
	/// Variables in the definition can override `options`, see [`SessionOptions::apply_variables()`].
	pub fn new(definition: InstallerDefinition, mut options: SessionOptions) -> crate::Result<Self> {
		options.apply_variables(&definition.variables);

		let mut rules = RulesEngine::new(options.unknown_condition_policy());
		for (id, condition) in definition.conditions {
			rules.register(id, condition)?;
		}
		for requirement in definition.requirements {
			rules.add_requirement(requirement)?;
		}
		let catalog = Catalog::new(definition.packs)?;
		for pack in &catalog {
			if let Some(condition) = &pack.condition {
				rules.register_pack_condition(pack.key(), condition.clone());
			}
		}
		rules.validate()?;

		log::info!("Loaded installer with {} packs and {} conditions", catalog.len(), rules.ids().count());

		Ok(Self { catalog, rules, options, variables: definition.variables })
	}

	pub fn from_source(source: &dyn CatalogSource, options: SessionOptions) -> crate::Result<Self> {
		Self::new(source.read_definition()?, options)
	}

	pub fn catalog(&self) -> &Catalog {
		&self.catalog
	}

	pub fn rules(&self) -> &RulesEngine {
		&self.rules
	}

	pub fn options(&self) -> &SessionOptions {
		&self.options
	}

	/// Variable values from the definition, the starting point for a session.
	pub fn default_variables(&self) -> &Variables {
		&self.variables
	}

	/// Packs whose condition holds for `variables`, in catalog order.
	///
	/// Required packs are always available, their condition is not consulted.
	pub fn available_packs(&self, variables: &dyn VariableProvider) -> crate::Result<Vec<&Pack>> {
		let mut v = Vec::new();
		for pack in &self.catalog {
			if pack.required || self.rules.can_install(pack.key(), variables)? {
				v.push(pack);
			} else {
				log::debug!("Pack {} is unavailable, its condition is false", pack.name);
			}
		}
		Ok(v)
	}

	/// Install groups over the packs available for `variables`.
	pub fn install_groups(&self, variables: &dyn VariableProvider) -> crate::Result<InstallGroups> {
		let available = self.available_packs(variables)?;
		InstallGroups::partition(&self.catalog, &available, variables)
	}

	/// Evaluates a condition expression such as `a+!b`.
	pub fn is_condition_true(&self, expression: &str, variables: &dyn VariableProvider) -> crate::Result<bool> {
		self.rules.evaluate_expression(expression, variables)
	}

	/// Starts pack selection with the definition's variables.
	pub fn open_session(&self) -> crate::Result<SelectionSession<'_, Open>> {
		SelectionSession::new(self, self.variables.clone())
	}

	/// Starts pack selection with `variables` in place of the definition's.
	pub fn open_session_with(&self, variables: Variables) -> crate::Result<SelectionSession<'_, Open>> {
		SelectionSession::new(self, variables)
	}
}
