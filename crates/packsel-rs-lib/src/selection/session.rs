use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;

use super::{Closed, Open, PackValidator, SelectionSink};
use crate::catalog::Pack;
use crate::config::SessionOptions;
use crate::context::InstallerContext;
use crate::install_groups::{InstallGroups, INSTALL_GROUP_VARIABLE};
use crate::relationship_resolver::{check_exclusions, DependencyResolver, ResolvedSelection};
use crate::rules::{VariableProvider, Variables};
use crate::Error;

/// Returned by [`SelectionSession::proceed()`] when the selection can't be resolved.
///
/// Holds the session exactly as it was so the user can fix the selection.
#[derive(Debug, thiserror::Error)]
#[error("selection rejected: {error}")]
pub struct Rejected<'ctx> {
	pub session: SelectionSession<'ctx, Open>,
	#[source]
	pub error: Error,
}

/// The editable part of an open session, put back when a multi step change fails half way.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint<'ctx> {
	options: SessionOptions,
	variables: Variables,
	candidates: Vec<&'ctx Pack>,
	install_group: Option<String>,
	selected: BTreeSet<String>,
}

/// The packs picked for installation, see the [`selection`](crate::selection) module.
pub struct SelectionSession<'ctx, State> {
	context: &'ctx InstallerContext,
	options: SessionOptions,
	variables: Variables,
	/// Packs that may be selected, in catalog order.
	candidates: Vec<&'ctx Pack>,
	install_group: Option<String>,
	/// The user's picks and the dependencies known to come with them.
	selected: BTreeSet<String>,
	/// Install order, only filled when closed.
	resolved: Vec<&'ctx Pack>,
	validators: HashMap<String, Vec<Box<dyn PackValidator + 'ctx>>>,
	state: PhantomData<State>,
}

impl<'ctx, State> SelectionSession<'ctx, State> {
	pub fn context(&self) -> &'ctx InstallerContext {
		self.context
	}

	pub fn options(&self) -> &SessionOptions {
		&self.options
	}

	pub fn variables(&self) -> &Variables {
		&self.variables
	}

	pub fn candidates(&self) -> &[&'ctx Pack] {
		&self.candidates
	}

	pub fn is_candidate(&self, name: &str) -> bool {
		self.candidates.iter().any(|p| p.name == name)
	}

	pub fn install_group(&self) -> Option<&str> {
		self.install_group.as_deref()
	}

	pub fn selected(&self) -> impl Iterator<Item = &str> {
		self.selected.iter().map(String::as_str)
	}

	pub fn is_selected(&self, name: &str) -> bool {
		self.selected.contains(name)
	}

	fn into_state<S>(self) -> SelectionSession<'ctx, S> {
		SelectionSession {
			context: self.context,
			options: self.options,
			variables: self.variables,
			candidates: self.candidates,
			install_group: self.install_group,
			selected: self.selected,
			resolved: self.resolved,
			validators: self.validators,
			state: PhantomData,
		}
	}
}

impl<'ctx> SelectionSession<'ctx, Open> {
	pub(crate) fn new(context: &'ctx InstallerContext, variables: Variables) -> crate::Result<Self> {
		let mut options = context.options().clone();
		options.apply_variables(&variables);

		let candidates = context.available_packs(&variables)?;
		let selected = candidates.iter()
			.filter(|p| p.preselected || p.required)
			.map(|p| p.name.clone())
			.collect::<BTreeSet<String>>();
		log::debug!("Selection opened with {} candidates, {} preselected", candidates.len(), selected.len());

		Ok(Self {
			context,
			options,
			variables,
			candidates,
			install_group: None,
			selected,
			resolved: Vec::new(),
			validators: HashMap::new(),
			state: PhantomData,
		})
	}

	/// Changes a variable and recomputes which packs are available.
	///
	/// Packs that became unavailable are deselected, packs that became available are selected when preselected.
	pub fn set_variable(&mut self, name: &str, value: &str) -> crate::Result<()> {
		self.variables.set(name, value);
		self.options.apply_variables(&self.variables);
		self.refresh()
	}

	fn refresh(&mut self) -> crate::Result<()> {
		let mut candidates = self.context.available_packs(&self.variables)?;
		if let Some(group) = &self.install_group {
			let groups = InstallGroups::partition(self.context.catalog(), &candidates, &self.variables)?;
			match groups.get(group) {
				Some(data) => candidates.retain(|p| data.contains(&p.name)),
				None => candidates.retain(|p| p.is_in_install_group(group)),
			}
		}

		for pack in &candidates {
			if !self.is_candidate(&pack.name) && (pack.preselected || pack.required) {
				log::debug!("Pack {} became available", pack.name);
				self.selected.insert(pack.name.clone());
			}
		}
		self.selected.retain(|name| {
			let keep = candidates.iter().any(|p| &p.name == name);
			if !keep {
				log::debug!("Pack {} is no longer available", name);
			}
			keep
		});
		self.candidates = candidates;
		Ok(())
	}

	/// Install groups over the packs currently available.
	pub fn install_groups(&self) -> crate::Result<InstallGroups> {
		self.context.install_groups(&self.variables)
	}

	/// Narrows the candidates to the packs of install group `name` and resets the selection.
	///
	/// Every pack in the group is selected unless [`SessionOptions::select_all_in_group()`] is off,
	/// in which case only preselected and required packs are.
	/// Only one pack of each exclude group is selected, preferring a preselected one.
	pub fn select_install_group(&mut self, name: &str) -> crate::Result<()> {
		let mut variables = self.variables.clone();
		variables.set(INSTALL_GROUP_VARIABLE, name);

		let groups = self.context.install_groups(&variables)?;
		let group = groups.get(name).ok_or_else(|| Error::UnknownInstallGroup(name.to_string()))?;
		let candidates = self.context.available_packs(&variables)?
			.into_iter()
			.filter(|p| group.contains(&p.name))
			.collect::<Vec<&'ctx Pack>>();

		let select_all = self.options.select_all_in_group();
		let mut selected = BTreeSet::<String>::new();
		let mut exclusive = BTreeMap::<&str, &'ctx Pack>::new();
		for pack in candidates.iter().copied().filter(|p| select_all || p.preselected || p.required) {
			match &pack.exclude_group {
				None => {
					selected.insert(pack.name.clone());
				},
				Some(exclude_group) => {
					let chosen = exclusive.entry(exclude_group.as_str()).or_insert(pack);
					if !(chosen.preselected || chosen.required) && (pack.preselected || pack.required) {
						*chosen = pack;
					}
				},
			}
		}
		selected.extend(exclusive.values().map(|p| p.name.clone()));

		log::info!("Install group {} chosen with {} packs, {} selected", name, candidates.len(), selected.len());
		self.variables = variables;
		self.install_group = Some(name.to_string());
		self.candidates = candidates;
		self.selected = selected;
		Ok(())
	}

	pub(crate) fn checkpoint(&self) -> Checkpoint<'ctx> {
		Checkpoint {
			options: self.options.clone(),
			variables: self.variables.clone(),
			candidates: self.candidates.clone(),
			install_group: self.install_group.clone(),
			selected: self.selected.clone(),
		}
	}

	pub(crate) fn rollback(&mut self, checkpoint: Checkpoint<'ctx>) {
		self.options = checkpoint.options;
		self.variables = checkpoint.variables;
		self.candidates = checkpoint.candidates;
		self.install_group = checkpoint.install_group;
		self.selected = checkpoint.selected;
	}

	fn candidate(&self, name: &str) -> crate::Result<&'ctx Pack> {
		let pack = self.context.catalog().get(name)
			.ok_or_else(|| Error::UnknownPackReference { name: name.to_string(), referenced_by: None })?;
		if !self.is_candidate(name) {
			return Err(Error::PackUnavailable(name.to_string()));
		}
		Ok(pack)
	}

	/// Checks or unchecks a single pack. The selection is left untouched on failure.
	///
	/// Checking a pack also checks its dependencies and unchecks the other packs of their exclude groups.
	///
	/// # Errors
	/// - [`PackIsRequired`](Error::PackIsRequired) when unchecking a required pack, directly or through its exclude group.
	/// - [`PackRequiredBy`](Error::PackRequiredBy) when unchecking a pack a selected pack depends on,
	///   including an exclude group sibling pushed out by checking.
	/// - [`MutualExclusionViolation`](Error::MutualExclusionViolation) when the pack needs two packs of one exclude group.
	/// - [`UnknownPackReference`](Error::UnknownPackReference) or [`PackUnavailable`](Error::PackUnavailable) for a pack that can't be selected.
	pub fn toggle(&mut self, name: &str, on: bool) -> crate::Result<()> {
		let pack = self.candidate(name)?;
		let catalog = self.context.catalog();
		let resolver = DependencyResolver::new(catalog);

		if on {
			let closure = resolver.closure(catalog.index_of(&pack.name))?
				.into_iter()
				.map(|i| &catalog.packs()[i])
				.collect::<Vec<&'ctx Pack>>();
			check_exclusions(&closure)?;

			let mut selected = self.selected.clone();
			for p in &closure {
				if let Some(group) = &p.exclude_group {
					let siblings = self.candidates.iter()
						.filter(|s| s.name != p.name && s.exclude_group.as_ref() == Some(group));
					for sibling in siblings {
						if !selected.remove(&sibling.name) {
							continue;
						}
						if sibling.required {
							return Err(Error::PackIsRequired(sibling.name.clone()));
						}
						let dependents = resolver.dependents(&sibling.name)?
							.into_iter()
							.filter(|d| selected.contains(&d.name))
							.map(|d| d.name.clone())
							.collect::<Vec<String>>();
						if !dependents.is_empty() {
							return Err(Error::PackRequiredBy { pack: sibling.name.clone(), dependents });
						}
						log::debug!("Deselected {} as it shares exclude group {} with {}", sibling.name, group, p.name);
					}
				}
				selected.insert(p.name.clone());
			}
			self.selected = selected;
		} else {
			if pack.required {
				return Err(Error::PackIsRequired(pack.name.clone()));
			}
			let dependents = resolver.dependents(&pack.name)?
				.into_iter()
				.filter(|p| self.selected.contains(&p.name))
				.map(|p| p.name.clone())
				.collect::<Vec<String>>();
			if !dependents.is_empty() {
				return Err(Error::PackRequiredBy { pack: pack.name.clone(), dependents });
			}
			self.selected.remove(&pack.name);
		}
		Ok(())
	}

	/// Resolves `names` and on success makes the result the selection.
	///
	/// The selection is left untouched on failure.
	pub fn select<S: AsRef<str>>(&mut self, names: &[S]) -> crate::Result<ResolvedSelection<'ctx>> {
		let resolved = DependencyResolver::new(self.context.catalog()).resolve(names, &self.candidates)?;
		self.selected = resolved.packs().iter().map(|p| p.name.clone()).collect();
		Ok(resolved)
	}

	/// Registers a check for `pack` run by [`proceed()`](Self::proceed) when the pack is in the resolved selection.
	pub fn add_validator(&mut self, pack: impl Into<String>, validator: impl PackValidator + 'ctx) {
		self.validators.entry(pack.into()).or_default().push(Box::new(validator));
	}

	/// Resolves and freezes the selection.
	///
	/// # Errors
	/// Gives back the unchanged session together with the reason the selection was refused.
	pub fn proceed(self) -> Result<SelectionSession<'ctx, Closed>, Box<Rejected<'ctx>>> {
		match self.resolve_selection() {
			Ok(resolved) => {
				log::info!("Selection accepted with {} packs", resolved.len());
				let mut closed = self.into_state::<Closed>();
				closed.selected = resolved.iter().map(|p| p.name.clone()).collect();
				closed.resolved = resolved;
				Ok(closed)
			},
			Err(error) => {
				log::warn!("Selection rejected: {}", error);
				Err(Box::new(Rejected { session: self, error }))
			},
		}
	}

	fn resolve_selection(&self) -> crate::Result<Vec<&'ctx Pack>> {
		/* Selected dependencies from outside the candidates come back through the closure */
		let requested = self.candidates.iter()
			.filter(|p| self.selected.contains(&p.name))
			.map(|p| p.name.as_str())
			.collect::<Vec<&str>>();
		let resolved = DependencyResolver::new(self.context.catalog()).resolve(&requested, &self.candidates)?;

		for pack in resolved.packs() {
			for validator in self.validators.get(&pack.name).into_iter().flatten() {
				if !validator.validate(&self.variables, pack, resolved.packs()) {
					return Err(Error::PackValidation(pack.name.clone()));
				}
			}
		}

		Ok(resolved.into_iter().collect())
	}
}

impl<'ctx> SelectionSession<'ctx, Closed> {
	/// The frozen selection in install order.
	pub fn packs(&self) -> &[&'ctx Pack] {
		&self.resolved
	}

	pub fn pack_names(&self) -> Vec<&'ctx str> {
		self.resolved.iter().map(|p| p.name.as_str()).collect()
	}

	/// Total size in bytes.
	pub fn size(&self) -> u64 {
		self.resolved.iter().map(|p| p.size).sum()
	}

	pub fn deliver(&self, sink: &mut dyn SelectionSink) -> crate::Result<()> {
		log::debug!("Delivering {} packs", self.resolved.len());
		sink.receive(&self.resolved)
	}

	/// Goes back to editing, keeping the resolved packs selected.
	pub fn reopen(self) -> SelectionSession<'ctx, Open> {
		let mut open = self.into_state::<Open>();
		open.resolved.clear();
		open
	}
}

impl<State> std::fmt::Debug for SelectionSession<'_, State> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SelectionSession")
			.field("variables", &self.variables)
			.field("install_group", &self.install_group)
			.field("candidates", &self.candidates.iter().map(|p| &p.name).collect::<Vec<_>>())
			.field("selected", &self.selected)
			.field("resolved", &self.resolved.iter().map(|p| &p.name).collect::<Vec<_>>())
			.field("validators", &self.validators.keys().collect::<Vec<_>>())
			.finish()
	}
}
