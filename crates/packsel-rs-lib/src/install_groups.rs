//! Splitting the available packs into installation profiles.
//!
//! Each install group holds the packs tagged with it, the untagged packs, and everything those depend on.

use std::collections::{BTreeMap, BTreeSet};
use serde::Serialize;

use crate::catalog::{Catalog, InInstallGroupExt, Pack};
use crate::relationship_resolver::DependencyResolver;
use crate::rules::VariableProvider;

/// Prefix of the variable holding a group's description, the group name follows.
pub const DESCRIPTION_VARIABLE_PREFIX: &str = "InstallationGroupPanel.description.";
/// Prefix of the variable holding a group's sort key, the group name follows.
pub const SORT_KEY_VARIABLE_PREFIX: &str = "InstallationGroupPanel.sortKey.";
/// Names the group offered first.
pub const DEFAULT_GROUP_VARIABLE: &str = "InstallationGroupPanel.defaultGroup";
/// Set to the chosen group's name.
pub const INSTALL_GROUP_VARIABLE: &str = "INSTALL_GROUP";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupData {
	pub name: String,
	pub description: String,
	pub sort_key: String,
	/// Total size in bytes of every pack in the group.
	pub size: u64,
	pub pack_names: BTreeSet<String>,
}

impl GroupData {
	/// Human readable size, `12 KB`.
	pub fn size_string(&self) -> String {
		const KB: u64 = 1024;
		const MB: u64 = KB * 1024;
		const GB: u64 = MB * 1024;
		match self.size {
			s if s < KB => format!("{} bytes", s),
			s if s < MB => format!("{} KB", s / KB),
			s if s < GB => format!("{} MB", s / MB),
			s => format!("{} GB", s / GB),
		}
	}

	pub fn contains(&self, pack: &str) -> bool {
		self.pack_names.contains(pack)
	}
}

/// Install groups by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InstallGroups(BTreeMap<String, GroupData>);

impl InstallGroups {
	/// Partitions `candidates` by install group.
	///
	/// When no candidate is tagged with a group the result is empty, meaning there is nothing to choose.
	pub fn partition(catalog: &Catalog, candidates: &[&Pack], variables: &dyn VariableProvider) -> crate::Result<Self> {
		let resolver = DependencyResolver::new(catalog);
		let names = candidates.iter()
			.flat_map(|p| p.install_groups.iter())
			.collect::<BTreeSet<&String>>();

		let mut groups = BTreeMap::<String, GroupData>::new();
		for name in names {
			let seeds = candidates.iter()
				.copied()
				.in_install_group(name)
				.filter_map(|p| catalog.index_of(&p.name));
			let members = resolver.closure(seeds)?
				.into_iter()
				.map(|i| &catalog.packs()[i])
				.collect::<Vec<&Pack>>();

			let description = variables.get(&format!("{}{}", DESCRIPTION_VARIABLE_PREFIX, name))
				.map(str::to_string)
				.unwrap_or_else(|| format!("{} installation", name));
			let sort_key = variables.get(&format!("{}{}", SORT_KEY_VARIABLE_PREFIX, name))
				.map(str::to_string)
				.unwrap_or_else(|| name.clone());

			let data = GroupData {
				name: name.clone(),
				description,
				sort_key,
				size: members.iter().map(|p| p.size).sum(),
				pack_names: members.iter().map(|p| p.name.clone()).collect(),
			};
			log::debug!("Install group {} has {} packs", data.name, data.pack_names.len());
			groups.insert(name.clone(), data);
		}

		Ok(Self(groups))
	}

	pub fn get(&self, name: &str) -> Option<&GroupData> {
		self.0.get(name)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &GroupData> {
		self.0.values()
	}

	/// Groups ordered by sort key, then name.
	pub fn sorted(&self) -> Vec<&GroupData> {
		let mut v: Vec<&GroupData> = self.0.values().collect();
		v.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then_with(|| a.name.cmp(&b.name)));
		v
	}

	/// The group named by [`DEFAULT_GROUP_VARIABLE`], or the first group by sort order.
	pub fn default_group(&self, variables: &dyn VariableProvider) -> Option<&GroupData> {
		variables.get(DEFAULT_GROUP_VARIABLE)
			.and_then(|name| self.get(name))
			.or_else(|| self.sorted().into_iter().next())
	}
}
