//! The immutable set of packs an installer offers.
//!
//! A [`Catalog`] is built once from the packs of an [`InstallerDefinition`], at which point every
//! reference between packs is checked. Nothing about a catalog changes afterwards.

use std::collections::{BTreeSet, HashMap};

use crate::relationship_resolver::dependency_graph::{self, DependencyGraph};
use crate::Error;

mod pack;
pub use pack::Pack;
mod import;
pub use import::InstallerDefinition;
pub use import::CatalogSource;
pub use import::JsonSource;
mod iterator;
pub use iterator::InInstallGroupExt;
pub use iterator::VisibleExt;

#[derive(Debug, Clone)]
pub struct Catalog {
	packs: Vec<Pack>,
	by_name: HashMap<String, usize>,
	graph: DependencyGraph,
}

impl Catalog {
	/// # Errors
	/// - [`DuplicatePack`](Error::DuplicatePack) when two packs share a name or id, or an id is another pack's name.
	/// - [`UnknownPackReference`](Error::UnknownPackReference) when a dependency or parent isn't in `packs`.
	pub fn new(packs: Vec<Pack>) -> crate::Result<Self> {
		let mut by_name = HashMap::<String, usize>::with_capacity(packs.len());
		for (i, pack) in packs.iter().enumerate() {
			if by_name.insert(pack.name.clone(), i).is_some() {
				return Err(Error::DuplicatePack(pack.name.clone()));
			}
		}

		/* Ids share the key space with names, see Pack::key() */
		let mut ids = BTreeSet::<&str>::new();
		for (i, pack) in packs.iter().enumerate() {
			if let Some(id) = &pack.id {
				let named_by_other = by_name.get(id).is_some_and(|j| *j != i);
				if !ids.insert(id) || named_by_other {
					return Err(Error::DuplicatePack(id.clone()));
				}
			}
		}

		for pack in &packs {
			for name in pack.dependencies.iter().chain(pack.parent.iter()) {
				if !by_name.contains_key(name) {
					return Err(Error::UnknownPackReference { name: name.clone(), referenced_by: Some(pack.name.clone()) });
				}
			}
		}

		let graph = dependency_graph::build(&packs, &by_name);
		log::debug!("Catalog built with {} packs and {} dependencies", graph.node_count(), graph.edge_count());

		Ok(Self { packs, by_name, graph })
	}

	pub fn get(&self, name: &str) -> Option<&Pack> {
		self.by_name.get(name).map(|i| &self.packs[*i])
	}

	/// Looks a pack up by its [`key`](Pack::key), the id or when it has none the name.
	pub fn get_by_key(&self, key: &str) -> Option<&Pack> {
		self.packs.iter().find(|p| p.key() == key)
	}

	/// Position of the pack in definition order.
	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.by_name.get(name).copied()
	}

	pub fn packs(&self) -> &[Pack] {
		&self.packs
	}

	pub fn iter(&self) -> std::slice::Iter<'_, Pack> {
		self.packs.iter()
	}

	pub fn len(&self) -> usize {
		self.packs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.packs.is_empty()
	}

	/// Every install group named by any pack.
	pub fn install_group_names(&self) -> BTreeSet<&str> {
		self.packs.iter().flat_map(|p| p.install_groups.iter().map(String::as_str)).collect()
	}

	/// Packs that name `parent` as their parent, for nesting in a tree view.
	pub fn children<'c>(&'c self, parent: &'c str) -> impl Iterator<Item = &'c Pack> + 'c {
		self.packs.iter().filter(move |p| p.parent.as_deref() == Some(parent))
	}

	pub(crate) fn graph(&self) -> &DependencyGraph {
		&self.graph
	}
}

impl<'c> IntoIterator for &'c Catalog {
	type Item = &'c Pack;
	type IntoIter = std::slice::Iter<'c, Pack>;

	fn into_iter(self) -> Self::IntoIter {
		self.packs.iter()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn lookup() {
		let catalog = Catalog::new(vec![Pack::new("Core"), Pack::new("Docs").with_id("docs")]).unwrap();
		assert_eq!(catalog.len(), 2);
		assert_eq!(catalog.index_of("Docs"), Some(1));
		assert_eq!(catalog.get_by_key("docs").unwrap().name, "Docs");
		assert_eq!(catalog.get_by_key("Core").unwrap().name, "Core");
		assert!(catalog.get("docs").is_none());
	}

	#[test]
	fn duplicate_names_are_rejected() {
		assert!(matches!(Catalog::new(vec![Pack::new("A"), Pack::new("A")]), Err(Error::DuplicatePack(n)) if n == "A"));
	}

	#[test]
	fn duplicate_ids_are_rejected() {
		assert!(matches!(Catalog::new(vec![Pack::new("A").with_id("x"), Pack::new("B").with_id("x")]), Err(Error::DuplicatePack(n)) if n == "x"));
	}

	#[test]
	fn id_matching_another_name_is_rejected() {
		assert!(matches!(Catalog::new(vec![Pack::new("Docs"), Pack::new("Manual").with_id("Docs")]), Err(Error::DuplicatePack(n)) if n == "Docs"));
	}

	#[test] fn id_matching_own_name_is_allowed() { assert!(Catalog::new(vec![Pack::new("Docs").with_id("Docs")]).is_ok()) }

	#[test]
	fn unknown_dependency_is_rejected() {
		let result = Catalog::new(vec![Pack::new("A").depends_on(["Missing"])]);
		assert!(matches!(result, Err(Error::UnknownPackReference { name, referenced_by: Some(by) }) if name == "Missing" && by == "A"));
	}

	#[test]
	fn unknown_parent_is_rejected() {
		assert!(Catalog::new(vec![Pack::new("A").with_parent("Nobody")]).is_err());
	}

	#[test]
	fn children_by_parent() {
		let catalog = Catalog::new(vec![Pack::new("Docs"), Pack::new("Api").with_parent("Docs"), Pack::new("Guide").with_parent("Docs")]).unwrap();
		assert_eq!(catalog.children("Docs").map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["Api", "Guide"]);
	}

	#[test]
	fn install_group_names_are_collected() {
		let catalog = Catalog::new(vec![
			Pack::new("A").with_install_group("user"),
			Pack::new("B").with_install_group("developer").with_install_group("user"),
			Pack::new("C"),
		]).unwrap();
		assert_eq!(catalog.install_group_names().into_iter().collect::<Vec<_>>(), vec!["developer", "user"]);
	}
}
