//! Expands a pack selection with everything it depends on.
//!
//! # Usage
//! 1. Create a [`DependencyResolver`] over a [`Catalog`].
//! 1. [`DependencyResolver::resolve()`] the requested pack names against the packs currently available.
//! 1. Read the install order from the returned [`ResolvedSelection`].
//!
//! The resolver holds no state between calls, every resolution starts with all packs unvisited.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::catalog::{Catalog, Pack};
use crate::Error;

pub(crate) mod dependency_graph;
pub(crate) use dependency_graph::Colour;

/// The outcome of a resolution: packs ordered so every pack comes after its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection<'c> {
	packs: Vec<&'c Pack>,
}

impl<'c> ResolvedSelection<'c> {
	pub fn packs(&self) -> &[&'c Pack] {
		&self.packs
	}

	pub fn names(&self) -> Vec<&'c str> {
		self.packs.iter().map(|p| p.name.as_str()).collect()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.packs.iter().any(|p| p.name == name)
	}

	pub fn len(&self) -> usize {
		self.packs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.packs.is_empty()
	}

	/// Sum of the packs' sizes in bytes.
	pub fn size(&self) -> u64 {
		self.packs.iter().map(|p| p.size).sum()
	}
}

impl<'c> IntoIterator for ResolvedSelection<'c> {
	type Item = &'c Pack;
	type IntoIter = std::vec::IntoIter<&'c Pack>;

	fn into_iter(self) -> Self::IntoIter {
		self.packs.into_iter()
	}
}

#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'c> {
	catalog: &'c Catalog,
}

impl<'c> DependencyResolver<'c> {
	pub fn new(catalog: &'c Catalog) -> Self {
		Self { catalog }
	}

	/// Transitive dependency closure of `seeds` as catalog indexes in install order.
	///
	/// Seeds are visited in the order given and dependencies in declaration order.
	///
	/// # Errors
	/// - [`CyclicDependency`](Error::CyclicDependency) with the packs forming the cycle, the first pack repeated at the end.
	pub fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> crate::Result<Vec<usize>> {
		fn visit(graph: &dependency_graph::DependencyGraph, catalog: &Catalog, pack: usize, colours: &mut HashMap<usize, Colour>, path: &mut Vec<usize>, order: &mut Vec<usize>) -> crate::Result<()> {
			match colours.get(&pack).copied().unwrap_or_default() {
				Colour::Black => return Ok(()),
				Colour::Grey => {
					let start = path.iter().position(|p| *p == pack).unwrap_or(0);
					let cycle = path[start..].iter()
						.chain(std::iter::once(&pack))
						.map(|i| catalog.packs()[*i].name.clone())
						.collect();
					return Err(Error::CyclicDependency(cycle));
				},
				Colour::White => {},
			}

			colours.insert(pack, Colour::Grey);
			path.push(pack);
			for dependency in dependency_graph::dependencies_of(graph, pack) {
				visit(graph, catalog, dependency, colours, path, order)?;
			}
			path.pop();
			colours.insert(pack, Colour::Black);
			order.push(pack);
			Ok(())
		}

		let mut colours = HashMap::<usize, Colour>::new();
		let mut path = Vec::<usize>::new();
		let mut order = Vec::<usize>::new();
		for seed in seeds {
			visit(self.catalog.graph(), self.catalog, seed, &mut colours, &mut path, &mut order)?;
		}
		Ok(order)
	}

	/// Resolves `requested` pack names against the available `candidates`.
	///
	/// Required candidates are always included, ahead of the requested packs.
	/// Dependencies are taken from the whole catalog whether they are candidates or not.
	///
	/// # Errors
	/// - [`UnknownPackReference`](Error::UnknownPackReference) for a requested name not in the catalog.
	/// - [`PackUnavailable`](Error::PackUnavailable) for a requested name that isn't a candidate.
	/// - [`CyclicDependency`](Error::CyclicDependency)
	/// - [`MutualExclusionViolation`](Error::MutualExclusionViolation) when the closure has two packs of the same exclude group.
	pub fn resolve<S: AsRef<str>>(&self, requested: &[S], candidates: &[&'c Pack]) -> crate::Result<ResolvedSelection<'c>> {
		let candidate_indexes = candidates.iter()
			.filter_map(|p| self.catalog.index_of(&p.name))
			.collect::<HashSet<usize>>();

		let mut seeds = candidates.iter()
			.filter(|p| p.required)
			.filter_map(|p| self.catalog.index_of(&p.name))
			.collect::<Vec<usize>>();

		for name in requested {
			let name = name.as_ref();
			let index = self.catalog.index_of(name)
				.ok_or_else(|| Error::UnknownPackReference { name: name.to_string(), referenced_by: None })?;
			if !candidate_indexes.contains(&index) {
				return Err(Error::PackUnavailable(name.to_string()));
			}
			seeds.push(index);
		}

		let packs = self.closure(seeds)?
			.into_iter()
			.map(|i| &self.catalog.packs()[i])
			.collect::<Vec<&'c Pack>>();

		check_exclusions(&packs)?;

		log::debug!("Resolved {} requested packs to {} packs", requested.len(), packs.len());
		Ok(ResolvedSelection { packs })
	}

	/// Every pack that depends on `name` directly or indirectly, in catalog order.
	pub fn dependents(&self, name: &str) -> crate::Result<Vec<&'c Pack>> {
		let start = self.catalog.index_of(name)
			.ok_or_else(|| Error::UnknownPackReference { name: name.to_string(), referenced_by: None })?;

		let mut found = BTreeSet::<usize>::new();
		let mut queue = VecDeque::from([start]);
		while let Some(pack) = queue.pop_front() {
			for dependent in dependency_graph::dependents_of(self.catalog.graph(), pack) {
				if dependent != start && found.insert(dependent) {
					queue.push_back(dependent);
				}
			}
		}

		Ok(found.into_iter().map(|i| &self.catalog.packs()[i]).collect())
	}
}

/// Fails when two of `packs` share an exclude group, naming the first such group.
pub(crate) fn check_exclusions(packs: &[&Pack]) -> crate::Result<()> {
	let mut exclude_groups = BTreeMap::<&str, Vec<String>>::new();
	for pack in packs {
		if let Some(group) = &pack.exclude_group {
			exclude_groups.entry(group.as_str()).or_default().push(pack.name.clone());
		}
	}
	match exclude_groups.into_iter().find(|(_, p)| p.len() > 1) {
		Some((group, packs)) => Err(Error::MutualExclusionViolation { group: group.to_string(), packs }),
		None => Ok(()),
	}
}
