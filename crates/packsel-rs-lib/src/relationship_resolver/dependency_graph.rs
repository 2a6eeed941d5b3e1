//! Sub-module for the pack dependency graph, independent of any one resolution.

use std::collections::HashMap;
use petgraph::prelude::*;

use crate::catalog::Pack;

/// Node weights are indexes into the catalog, node `i` is pack `i`.
/// Edge weights are the position of the dependency in the dependent's list so traversal follows definition order.
pub type DependencyGraph = DiGraph<usize, usize>;

/// Marking used by depth first traversals.
///
/// Every traversal keeps its own colours, nothing is stored on the graph or the packs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Colour {
	/// Not visited yet.
	#[default] White,
	/// On the current path.
	Grey,
	/// Finished.
	Black,
}

/// Builds the graph with an edge from each pack to each of its dependencies.
///
/// All dependencies must already be known to be in `by_name`, unknown ones are skipped.
pub fn build(packs: &[Pack], by_name: &HashMap<String, usize>) -> DependencyGraph {
	let mut graph = DependencyGraph::with_capacity(packs.len(), packs.iter().map(|p| p.dependencies.len()).sum());
	for i in 0..packs.len() {
		graph.add_node(i);
	}
	for (i, pack) in packs.iter().enumerate() {
		for (position, dependency) in pack.dependencies.iter().enumerate() {
			if let Some(d) = by_name.get(dependency) {
				graph.add_edge(NodeIndex::new(i), NodeIndex::new(*d), position);
			}
		}
	}
	graph
}

/// Direct dependencies of `pack` in the order they were declared.
pub fn dependencies_of(graph: &DependencyGraph, pack: usize) -> Vec<usize> {
	let mut edges: Vec<_> = graph.edges_directed(NodeIndex::new(pack), Outgoing).collect();
	edges.sort_by_key(|e| *e.weight());
	edges.into_iter().map(|e| graph[e.target()]).collect()
}

/// Packs that directly depend on `pack`, in catalog order.
pub fn dependents_of(graph: &DependencyGraph, pack: usize) -> Vec<usize> {
	let mut v: Vec<usize> = graph.neighbors_directed(NodeIndex::new(pack), Incoming).map(|n| graph[n]).collect();
	v.sort_unstable();
	v.dedup();
	v
}

#[cfg(test)]
mod test {
	use super::*;

	fn graph(packs: &[Pack]) -> DependencyGraph {
		let by_name = packs.iter().enumerate().map(|(i, p)| (p.name.clone(), i)).collect();
		build(packs, &by_name)
	}

	#[test]
	fn dependencies_keep_declared_order() {
		let packs = [Pack::new("A").depends_on(["C", "B"]), Pack::new("B"), Pack::new("C")];
		assert_eq!(dependencies_of(&graph(&packs), 0), vec![2, 1]);
	}

	#[test]
	fn dependents_are_sorted() {
		let packs = [Pack::new("Lib"), Pack::new("B").depends_on(["Lib"]), Pack::new("A").depends_on(["Lib"])];
		assert_eq!(dependents_of(&graph(&packs), 0), vec![1, 2]);
	}

	#[test]
	fn colours_start_white() {
		assert_eq!(Colour::default(), Colour::White);
	}
}
