//! The relationship graph and its connectivity statistics.
//!
//! Nodes are element ids, stored once in an arena and addressed by
//! [`NodeIndex`]; edges are relationship instances. The graph is built once
//! per audit and never updated.

use std::collections::{BTreeMap, HashMap};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    unionfind::UnionFind,
};
use serde::Serialize;

use crate::storage::ModelSnapshot;

/// Directed graph of elements and their relationships.
#[derive(Debug, Default)]
pub struct RelationshipGraph {
    graph: DiGraph<String, String>,
    index: HashMap<String, NodeIndex>,
}

impl RelationshipGraph {
    /// Builds the graph from every element and relationship in `snapshot`.
    ///
    /// Every element is a node, whether or not it has relationships.
    /// Relationship targets missing from the model become nodes too.
    /// Elements without an id contribute neither nodes nor edges.
    #[must_use]
    pub fn build(snapshot: &ModelSnapshot) -> Self {
        let mut graph = Self::default();
        let identified = || snapshot.elements().iter().filter(|e| !e.id.is_empty());
        for element in identified() {
            graph.node(&element.id);
        }
        for element in identified() {
            for relationship in &element.relationships {
                graph.add_edge(&element.id, &relationship.target, &relationship.predicate);
            }
        }
        graph
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.index.get(id) {
            return index;
        }
        let index = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), index);
        index
    }

    /// Adds a relationship, creating nodes for unseen ids.
    pub fn add_edge(&mut self, source: &str, destination: &str, predicate: &str) {
        let source = self.node(source);
        let destination = self.node(destination);
        self.graph
            .add_edge(source, destination, predicate.to_string());
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// In-degree plus out-degree of a node. Parallel edges count
    /// separately; a self-loop counts twice.
    #[must_use]
    pub fn degree(&self, id: &str) -> Option<usize> {
        self.index.get(id).map(|&node| self.total_degree(node))
    }

    fn total_degree(&self, node: NodeIndex) -> usize {
        self.graph.edges_directed(node, Direction::Outgoing).count()
            + self.graph.edges_directed(node, Direction::Incoming).count()
    }

    fn id(&self, node: NodeIndex) -> &str {
        &self.graph[node]
    }

    /// Outgoing neighbours of `node`, sorted by id and deduplicated.
    fn sorted_successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut successors: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        successors.sort_by(|a, b| self.id(*a).cmp(self.id(*b)));
        successors.dedup();
        successors
    }
}

/// An indirect path between two elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitiveChain {
    /// First element.
    pub start: String,
    /// Last element.
    pub end: String,
    /// Every element on the path, `start` and `end` included.
    pub path: Vec<String>,
}

/// Whole-graph summary numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityStats {
    /// Distinct element ids, including relationship targets.
    pub node_count: usize,
    /// Relationship instances.
    pub edge_count: usize,
    /// Weakly connected components.
    pub connected_components: usize,
    /// Size of the largest component.
    pub largest_component_size: usize,
    /// Nodes with no relationships at all.
    pub isolated_nodes: usize,
    /// Mean of in-degree plus out-degree.
    pub average_degree: f64,
    /// Number of reported transitive chains.
    pub transitive_chain_count: usize,
}

/// Connectivity section of the audit report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityReport {
    /// Members of each component, sorted; largest component first.
    pub components: Vec<Vec<String>>,
    /// Degree histogram: degree to number of nodes with that degree.
    pub degrees: BTreeMap<usize, usize>,
    /// Shortest indirect paths, sorted by start then end.
    pub transitive_chains: Vec<TransitiveChain>,
    /// Summary numbers.
    pub stats: ConnectivityStats,
}

/// Computes structural statistics over a [`RelationshipGraph`].
#[derive(Debug)]
pub struct ConnectivityAnalyzer<'g> {
    graph: &'g RelationshipGraph,
    max_depth: usize,
    max_chains: usize,
}

impl<'g> ConnectivityAnalyzer<'g> {
    /// Creates an analyzer following at most `max_depth` edges per chain and
    /// reporting at most `max_chains` chains.
    #[must_use]
    pub const fn new(graph: &'g RelationshipGraph, max_depth: usize, max_chains: usize) -> Self {
        Self {
            graph,
            max_depth,
            max_chains,
        }
    }

    /// Runs every analysis.
    #[must_use]
    pub fn analyze(&self) -> ConnectivityReport {
        let components = self.components();
        let degrees = self.degree_histogram();
        let transitive_chains = self.transitive_chains();

        let node_count = self.graph.node_count();
        let degree_sum: usize = degrees.iter().map(|(degree, nodes)| degree * nodes).sum();

        let stats = ConnectivityStats {
            node_count,
            edge_count: self.graph.edge_count(),
            connected_components: components.len(),
            largest_component_size: components.first().map_or(0, Vec::len),
            isolated_nodes: degrees.get(&0).copied().unwrap_or_default(),
            average_degree: average(degree_sum, node_count),
            transitive_chain_count: transitive_chains.len(),
        };

        ConnectivityReport {
            components,
            degrees,
            transitive_chains,
            stats,
        }
    }

    /// Weakly connected components: direction is ignored.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<String>> {
        let graph = &self.graph.graph;
        let mut sets = UnionFind::new(graph.node_count());
        for edge in graph.raw_edges() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
        for node in graph.node_indices() {
            groups
                .entry(sets.find(node.index()))
                .or_default()
                .push(graph[node].clone());
        }

        let mut components: Vec<Vec<String>> = groups
            .into_values()
            .map(|mut members| {
                members.sort();
                members
            })
            .collect();
        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        components
    }

    /// Number of nodes per total degree.
    #[must_use]
    pub fn degree_histogram(&self) -> BTreeMap<usize, usize> {
        let mut histogram = BTreeMap::new();
        for node in self.graph.graph.node_indices() {
            *histogram.entry(self.graph.total_degree(node)).or_default() += 1;
        }
        histogram
    }

    /// Indirect paths of at least two edges.
    ///
    /// For each ordered pair of elements joined by a simple directed path of
    /// between two and `max_depth` edges, reports the shortest such path;
    /// among equally short paths the lexicographically smallest wins. A pair
    /// that also shares a direct edge still gets its shortest longer path.
    /// Searches are depth-first from each node in id order and cut off at
    /// `max_depth`.
    #[must_use]
    pub fn transitive_chains(&self) -> Vec<TransitiveChain> {
        let mut starts: Vec<NodeIndex> = self.graph.graph.node_indices().collect();
        starts.sort_by(|a, b| self.graph.id(*a).cmp(self.graph.id(*b)));

        let mut chains = Vec::new();
        for start in starts {
            for chain in self.chains_from(start) {
                if chains.len() == self.max_chains {
                    tracing::warn!(
                        limit = self.max_chains,
                        "Transitive chain limit reached; remaining chains omitted"
                    );
                    return chains;
                }
                chains.push(chain);
            }
        }
        chains
    }

    /// Shortest chain from `start` to every node reachable in two or more
    /// edges, sorted by end id.
    fn chains_from(&self, start: NodeIndex) -> Vec<TransitiveChain> {
        let mut best: BTreeMap<&str, Vec<NodeIndex>> = BTreeMap::new();
        let mut path = vec![start];
        self.extend_chains(&mut path, &mut best);

        best.into_iter()
            .map(|(end, path)| TransitiveChain {
                start: self.graph.id(start).to_string(),
                end: end.to_string(),
                path: path
                    .into_iter()
                    .map(|node| self.graph.id(node).to_string())
                    .collect(),
            })
            .collect()
    }

    /// Depth-first walk over simple paths. Successors are visited in id
    /// order, so paths are enumerated lexicographically and only a strictly
    /// shorter path replaces the one recorded for an end.
    fn extend_chains<'a>(
        &'a self,
        path: &mut Vec<NodeIndex>,
        best: &mut BTreeMap<&'a str, Vec<NodeIndex>>,
    ) {
        let edges = path.len() - 1;
        if edges == self.max_depth {
            return;
        }
        let Some(&node) = path.last() else {
            return;
        };

        for next in self.graph.sorted_successors(node) {
            if path.contains(&next) {
                continue;
            }
            path.push(next);
            if edges + 1 >= 2 {
                let end = self.graph.id(next);
                if best.get(end).is_none_or(|known| known.len() > path.len()) {
                    best.insert(end, path.clone());
                }
            }
            self.extend_chains(path, best);
            path.pop();
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn average(total: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ModelElement,
        storage::{ModelMetadata, ModelSnapshot},
    };

    fn graph(edges: &[(&str, &str)]) -> RelationshipGraph {
        let mut graph = RelationshipGraph::default();
        for (source, destination) in edges {
            graph.add_edge(source, destination, "uses");
        }
        graph
    }

    fn analyze(graph: &RelationshipGraph) -> ConnectivityReport {
        ConnectivityAnalyzer::new(graph, 4, 10_000).analyze()
    }

    #[test]
    fn single_edge_connects_both_elements() {
        let snapshot = ModelSnapshot::new(
            ModelMetadata::default(),
            vec![
                ModelElement::new("business-service-a", "business", "service", "A"),
                ModelElement::new("business-service-b", "business", "service", "B")
                    .with_relationship("uses", "business-service-a"),
            ],
        );
        let graph = RelationshipGraph::build(&snapshot);
        let stats = analyze(&graph).stats;

        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.isolated_nodes, 0);
        assert_eq!(stats.connected_components, 1);
        assert!((stats.average_degree - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn isolated_elements_are_nodes() {
        let snapshot = ModelSnapshot::new(
            ModelMetadata::default(),
            vec![
                ModelElement::new("business-service-a", "business", "service", "A"),
                ModelElement::new("business-service-b", "business", "service", "B")
                    .with_relationship("uses", "business-service-c"),
                ModelElement::new("business-service-c", "business", "service", "C"),
            ],
        );
        let report = analyze(&RelationshipGraph::build(&snapshot));

        assert_eq!(report.stats.node_count, 3);
        assert_eq!(report.stats.isolated_nodes, 1);
        assert_eq!(report.stats.connected_components, 2);
        assert_eq!(report.stats.largest_component_size, 2);
        assert_eq!(report.components[1], ["business-service-a"]);
        assert_eq!(report.degrees, BTreeMap::from([(0, 1), (1, 2)]));
    }

    #[test]
    fn components_ignore_direction() {
        let graph = graph(&[("a", "b"), ("c", "b"), ("d", "e")]);
        let components = ConnectivityAnalyzer::new(&graph, 4, 100).components();
        assert_eq!(components, [vec!["a", "b", "c"], vec!["d", "e"]]);
    }

    #[test]
    fn chains_follow_direction() {
        let graph = graph(&[("goal", "service"), ("service", "component"), ("goal", "x")]);
        let chains = ConnectivityAnalyzer::new(&graph, 4, 100).transitive_chains();
        assert_eq!(
            chains,
            [TransitiveChain {
                start: "goal".to_string(),
                end: "component".to_string(),
                path: vec!["goal".into(), "service".into(), "component".into()],
            }]
        );
    }

    #[test]
    fn direct_edge_does_not_hide_longer_chain() {
        let graph = graph(&[
            ("goal", "service"),
            ("service", "component"),
            ("goal", "component"),
        ]);
        let chains = ConnectivityAnalyzer::new(&graph, 4, 100).transitive_chains();
        assert_eq!(
            chains,
            [TransitiveChain {
                start: "goal".to_string(),
                end: "component".to_string(),
                path: vec!["goal".into(), "service".into(), "component".into()],
            }]
        );
    }

    #[test]
    fn anonymous_elements_add_no_nodes() {
        let anonymous = ModelElement::new("", "business", "service", "Nameless")
            .with_relationship("uses", "business-service-a");
        let snapshot = ModelSnapshot::new(
            ModelMetadata::default(),
            vec![
                ModelElement::new("business-service-a", "business", "service", "A"),
                anonymous,
            ],
        );
        let stats = analyze(&RelationshipGraph::build(&snapshot)).stats;

        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.edge_count, 0);
        assert_eq!(stats.isolated_nodes, 1);
    }

    #[test]
    fn chains_prefer_shortest_then_lexicographic_paths() {
        let graph = graph(&[
            ("a", "c"),
            ("a", "b"),
            ("b", "d"),
            ("c", "d"),
            ("d", "e"),
            ("a", "f"),
            ("f", "g"),
            ("g", "e"),
        ]);
        let chains = ConnectivityAnalyzer::new(&graph, 4, 100).transitive_chains();
        let a_to_d = chains
            .iter()
            .find(|c| c.start == "a" && c.end == "d")
            .unwrap();
        assert_eq!(a_to_d.path, ["a", "b", "d"]);
        let a_to_e = chains
            .iter()
            .find(|c| c.start == "a" && c.end == "e")
            .unwrap();
        assert_eq!(a_to_e.path, ["a", "b", "d", "e"]);
    }

    #[test]
    fn chain_depth_is_bounded() {
        let graph = graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")]);
        let shallow = ConnectivityAnalyzer::new(&graph, 2, 100).transitive_chains();
        assert!(shallow.iter().all(|c| c.path.len() == 3));
        assert_eq!(shallow.len(), 3);

        let deep = ConnectivityAnalyzer::new(&graph, 4, 100).transitive_chains();
        assert_eq!(deep.len(), 6);
    }

    #[test]
    fn chains_never_revisit_nodes() {
        let graph = graph(&[("a", "b"), ("b", "a"), ("b", "c")]);
        let chains = ConnectivityAnalyzer::new(&graph, 4, 100).transitive_chains();
        assert!(chains.iter().all(|c| c.start != c.end));
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].path, ["a", "b", "c"]);
    }

    #[test]
    fn chain_count_is_capped() {
        let graph = graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")]);
        let chains = ConnectivityAnalyzer::new(&graph, 4, 2).transitive_chains();
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn empty_graph_has_zero_average_degree() {
        let report = analyze(&RelationshipGraph::default());
        assert_eq!(report.stats.node_count, 0);
        assert!(report.stats.average_degree.abs() < f64::EPSILON);
        assert_eq!(report.stats.largest_component_size, 0);
    }
}
