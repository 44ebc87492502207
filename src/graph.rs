//!
//! Directed edge set algorithms
//!
//! * reachable / reaching sets
//! * cyclic component of a node
//! * topological sort that groups mutually cyclic nodes
//!
//! used on the clique graph (must be acyclic) and on the silent transitions
//! inside a clique (cycles are resolved as a linear system).
//!
use fnv::{FnvHashMap, FnvHashSet};
use petgraph::graphmap::{DiGraphMap, NodeTrait};
use petgraph::unionfind::UnionFind;
use petgraph::Direction;

///
/// A set of directed edges over copyable node ids.
///
/// Nodes are visited in ascending order, whatever order they were added
/// (or removed) in, so every traversal below is deterministic.
///
#[derive(Debug, Clone)]
pub struct EdgeSet<N: NodeTrait> {
    graph: DiGraphMap<N, ()>,
}

///
/// An element of `sort_graph` output.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group<N> {
    /// a node that had no remaining incoming edge when it was removed
    Transient(N),
    /// a maximal cyclic component with no entry from remaining nodes,
    /// sorted ascending. A node with a self loop forms a one-element group.
    Cyclic(Vec<N>),
}

impl<N: Copy> Group<N> {
    pub fn nodes(&self) -> Vec<N> {
        match self {
            Group::Transient(n) => vec![*n],
            Group::Cyclic(ns) => ns.clone(),
        }
    }
    pub fn len(&self) -> usize {
        match self {
            Group::Transient(_) => 1,
            Group::Cyclic(ns) => ns.len(),
        }
    }
    pub fn is_cyclic(&self) -> bool {
        matches!(self, Group::Cyclic(_))
    }
}

impl<N: NodeTrait> Default for EdgeSet<N> {
    fn default() -> Self {
        EdgeSet {
            graph: DiGraphMap::new(),
        }
    }
}

impl<N: NodeTrait> EdgeSet<N> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_edges<I: IntoIterator<Item = (N, N)>>(edges: I) -> Self {
        let mut s = Self::new();
        for (a, b) in edges {
            s.add_edge(a, b);
        }
        s
    }
    ///
    /// Register a node without edges.
    ///
    pub fn add_node(&mut self, node: N) {
        self.graph.add_node(node);
    }
    pub fn add_edge(&mut self, from: N, to: N) {
        self.graph.add_edge(from, to, ());
    }
    pub fn contains_edge(&self, from: N, to: N) -> bool {
        self.graph.contains_edge(from, to)
    }
    pub fn n_nodes(&self) -> usize {
        self.graph.node_count()
    }
    pub fn n_edges(&self) -> usize {
        self.graph.edge_count()
    }
    pub fn nodes(&self) -> Vec<N> {
        sorted_nodes(&self.graph)
    }
    pub fn edges(&self) -> Vec<(N, N)> {
        self.graph.all_edges().map(|(a, b, _)| (a, b)).collect()
    }
    ///
    /// Nodes without incoming edges
    ///
    pub fn sources(&self) -> Vec<N> {
        sorted_nodes(&self.graph)
            .into_iter()
            .filter(|&n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }
    ///
    /// Nodes without outgoing edges
    ///
    pub fn sinks(&self) -> Vec<N> {
        sorted_nodes(&self.graph)
            .into_iter()
            .filter(|&n| {
                self.graph
                    .neighbors_directed(n, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect()
    }
    ///
    /// Nodes reachable from `node` by one or more edges.
    ///
    /// `node` itself is included only if it lies on a cycle.
    ///
    pub fn reachable_from(&self, node: N) -> FnvHashSet<N> {
        closure(&self.graph, node, Direction::Outgoing)
    }
    ///
    /// Nodes from which `node` is reachable by one or more edges.
    ///
    pub fn reaching_to(&self, node: N) -> FnvHashSet<N> {
        closure(&self.graph, node, Direction::Incoming)
    }
    ///
    /// Nodes both reachable from and reaching `node`.
    ///
    /// Empty if `node` is not on a cycle.
    ///
    pub fn cyclic_component(&self, node: N) -> FnvHashSet<N> {
        cyclic_component(&self.graph, node)
    }
    ///
    /// Number of weakly connected components
    ///
    pub fn connected_components(&self) -> usize {
        let index: FnvHashMap<N, usize> = self
            .graph
            .nodes()
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        let mut uf = UnionFind::new(index.len());
        for (a, b, _) in self.graph.all_edges() {
            uf.union(index[&a], index[&b]);
        }
        let mut labels = uf.into_labeling();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }
    ///
    /// Topological sort grouping mutually cyclic nodes.
    ///
    /// Repeatedly removes a node without remaining incoming edge (emitted as
    /// `Group::Transient`) or, when there is none, a cyclic component that
    /// no remaining node outside it can reach (emitted as `Group::Cyclic`).
    ///
    pub fn sort_graph(&self) -> Vec<Group<N>> {
        let mut g = self.graph.clone();
        let mut groups = Vec::new();

        while g.node_count() > 0 {
            let nodes = sorted_nodes(&g);
            let transient = nodes
                .iter()
                .copied()
                .find(|&n| g.neighbors_directed(n, Direction::Incoming).next().is_none());
            if let Some(n) = transient {
                g.remove_node(n);
                groups.push(Group::Transient(n));
                continue;
            }

            // every remaining node has an incoming edge, so a closed cyclic
            // component exists in any finite graph
            let closed = nodes.iter().find_map(|&n| {
                let component = cyclic_component(&g, n);
                let reaching = closure(&g, n, Direction::Incoming);
                if !component.is_empty() && component.len() == reaching.len() {
                    Some(component)
                } else {
                    None
                }
            });
            let component = match closed {
                Some(component) => component,
                None => unreachable!("sort_graph: no source and no closed cycle"),
            };
            let mut members: Vec<N> = component.into_iter().collect();
            members.sort();
            for &n in members.iter() {
                g.remove_node(n);
            }
            groups.push(Group::Cyclic(members));
        }

        groups
    }
}

fn sorted_nodes<N: NodeTrait>(g: &DiGraphMap<N, ()>) -> Vec<N> {
    let mut nodes: Vec<N> = g.nodes().collect();
    nodes.sort();
    nodes
}

fn closure<N: NodeTrait>(g: &DiGraphMap<N, ()>, node: N, dir: Direction) -> FnvHashSet<N> {
    let mut set: FnvHashSet<N> = g.neighbors_directed(node, dir).collect();
    loop {
        let next: Vec<N> = set
            .iter()
            .flat_map(|&n| g.neighbors_directed(n, dir))
            .filter(|n| !set.contains(n))
            .collect();
        if next.is_empty() {
            break;
        }
        set.extend(next);
    }
    set
}

fn cyclic_component<N: NodeTrait>(g: &DiGraphMap<N, ()>, node: N) -> FnvHashSet<N> {
    let reachable = closure(g, node, Direction::Outgoing);
    let reaching = closure(g, node, Direction::Incoming);
    reachable.intersection(&reaching).copied().collect()
}
