//! # GSN Tree
//!
//! A parsed GSN argument as a directed acyclic graph. Edges point from an
//! element to the elements it references through `supportedBy` or
//! `inContextOf`, so the top-level claim is the unique node with in-degree zero.
//!
//! Construction is fail-fast:
//! 1. labels must be non-empty and unique, declared beliefs must be probabilities
//! 2. every reference must resolve and use a legal type pair
//!    (GSN Community Standard v3, Table 1:2-2)
//! 3. the graph must have exactly one root and no cycles
//!
//! Nodes are stored densely and addressed by index; labels map to indices
//! through an `FxHashMap`.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::engine::element::{GsnElement, GsnType};
use crate::engine::errors::GsnError;
use crate::engine::probability::is_valid_probability;

/// The two relations a GSN element can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    SupportedBy,
    InContextOf,
}

impl RelationKind {
    pub fn name(self) -> &'static str {
        match self {
            RelationKind::SupportedBy => "supportedBy",
            RelationKind::InContextOf => "inContextOf",
        }
    }

    /// Whether `src --self--> dst` is a legal relation.
    pub fn allows(self, src: GsnType, dst: GsnType) -> bool {
        use GsnType::*;
        match self {
            RelationKind::SupportedBy => matches!(
                (src, dst),
                (Goal, Goal) | (Goal, Strategy) | (Goal, Solution) | (Strategy, Goal)
            ),
            RelationKind::InContextOf => {
                matches!(src, Goal | Strategy) && matches!(dst, Context | Assumption | Justification)
            }
        }
    }
}

/// Adjacency of a [`GsnTree`], indexed like [`GsnTree::elements`].
#[derive(Debug, Clone, Default)]
pub struct TreeGraph {
    successors: Vec<SmallVec<[usize; 4]>>,
    in_degree: Vec<usize>,
}

impl TreeGraph {
    fn with_nodes(count: usize) -> Self {
        Self {
            successors: vec![SmallVec::new(); count],
            in_degree: vec![0; count],
        }
    }

    fn add_edge(&mut self, src: usize, dst: usize) {
        self.successors[src].push(dst);
        self.in_degree[dst] += 1;
    }

    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.in_degree[node]
    }

    /// Nodes with in-degree zero, ascending.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&n| self.in_degree[n] == 0)
            .collect()
    }

    /// Kahn's algorithm. Returns `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let mut remaining = self.in_degree.clone();
        let mut queue: Vec<usize> = self.roots();
        queue.reverse();
        let mut order = Vec::with_capacity(self.node_count());

        while let Some(node) = queue.pop() {
            order.push(node);
            for &next in self.successors[node].iter().rev() {
                remaining[next] -= 1;
                if remaining[next] == 0 {
                    queue.push(next);
                }
            }
        }

        (order.len() == self.node_count()).then_some(order)
    }
}

/// A validated GSN argument.
#[derive(Debug, Clone)]
pub struct GsnTree {
    name: String,
    elements: Vec<GsnElement>,
    index: FxHashMap<String, usize>,
    edges: Vec<(String, String)>,
    graph: TreeGraph,
    root: usize,
}

impl GsnTree {
    /// Validates `elements` and builds the argument graph.
    ///
    /// Element order is preserved and determines the order of edges and,
    /// downstream, of network variables.
    pub fn build<I>(name: impl Into<String>, elements: I) -> Result<Self, GsnError>
    where
        I: IntoIterator<Item = GsnElement>,
    {
        let elements: Vec<GsnElement> = elements.into_iter().collect();
        let index = index_elements(&elements)?;
        verify_relations(&elements, &index)?;
        let edges = collect_edges(&elements);

        let mut graph = TreeGraph::with_nodes(elements.len());
        for (src, dst) in &edges {
            graph.add_edge(index[src.as_str()], index[dst.as_str()]);
        }

        let roots = graph.roots();
        let root = match roots.as_slice() {
            [root] => *root,
            [] => {
                return Err(GsnError::Structure(
                    "parsed GSN tree has no root node (cycle or empty tree)".into(),
                ))
            }
            many => {
                let labels: Vec<&str> = many.iter().map(|&i| elements[i].label()).collect();
                return Err(GsnError::Structure(format!(
                    "parsed GSN tree might be invalid, found multiple ({}) root nodes: {:?}",
                    many.len(),
                    labels
                )));
            }
        };

        if graph.topological_order().is_none() {
            return Err(GsnError::Structure(format!(
                "parsed GSN tree below root '{}' contains a cycle",
                elements[root].label()
            )));
        }

        Ok(Self {
            name: name.into(),
            elements,
            index,
            edges,
            graph,
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elements(&self) -> &[GsnElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, label: &str) -> Option<&GsnElement> {
        self.index_of(label).map(|i| &self.elements[i])
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Deduplicated `(source, referenced)` pairs in declaration order.
    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn graph(&self) -> &TreeGraph {
        &self.graph
    }

    /// The unique element nothing refers to: the top-level claim.
    pub fn root(&self) -> &GsnElement {
        &self.elements[self.root]
    }

    /// Elements referenced by `label`, in edge order.
    pub fn successors(&self, label: &str) -> Option<impl Iterator<Item = &GsnElement>> {
        let idx = self.index_of(label)?;
        Some(
            self.graph
                .successors(idx)
                .iter()
                .map(move |&i| &self.elements[i]),
        )
    }

    pub fn in_degree(&self, label: &str) -> Option<usize> {
        self.index_of(label).map(|i| self.graph.in_degree(i))
    }

    /// Labels from the root downwards; every element precedes the ones it references.
    pub fn topological_order(&self) -> Vec<&str> {
        self.graph
            .topological_order()
            .unwrap_or_default()
            .into_iter()
            .map(|i| self.elements[i].label())
            .collect()
    }

    /// Elements of one type, in declaration order.
    pub fn elements_of_type(&self, ty: GsnType) -> impl Iterator<Item = &GsnElement> {
        self.elements.iter().filter(move |e| e.element_type() == ty)
    }

    /// Type of a referenced label. Only valid for labels known to be in the tree.
    pub(crate) fn type_of(&self, label: &str) -> GsnType {
        self.elements[self.index[label]].element_type()
    }
}

fn index_elements(elements: &[GsnElement]) -> Result<FxHashMap<String, usize>, GsnError> {
    let mut index = FxHashMap::default();
    index.reserve(elements.len());
    for (i, element) in elements.iter().enumerate() {
        if element.label().is_empty() {
            return Err(GsnError::Structure(format!(
                "element #{} has an empty label",
                i
            )));
        }
        if let Some(belief) = element.belief() {
            if !is_valid_probability(&belief) {
                return Err(GsnError::InvalidProbability(format!(
                    "belief for element {} needs to be between 0...1 but is {}",
                    element.label(),
                    belief
                )));
            }
        }
        if index.insert(element.label().to_string(), i).is_some() {
            return Err(GsnError::Structure(format!(
                "duplicate element label '{}'",
                element.label()
            )));
        }
    }
    Ok(index)
}

fn verify_relations(
    elements: &[GsnElement],
    index: &FxHashMap<String, usize>,
) -> Result<(), GsnError> {
    for element in elements {
        let declared = [
            (RelationKind::SupportedBy, &element.supporters),
            (RelationKind::InContextOf, &element.contexts),
        ];
        for (kind, targets) in declared {
            for target in targets {
                let Some(&t) = index.get(target.as_str()) else {
                    return Err(GsnError::relation(
                        element.label(),
                        format!("{} references unknown element '{}'", kind.name(), target),
                    ));
                };
                let dst = elements[t].element_type();
                if !kind.allows(element.element_type(), dst) {
                    return Err(GsnError::relation(
                        element.label(),
                        format!(
                            "{} reference to '{}' is not a valid relation ({} -> {})",
                            kind.name(),
                            target,
                            element.element_type(),
                            dst
                        ),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn collect_edges(elements: &[GsnElement]) -> Vec<(String, String)> {
    let mut seen: FxHashSet<(&str, &str)> = FxHashSet::default();
    let mut edges = Vec::new();
    for element in elements {
        for dst in element.references() {
            if seen.insert((element.label(), dst)) {
                edges.push((element.label().to_string(), dst.to_string()));
            }
        }
    }
    edges
}
