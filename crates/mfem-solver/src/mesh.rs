//! Mesh data structures for grid-topology finite element analysis.
//!
//! A mesh only ever holds the solid part of a design: nodes and elements are
//! compacted so that their `index` fields are contiguous from 0. Every DOF and
//! matrix index downstream is derived from these indices.

use std::fmt;

use serde::Serialize;

use crate::error::{FemError, Result};
use crate::topology::ElementField;

/// Corner position of a node within an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    SouthWest = 0,
    SouthEast = 1,
    NorthEast = 2,
    NorthWest = 3,
}

impl Corner {
    /// Corners in element node order
    pub const ALL: [Corner; 4] = [
        Corner::SouthWest,
        Corner::SouthEast,
        Corner::NorthEast,
        Corner::NorthWest,
    ];

    /// Reference-square signs (ξ_k, η_k) of this corner
    pub fn signs(self) -> (f64, f64) {
        match self {
            Corner::SouthWest => (-1.0, -1.0),
            Corner::SouthEast => (1.0, -1.0),
            Corner::NorthEast => (1.0, 1.0),
            Corner::NorthWest => (-1.0, 1.0),
        }
    }

    /// Grid offset (di, dj) of this corner from the element's (i, j)
    pub fn offset(self) -> (usize, usize) {
        match self {
            Corner::SouthWest => (0, 0),
            Corner::SouthEast => (1, 0),
            Corner::NorthEast => (1, 1),
            Corner::NorthWest => (0, 1),
        }
    }
}

/// A node on the solid part of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// x-index in the node lattice
    pub i: usize,
    /// y-index in the node lattice
    pub j: usize,
    /// Position in the compacted node list
    pub index: usize,
    /// True if the node lies on the clamped edge (j == 0)
    pub boundary: bool,
}

impl Node {
    /// Physical coordinates in µm
    pub fn coords(&self, a: f64, b: f64) -> (f64, f64) {
        (2.0 * a * self.i as f64, 2.0 * b * self.j as f64)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {}: {} {}", self.index, self.i, self.j)
    }
}

/// A solid grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    /// x-index of the cell
    pub i: usize,
    /// y-index of the cell
    pub j: usize,
    /// Position in the compacted element list
    pub index: usize,
    /// Node indices in corner order (SW, SE, NE, NW)
    pub nodes: [usize; 4],
}

impl Element {
    /// Map physical coordinates (µm) onto this element's reference square
    pub fn reference_coords(&self, x: f64, y: f64, a: f64, b: f64) -> (f64, f64) {
        let xi = x / a - 2.0 * (self.i as f64 + 0.5);
        let eta = y / b - 2.0 * (self.j as f64 + 0.5);
        (xi, eta)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Element {}: {} {} {} {} ({}, {})",
            self.index, self.nodes[0], self.nodes[1], self.nodes[2], self.nodes[3], self.i, self.j
        )
    }
}

/// Compacted mesh of the solid cells of a topology
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) nodes: Vec<Node>,
    pub(crate) elements: Vec<Element>,
    pub(crate) a: f64,
    pub(crate) b: f64,
    pub(crate) grid: (usize, usize),
}

impl Mesh {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// True if the topology had no solid cells
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element half-dimensions (a, b) in µm
    pub fn half_dimensions(&self) -> (f64, f64) {
        (self.a, self.b)
    }

    /// Shape of the grid the mesh was compiled from
    pub fn grid_shape(&self) -> (usize, usize) {
        (self.grid.0, self.grid.1)
    }

    /// Corner nodes of an element
    pub fn element_nodes(&self, element: &Element) -> [&Node; 4] {
        element.nodes.map(|n| &self.nodes[n])
    }

    /// Sample a grid-aligned field at every element, in element order
    pub fn element_values(&self, field: &ElementField) -> Result<Vec<f64>> {
        if field.shape() != self.grid {
            return Err(FemError::InvalidField(format!(
                "field shape {:?} does not match grid shape {:?}",
                field.shape(),
                self.grid
            )));
        }
        Ok(self.elements.iter().map(|e| field.get(e.i, e.j)).collect())
    }

    /// Indices of elements with no chain of shared nodes to a clamped node
    pub fn unclamped_elements(&self) -> Vec<usize> {
        let mut node_elements = vec![Vec::new(); self.nodes.len()];
        for element in &self.elements {
            for &n in &element.nodes {
                node_elements[n].push(element.index);
            }
        }

        let mut reached = vec![false; self.elements.len()];
        let mut visited: Vec<bool> = self.nodes.iter().map(|n| n.boundary).collect();
        let mut stack: Vec<usize> = self
            .nodes
            .iter()
            .filter(|n| n.boundary)
            .map(|n| n.index)
            .collect();
        while let Some(node) = stack.pop() {
            for &e in &node_elements[node] {
                if reached[e] {
                    continue;
                }
                reached[e] = true;
                for &n in &self.elements[e].nodes {
                    if !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
        (0..self.elements.len()).filter(|&e| !reached[e]).collect()
    }

    /// Fail with `IllPosedBoundary` if any solid region floats free of the clamp
    pub fn check_clamped(&self) -> Result<()> {
        let floating = self.unclamped_elements();
        match floating.first() {
            None => Ok(()),
            Some(&first) => {
                let element = &self.elements[first];
                Err(FemError::IllPosedBoundary(format!(
                    "{} element(s) are not connected to the clamped edge, first at cell ({}, {})",
                    floating.len(),
                    element.i,
                    element.j
                )))
            }
        }
    }

    pub fn statistics(&self) -> MeshStatistics {
        MeshStatistics {
            num_nodes: self.nodes.len(),
            num_elements: self.elements.len(),
            num_boundary_nodes: self.nodes.iter().filter(|n| n.boundary).count(),
        }
    }
}

/// Mesh statistics for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshStatistics {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub num_boundary_nodes: usize,
}

impl MeshStatistics {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        [
            format!("Nodes: {}", self.num_nodes),
            format!("Elements: {}", self.num_elements),
            format!("Clamped nodes: {}", self.num_boundary_nodes),
        ]
        .join("\n")
    }
}
