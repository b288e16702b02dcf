//! Mesh builder compiling an occupancy grid into a compacted mesh.
//!
//! Compilation runs in two phases. The first allocates a node at every corner
//! of the (rows+1) x (cols+1) lattice and flags the corners of solid cells;
//! the second scans the lattice row-major and emits only the solid elements
//! and the nodes they touch, numbering both from 0. The lattice never leaves
//! this module.

use tracing::{debug, warn};

use crate::mesh::{Corner, Element, Mesh, Node};
use crate::topology::{Cantilever, Topology};

/// Transient lattice slot for a node
#[derive(Debug, Clone, Copy, Default)]
struct LatticeNode {
    solid: bool,
    index: usize,
}

/// Builds a mesh from an occupancy grid
pub struct MeshBuilder<'a> {
    topology: &'a Topology,
    a: f64,
    b: f64,
}

impl<'a> MeshBuilder<'a> {
    /// Create a builder for a topology with element half-dimensions `a`, `b` (µm)
    pub fn new(topology: &'a Topology, a: f64, b: f64) -> Self {
        Self { topology, a, b }
    }

    /// Build the mesh of a cantilever design
    pub fn from_cantilever(cantilever: &Cantilever) -> Mesh {
        MeshBuilder::new(&cantilever.topology, cantilever.a, cantilever.b).build()
    }

    /// Compile the topology into a mesh
    pub fn build(&self) -> Mesh {
        let (rows, cols) = self.topology.shape();
        let mut lattice = self.mark_lattice(rows, cols);

        // Node pass: compact the solid lattice nodes row-major.
        let mut nodes = Vec::new();
        for i in 0..=rows {
            for j in 0..=cols {
                let slot = &mut lattice[i * (cols + 1) + j];
                if slot.solid {
                    slot.index = nodes.len();
                    nodes.push(Node {
                        i,
                        j,
                        index: nodes.len(),
                        boundary: j == 0,
                    });
                }
            }
        }

        // Element pass: compact the solid cells row-major.
        let mut elements = Vec::with_capacity(self.topology.solid_count());
        for i in 0..rows {
            for j in 0..cols {
                if !self.topology.is_solid(i, j) {
                    continue;
                }
                let corners = Corner::ALL.map(|corner| {
                    let (di, dj) = corner.offset();
                    lattice[(i + di) * (cols + 1) + (j + dj)].index
                });
                elements.push(Element {
                    i,
                    j,
                    index: elements.len(),
                    nodes: corners,
                });
            }
        }

        if elements.is_empty() {
            warn!(rows, cols, "topology has no solid elements; mesh is empty");
        } else {
            debug!(
                nodes = nodes.len(),
                elements = elements.len(),
                "compiled mesh"
            );
        }

        Mesh {
            nodes,
            elements,
            a: self.a,
            b: self.b,
            grid: (rows, cols),
        }
    }

    /// Phase one: flag every corner of every solid cell
    fn mark_lattice(&self, rows: usize, cols: usize) -> Vec<LatticeNode> {
        let mut lattice = vec![LatticeNode::default(); (rows + 1) * (cols + 1)];
        for i in 0..rows {
            for j in 0..cols {
                if self.topology.is_solid(i, j) {
                    for corner in Corner::ALL {
                        let (di, dj) = corner.offset();
                        lattice[(i + di) * (cols + 1) + (j + dj)].solid = true;
                    }
                }
            }
        }
        lattice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(rows: &[Vec<u8>]) -> Mesh {
        let topology = Topology::from_rows(rows).unwrap();
        MeshBuilder::new(&topology, 5.0, 5.0).build()
    }

    #[test]
    fn single_element_mesh() {
        let mesh = build(&[vec![1]]);
        assert_eq!(mesh.n_elements(), 1);
        assert_eq!(mesh.n_nodes(), 4);

        let element = mesh.elements()[0];
        let nodes = mesh.element_nodes(&element);
        let grid: Vec<_> = nodes.iter().map(|n| (n.i, n.j)).collect();
        assert_eq!(grid, vec![(0, 0), (1, 0), (1, 1), (0, 1)]);
    }

    #[test]
    fn shared_nodes_are_not_duplicated() {
        // Two cells along x share an edge: 6 nodes
        let mesh = build(&[vec![1], vec![1]]);
        assert_eq!(mesh.n_nodes(), 6);
        let first = mesh.elements()[0];
        let second = mesh.elements()[1];
        assert_eq!(first.nodes[1], second.nodes[0]);
        assert_eq!(first.nodes[2], second.nodes[3]);
    }

    #[test]
    fn void_cells_are_skipped() {
        let mesh = build(&[vec![1, 0, 1], vec![0, 0, 0], vec![1, 1, 0]]);
        assert_eq!(mesh.n_elements(), 4);
        let cells: Vec<_> = mesh.elements().iter().map(|e| (e.i, e.j)).collect();
        assert_eq!(cells, vec![(0, 0), (0, 2), (2, 0), (2, 1)]);
        for (k, e) in mesh.elements().iter().enumerate() {
            assert_eq!(e.index, k);
        }
    }

    #[test]
    fn node_indices_are_contiguous() {
        let mesh = build(&[vec![0, 1, 0], vec![1, 0, 1], vec![0, 1, 1]]);
        for (k, n) in mesh.nodes().iter().enumerate() {
            assert_eq!(n.index, k);
        }
        // Every referenced node index is in range
        for e in mesh.elements() {
            assert!(e.nodes.iter().all(|&n| n < mesh.n_nodes()));
        }
    }

    #[test]
    fn boundary_flag_marks_first_column() {
        let mesh = build(&[vec![1, 1]]);
        let boundary: Vec<_> = mesh.nodes().iter().filter(|n| n.boundary).collect();
        assert_eq!(boundary.len(), 2);
        assert!(boundary.iter().all(|n| n.j == 0));
    }

    #[test]
    fn empty_topology_gives_empty_mesh() {
        let mesh = build(&[vec![0, 0], vec![0, 0]]);
        assert!(mesh.is_empty());
        assert_eq!(mesh.n_nodes(), 0);
        assert_eq!(mesh.grid_shape(), (2, 2));
    }
}
