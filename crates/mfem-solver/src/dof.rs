//! Degree-of-freedom numbering and boundary partitioning.
//!
//! Every physics model gives each node a fixed-size block of DOFs. With block
//! size `d`, node `n` owns `d*n .. d*n + d`. DOFs on the clamped edge are fixed
//! at zero; the rest are free.

use std::ops::Range;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;

/// Physics models supported by the DOF mapper and element kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Physics {
    /// Mindlin plate: (w, θx, θy) per node
    Plate,
    /// Piezoelectric laminate: (u, v, w, θx, θy) per node plus one electrode
    Laminate,
    /// Scalar diffusion (heat conduction): one value per node
    Diffusion,
}

impl Physics {
    /// DOFs per node
    pub fn block_size(self) -> usize {
        match self {
            Physics::Plate => 3,
            Physics::Laminate => 5,
            Physics::Diffusion => 1,
        }
    }

    /// Offset of the transverse deflection DOF within a node block
    pub fn deflection_offset(self) -> usize {
        match self {
            Physics::Plate => 0,
            Physics::Laminate => 2,
            Physics::Diffusion => 0,
        }
    }

    /// Number of electrical DOFs for the whole structure
    pub fn electrical_dofs(self) -> usize {
        match self {
            Physics::Laminate => 1,
            Physics::Plate | Physics::Diffusion => 0,
        }
    }
}

/// DOFs owned by one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofNode {
    /// Index of the mesh node
    pub node: usize,
    pub dofs: Range<usize>,
    pub deflection_dof: usize,
    pub boundary: bool,
}

/// Local-to-global scatter map of one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofElement {
    /// Index of the mesh element
    pub element: usize,
    /// Corner node DOF blocks concatenated in SW, SE, NE, NW order
    pub dofs: Vec<usize>,
    /// Electrical DOFs (laminates only)
    pub electrical_dofs: Vec<usize>,
}

impl DofElement {
    /// Extract this element's entries from a full-length vector
    pub fn gather(&self, u: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(self.dofs.len(), self.dofs.iter().map(|&d| u[d]))
    }
}

/// DOF numbering for one physics model on one mesh
#[derive(Debug, Clone)]
pub struct DofMap {
    physics: Physics,
    nodes: Vec<DofNode>,
    elements: Vec<DofElement>,
    fixed: Vec<usize>,
    free: Vec<usize>,
}

impl DofMap {
    pub fn new(mesh: &Mesh, physics: Physics) -> Self {
        let d = physics.block_size();
        let nodes: Vec<DofNode> = mesh
            .nodes()
            .iter()
            .map(|n| DofNode {
                node: n.index,
                dofs: d * n.index..d * n.index + d,
                deflection_dof: d * n.index + physics.deflection_offset(),
                boundary: n.boundary,
            })
            .collect();

        let electrical: Vec<usize> = (0..physics.electrical_dofs()).collect();
        let elements = mesh
            .elements()
            .iter()
            .map(|e| DofElement {
                element: e.index,
                dofs: e.nodes.iter().flat_map(|&n| nodes[n].dofs.clone()).collect(),
                electrical_dofs: electrical.clone(),
            })
            .collect();

        let fixed: Vec<usize> = nodes
            .iter()
            .filter(|n| n.boundary)
            .flat_map(|n| n.dofs.clone())
            .collect();
        let mut is_fixed = vec![false; d * nodes.len()];
        for &dof in &fixed {
            is_fixed[dof] = true;
        }
        let free = (0..d * nodes.len()).filter(|&dof| !is_fixed[dof]).collect();

        Self {
            physics,
            nodes,
            elements,
            fixed,
            free,
        }
    }

    pub fn physics(&self) -> Physics {
        self.physics
    }

    pub fn nodes(&self) -> &[DofNode] {
        &self.nodes
    }

    pub fn elements(&self) -> &[DofElement] {
        &self.elements
    }

    /// Total number of (mechanical or scalar) DOFs
    pub fn n_dofs(&self) -> usize {
        self.physics.block_size() * self.nodes.len()
    }

    /// Number of electrical DOFs (0 unless laminate)
    pub fn n_electrical_dofs(&self) -> usize {
        self.physics.electrical_dofs()
    }

    pub fn all_dofs(&self) -> Range<usize> {
        0..self.n_dofs()
    }

    /// DOFs on clamped nodes, ascending
    pub fn fixed_dofs(&self) -> &[usize] {
        &self.fixed
    }

    /// DOFs not on clamped nodes, ascending
    pub fn free_dofs(&self) -> &[usize] {
        &self.free
    }

    /// Expand a free-DOF vector into a full-length vector with zeros on fixed DOFs
    pub fn expand(&self, reduced: &DVector<f64>) -> DVector<f64> {
        let mut full = DVector::zeros(self.n_dofs());
        for (k, &dof) in self.free.iter().enumerate() {
            full[dof] = reduced[k];
        }
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_builder::MeshBuilder;
    use crate::topology::Topology;

    fn mesh(rows: usize, cols: usize) -> Mesh {
        MeshBuilder::new(&Topology::filled(rows, cols), 5.0, 5.0).build()
    }

    #[test]
    fn partitions_all_dofs() {
        let mesh = mesh(3, 2);
        for physics in [Physics::Plate, Physics::Laminate, Physics::Diffusion] {
            let dof = DofMap::new(&mesh, physics);
            let d = physics.block_size();
            assert_eq!(dof.n_dofs(), d * mesh.n_nodes());
            assert_eq!(dof.fixed_dofs().len() + dof.free_dofs().len(), dof.n_dofs());

            let mut merged: Vec<usize> = dof
                .fixed_dofs()
                .iter()
                .chain(dof.free_dofs())
                .copied()
                .collect();
            merged.sort_unstable();
            assert_eq!(merged, dof.all_dofs().collect::<Vec<_>>());
        }
    }

    #[test]
    fn fixed_dofs_belong_to_clamped_nodes() {
        let mesh = mesh(2, 2);
        let dof = DofMap::new(&mesh, Physics::Plate);
        // Three nodes sit on j == 0
        assert_eq!(dof.fixed_dofs().len(), 9);
        for &d in dof.fixed_dofs() {
            assert!(mesh.nodes()[d / 3].boundary);
        }
    }

    #[test]
    fn element_scatter_follows_corner_order() {
        let mesh = mesh(1, 1);
        let dof = DofMap::new(&mesh, Physics::Laminate);
        let element = &dof.elements()[0];
        assert_eq!(element.dofs.len(), 20);
        let corners = mesh.elements()[0].nodes;
        for (k, &n) in corners.iter().enumerate() {
            let expected: Vec<usize> = (5 * n..5 * n + 5).collect();
            assert_eq!(&element.dofs[5 * k..5 * k + 5], expected.as_slice());
        }
        assert_eq!(element.electrical_dofs, vec![0]);
    }

    #[test]
    fn deflection_dof_offset_per_physics() {
        let mesh = mesh(1, 1);
        let plate = DofMap::new(&mesh, Physics::Plate);
        let laminate = DofMap::new(&mesh, Physics::Laminate);
        assert_eq!(plate.nodes()[1].deflection_dof, 3);
        assert_eq!(laminate.nodes()[1].deflection_dof, 7);
    }

    #[test]
    fn expand_zeroes_fixed_dofs() {
        let mesh = mesh(1, 1);
        let dof = DofMap::new(&mesh, Physics::Diffusion);
        let reduced = DVector::from_element(dof.free_dofs().len(), 2.0);
        let full = dof.expand(&reduced);
        for &d in dof.fixed_dofs() {
            assert_eq!(full[d], 0.0);
        }
        for &d in dof.free_dofs() {
            assert_eq!(full[d], 2.0);
        }
    }

    #[test]
    fn empty_mesh_has_no_dofs() {
        let mesh = MeshBuilder::new(&Topology::empty(2, 2), 5.0, 5.0).build();
        let dof = DofMap::new(&mesh, Physics::Plate);
        assert_eq!(dof.n_dofs(), 0);
        assert!(dof.free_dofs().is_empty());
        assert!(dof.elements().is_empty());
    }

    #[test]
    fn gather_reads_element_entries() {
        let mesh = mesh(2, 1);
        let dof = DofMap::new(&mesh, Physics::Diffusion);
        let u = DVector::from_iterator(dof.n_dofs(), (0..dof.n_dofs()).map(|d| d as f64));
        let second = &dof.elements()[1];
        let local = second.gather(&u);
        let expected: Vec<f64> = mesh.elements()[1].nodes.iter().map(|&n| n as f64).collect();
        assert_eq!(local.as_slice(), expected.as_slice());
    }
}
