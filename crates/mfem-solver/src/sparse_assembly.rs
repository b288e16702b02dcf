//! Sparse matrix assembly for grid-topology finite element systems.
//!
//! Local matrices are scattered through the DOF map as (row, col, value)
//! triplets. Triplets are emitted per element in parallel and accumulated
//! serially in element order through a COO matrix, whose conversion to CSR
//! sums duplicate entries.
//!
//! Free-DOF views are extracted by index remapping, so assembled matrices
//! always keep the full DOF numbering.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;
use tracing::debug;

use crate::dof::{DofElement, DofMap};

type Triplet = (usize, usize, f64);

/// Picks the row and column scatter maps of an element
type Selector = fn(&DofElement) -> (&[usize], &[usize]);

fn mechanical(element: &DofElement) -> (&[usize], &[usize]) {
    (&element.dofs, &element.dofs)
}

fn coupling(element: &DofElement) -> (&[usize], &[usize]) {
    (&element.dofs, &element.electrical_dofs)
}

fn electrical(element: &DofElement) -> (&[usize], &[usize]) {
    (&element.electrical_dofs, &element.electrical_dofs)
}

/// Scatter-add assembler over one DOF map
pub struct Assembler<'a> {
    dof: &'a DofMap,
}

impl<'a> Assembler<'a> {
    pub fn new(dof: &'a DofMap) -> Self {
        Self { dof }
    }

    /// Assemble a mechanical (or scalar) matrix of size n_dofs × n_dofs.
    ///
    /// `scales`, when given, multiplies each element's contribution and must
    /// hold one value per element in element order.
    pub fn assemble_square(&self, local: &DMatrix<f64>, scales: Option<&[f64]>) -> CsrMatrix<f64> {
        let n = self.dof.n_dofs();
        self.assemble(n, n, local, scales, mechanical)
    }

    /// Assemble the mechanical-electrical coupling matrix (n_dofs × n_electrical)
    pub fn assemble_coupling(&self, local: &DMatrix<f64>) -> CsrMatrix<f64> {
        let (n, m) = (self.dof.n_dofs(), self.dof.n_electrical_dofs());
        self.assemble(n, m, local, None, coupling)
    }

    /// Assemble the electrical matrix (n_electrical × n_electrical)
    pub fn assemble_electrical(&self, local: &DMatrix<f64>) -> CsrMatrix<f64> {
        let m = self.dof.n_electrical_dofs();
        self.assemble(m, m, local, None, electrical)
    }

    /// Assemble a load vector from a local vector
    pub fn assemble_vector(&self, local: &DVector<f64>, scales: Option<&[f64]>) -> DVector<f64> {
        let mut global = DVector::zeros(self.dof.n_dofs());
        for (e, element) in self.dof.elements().iter().enumerate() {
            assert_eq!(
                element.dofs.len(),
                local.len(),
                "scatter map of element {} does not match local vector length",
                element.element
            );
            let scale = scales.map_or(1.0, |s| s[e]);
            for (k, &dof) in element.dofs.iter().enumerate() {
                global[dof] += scale * local[k];
            }
        }
        global
    }

    fn assemble(
        &self,
        nrows: usize,
        ncols: usize,
        local: &DMatrix<f64>,
        scales: Option<&[f64]>,
        select: Selector,
    ) -> CsrMatrix<f64> {
        if let Some(scales) = scales {
            assert_eq!(
                scales.len(),
                self.dof.elements().len(),
                "one scale factor is required per element"
            );
        }

        let buffers: Vec<Vec<Triplet>> = self
            .dof
            .elements()
            .par_iter()
            .enumerate()
            .map(|(e, element)| {
                let (rows, cols) = select(element);
                let scale = scales.map_or(1.0, |s| s[e]);
                scatter(local, rows, cols, scale, element.element)
            })
            .collect();

        let mut coo = CooMatrix::new(nrows, ncols);
        for (r, c, v) in buffers.into_iter().flatten() {
            coo.push(r, c, v);
        }
        let csr = CsrMatrix::from(&coo);
        debug!(nrows, ncols, nnz = csr.nnz(), "assembled sparse matrix");
        csr
    }
}

fn scatter(
    local: &DMatrix<f64>,
    rows: &[usize],
    cols: &[usize],
    scale: f64,
    element: usize,
) -> Vec<Triplet> {
    assert_eq!(
        (rows.len(), cols.len()),
        local.shape(),
        "scatter map of element {element} does not match local matrix shape"
    );
    let mut triplets = Vec::with_capacity(rows.len() * cols.len());
    for (i, &r) in rows.iter().enumerate() {
        for (j, &c) in cols.iter().enumerate() {
            triplets.push((r, c, scale * local[(i, j)]));
        }
    }
    triplets
}

/// Return ½(A + Aᵀ) with entries (r, c) and (c, r) bit-identical
pub fn symmetrize(a: &CsrMatrix<f64>) -> CsrMatrix<f64> {
    assert_eq!(a.nrows(), a.ncols(), "symmetrize requires a square matrix");
    // (r, c) and (c, r) sum the same one or two halves
    let mut coo = CooMatrix::new(a.nrows(), a.ncols());
    for (r, c, &v) in a.triplet_iter() {
        let half = 0.5 * v;
        coo.push(r, c, half);
        coo.push(c, r, half);
    }
    CsrMatrix::from(&coo)
}

/// Map each full index to its position in `free`, if any
fn reduced_index(n: usize, free: &[usize]) -> Vec<Option<usize>> {
    let mut map = vec![None; n];
    for (k, &dof) in free.iter().enumerate() {
        map[dof] = Some(k);
    }
    map
}

/// Square free-DOF view A[free, free]
pub fn reduce(a: &CsrMatrix<f64>, free: &[usize]) -> CsrMatrix<f64> {
    let map = reduced_index(a.nrows(), free);
    let mut coo = CooMatrix::new(free.len(), free.len());
    for (r, c, &v) in a.triplet_iter() {
        if let (Some(rr), Some(cc)) = (map[r], map[c]) {
            coo.push(rr, cc, v);
        }
    }
    CsrMatrix::from(&coo)
}

/// Row-only free-DOF view A[free, :]
pub fn reduce_rows(a: &CsrMatrix<f64>, free: &[usize]) -> CsrMatrix<f64> {
    let map = reduced_index(a.nrows(), free);
    let mut coo = CooMatrix::new(free.len(), a.ncols());
    for (r, c, &v) in a.triplet_iter() {
        if let Some(rr) = map[r] {
            coo.push(rr, c, v);
        }
    }
    CsrMatrix::from(&coo)
}

/// Free entries of a full-length vector
pub fn reduce_vector(v: &DVector<f64>, free: &[usize]) -> DVector<f64> {
    DVector::from_iterator(free.len(), free.iter().map(|&d| v[d]))
}

/// True if every stored entry equals its mirror exactly
pub fn is_symmetric(a: &CsrMatrix<f64>) -> bool {
    a.nrows() == a.ncols()
        && a.triplet_iter().all(|(r, c, &v)| {
            a.get_entry(c, r)
                .is_some_and(|entry| entry.into_value() == v)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dof::Physics;
    use crate::mesh_builder::MeshBuilder;
    use crate::topology::Topology;

    fn dof_map(rows: usize, cols: usize) -> DofMap {
        let mesh = MeshBuilder::new(&Topology::filled(rows, cols), 5.0, 5.0).build();
        DofMap::new(&mesh, Physics::Diffusion)
    }

    fn dense(a: &CsrMatrix<f64>) -> DMatrix<f64> {
        let mut d = DMatrix::zeros(a.nrows(), a.ncols());
        for (r, c, &v) in a.triplet_iter() {
            d[(r, c)] += v;
        }
        d
    }

    #[test]
    fn shared_nodes_accumulate() {
        // Two elements along x share nodes 2 and 3
        let dof = dof_map(2, 1);
        let local = DMatrix::from_element(4, 4, 1.0);
        let k = Assembler::new(&dof).assemble_square(&local, None);
        let k = dense(&k);
        assert_eq!(k.shape(), (6, 6));
        assert_eq!(k[(0, 0)], 1.0);
        assert_eq!(k[(2, 2)], 2.0);
        assert_eq!(k[(2, 3)], 2.0);
        assert_eq!(k[(0, 5)], 0.0);
        assert_eq!(k.sum(), 32.0);
    }

    #[test]
    fn scales_weight_each_element() {
        let dof = dof_map(2, 1);
        let local = DMatrix::identity(4, 4);
        let k = Assembler::new(&dof).assemble_square(&local, Some(&[1.0, 10.0]));
        let k = dense(&k);
        assert_eq!(k[(0, 0)], 1.0);
        assert_eq!(k[(2, 2)], 11.0);
        assert_eq!(k[(4, 4)], 10.0);
    }

    #[test]
    #[should_panic(expected = "does not match local matrix shape")]
    fn mismatched_local_matrix_panics() {
        let dof = dof_map(1, 1);
        let local = DMatrix::identity(3, 3);
        Assembler::new(&dof).assemble_square(&local, None);
    }

    #[test]
    fn symmetrize_is_exact() {
        let coo = CooMatrix::try_from_triplets(
            3,
            3,
            vec![0, 1, 0, 2, 1],
            vec![1, 0, 2, 1, 1],
            vec![0.1, 0.2 + 1e-17, 0.3, 0.7, 5.0],
        )
        .unwrap();
        let a = CsrMatrix::from(&coo);
        let s = symmetrize(&a);
        assert!(is_symmetric(&s));
        let d = dense(&s);
        assert_eq!(d[(0, 2)], 0.15);
        assert_eq!(d[(2, 0)], 0.15);
        assert_eq!(d[(1, 2)], 0.35);
        assert_eq!(d[(2, 1)], 0.35);
        assert_eq!(d[(0, 1)], d[(1, 0)]);
        assert_eq!(d[(1, 1)], 5.0);
        assert_eq!(s.nnz(), 7);
    }

    #[test]
    fn reduce_extracts_free_block() {
        let coo = CooMatrix::try_from_triplets(
            3,
            3,
            vec![0, 1, 1, 2, 2],
            vec![0, 1, 2, 1, 2],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap();
        let a = CsrMatrix::from(&coo);
        let r = dense(&reduce(&a, &[1, 2]));
        assert_eq!(r, DMatrix::from_row_slice(2, 2, &[2.0, 3.0, 4.0, 5.0]));

        let rows = dense(&reduce_rows(&a, &[0, 2]));
        assert_eq!(rows, DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 0.0, 0.0, 4.0, 5.0]));
    }

    #[test]
    fn assemble_vector_accumulates_shared_nodes() {
        let dof = dof_map(1, 2);
        let local = DVector::from_element(4, 0.25);
        let f = Assembler::new(&dof).assemble_vector(&local, Some(&[4.0, 4.0]));
        assert_eq!(f.len(), 6);
        assert!((f.sum() - 8.0).abs() < 1e-15);
        // Middle nodes are shared by both elements
        assert_eq!(f[1], 2.0);
        assert_eq!(f[0], 1.0);
    }
}
