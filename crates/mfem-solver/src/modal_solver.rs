//! Modal analysis solver for computing natural frequencies and mode shapes.
//!
//! This module implements eigenvalue analysis for undamped free vibration:
//! (K - λM)φ = 0
//!
//! where:
//! - K = global stiffness matrix
//! - M = global mass matrix
//! - λ = ω² (squared angular frequency)
//! - φ = mode shape (eigenvector)
//!
//! # Workflow
//! 1. Compile the topology into a mesh and number the DOFs
//! 2. Compute one set of element matrices and assemble global K and M
//! 3. Reduce K and M to the free DOFs (the clamped edge is fixed)
//! 4. Solve K_free φ = λ M_free φ for the modes closest to zero
//! 5. Convert eigenvalues to frequencies: f = √λ / (2π)
//! 6. Expand mode shapes back to full DOF space
//!
//! # Example
//! ```no_run
//! use mfem_solver::{Cantilever, CantileverFem, PlateMaterial, Topology};
//!
//! # fn example() -> mfem_solver::Result<()> {
//! let cantilever = Cantilever::new(Topology::filled(10, 5), 5.0, 5.0, 50.0, 45.0)?;
//! let fem = CantileverFem::new(cantilever, PlateMaterial::soi_mumps());
//! let results = fem.modal_analysis(3)?;
//!
//! for (i, freq) in results.frequencies_hz.iter().enumerate() {
//!     println!("  Mode {}: {:.2} Hz", i + 1, freq);
//! }
//! # Ok(())
//! # }
//! ```

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use tracing::{info, warn};

use crate::backend::{EigenSolver, NativeBackend, SolverConfig};
use crate::dof::DofMap;
use crate::elements::{MechanicalModel, StructuralElement};
use crate::error::{FemError, Result};
use crate::mesh::Mesh;
use crate::mesh_builder::MeshBuilder;
use crate::sparse_assembly::{self, Assembler};
use crate::topology::Cantilever;

/// Results from modal analysis
#[derive(Debug, Clone)]
pub struct ModalResults {
    /// Natural frequencies in Hz
    pub frequencies_hz: Vec<f64>,
    /// Eigenvalues (λ = ω² = (2πf)²), ascending
    pub eigenvalues: Vec<f64>,
    /// Mass-orthonormal mode shapes over all mechanical DOFs, one per column
    pub mode_shapes: DMatrix<f64>,
    /// Number of modes computed
    pub num_modes: usize,
}

impl ModalResults {
    fn empty(n_dofs: usize) -> Self {
        Self {
            frequencies_hz: Vec::new(),
            eigenvalues: Vec::new(),
            mode_shapes: DMatrix::zeros(n_dofs, 0),
            num_modes: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.num_modes == 0
    }

    /// Get the i-th mode shape as a vector
    pub fn mode_shape(&self, mode_index: usize) -> Option<DVector<f64>> {
        if mode_index >= self.num_modes {
            return None;
        }
        Some(self.mode_shapes.column(mode_index).into())
    }

    /// Get angular frequency (rad/s) for a given mode
    pub fn angular_frequency(&self, mode_index: usize) -> Option<f64> {
        self.eigenvalues
            .get(mode_index)
            .map(|&lambda| lambda.max(0.0).sqrt())
    }
}

/// Assembled global matrices of a structural model, full DOF numbering
#[derive(Debug, Clone)]
pub struct StructuralSystem {
    pub mass: CsrMatrix<f64>,
    pub stiffness: CsrMatrix<f64>,
    /// n_dofs × 1 (laminates only)
    pub coupling: Option<CsrMatrix<f64>>,
    /// 1 × 1 (laminates only)
    pub capacitance: Option<CsrMatrix<f64>>,
}

/// Finite element model of a cantilever design
#[derive(Debug, Clone)]
pub struct CantileverFem {
    cantilever: Cantilever,
    model: MechanicalModel,
    mesh: Mesh,
    dof: DofMap,
    system: StructuralSystem,
}

impl CantileverFem {
    /// Mesh the design, compute the element matrices and assemble the system
    pub fn new(cantilever: Cantilever, model: impl Into<MechanicalModel>) -> Self {
        let model = model.into();
        let mesh = MeshBuilder::from_cantilever(&cantilever);
        let dof = DofMap::new(&mesh, model.physics());
        let local = model.element_matrices(cantilever.a, cantilever.b);

        let assembler = Assembler::new(&dof);
        let stiffness =
            sparse_assembly::symmetrize(&assembler.assemble_square(&local.stiffness, None));
        let mass = sparse_assembly::symmetrize(&assembler.assemble_square(&local.mass, None));
        let coupling = local.coupling.as_ref().map(|kuv| assembler.assemble_coupling(kuv));
        let capacitance = local
            .capacitance
            .map(|c| assembler.assemble_electrical(&DMatrix::from_element(1, 1, c)));

        info!(
            physics = ?model.physics(),
            elements = mesh.n_elements(),
            nodes = mesh.n_nodes(),
            dofs = dof.n_dofs(),
            free_dofs = dof.free_dofs().len(),
            "assembled cantilever model"
        );

        Self {
            cantilever,
            model,
            mesh,
            dof,
            system: StructuralSystem {
                mass,
                stiffness,
                coupling,
                capacitance,
            },
        }
    }

    pub fn cantilever(&self) -> &Cantilever {
        &self.cantilever
    }

    pub fn model(&self) -> &MechanicalModel {
        &self.model
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn dof(&self) -> &DofMap {
        &self.dof
    }

    pub fn system(&self) -> &StructuralSystem {
        &self.system
    }

    pub fn mass_matrix(&self) -> &CsrMatrix<f64> {
        &self.system.mass
    }

    pub fn stiffness_matrix(&self) -> &CsrMatrix<f64> {
        &self.system.stiffness
    }

    pub fn coupling_matrix(&self) -> Option<&CsrMatrix<f64>> {
        self.system.coupling.as_ref()
    }

    pub fn capacitance_matrix(&self) -> Option<&CsrMatrix<f64>> {
        self.system.capacitance.as_ref()
    }

    /// Mass matrix restricted to the free DOFs
    pub fn free_mass_matrix(&self) -> CsrMatrix<f64> {
        sparse_assembly::reduce(&self.system.mass, self.dof.free_dofs())
    }

    /// Stiffness matrix restricted to the free DOFs
    pub fn free_stiffness_matrix(&self) -> CsrMatrix<f64> {
        sparse_assembly::reduce(&self.system.stiffness, self.dof.free_dofs())
    }

    /// Coupling matrix rows of the free DOFs
    pub fn free_coupling_matrix(&self) -> Option<CsrMatrix<f64>> {
        self.system
            .coupling
            .as_ref()
            .map(|kuv| sparse_assembly::reduce_rows(kuv, self.dof.free_dofs()))
    }

    /// Compute the `num_modes` lowest modes with default solver settings
    pub fn modal_analysis(&self, num_modes: usize) -> Result<ModalResults> {
        self.modal_analysis_with(num_modes, &NativeBackend::new(SolverConfig::default()))
    }

    /// Compute the `num_modes` lowest modes with a given eigensolver
    pub fn modal_analysis_with(
        &self,
        num_modes: usize,
        solver: &dyn EigenSolver,
    ) -> Result<ModalResults> {
        let n_free = self.dof.free_dofs().len();
        if self.mesh.is_empty() || n_free == 0 {
            warn!("no free DOFs; modal analysis returns no modes");
            return Ok(ModalResults::empty(self.dof.n_dofs()));
        }
        if num_modes == 0 {
            return Ok(ModalResults::empty(self.dof.n_dofs()));
        }
        if num_modes >= n_free {
            return Err(FemError::TooManyModes {
                requested: num_modes,
                available: n_free,
            });
        }
        self.mesh.check_clamped()?;

        let k_free = self.free_stiffness_matrix();
        let m_free = self.free_mass_matrix();
        let (eigen, solve_info) = solver.solve_eigen(&k_free, &m_free, num_modes)?;

        let num_found = eigen.eigenvalues.len();
        let mut mode_shapes = DMatrix::zeros(self.dof.n_dofs(), num_found);
        for i in 0..num_found {
            let reduced = eigen.eigenvectors.column(i).into_owned();
            mode_shapes.set_column(i, &self.dof.expand(&reduced));
        }

        let frequencies_hz: Vec<f64> = eigen
            .eigenvalues
            .iter()
            .map(|&lambda| lambda.max(0.0).sqrt() / (2.0 * std::f64::consts::PI))
            .collect();

        info!(
            modes = num_found,
            iterations = solve_info.iterations,
            solver = %solve_info.solver_name,
            fundamental_hz = frequencies_hz.first().copied().unwrap_or(0.0),
            "modal analysis complete"
        );

        Ok(ModalResults {
            frequencies_hz,
            eigenvalues: eigen.eigenvalues,
            mode_shapes,
            num_modes: num_found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{LaminateMaterial, PlateMaterial};
    use crate::topology::Topology;

    fn plate_fem(rows: usize, cols: usize) -> CantileverFem {
        let cantilever = Cantilever::new(Topology::filled(rows, cols), 5.0, 5.0, 5.0, 5.0).unwrap();
        CantileverFem::new(cantilever, PlateMaterial::soi_mumps())
    }

    #[test]
    fn full_and_free_views_have_expected_shapes() {
        let fem = plate_fem(3, 2);
        let n = fem.dof().n_dofs();
        let n_free = fem.dof().free_dofs().len();
        assert_eq!(fem.mass_matrix().nrows(), n);
        assert_eq!(fem.stiffness_matrix().ncols(), n);
        assert_eq!(fem.free_mass_matrix().nrows(), n_free);
        assert_eq!(fem.free_stiffness_matrix().ncols(), n_free);
        assert!(fem.coupling_matrix().is_none());
        assert!(fem.free_coupling_matrix().is_none());
    }

    #[test]
    fn assembled_matrices_are_exactly_symmetric() {
        let fem = plate_fem(4, 3);
        assert!(sparse_assembly::is_symmetric(fem.stiffness_matrix()));
        assert!(sparse_assembly::is_symmetric(fem.mass_matrix()));
    }

    #[test]
    fn laminate_exposes_electrical_matrices() {
        let cantilever = Cantilever::new(Topology::filled(3, 2), 5.0, 5.0, 5.0, 5.0).unwrap();
        let fem = CantileverFem::new(cantilever, LaminateMaterial::piezo_mumps());
        let n = fem.dof().n_dofs();
        let kuv = fem.coupling_matrix().unwrap();
        assert_eq!((kuv.nrows(), kuv.ncols()), (n, 1));
        let kvv = fem.capacitance_matrix().unwrap();
        assert_eq!((kvv.nrows(), kvv.ncols()), (1, 1));
        let free = fem.free_coupling_matrix().unwrap();
        assert_eq!(free.nrows(), fem.dof().free_dofs().len());
    }

    #[test]
    fn zero_modes_is_empty() {
        let results = plate_fem(2, 2).modal_analysis(0).unwrap();
        assert!(results.is_empty());
        assert!(results.mode_shape(0).is_none());
    }

    #[test]
    fn too_many_modes_is_an_error() {
        let fem = plate_fem(1, 1);
        // One free node edge: 2 nodes × 3 DOFs
        let n_free = fem.dof().free_dofs().len();
        assert_eq!(n_free, 6);
        let err = fem.modal_analysis(n_free).unwrap_err();
        assert!(matches!(err, FemError::TooManyModes { requested: 6, available: 6 }));
    }

    #[test]
    fn smallest_designs_have_modes() {
        for (rows, cols) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            let fem = plate_fem(rows, cols);
            let n_free = fem.dof().free_dofs().len();
            for k in [1, 2] {
                let results = fem.modal_analysis(k).unwrap();
                assert_eq!(results.num_modes, k, "{rows}x{cols} plate, {k} modes of {n_free}");
                assert!(results.frequencies_hz[0] > 0.0);
            }
        }

        let cantilever = Cantilever::new(Topology::filled(1, 1), 5.0, 5.0, 5.0, 5.0).unwrap();
        let laminate = CantileverFem::new(cantilever, LaminateMaterial::piezo_mumps());
        let results = laminate.modal_analysis(1).unwrap();
        assert!(results.frequencies_hz[0] > 0.0);
    }

    #[test]
    fn detached_plate_island_is_ill_posed() {
        // Clamped 2 × 4 strip plus a 2 × 2 island at rows 3..5, columns 3..5
        let mut topology = Topology::empty(5, 5);
        for i in 0..2 {
            for j in 0..4 {
                topology.set(i, j, true);
            }
        }
        for i in 3..5 {
            for j in 3..5 {
                topology.set(i, j, true);
            }
        }
        let cantilever = Cantilever::new(topology, 5.0, 5.0, 5.0, 5.0).unwrap();
        for model in [
            MechanicalModel::from(PlateMaterial::soi_mumps()),
            MechanicalModel::from(LaminateMaterial::piezo_mumps()),
        ] {
            let fem = CantileverFem::new(cantilever.clone(), model);
            let err = fem.modal_analysis(2).unwrap_err();
            assert!(matches!(err, FemError::IllPosedBoundary(_)), "{err:?}");
        }
    }

    #[test]
    fn fixed_entries_of_modes_are_zero() {
        let fem = plate_fem(4, 2);
        let results = fem.modal_analysis(2).unwrap();
        for i in 0..results.num_modes {
            let mode = results.mode_shape(i).unwrap();
            for &d in fem.dof().fixed_dofs() {
                assert_eq!(mode[d], 0.0);
            }
        }
    }
}
