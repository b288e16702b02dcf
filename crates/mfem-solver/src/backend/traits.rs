//! Backend trait definitions for numerical solvers.
//!
//! These traits abstract over the concrete numerical library used for
//! global system operations (linear solve, eigenvalue solve). Both operate on
//! systems already reduced to the free DOFs. Element-level computations remain
//! in nalgebra (small, dense matrices).

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

use crate::error::Result;

/// Eigensolver controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Relative change of the requested eigenvalues between sweeps
    pub tolerance: f64,
    /// Sweep cap before giving up
    pub max_iterations: usize,
    /// Guard vectors carried beyond the requested modes
    pub extra_vectors: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 300,
            extra_vectors: 8,
        }
    }
}

impl SolverConfig {
    /// Subspace dimension for `num_modes` requested modes out of `n` free DOFs
    pub fn subspace_size(&self, num_modes: usize, n: usize) -> usize {
        (2 * num_modes).max(num_modes + self.extra_vectors).min(n)
    }
}

/// Results from an eigenvalue solve.
#[derive(Debug, Clone)]
pub struct EigenResult {
    /// Eigenvalues (λ = ω²), sorted ascending
    pub eigenvalues: Vec<f64>,
    /// Mass-orthonormal eigenvectors as columns in free-DOF space
    pub eigenvectors: DMatrix<f64>,
}

impl EigenResult {
    pub fn empty(n: usize) -> Self {
        Self {
            eigenvalues: Vec::new(),
            eigenvectors: DMatrix::zeros(n, 0),
        }
    }
}

/// Solver convergence and diagnostic info.
#[derive(Debug, Clone)]
pub struct SolveInfo {
    /// Number of iterations (1 for direct solvers)
    pub iterations: usize,
    /// Final residual or convergence measure (if available)
    pub residual_norm: Option<f64>,
    /// Human-readable solver name
    pub solver_name: String,
}

/// Trait for a linear solver backend.
pub trait LinearSolver: Send + Sync {
    /// Solve K u = f for a symmetric positive definite K.
    fn solve_linear(
        &self,
        stiffness: &CsrMatrix<f64>,
        rhs: &DVector<f64>,
    ) -> Result<(DVector<f64>, SolveInfo)>;
}

/// Trait for an eigenvalue solver backend.
///
/// Implementations solve K φ = λ M φ and return the `num_modes` eigenpairs
/// closest to zero.
pub trait EigenSolver: Send + Sync {
    fn solve_eigen(
        &self,
        stiffness: &CsrMatrix<f64>,
        mass: &CsrMatrix<f64>,
        num_modes: usize,
    ) -> Result<(EigenResult, SolveInfo)>;
}

/// Combined backend providing both linear and eigenvalue solvers.
pub trait SolverBackend: LinearSolver + EigenSolver {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;
}
