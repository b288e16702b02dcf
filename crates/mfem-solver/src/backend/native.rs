//! Native backend using nalgebra and nalgebra-sparse.
//!
//! It supports:
//! - Sparse Cholesky factorization for symmetric positive definite systems
//! - Shift-invert subspace iteration for the generalized eigenvalue problem
//! - Dense Cholesky-transformed `SymmetricEigen` when the subspace would span
//!   every free DOF
//!
//! Subspace iteration factors K once and repeatedly applies K⁻¹M to a block
//! of vectors. Each sweep K-orthonormalizes the block by modified
//! Gram-Schmidt and solves the projected inverse problem Vᵀ M V q = μ q with
//! μ = 1/λ, so the lowest modes are resolved to relative precision even when
//! the spectrum spans many decades.

use nalgebra::{DMatrix, DVector, SymmetricEigen};
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CscMatrix, CsrMatrix};
use tracing::debug;

use super::traits::*;
use crate::error::{FemError, Result};

/// Native solver backend using nalgebra for all numerical operations.
#[derive(Debug, Clone, Default)]
pub struct NativeBackend {
    config: SolverConfig,
}

impl NativeBackend {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

/// Squared Cholesky pivots below this fraction of the matching diagonal entry
/// of K mark a singular free-DOF system
const PIVOT_RATIO: f64 = 1e-12;

fn ill_posed(detail: impl std::fmt::Display) -> FemError {
    FemError::IllPosedBoundary(format!(
        "stiffness matrix on the free DOFs is not positive definite ({detail}); \
         every solid region must connect to the clamped edge"
    ))
}

fn check_pivots(pivots: impl Iterator<Item = (usize, f64)>, diagonal: &[f64]) -> Result<()> {
    for (dof, pivot) in pivots {
        if !(pivot * pivot > PIVOT_RATIO * diagonal[dof]) {
            return Err(ill_posed(format!("vanishing pivot at free DOF {dof}")));
        }
    }
    Ok(())
}

fn stiffness_diagonal(stiffness: &CsrMatrix<f64>) -> Vec<f64> {
    let mut diag = vec![0.0; stiffness.nrows()];
    for (r, c, &v) in stiffness.triplet_iter() {
        if r == c {
            diag[r] = v;
        }
    }
    diag
}

fn factor(stiffness: &CsrMatrix<f64>) -> Result<CscCholesky<f64>> {
    let chol = CscCholesky::factor(&CscMatrix::from(stiffness)).map_err(ill_posed)?;
    let pivots = chol
        .l()
        .triplet_iter()
        .filter(|(r, c, _)| r == c)
        .map(|(r, _, &l)| (r, l));
    check_pivots(pivots, &stiffness_diagonal(stiffness))?;
    Ok(chol)
}

impl LinearSolver for NativeBackend {
    fn solve_linear(
        &self,
        stiffness: &CsrMatrix<f64>,
        rhs: &DVector<f64>,
    ) -> Result<(DVector<f64>, SolveInfo)> {
        let n = stiffness.nrows();
        if n == 0 {
            return Ok((DVector::zeros(0), direct_info()));
        }

        let chol = factor(stiffness)?;
        let b = DMatrix::from_column_slice(n, 1, rhs.as_slice());
        let x = chol.solve(&b);
        let u = DVector::from_column_slice(x.as_slice());

        let residual = stiffness * &u - rhs;
        Ok((
            u,
            SolveInfo {
                residual_norm: Some(residual.norm()),
                ..direct_info()
            },
        ))
    }
}

fn direct_info() -> SolveInfo {
    SolveInfo {
        iterations: 1,
        residual_norm: None,
        solver_name: "sparse-Cholesky".to_string(),
    }
}

impl EigenSolver for NativeBackend {
    fn solve_eigen(
        &self,
        stiffness: &CsrMatrix<f64>,
        mass: &CsrMatrix<f64>,
        num_modes: usize,
    ) -> Result<(EigenResult, SolveInfo)> {
        let n = stiffness.nrows();
        if num_modes == 0 || n == 0 {
            return Ok((
                EigenResult::empty(n),
                SolveInfo {
                    iterations: 0,
                    residual_norm: None,
                    solver_name: "subspace-iteration".to_string(),
                },
            ));
        }
        if num_modes >= n {
            return Err(FemError::TooManyModes {
                requested: num_modes,
                available: n,
            });
        }

        let p = self.config.subspace_size(num_modes, n);
        if p == n {
            return dense_eigen(stiffness, mass, num_modes);
        }

        let chol = factor(stiffness)?;
        let mut rng = StartSequence::default();
        let mut x = start_vectors(mass, p, &mut rng);
        let mut previous: Option<Vec<f64>> = None;

        for iteration in 1..=self.config.max_iterations {
            let mut v = chol.solve(&(mass * &x));
            let mut kv = stiffness * &v;
            let mut from = 0;
            let mut refills = 0;
            while let Err(collapsed) = k_orthonormalize(&mut v, &mut kv, from) {
                refills += 1;
                if refills > p {
                    return Err(FemError::NotConverged { iterations: iteration });
                }
                debug!(iteration, column = collapsed, "refilling dependent subspace column");
                let seed = rng.column(mass);
                let fresh = chol.solve(&(mass * &seed));
                kv.set_column(collapsed, &(stiffness * &fresh).column(0));
                v.set_column(collapsed, &fresh.column(0));
                from = collapsed;
            }

            let (mu, q) = inverse_ritz(&v, mass);
            if mu[..num_modes].iter().any(|&value| !(value > 0.0)) {
                return Err(FemError::NotConverged { iterations: iteration });
            }
            x = &v * q;

            let current: Vec<f64> = mu[..num_modes].iter().map(|value| 1.0 / value).collect();
            if let Some(prev) = &previous {
                let change = current
                    .iter()
                    .zip(prev)
                    .map(|(l, lp)| (l - lp).abs() / l.abs().max(f64::MIN_POSITIVE))
                    .fold(0.0, f64::max);
                debug!(iteration, change, "subspace sweep");
                if change <= self.config.tolerance {
                    let mut eigenvectors = x.columns(0, num_modes).into_owned();
                    for (i, value) in mu[..num_modes].iter().enumerate() {
                        eigenvectors.column_mut(i).scale_mut(1.0 / value.sqrt());
                    }
                    return Ok((
                        EigenResult {
                            eigenvalues: current,
                            eigenvectors,
                        },
                        SolveInfo {
                            iterations: iteration,
                            residual_norm: Some(change),
                            solver_name: "subspace-iteration".to_string(),
                        },
                    ));
                }
            }
            previous = Some(current);
        }

        Err(FemError::NotConverged {
            iterations: self.config.max_iterations,
        })
    }
}

impl SolverBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }
}

/// Columns whose K-norm drops below this fraction during orthogonalization
/// are treated as linearly dependent
const COLLAPSE_RATIO: f64 = 1e-12;

/// Deterministic pseudo-random column generator
#[derive(Debug, Clone)]
struct StartSequence {
    state: u64,
}

impl Default for StartSequence {
    fn default() -> Self {
        Self {
            state: 0x2545_f491_4f6c_dd1d,
        }
    }
}

impl StartSequence {
    /// Uniform in [-0.5, 0.5)
    fn next(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.state >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    }

    /// One column scaled entrywise by diag(M)
    fn column(&mut self, mass: &CsrMatrix<f64>) -> DMatrix<f64> {
        let diag = mass_diagonal(mass);
        DMatrix::from_fn(diag.len(), 1, |i, _| self.next() * diag[i])
    }
}

fn mass_diagonal(mass: &CsrMatrix<f64>) -> Vec<f64> {
    let mut diag = vec![f64::MIN_POSITIVE; mass.nrows()];
    for (r, c, &v) in mass.triplet_iter() {
        if r == c {
            diag[r] = v.abs().max(f64::MIN_POSITIVE);
        }
    }
    diag
}

/// Starting block: diag(M) followed by pseudo-random columns
fn start_vectors(mass: &CsrMatrix<f64>, p: usize, rng: &mut StartSequence) -> DMatrix<f64> {
    let diag = mass_diagonal(mass);
    let mut x = DMatrix::zeros(diag.len(), p);
    for (i, &d) in diag.iter().enumerate() {
        x[(i, 0)] = d;
    }
    for j in 1..p {
        for (i, &d) in diag.iter().enumerate() {
            x[(i, j)] = rng.next() * d;
        }
    }
    x
}

/// Modified Gram-Schmidt in the K inner product, two passes per column.
///
/// `kv` holds K·v and is updated alongside `v`. Columns before `from` must
/// already be K-orthonormal. On a dependent column its index is returned and
/// the columns before it are left orthonormal.
fn k_orthonormalize(
    v: &mut DMatrix<f64>,
    kv: &mut DMatrix<f64>,
    from: usize,
) -> std::result::Result<(), usize> {
    for j in from..v.ncols() {
        let initial = v.column(j).dot(&kv.column(j)).max(0.0).sqrt();
        for _ in 0..2 {
            for i in 0..j {
                let c = v.column(i).dot(&kv.column(j));
                let (vi, ki) = (v.column(i).into_owned(), kv.column(i).into_owned());
                v.column_mut(j).axpy(-c, &vi, 1.0);
                kv.column_mut(j).axpy(-c, &ki, 1.0);
            }
        }
        let norm = v.column(j).dot(&kv.column(j)).max(0.0).sqrt();
        if !(norm > COLLAPSE_RATIO * initial) {
            return Err(j);
        }
        v.column_mut(j).scale_mut(1.0 / norm);
        kv.column_mut(j).scale_mut(1.0 / norm);
    }
    Ok(())
}

/// Eigenpairs of Vᵀ M V for a K-orthonormal V, sorted by descending μ = 1/λ
fn inverse_ritz(v: &DMatrix<f64>, mass: &CsrMatrix<f64>) -> (Vec<f64>, DMatrix<f64>) {
    let mut m_proj = v.transpose() * (mass * v);
    crate::elements::symmetrize(&mut m_proj);
    sorted_descending(SymmetricEigen::new(m_proj))
}

fn sorted_descending(eigen: SymmetricEigen<f64, nalgebra::Dyn>) -> (Vec<f64>, DMatrix<f64>) {
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));
    let values = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let vectors = DMatrix::from_columns(
        &order
            .iter()
            .map(|&i| eigen.eigenvectors.column(i))
            .collect::<Vec<_>>(),
    );
    (values, vectors)
}

/// Full dense solve of M φ = μ K φ through the Cholesky factor of K
fn dense_eigen(
    stiffness: &CsrMatrix<f64>,
    mass: &CsrMatrix<f64>,
    num_modes: usize,
) -> Result<(EigenResult, SolveInfo)> {
    let l = DMatrix::from(stiffness)
        .cholesky()
        .ok_or_else(|| ill_posed("dense factorization failed"))?
        .unpack();
    check_pivots(l.diagonal().iter().copied().enumerate(), &stiffness_diagonal(stiffness))?;
    let m = DMatrix::from(mass);

    let singular = || ill_posed("singular triangular factor");
    let w = l.solve_lower_triangular(&m).ok_or_else(singular)?;
    let mut b = l.solve_lower_triangular(&w.transpose()).ok_or_else(singular)?;
    crate::elements::symmetrize(&mut b);

    let (mu, z) = sorted_descending(SymmetricEigen::new(b));
    if mu[..num_modes].iter().any(|&value| !(value > 0.0)) {
        return Err(FemError::NotConverged { iterations: 1 });
    }
    let z = z.columns(0, num_modes).into_owned();
    let mut eigenvectors = l.tr_solve_lower_triangular(&z).ok_or_else(singular)?;
    for (i, value) in mu[..num_modes].iter().enumerate() {
        eigenvectors.column_mut(i).scale_mut(1.0 / value.sqrt());
    }
    debug!(n = stiffness.nrows(), "dense eigen solve");

    Ok((
        EigenResult {
            eigenvalues: mu[..num_modes].iter().map(|value| 1.0 / value).collect(),
            eigenvectors,
        },
        SolveInfo {
            iterations: 1,
            residual_norm: None,
            solver_name: "dense-Cholesky+SymmetricEigen".to_string(),
        },
    ))
}
