//! Numerical backend abstraction layer.
//!
//! This module provides trait-based interfaces for linear and eigenvalue
//! solvers, so the analyses only ever hand over free-DOF sparse matrices.
//!
//! # Architecture
//!
//! ```text
//! Element kernels (nalgebra SMatrix/DMatrix, small and dense)
//!         │
//!         ▼
//! Assembly (COO triplets → CSR, free-DOF views)
//!         │
//!         ▼
//! Backend traits (LinearSolver, EigenSolver)
//!         │
//!         ▼
//! NativeBackend (sparse Cholesky, subspace iteration)
//! ```

pub mod native;
pub mod traits;

pub use native::NativeBackend;
pub use traits::*;

/// Returns the default solver backend.
pub fn default_backend() -> Box<dyn SolverBackend> {
    Box::new(NativeBackend::default())
}

/// Returns the native backend with custom eigensolver settings.
pub fn backend_with_config(config: SolverConfig) -> Box<dyn SolverBackend> {
    Box::new(NativeBackend::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backends_report_native_name() {
        assert_eq!(default_backend().name(), "native");
        let config = SolverConfig {
            tolerance: 1e-8,
            ..SolverConfig::default()
        };
        assert_eq!(backend_with_config(config).name(), "native");
    }

    #[test]
    fn subspace_size_is_capped_by_problem_size() {
        let config = SolverConfig::default();
        assert_eq!(config.subspace_size(3, 100), 11);
        assert_eq!(config.subspace_size(20, 100), 40);
        assert_eq!(config.subspace_size(3, 6), 6);
    }
}
