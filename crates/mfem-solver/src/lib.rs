//! Finite element analysis of grid-topology MEMS cantilevers.
//!
//! A design is a 0/1 grid of square cells clamped along its y = 0 edge.
//! The crate meshes the grid with bilinear 4-node quadrilaterals and offers
//! two analyses on top of it:
//!
//! - modal analysis of a Mindlin plate or a piezoelectric laminate, with
//!   tip readouts (deflection, modal stiffness, charge, mode kind);
//! - steady diffusion with per-cell conductivity and source.
//!
//! Lengths on the public API (cell half-widths, probe points) are in µm;
//! everything else is SI.

pub mod analysis;
pub mod backend;
pub mod dof;
pub mod elements;
pub mod error;
pub mod materials;
pub mod mesh;
pub mod mesh_builder;
pub mod modal_solver;
pub mod postprocess;
pub mod sparse_assembly;
pub mod static_solver;
pub mod topology;

pub use analysis::{AnalysisConfig, AnalysisPipeline, AnalysisType, ModalReport, StaticReport};
pub use backend::{
    EigenResult, EigenSolver, LinearSolver, NativeBackend, SolveInfo, SolverBackend, SolverConfig,
    default_backend,
};
pub use dof::{DofMap, Physics};
pub use elements::{MechanicalModel, StructuralElement};
pub use error::{FemError, Result};
pub use materials::{LaminateLayer, LaminateMaterial, PlateMaterial};
pub use mesh::{Mesh, MeshStatistics};
pub use mesh_builder::MeshBuilder;
pub use modal_solver::{CantileverFem, ModalResults, StructuralSystem};
pub use postprocess::{
    FieldStatistics, ModeIdentification, ModeKind, ModeSummary, PointOperator, modal_readouts,
};
pub use static_solver::{DiffusionDomain, DiffusionFem, DiffusionSolution};
pub use topology::{Cantilever, ElementField, Topology};
