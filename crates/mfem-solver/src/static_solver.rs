//! Static solver for steady scalar diffusion (heat conduction).
//!
//! Solves K u = f on a grid domain where K is the conduction matrix scaled
//! per element by its conductivity and f the heat load scaled per element by
//! its source density. Nodes on the j == 0 edge are held at zero.

use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use tracing::{info, warn};

use crate::backend::{LinearSolver, NativeBackend, SolveInfo};
use crate::dof::{DofMap, Physics};
use crate::elements::DiffusionElement;
use crate::error::{FemError, Result};
use crate::mesh::Mesh;
use crate::mesh_builder::MeshBuilder;
use crate::postprocess::FieldStatistics;
use crate::sparse_assembly::{self, Assembler};
use crate::topology::{ElementField, Topology};

/// Diffusion problem on a grid domain
///
/// `conductivity` and `source` are per-cell fields with the same shape as
/// `domain`; values on void cells are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionDomain {
    pub domain: Topology,
    pub conductivity: ElementField,
    pub source: ElementField,
    /// Element half-width in x [µm]
    pub a: f64,
    /// Element half-width in y [µm]
    pub b: f64,
}

impl DiffusionDomain {
    pub fn new(
        domain: Topology,
        conductivity: ElementField,
        source: ElementField,
        a: f64,
        b: f64,
    ) -> Result<Self> {
        for (name, field) in [("conductivity", &conductivity), ("source", &source)] {
            if field.shape() != domain.shape() {
                return Err(FemError::InvalidField(format!(
                    "{name} shape {:?} does not match domain shape {:?}",
                    field.shape(),
                    domain.shape()
                )));
            }
        }
        if !(a > 0.0 && b > 0.0) {
            return Err(FemError::InvalidTopology(format!(
                "element half-dimensions must be positive, got a = {a}, b = {b}"
            )));
        }
        Ok(Self {
            domain,
            conductivity,
            source,
            a,
            b,
        })
    }
}

/// Solution of a diffusion problem
#[derive(Debug, Clone)]
pub struct DiffusionSolution {
    /// Value at every node, zero on the fixed edge
    pub values: DVector<f64>,
    /// Values at the free DOFs only
    pub free_values: DVector<f64>,
    pub info: SolveInfo,
}

impl DiffusionSolution {
    /// Extrema and mean of the nodal values, `None` for an empty domain
    pub fn statistics(&self) -> Option<FieldStatistics> {
        FieldStatistics::compute(&self.values)
    }
}

/// Finite element model of a diffusion problem
#[derive(Debug, Clone)]
pub struct DiffusionFem {
    domain: DiffusionDomain,
    mesh: Mesh,
    dof: DofMap,
    conduction: CsrMatrix<f64>,
    heating: DVector<f64>,
}

impl DiffusionFem {
    pub fn new(domain: DiffusionDomain) -> Result<Self> {
        let mesh = MeshBuilder::new(&domain.domain, domain.a, domain.b).build();
        let dof = DofMap::new(&mesh, Physics::Diffusion);
        let conductivity = mesh.element_values(&domain.conductivity)?;
        let source = mesh.element_values(&domain.source)?;
        let local = DiffusionElement::new().matrices(domain.a, domain.b);

        let assembler = Assembler::new(&dof);
        let conduction = sparse_assembly::symmetrize(
            &assembler.assemble_square(&local.conduction, Some(&conductivity)),
        );
        let heating = assembler.assemble_vector(&local.source, Some(&source));

        info!(
            elements = mesh.n_elements(),
            dofs = dof.n_dofs(),
            free_dofs = dof.free_dofs().len(),
            "assembled diffusion model"
        );

        Ok(Self {
            domain,
            mesh,
            dof,
            conduction,
            heating,
        })
    }

    pub fn domain(&self) -> &DiffusionDomain {
        &self.domain
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn dof(&self) -> &DofMap {
        &self.dof
    }

    pub fn conduction_matrix(&self) -> &CsrMatrix<f64> {
        &self.conduction
    }

    pub fn heating_vector(&self) -> &DVector<f64> {
        &self.heating
    }

    pub fn free_conduction_matrix(&self) -> CsrMatrix<f64> {
        sparse_assembly::reduce(&self.conduction, self.dof.free_dofs())
    }

    pub fn free_heating_vector(&self) -> DVector<f64> {
        sparse_assembly::reduce_vector(&self.heating, self.dof.free_dofs())
    }

    /// Solve with the default backend
    pub fn solve(&self) -> Result<DiffusionSolution> {
        self.solve_with(&NativeBackend::default())
    }

    /// Solve K_free u_free = f_free and scatter into a full-length vector
    pub fn solve_with(&self, solver: &dyn LinearSolver) -> Result<DiffusionSolution> {
        if self.dof.free_dofs().is_empty() {
            warn!("diffusion domain has no free DOFs; solution is empty or identically zero");
        }
        self.mesh.check_clamped()?;
        let (free_values, info) =
            solver.solve_linear(&self.free_conduction_matrix(), &self.free_heating_vector())?;
        let values = self.dof.expand(&free_values);
        info!(
            residual = info.residual_norm.unwrap_or(0.0),
            "diffusion solve complete"
        );
        Ok(DiffusionSolution {
            values,
            free_values,
            info,
        })
    }
}
