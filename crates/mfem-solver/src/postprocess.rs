//! Field operators and modal readouts.
//!
//! A point operator is a 1 × n sparse row that interpolates the transverse
//! deflection (or the scalar field, for diffusion) at a physical point from
//! a full-length solution vector. Mode identification and the per-mode
//! readouts are built on top of it.

use std::fmt;

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dof::DofMap;
use crate::elements::shape::interpolation_weights;
use crate::error::{FemError, Result};
use crate::mesh::Mesh;
use crate::modal_solver::{CantileverFem, ModalResults};

/// Interpolation operator for one physical point
#[derive(Debug, Clone)]
pub struct PointOperator {
    operator: CsrMatrix<f64>,
    element: usize,
    reference: (f64, f64),
}

impl PointOperator {
    /// Build the operator for the point (`x`, `y`) in µm.
    ///
    /// The point belongs to the first element, in element order, whose
    /// reference coordinates satisfy -1 < ξ ≤ 1 and -1 < η ≤ 1. Points on a
    /// shared edge therefore go to the element on the low-x / low-y side.
    ///
    /// # Errors
    /// `PointOutsideDomain` if no solid element contains the point.
    pub fn new(mesh: &Mesh, dof: &DofMap, x: f64, y: f64) -> Result<Self> {
        let (a, b) = mesh.half_dimensions();
        let inside = |v: f64| v > -1.0 && v <= 1.0;
        let (element, xi, eta) = mesh
            .elements()
            .iter()
            .find_map(|e| {
                let (xi, eta) = e.reference_coords(x, y, a, b);
                (inside(xi) && inside(eta)).then_some((e, xi, eta))
            })
            .ok_or(FemError::PointOutsideDomain { x, y })?;

        let weights = interpolation_weights(xi, eta);
        let mut coo = CooMatrix::new(1, dof.n_dofs());
        for (&node, &weight) in element.nodes.iter().zip(&weights) {
            coo.push(0, dof.nodes()[node].deflection_dof, weight);
        }

        Ok(Self {
            operator: CsrMatrix::from(&coo),
            element: element.index,
            reference: (xi, eta),
        })
    }

    /// The 1 × n_dofs sparse row
    pub fn operator(&self) -> &CsrMatrix<f64> {
        &self.operator
    }

    /// Index of the element containing the point
    pub fn element(&self) -> usize {
        self.element
    }

    /// Reference coordinates (ξ, η) of the point in its element
    pub fn reference_coords(&self) -> (f64, f64) {
        self.reference
    }

    /// Interpolated value of a full-length vector at the point
    pub fn apply(&self, u: &DVector<f64>) -> f64 {
        self.operator.triplet_iter().map(|(_, c, &w)| w * u[c]).sum()
    }
}

/// Qualitative shape of a vibration mode near the probe point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Flexural,
    Torsional,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeKind::Flexural => f.pad("flexural"),
            ModeKind::Torsional => f.pad("torsional"),
        }
    }
}

/// Classifies modes by comparing deflection signs at two probe points
#[derive(Debug, Clone)]
pub struct ModeIdentification {
    first: PointOperator,
    second: PointOperator,
}

impl ModeIdentification {
    /// Probes at (x - 1, y) and (x + 1, y), in µm
    pub fn new(mesh: &Mesh, dof: &DofMap, x: f64, y: f64) -> Result<Self> {
        Self::at_points(mesh, dof, (x - 1.0, y), (x + 1.0, y))
    }

    /// Probes at two arbitrary points
    pub fn at_points(
        mesh: &Mesh,
        dof: &DofMap,
        first: (f64, f64),
        second: (f64, f64),
    ) -> Result<Self> {
        Ok(Self {
            first: PointOperator::new(mesh, dof, first.0, first.1)?,
            second: PointOperator::new(mesh, dof, second.0, second.1)?,
        })
    }

    /// Probes around the tip point of a cantilever model
    pub fn from_fem(fem: &CantileverFem) -> Result<Self> {
        let c = fem.cantilever();
        Self::new(fem.mesh(), fem.dof(), c.xtip, c.ytip)
    }

    pub fn identify(&self, mode: &DVector<f64>) -> ModeKind {
        if sign(self.first.apply(mode)) == sign(self.second.apply(mode)) {
            ModeKind::Flexural
        } else {
            ModeKind::Torsional
        }
    }

    pub fn is_mode_flexural(&self, mode: &DVector<f64>) -> bool {
        self.identify(mode) == ModeKind::Flexural
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Scalar readouts of one mode at the cantilever tip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSummary {
    /// 1-based mode number
    pub mode: usize,
    pub eigenvalue: f64,
    pub frequency_hz: f64,
    /// Interpolated deflection at the tip of the mass-normalized mode
    pub tip_displacement: f64,
    /// φᵀKφ / w², the equivalent spring constant at the tip [N/m].
    /// `None` when the tip sits on a nodal line of the mode.
    pub modal_stiffness: Option<f64>,
    /// Kuvᵀφ / w, charge per unit tip deflection [C/m]. Laminates only, and
    /// `None` on a nodal line.
    pub charge: Option<f64>,
    pub kind: ModeKind,
}

/// Compute tip readouts for every mode of a modal analysis
pub fn modal_readouts(fem: &CantileverFem, results: &ModalResults) -> Result<Vec<ModeSummary>> {
    if results.is_empty() {
        return Ok(Vec::new());
    }
    let c = fem.cantilever();
    let probe = PointOperator::new(fem.mesh(), fem.dof(), c.xtip, c.ytip)?;
    let identification = ModeIdentification::from_fem(fem)?;

    let summaries = (0..results.num_modes)
        .map(|i| {
            let phi = results.mode_shapes.column(i).into_owned();
            let w = probe.apply(&phi);
            let on_nodal_line = w == 0.0;
            if on_nodal_line {
                warn!(mode = i + 1, "tip deflection is zero; stiffness and charge are undefined");
            }
            let kphi = fem.stiffness_matrix() * &phi;
            let modal_stiffness = (!on_nodal_line).then(|| phi.dot(&kphi) / (w * w));
            let charge = fem.coupling_matrix().filter(|_| !on_nodal_line).map(|kuv| {
                let q: f64 = kuv.triplet_iter().map(|(r, _, &v)| v * phi[r]).sum();
                q / w
            });
            ModeSummary {
                mode: i + 1,
                eigenvalue: results.eigenvalues[i],
                frequency_hz: results.frequencies_hz[i],
                tip_displacement: w,
                modal_stiffness,
                charge,
                kind: identification.identify(&phi),
            }
        })
        .collect();
    Ok(summaries)
}

/// Extrema and mean of a nodal field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl FieldStatistics {
    /// `None` for an empty field
    pub fn compute(values: &DVector<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            min: values.min(),
            max: values.max(),
            mean: values.mean(),
        })
    }
}
