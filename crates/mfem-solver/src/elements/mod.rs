//! Element kernels for grid-topology models.
//!
//! Every element of a uniform grid is the same 2a x 2b rectangle, so a kernel
//! computes one set of local matrices that the assembler reuses for every
//! element. Half-dimensions are passed in µm and converted to metres here.

use nalgebra::DMatrix;

use crate::dof::Physics;
use crate::materials::{LaminateMaterial, PlateMaterial};

pub mod diffusion;
pub mod laminate;
pub mod plate;
pub mod shape;

pub use diffusion::{DiffusionElement, DiffusionMatrices};
pub use laminate::PiezoLaminate;
pub use plate::MindlinPlate;
pub use shape::{CENTROID, GAUSS_2X2, QuadraturePoint, ShapeFunctions};

/// Length unit of the half-dimensions handed to the kernels [m]
pub(crate) const MICRON: f64 = 1e-6;

/// Local matrices of one structural element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMatrices {
    pub stiffness: DMatrix<f64>,
    pub mass: DMatrix<f64>,
    /// Electromechanical coupling column (laminates only)
    pub coupling: Option<DMatrix<f64>>,
    /// Element capacitance [F] (laminates only)
    pub capacitance: Option<f64>,
}

/// Interface of a structural element kernel
pub trait StructuralElement {
    /// Physics model whose DOF layout the local matrices follow
    fn physics(&self) -> Physics;

    /// Compute the local matrices for half-dimensions `a`, `b` in µm
    fn element_matrices(&self, a: f64, b: f64) -> ElementMatrices;
}

/// Mechanical model of a cantilever: selects the element kernel
#[derive(Debug, Clone, PartialEq)]
pub enum MechanicalModel {
    Plate(MindlinPlate),
    Laminate(PiezoLaminate),
}

impl MechanicalModel {
    pub fn plate(material: PlateMaterial) -> Self {
        MechanicalModel::Plate(MindlinPlate::new(material))
    }

    pub fn laminate(material: LaminateMaterial) -> Self {
        MechanicalModel::Laminate(PiezoLaminate::new(material))
    }
}

impl StructuralElement for MechanicalModel {
    fn physics(&self) -> Physics {
        match self {
            MechanicalModel::Plate(kernel) => kernel.physics(),
            MechanicalModel::Laminate(kernel) => kernel.physics(),
        }
    }

    fn element_matrices(&self, a: f64, b: f64) -> ElementMatrices {
        match self {
            MechanicalModel::Plate(kernel) => kernel.element_matrices(a, b),
            MechanicalModel::Laminate(kernel) => kernel.element_matrices(a, b),
        }
    }
}

impl From<PlateMaterial> for MechanicalModel {
    fn from(material: PlateMaterial) -> Self {
        MechanicalModel::plate(material)
    }
}

impl From<LaminateMaterial> for MechanicalModel {
    fn from(material: LaminateMaterial) -> Self {
        MechanicalModel::laminate(material)
    }
}

/// Replace a square matrix by ½(A + Aᵀ)
///
/// Entries (i, j) and (j, i) come out bit-identical.
pub fn symmetrize(matrix: &mut DMatrix<f64>) {
    assert!(matrix.is_square(), "symmetrize requires a square matrix");
    let n = matrix.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let mean = 0.5 * (matrix[(i, j)] + matrix[(j, i)]);
            matrix[(i, j)] = mean;
            matrix[(j, i)] = mean;
        }
    }
}
