//! Four-node scalar diffusion element (steady heat conduction).

use nalgebra::{DMatrix, DVector, Matrix4, Vector4};

use super::MICRON;
use super::shape::{GAUSS_2X2, ShapeFunctions};

/// Unit-coefficient local matrices of a diffusion element
///
/// The assembler scales `conduction` by each element's conductivity and
/// `source` by each element's source density.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionMatrices {
    /// ∫ ∇Nᵀ∇N dA (4×4)
    pub conduction: DMatrix<f64>,
    /// ∫ Nᵀ dA (4)
    pub source: DVector<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiffusionElement;

impl DiffusionElement {
    pub fn new() -> Self {
        Self
    }

    /// Local matrices for half-dimensions `a`, `b` in µm
    pub fn matrices(&self, a: f64, b: f64) -> DiffusionMatrices {
        let (a, b) = (a * MICRON, b * MICRON);
        let jacobian = a * b;
        let mut ke = Matrix4::zeros();
        let mut fe = Vector4::zeros();
        for point in &GAUSS_2X2 {
            let s = ShapeFunctions::at_point(point, a, b);
            let n = Vector4::from(s.n);
            let dndx = Vector4::from(s.dndx);
            let dndy = Vector4::from(s.dndy);
            let w = jacobian * point.weight;
            ke += (dndx * dndx.transpose() + dndy * dndy.transpose()) * w;
            fe += n * w;
        }

        let mut conduction = DMatrix::from_column_slice(4, 4, ke.as_slice());
        super::symmetrize(&mut conduction);
        DiffusionMatrices {
            conduction,
            source: DVector::from_column_slice(fe.as_slice()),
        }
    }
}
