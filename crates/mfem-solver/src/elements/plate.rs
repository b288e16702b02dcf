//! Four-node Mindlin plate element.
//!
//! DOFs per node are (w, θx, θy). Curvatures and transverse shear strains:
//!
//! ```text
//! κx = -∂θy/∂x    κy = ∂θx/∂y    κxy = ∂θx/∂x - ∂θy/∂y
//! γxz = ∂w/∂x + θy               γyz = ∂w/∂y - θx
//! ```
//!
//! Bending and mass use full 2×2 Gauss quadrature; transverse shear uses the
//! one-point centroid rule to avoid shear locking.

use nalgebra::{DMatrix, Matrix3, SMatrix};

use super::shape::{CENTROID, GAUSS_2X2, ShapeFunctions};
use super::{ElementMatrices, MICRON, StructuralElement, symmetrize};
use crate::dof::Physics;
use crate::materials::{PlateMaterial, SHEAR_CORRECTION};

const NDOF: usize = 12;

type Local = SMatrix<f64, NDOF, NDOF>;

/// Mindlin plate kernel
#[derive(Debug, Clone, PartialEq)]
pub struct MindlinPlate {
    material: PlateMaterial,
}

impl MindlinPlate {
    pub fn new(material: PlateMaterial) -> Self {
        Self { material }
    }

    pub fn material(&self) -> &PlateMaterial {
        &self.material
    }

    /// Element stiffness matrix (12×12) for half-dimensions in µm
    pub fn stiffness_matrix(&self, a: f64, b: f64) -> DMatrix<f64> {
        let (a, b) = (a * MICRON, b * MICRON);
        let PlateMaterial { h, elastic, nu, .. } = self.material;
        let jacobian = a * b;

        let ci = Matrix3::new(1.0, nu, 0.0, nu, 1.0, 0.0, 0.0, 0.0, 0.5 * (1.0 - nu));
        let mut bending = Local::zeros();
        for point in &GAUSS_2X2 {
            let bb = bending_operator(&ShapeFunctions::at_point(point, a, b));
            bending += bb.transpose() * ci * bb * point.weight;
        }
        bending *= jacobian * h * h * h / 12.0 * elastic / (1.0 - nu * nu);

        let bs = shear_operator(&ShapeFunctions::at_point(&CENTROID, a, b));
        let shear = bs.transpose() * bs
            * (CENTROID.weight * jacobian * SHEAR_CORRECTION * h * self.material.shear_modulus());

        let mut ke = to_dynamic(&(bending + shear));
        symmetrize(&mut ke);
        ke
    }

    /// Consistent mass matrix (12×12) with rotary inertia
    pub fn mass_matrix(&self, a: f64, b: f64) -> DMatrix<f64> {
        let (a, b) = (a * MICRON, b * MICRON);
        let PlateMaterial { h, rho, .. } = self.material;
        let jacobian = a * b;
        let translational = rho * h;
        let rotary = rho * h * h * h / 12.0;

        let mut me = Local::zeros();
        for point in &GAUSS_2X2 {
            let s = ShapeFunctions::at_point(point, a, b);
            let scale = jacobian * point.weight;
            for k in 0..4 {
                for l in 0..4 {
                    let nn = s.n[k] * s.n[l] * scale;
                    me[(3 * k, 3 * l)] += translational * nn;
                    me[(3 * k + 1, 3 * l + 1)] += rotary * nn;
                    me[(3 * k + 2, 3 * l + 2)] += rotary * nn;
                }
            }
        }

        let mut me = to_dynamic(&me);
        symmetrize(&mut me);
        me
    }
}

impl StructuralElement for MindlinPlate {
    fn physics(&self) -> Physics {
        Physics::Plate
    }

    fn element_matrices(&self, a: f64, b: f64) -> ElementMatrices {
        ElementMatrices {
            stiffness: self.stiffness_matrix(a, b),
            mass: self.mass_matrix(a, b),
            coupling: None,
            capacitance: None,
        }
    }
}

/// Curvature operator (κx, κy, κxy) over the 12 element DOFs
fn bending_operator(s: &ShapeFunctions) -> SMatrix<f64, 3, NDOF> {
    let mut bb = SMatrix::<f64, 3, NDOF>::zeros();
    for k in 0..4 {
        let (dx, dy) = (s.dndx[k], s.dndy[k]);
        bb[(0, 3 * k + 2)] = -dx;
        bb[(1, 3 * k + 1)] = dy;
        bb[(2, 3 * k + 1)] = dx;
        bb[(2, 3 * k + 2)] = -dy;
    }
    bb
}

/// Transverse shear operator (γxz, γyz) over the 12 element DOFs
fn shear_operator(s: &ShapeFunctions) -> SMatrix<f64, 2, NDOF> {
    let mut bs = SMatrix::<f64, 2, NDOF>::zeros();
    for k in 0..4 {
        bs[(0, 3 * k)] = s.dndx[k];
        bs[(0, 3 * k + 2)] = s.n[k];
        bs[(1, 3 * k)] = s.dndy[k];
        bs[(1, 3 * k + 1)] = -s.n[k];
    }
    bs
}

fn to_dynamic(local: &Local) -> DMatrix<f64> {
    DMatrix::from_column_slice(NDOF, NDOF, local.as_slice())
}
