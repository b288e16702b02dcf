//! Four-node piezoelectric laminate element.
//!
//! DOFs per node are (u, v, w, θx, θy) with in-plane displacements varying
//! through the thickness as u(z) = u + zθy and v(z) = v - zθx. Strains are
//! ordered (εx, εy, γyz, γxz, γxy) and split into a membrane part, a
//! curvature part scaled by z, and a transverse shear part. A single electrode
//! pair spans the whole structure, so the electrical side of an element is one
//! coupling column and one capacitance.

use nalgebra::{DMatrix, SMatrix, SVector};

use super::shape::{CENTROID, GAUSS_2X2, ShapeFunctions};
use super::{ElementMatrices, MICRON, StructuralElement, symmetrize};
use crate::dof::Physics;
use crate::materials::LaminateMaterial;

const NDOF: usize = 20;

type Local = SMatrix<f64, NDOF, NDOF>;
type StrainOperator = SMatrix<f64, 5, NDOF>;

/// Laminate kernel
#[derive(Debug, Clone, PartialEq)]
pub struct PiezoLaminate {
    material: LaminateMaterial,
}

impl PiezoLaminate {
    pub fn new(material: LaminateMaterial) -> Self {
        Self { material }
    }

    pub fn material(&self) -> &LaminateMaterial {
        &self.material
    }

    /// Element stiffness matrix (20×20)
    pub fn stiffness_matrix(&self, a: f64, b: f64) -> DMatrix<f64> {
        let (a, b) = (a * MICRON, b * MICRON);
        let jacobian = a * b;
        let (cs1, cs2, cs3) = self.material.elastic_moments();

        let mut ke = Local::zeros();
        for point in &GAUSS_2X2 {
            let (bs1, bs2, _) = strain_operators(&ShapeFunctions::at_point(point, a, b));
            let integrand = bs1.transpose() * cs1 * bs1
                + bs2.transpose() * cs2 * bs1
                + bs1.transpose() * cs2 * bs2
                + bs2.transpose() * cs3 * bs2;
            ke += integrand * (jacobian * point.weight);
        }

        let (_, _, bs3) = strain_operators(&ShapeFunctions::at_point(&CENTROID, a, b));
        ke += bs3.transpose() * cs1 * bs3 * (jacobian * CENTROID.weight);

        let mut ke = to_dynamic(&ke);
        symmetrize(&mut ke);
        ke
    }

    /// Consistent mass matrix (20×20)
    pub fn mass_matrix(&self, a: f64, b: f64) -> DMatrix<f64> {
        let (a, b) = (a * MICRON, b * MICRON);
        let jacobian = a * b;
        let inertia = self.material.inertia_matrix();

        let mut me = Local::zeros();
        for point in &GAUSS_2X2 {
            let nu = displacement_operator(&ShapeFunctions::at_point(point, a, b));
            me += nu.transpose() * inertia * nu * (jacobian * point.weight);
        }

        let mut me = to_dynamic(&me);
        symmetrize(&mut me);
        me
    }

    /// Charge per unit electrode voltage produced by each element DOF (20×1)
    pub fn coupling_matrix(&self, a: f64, b: f64) -> DMatrix<f64> {
        let (a, b) = (a * MICRON, b * MICRON);
        let jacobian = a * b;
        let (ce1, ce2) = self.material.piezoelectric_moments();
        let field = 1.0 / self.material.piezo_thickness();

        let mut kuv = SVector::<f64, NDOF>::zeros();
        for point in &GAUSS_2X2 {
            let (bs1, bs2, bs3) = strain_operators(&ShapeFunctions::at_point(point, a, b));
            let integrand = (bs1 + bs3).transpose() * ce1 + bs2.transpose() * ce2;
            kuv += integrand * (jacobian * point.weight * field);
        }
        DMatrix::from_column_slice(NDOF, 1, kuv.as_slice())
    }

    /// Element capacitance [F]
    pub fn capacitance(&self, a: f64, b: f64) -> f64 {
        let jacobian = a * MICRON * b * MICRON;
        CENTROID.weight * jacobian * self.material.capacitance_density()
    }
}

impl StructuralElement for PiezoLaminate {
    fn physics(&self) -> Physics {
        Physics::Laminate
    }

    fn element_matrices(&self, a: f64, b: f64) -> ElementMatrices {
        ElementMatrices {
            stiffness: self.stiffness_matrix(a, b),
            mass: self.mass_matrix(a, b),
            coupling: Some(self.coupling_matrix(a, b)),
            capacitance: Some(self.capacitance(a, b)),
        }
    }
}

/// Membrane, curvature and transverse shear strain operators
fn strain_operators(s: &ShapeFunctions) -> (StrainOperator, StrainOperator, StrainOperator) {
    let mut bs1 = StrainOperator::zeros();
    let mut bs2 = StrainOperator::zeros();
    let mut bs3 = StrainOperator::zeros();
    for k in 0..4 {
        let (n, dx, dy) = (s.n[k], s.dndx[k], s.dndy[k]);
        let c = 5 * k;

        bs1[(0, c)] = dx;
        bs1[(1, c + 1)] = dy;
        bs1[(4, c)] = dy;
        bs1[(4, c + 1)] = dx;

        bs2[(0, c + 4)] = dx;
        bs2[(1, c + 3)] = -dy;
        bs2[(4, c + 3)] = -dx;
        bs2[(4, c + 4)] = dy;

        bs3[(2, c + 2)] = dy;
        bs3[(2, c + 3)] = -n;
        bs3[(3, c + 2)] = dx;
        bs3[(3, c + 4)] = n;
    }
    (bs1, bs2, bs3)
}

/// Interpolation of the five mid-plane fields
fn displacement_operator(s: &ShapeFunctions) -> StrainOperator {
    let mut nu = StrainOperator::zeros();
    for k in 0..4 {
        for d in 0..5 {
            nu[(d, 5 * k + d)] = s.n[k];
        }
    }
    nu
}

fn to_dynamic(local: &Local) -> DMatrix<f64> {
    DMatrix::from_column_slice(NDOF, NDOF, local.as_slice())
}
