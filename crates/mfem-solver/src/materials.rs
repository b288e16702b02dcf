//! Material properties for plate and laminate analyses.
//!
//! Plates are a single homogeneous layer. Laminates are a stack of layers
//! integrated through the thickness; one layer carries the piezoelectric
//! effect and acts as the dielectric between the electrodes.
//!
//! All quantities are SI: thickness in m, density in kg/m³, moduli in Pa,
//! permittivity in F/m and piezoelectric stress coefficients in C/m².

use nalgebra::{Matrix5, Vector5};
use serde::{Deserialize, Serialize};

use crate::error::{FemError, Result};

/// Vacuum permittivity [F/m]
pub const VACUUM_PERMITTIVITY: f64 = 8.85418782e-12;

/// Mindlin shear correction factor
pub const SHEAR_CORRECTION: f64 = std::f64::consts::PI * std::f64::consts::PI / 12.0;

fn check_elastic(h: f64, rho: f64, elastic: f64, nu: f64) -> Result<()> {
    if !(h > 0.0) {
        return Err(FemError::InvalidMaterial(format!("thickness must be positive, got {h}")));
    }
    if !(rho > 0.0) {
        return Err(FemError::InvalidMaterial(format!("density must be positive, got {rho}")));
    }
    if !(elastic > 0.0) {
        return Err(FemError::InvalidMaterial(format!(
            "elastic modulus must be positive, got {elastic}"
        )));
    }
    if !(nu > -1.0 && nu < 0.5) {
        return Err(FemError::InvalidMaterial(format!(
            "Poisson's ratio must lie in (-1, 0.5), got {nu}"
        )));
    }
    Ok(())
}

/// Homogeneous plate material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateMaterial {
    /// Thickness [m]
    pub h: f64,
    /// Density [kg/m³]
    pub rho: f64,
    /// Young's modulus [Pa]
    pub elastic: f64,
    /// Poisson's ratio [-]
    pub nu: f64,
}

impl PlateMaterial {
    pub fn new(h: f64, rho: f64, elastic: f64, nu: f64) -> Result<Self> {
        check_elastic(h, rho, elastic, nu)?;
        Ok(Self { h, rho, elastic, nu })
    }

    /// 10 µm single-crystal silicon device layer of the SOI-MUMPs process
    pub fn soi_mumps() -> Self {
        Self {
            h: 10e-6,
            rho: 2330.0,
            elastic: 130e9,
            nu: 0.29,
        }
    }

    /// Re-check a material that was deserialized or built field by field
    pub fn validate(&self) -> Result<()> {
        check_elastic(self.h, self.rho, self.elastic, self.nu)
    }

    pub fn shear_modulus(&self) -> f64 {
        0.5 * self.elastic / (1.0 + self.nu)
    }
}

/// One layer of a laminate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaminateLayer {
    /// Thickness [m]
    pub h: f64,
    /// Density [kg/m³]
    pub rho: f64,
    /// Young's modulus [Pa]
    pub elastic: f64,
    /// Poisson's ratio [-]
    pub nu: f64,
    /// Permittivity [F/m]
    #[serde(default)]
    pub epsilon: f64,
    /// Piezoelectric stress coefficient e31 = e32 [C/m²]
    #[serde(default)]
    pub e_piezo: f64,
}

impl LaminateLayer {
    /// Purely elastic layer
    pub fn elastic(h: f64, rho: f64, elastic: f64, nu: f64) -> Self {
        Self {
            h,
            rho,
            elastic,
            nu,
            epsilon: 0.0,
            e_piezo: 0.0,
        }
    }

    /// Piezoelectric layer
    pub fn piezoelectric(
        h: f64,
        rho: f64,
        elastic: f64,
        nu: f64,
        epsilon: f64,
        e_piezo: f64,
    ) -> Self {
        Self {
            h,
            rho,
            elastic,
            nu,
            epsilon,
            e_piezo,
        }
    }

    /// Layer elastic matrix acting on (εx, εy, γyz, γxz, γxy)
    #[rustfmt::skip]
    pub fn elastic_matrix(&self) -> Matrix5<f64> {
        let shear_modulus = 0.5 * self.elastic / (1.0 + self.nu);
        let c11 = self.elastic / (1.0 - self.nu * self.nu);
        let c12 = c11 * self.nu;
        let c44 = SHEAR_CORRECTION * shear_modulus;
        let c66 = shear_modulus;
        Matrix5::new(
            c11, c12, 0.0, 0.0, 0.0,
            c12, c11, 0.0, 0.0, 0.0,
            0.0, 0.0, c44, 0.0, 0.0,
            0.0, 0.0, 0.0, c44, 0.0,
            0.0, 0.0, 0.0, 0.0, c66,
        )
    }

    /// Transposed piezoelectric row (e31, e32, 0, 0, 0)ᵀ
    pub fn piezoelectric_column(&self) -> Vector5<f64> {
        Vector5::new(self.e_piezo, self.e_piezo, 0.0, 0.0, 0.0)
    }
}

/// Through-thickness integrated laminate properties
///
/// With layer `k` spanning `z ∈ [zl, zu]` around the mid-plane of the stack,
/// the elastic moments are `csN = Σ c_k (zu^N - zl^N) / N` for N = 1, 2, 3 and
/// the mass moments follow the same pattern with density.
#[derive(Debug, Clone, PartialEq)]
pub struct LaminateMaterial {
    layers: Vec<LaminateLayer>,
    cs1: Matrix5<f64>,
    cs2: Matrix5<f64>,
    cs3: Matrix5<f64>,
    ce1: Vector5<f64>,
    ce2: Vector5<f64>,
    cc: f64,
    mass_moments: (f64, f64, f64),
    piezo_thickness: f64,
}

impl LaminateMaterial {
    /// Integrate a stack of layers listed bottom to top.
    ///
    /// `piezo_layer` is the index of the layer between the electrodes.
    pub fn new(layers: Vec<LaminateLayer>, piezo_layer: usize) -> Result<Self> {
        if layers.is_empty() {
            return Err(FemError::InvalidMaterial("laminate has no layers".into()));
        }
        if piezo_layer >= layers.len() {
            return Err(FemError::InvalidMaterial(format!(
                "piezoelectric layer {} out of range for {} layers",
                piezo_layer,
                layers.len()
            )));
        }
        for layer in &layers {
            check_elastic(layer.h, layer.rho, layer.elastic, layer.nu)?;
        }
        Ok(Self::integrate(layers, piezo_layer))
    }

    fn integrate(layers: Vec<LaminateLayer>, piezo_layer: usize) -> Self {
        let thickness: f64 = layers.iter().map(|l| l.h).sum();
        let mut bounds = Vec::with_capacity(layers.len());
        let mut zl = -0.5 * thickness;
        for layer in &layers {
            bounds.push((zl, zl + layer.h));
            zl += layer.h;
        }

        let mut cs1 = Matrix5::zeros();
        let mut cs2 = Matrix5::zeros();
        let mut cs3 = Matrix5::zeros();
        let (mut p0, mut p1, mut p2) = (0.0, 0.0, 0.0);
        for (layer, &(zl, zu)) in layers.iter().zip(&bounds) {
            let c = layer.elastic_matrix();
            let m1 = zu - zl;
            let m2 = (zu * zu - zl * zl) / 2.0;
            let m3 = (zu * zu * zu - zl * zl * zl) / 3.0;
            cs1 += c * m1;
            cs2 += c * m2;
            cs3 += c * m3;
            p0 += layer.rho * m1;
            p1 += layer.rho * m2;
            p2 += layer.rho * m3;
        }

        let piezo = &layers[piezo_layer];
        let (zl, zu) = bounds[piezo_layer];
        let e = piezo.piezoelectric_column();
        let ce1 = e * (zu - zl);
        let ce2 = e * ((zu * zu - zl * zl) / 2.0);
        let cc = piezo.epsilon / piezo.h;

        Self {
            cs1,
            cs2,
            cs3,
            ce1,
            ce2,
            cc,
            mass_moments: (p0, p1, p2),
            piezo_thickness: piezo.h,
            layers,
        }
    }

    /// PiezoMUMPs stack: 10 µm silicon, 0.5 µm aluminium nitride, 1 µm aluminium
    pub fn piezo_mumps() -> Self {
        let si = LaminateLayer::elastic(10e-6, 2330.0, 130e9, 0.28);
        let aln = LaminateLayer::piezoelectric(
            0.5e-6,
            3260.0,
            300e9,
            0.36,
            VACUUM_PERMITTIVITY * 10.2,
            0.58,
        );
        let al = LaminateLayer::elastic(1e-6, 2700.0, 70e9, 0.33);
        Self::integrate(vec![si, aln, al], 1)
    }

    /// SOI-MUMPs device layer modelled as a single-layer laminate
    pub fn soi_mumps() -> Self {
        let si = LaminateLayer::elastic(10e-6, 2330.0, 169e9, 0.064);
        Self::integrate(vec![si], 0)
    }

    pub fn layers(&self) -> &[LaminateLayer] {
        &self.layers
    }

    /// Zeroth, first and second z-moments of the layer elastic matrices
    pub fn elastic_moments(&self) -> (&Matrix5<f64>, &Matrix5<f64>, &Matrix5<f64>) {
        (&self.cs1, &self.cs2, &self.cs3)
    }

    /// Zeroth and first z-moments of the piezoelectric coefficients
    pub fn piezoelectric_moments(&self) -> (&Vector5<f64>, &Vector5<f64>) {
        (&self.ce1, &self.ce2)
    }

    /// Permittivity over piezo-layer thickness [F/m²]
    pub fn capacitance_density(&self) -> f64 {
        self.cc
    }

    /// Thickness of the piezoelectric layer [m]
    pub fn piezo_thickness(&self) -> f64 {
        self.piezo_thickness
    }

    /// Density moments (p0, p1, p2)
    pub fn mass_moments(&self) -> (f64, f64, f64) {
        self.mass_moments
    }

    /// Inertia matrix over (u, v, w, θx, θy) for the kinematics
    /// u(z) = u + zθy, v(z) = v - zθx, w(z) = w
    #[rustfmt::skip]
    pub fn inertia_matrix(&self) -> Matrix5<f64> {
        let (p0, p1, p2) = self.mass_moments;
        Matrix5::new(
            p0, 0.0, 0.0, 0.0, p1,
            0.0, p0, 0.0, -p1, 0.0,
            0.0, 0.0, p0, 0.0, 0.0,
            0.0, -p1, 0.0, p2, 0.0,
            p1, 0.0, 0.0, 0.0, p2,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_plate_material() {
        assert!(PlateMaterial::new(0.0, 2330.0, 130e9, 0.29).is_err());
        assert!(PlateMaterial::new(10e-6, 2330.0, 130e9, 0.5).is_err());
        assert!(PlateMaterial::new(10e-6, -1.0, 130e9, 0.29).is_err());
        assert!(PlateMaterial::new(10e-6, 2330.0, 130e9, 0.29).is_ok());
    }

    #[test]
    fn single_layer_moments() {
        let h = 10e-6;
        let layer = LaminateLayer::elastic(h, 2330.0, 169e9, 0.064);
        let laminate = LaminateMaterial::new(vec![layer], 0).unwrap();
        let (cs1, cs2, cs3) = laminate.elastic_moments();
        let c = layer.elastic_matrix();

        // Symmetric stack: first moment vanishes
        assert!((cs1 - c * h).norm() < 1e-6 * (c * h).norm());
        assert!(cs2.norm() < 1e-12 * c.norm());
        assert!((cs3 - c * (h * h * h / 12.0)).norm() < 1e-9 * (c * h * h * h).norm());

        let (p0, p1, p2) = laminate.mass_moments();
        assert!((p0 - 2330.0 * h).abs() < 1e-12);
        assert!(p1.abs() < 1e-18);
        assert!((p2 - 2330.0 * h * h * h / 12.0).abs() < 1e-24);
    }

    #[test]
    fn piezo_mumps_is_asymmetric() {
        let laminate = LaminateMaterial::piezo_mumps();
        assert_eq!(laminate.layers().len(), 3);
        let (_, cs2, _) = laminate.elastic_moments();
        assert!(cs2[(0, 0)].abs() > 0.0);
        assert!((laminate.piezo_thickness() - 0.5e-6).abs() < 1e-18);
        let expected_cc = VACUUM_PERMITTIVITY * 10.2 / 0.5e-6;
        assert!((laminate.capacitance_density() - expected_cc).abs() < 1e-12 * expected_cc);
    }

    #[test]
    fn inertia_matrix_is_symmetric() {
        let m = LaminateMaterial::piezo_mumps().inertia_matrix();
        assert_eq!(m, m.transpose());
    }

    #[test]
    fn rejects_out_of_range_piezo_layer() {
        let layer = LaminateLayer::elastic(1e-6, 1000.0, 1e9, 0.3);
        assert!(LaminateMaterial::new(vec![layer], 1).is_err());
        assert!(LaminateMaterial::new(Vec::new(), 0).is_err());
    }
}
