//! Bilinear shape functions and quadrature rules on the reference square.
//!
//! Node ordering is SW, SE, NE, NW with reference signs
//! (ξ_k, η_k) = (-1,-1), (1,-1), (1,1), (-1,1). The map from the reference
//! square onto a 2a x 2b rectangle is affine with Jacobian determinant a·b.

use crate::mesh::Corner;

/// A quadrature point on the reference square
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraturePoint {
    pub xi: f64,
    pub eta: f64,
    pub weight: f64,
}

const GP: f64 = 0.577_350_269_189_625_8; // 1/√3

/// Full 2×2 Gauss rule, points in corner order
#[rustfmt::skip]
pub const GAUSS_2X2: [QuadraturePoint; 4] = [
    QuadraturePoint { xi: -GP, eta: -GP, weight: 1.0 },
    QuadraturePoint { xi: GP, eta: -GP, weight: 1.0 },
    QuadraturePoint { xi: GP, eta: GP, weight: 1.0 },
    QuadraturePoint { xi: -GP, eta: GP, weight: 1.0 },
];

/// Reduced one-point rule at the centroid
pub const CENTROID: QuadraturePoint = QuadraturePoint {
    xi: 0.0,
    eta: 0.0,
    weight: 4.0,
};

/// Shape function values and physical derivatives at one point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeFunctions {
    pub n: [f64; 4],
    pub dndx: [f64; 4],
    pub dndy: [f64; 4],
}

impl ShapeFunctions {
    /// Evaluate at (ξ, η) for an element of half-dimensions `a`, `b`
    pub fn at(xi: f64, eta: f64, a: f64, b: f64) -> Self {
        let mut n = [0.0; 4];
        let mut dndx = [0.0; 4];
        let mut dndy = [0.0; 4];
        for (k, corner) in Corner::ALL.iter().enumerate() {
            let (xs, es) = corner.signs();
            n[k] = 0.25 * (1.0 + xs * xi) * (1.0 + es * eta);
            dndx[k] = xs * 0.25 * (1.0 + es * eta) / a;
            dndy[k] = es * 0.25 * (1.0 + xs * xi) / b;
        }
        Self { n, dndx, dndy }
    }

    pub fn at_point(point: &QuadraturePoint, a: f64, b: f64) -> Self {
        Self::at(point.xi, point.eta, a, b)
    }
}

/// Shape function values only, for interpolation at a point
pub fn interpolation_weights(xi: f64, eta: f64) -> [f64; 4] {
    Corner::ALL.map(|corner| {
        let (xs, es) = corner.signs();
        0.25 * (1.0 + xs * xi) * (1.0 + es * eta)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_of_unity() {
        for &(xi, eta) in &[(0.0, 0.0), (0.3, -0.7), (-1.0, 1.0), (0.9, 0.1)] {
            let s = ShapeFunctions::at(xi, eta, 2.0, 3.0);
            let sum: f64 = s.n.iter().sum();
            assert!((sum - 1.0).abs() < 1e-14);
            // Derivatives of a partition of unity sum to zero
            assert!(s.dndx.iter().sum::<f64>().abs() < 1e-14);
            assert!(s.dndy.iter().sum::<f64>().abs() < 1e-14);
        }
    }

    #[test]
    fn kronecker_property_at_corners() {
        for (k, corner) in Corner::ALL.iter().enumerate() {
            let (xi, eta) = corner.signs();
            let w = interpolation_weights(xi, eta);
            for (l, &value) in w.iter().enumerate() {
                let expected = if k == l { 1.0 } else { 0.0 };
                assert!((value - expected).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn derivatives_reproduce_linear_field() {
        // f(x, y) = 3x + 2y on an element of half-size (a, b) centred at 0
        let (a, b) = (2.0, 0.5);
        let nodal: Vec<f64> = Corner::ALL
            .iter()
            .map(|c| {
                let (xs, es) = c.signs();
                3.0 * xs * a + 2.0 * es * b
            })
            .collect();
        let s = ShapeFunctions::at(0.2, -0.4, a, b);
        let dfdx: f64 = s.dndx.iter().zip(&nodal).map(|(d, f)| d * f).sum();
        let dfdy: f64 = s.dndy.iter().zip(&nodal).map(|(d, f)| d * f).sum();
        assert!((dfdx - 3.0).abs() < 1e-12);
        assert!((dfdy - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quadrature_weights_cover_reference_area() {
        let full: f64 = GAUSS_2X2.iter().map(|p| p.weight).sum();
        assert_eq!(full, 4.0);
        assert_eq!(CENTROID.weight, 4.0);
    }
}
