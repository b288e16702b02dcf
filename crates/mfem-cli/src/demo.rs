//! Bundled demo scenarios.

use clap::ValueEnum;
use mfem_solver::{Cantilever, DiffusionDomain, ElementField, FemError, Topology};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Paddle cantilever as an SOI-MUMPs Mindlin plate
    Plate,
    /// Paddle cantilever as a PiezoMUMPs laminate
    Laminate,
    /// Heat conduction with a void corner and a low-conductivity band
    Poisson,
}

/// Number of modes computed by the cantilever demos
pub const DEMO_MODES: usize = 3;

/// 500 × 500 µm paddle: a 50 × 25 base with a 10-cell wide beam on top
pub fn paddle_cantilever() -> Result<Cantilever, FemError> {
    let rows: Vec<Vec<u8>> = (0..50)
        .map(|i| {
            let tip = u8::from((20..30).contains(&i));
            let mut row = vec![1; 25];
            row.extend(std::iter::repeat_n(tip, 25));
            row
        })
        .collect();
    Cantilever::new(Topology::from_rows(&rows)?, 5.0, 5.0, 250.0, 495.0)
}

pub fn poisson_domain() -> Result<DiffusionDomain, FemError> {
    let (rows, cols) = (20, 25);
    let mut domain = Topology::filled(rows, cols);
    let mut conductivity = ElementField::uniform(rows, cols, 1.0);
    let mut source = ElementField::uniform(rows, cols, 0.0);
    for i in 0..rows {
        for j in 0..cols {
            if i >= 15 && j >= 20 {
                domain.set(i, j, false);
            }
            if (3 < j && j < 16) || (j > 15 && i > 5) {
                conductivity.set(i, j, 1e-2);
            } else {
                source.set(i, j, 1e-3);
            }
        }
    }
    DiffusionDomain::new(domain, conductivity, source, 5.0, 5.0)
}
