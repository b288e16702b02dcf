//! Occupancy grids and cantilever descriptions.
//!
//! A [`Topology`] is the binary solid/void matrix a design is drawn on. Rows
//! run along the x-axis and columns along the y-axis; the clamped edge is the
//! first column (j = 0). A [`Cantilever`] adds the element half-dimensions and
//! the probe point used to normalise mode shapes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FemError, Result};

/// Binary occupancy matrix (1 = solid, 0 = void)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Topology {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl Topology {
    /// Create a topology from row-major cell values
    ///
    /// # Errors
    /// Returns `InvalidTopology` if the cell count does not match the shape or
    /// if any entry is not exactly 0 or 1.
    pub fn new(rows: usize, cols: usize, cells: Vec<u8>) -> Result<Self> {
        if cells.len() != rows * cols {
            return Err(FemError::InvalidTopology(format!(
                "expected {} cells for a {}x{} grid, got {}",
                rows * cols,
                rows,
                cols,
                cells.len()
            )));
        }
        if let Some(pos) = cells.iter().position(|&c| c > 1) {
            return Err(FemError::InvalidTopology(format!(
                "entry ({}, {}) is {}, expected 0 or 1",
                pos / cols.max(1),
                pos % cols.max(1),
                cells[pos]
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Create a topology from nested rows
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
            return Err(FemError::InvalidTopology(format!(
                "row {} has {} entries, expected {}",
                bad,
                rows[bad].len(),
                ncols
            )));
        }
        let cells = rows.iter().flatten().copied().collect();
        Self::new(rows.len(), ncols, cells)
    }

    /// Fully solid rows x cols grid
    pub fn filled(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![1; rows * cols],
        }
    }

    /// Fully void rows x cols grid
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
        }
    }

    /// Grid shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_solid(&self, i: usize, j: usize) -> bool {
        self.cells[i * self.cols + j] == 1
    }

    pub fn set(&mut self, i: usize, j: usize, solid: bool) {
        self.cells[i * self.cols + j] = u8::from(solid);
    }

    /// Number of solid cells
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 1).count()
    }

    /// Copy of the grid as nested rows
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells.chunks(self.cols).map(<[u8]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<u8>>> for Topology {
    type Error = FemError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<Topology> for Vec<Vec<u8>> {
    fn from(topology: Topology) -> Self {
        topology.to_rows()
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            let line: String = row.iter().map(|&c| if c == 1 { '1' } else { '0' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Per-element scalar field aligned with an occupancy grid
/// (conductivity, heat source, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct ElementField {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl ElementField {
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
            return Err(FemError::InvalidField(format!(
                "row {} has {} entries, expected {}",
                bad,
                rows[bad].len(),
                ncols
            )));
        }
        Ok(Self {
            rows: rows.len(),
            cols: ncols,
            values: rows.iter().flatten().copied().collect(),
        })
    }

    /// Field with the same value everywhere
    pub fn uniform(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            values: vec![value; rows * cols],
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.cols + j] = value;
    }
}

impl TryFrom<Vec<Vec<f64>>> for ElementField {
    type Error = FemError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<ElementField> for Vec<Vec<f64>> {
    fn from(field: ElementField) -> Self {
        if field.cols == 0 {
            return vec![Vec::new(); field.rows];
        }
        field.values.chunks(field.cols).map(<[f64]>::to_vec).collect()
    }
}

/// A cantilever design: topology, element size and probe point
///
/// `a` and `b` are half the element width in x and y, in µm. The probe point
/// (`xtip`, `ytip`) is in µm and should lie on a solid element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CantileverRecord")]
pub struct Cantilever {
    pub topology: Topology,
    pub a: f64,
    pub b: f64,
    pub xtip: f64,
    pub ytip: f64,
}

/// Serialized form of a [`Cantilever`] before validation
#[derive(Deserialize)]
struct CantileverRecord {
    topology: Topology,
    a: f64,
    b: f64,
    xtip: f64,
    ytip: f64,
}

impl TryFrom<CantileverRecord> for Cantilever {
    type Error = FemError;

    fn try_from(record: CantileverRecord) -> Result<Self> {
        Self::new(record.topology, record.a, record.b, record.xtip, record.ytip)
    }
}

impl Cantilever {
    /// Create a cantilever, checking that the element dimensions are positive
    pub fn new(topology: Topology, a: f64, b: f64, xtip: f64, ytip: f64) -> Result<Self> {
        if !(a > 0.0 && b > 0.0) {
            return Err(FemError::InvalidTopology(format!(
                "element half-dimensions must be positive, got a = {a}, b = {b}"
            )));
        }
        Ok(Self {
            topology,
            a,
            b,
            xtip,
            ytip,
        })
    }

    /// Size of the rectangular design area in µm as (x, y)
    pub fn design_area(&self) -> (f64, f64) {
        let (rows, cols) = self.topology.shape();
        (2.0 * self.a * rows as f64, 2.0 * self.b * cols as f64)
    }
}

impl fmt::Display for Cantilever {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, length) = self.design_area();
        writeln!(f, "--- MicroFEM Cantilever ---")?;
        writeln!(f, "Each element is {} x {} um", 2.0 * self.a, 2.0 * self.b)?;
        writeln!(f, "The design area is {width} x {length} um")?;
        writeln!(f, "(xtip, ytip) = ({}, {}) um", self.xtip, self.ytip)
    }
}
