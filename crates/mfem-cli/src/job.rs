//! JSON job files.
//!
//! A modal job describes a cantilever and its material; a static job
//! describes a diffusion domain. Materials are either a named preset or an
//! inline plate material:
//!
//! ```json
//! { "topology": [[1, 1], [1, 1]], "a": 5.0, "b": 5.0,
//!   "xtip": 10.0, "ytip": 15.0, "material": "piezo-mumps" }
//! ```

use std::fs;
use std::path::Path;

use mfem_solver::{
    Cantilever, DiffusionDomain, ElementField, LaminateMaterial, MechanicalModel, PlateMaterial,
    Topology,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Named fabrication stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaterialPreset {
    /// Silicon device layer as a Mindlin plate
    SoiMumps,
    /// Si / AlN / Al piezoelectric laminate
    PiezoMumps,
    /// Silicon device layer as a single-layer laminate
    SoiMumpsLaminate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JobMaterial {
    Preset(MaterialPreset),
    Plate(PlateMaterial),
}

impl JobMaterial {
    pub fn into_model(self) -> Result<MechanicalModel, CliError> {
        let model = match self {
            JobMaterial::Preset(MaterialPreset::SoiMumps) => PlateMaterial::soi_mumps().into(),
            JobMaterial::Preset(MaterialPreset::PiezoMumps) => {
                LaminateMaterial::piezo_mumps().into()
            }
            JobMaterial::Preset(MaterialPreset::SoiMumpsLaminate) => {
                LaminateMaterial::soi_mumps().into()
            }
            JobMaterial::Plate(material) => {
                material.validate()?;
                material.into()
            }
        };
        Ok(model)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModalJob {
    pub topology: Topology,
    pub a: f64,
    pub b: f64,
    pub xtip: f64,
    pub ytip: f64,
    pub material: JobMaterial,
    /// Number of modes, overridden by `--modes`
    #[serde(default)]
    pub modes: Option<usize>,
}

impl ModalJob {
    pub fn into_parts(self) -> Result<(Cantilever, MechanicalModel), CliError> {
        let cantilever = Cantilever::new(self.topology, self.a, self.b, self.xtip, self.ytip)?;
        Ok((cantilever, self.material.into_model()?))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticJob {
    pub domain: Topology,
    pub conductivity: ElementField,
    pub source: ElementField,
    pub a: f64,
    pub b: f64,
}

impl StaticJob {
    pub fn into_domain(self) -> Result<DiffusionDomain, CliError> {
        Ok(DiffusionDomain::new(
            self.domain,
            self.conductivity,
            self.source,
            self.a,
            self.b,
        )?)
    }
}

/// Read and parse a job file
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        context: path.display().to_string(),
        source,
    })
}
