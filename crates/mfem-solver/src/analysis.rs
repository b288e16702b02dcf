//! Analysis pipeline definitions and execution framework.
//!
//! A pipeline runs one analysis end to end and returns a serializable report:
//! modal analysis of a cantilever (frequencies plus tip readouts) or a static
//! diffusion solve (field extrema).

use serde::Serialize;
use tracing::info;

use crate::backend::{NativeBackend, SolverConfig};
use crate::dof::Physics;
use crate::elements::{MechanicalModel, StructuralElement};
use crate::error::{FemError, Result};
use crate::mesh::MeshStatistics;
use crate::modal_solver::CantileverFem;
use crate::postprocess::{FieldStatistics, ModeSummary, modal_readouts};
use crate::static_solver::{DiffusionDomain, DiffusionFem};
use crate::topology::Cantilever;

/// Analysis type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Undamped free vibration of a clamped cantilever
    Modal,
    /// Steady diffusion with a fixed edge
    Static,
}

/// Analysis configuration and control
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Type of analysis to perform
    pub analysis_type: AnalysisType,
    /// Number of modes to extract (modal only)
    pub num_modes: usize,
    /// Eigensolver settings (modal only)
    pub solver: SolverConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analysis_type: AnalysisType::Modal,
            num_modes: 3,
            solver: SolverConfig::default(),
        }
    }
}

/// Report of a modal analysis
#[derive(Debug, Clone, Serialize)]
pub struct ModalReport {
    pub analysis_type: AnalysisType,
    pub physics: Physics,
    pub mesh: MeshStatistics,
    pub num_dofs: usize,
    pub num_free_dofs: usize,
    pub modes: Vec<ModeSummary>,
}

impl ModalReport {
    /// Format as a human-readable table
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("Analysis: {:?} ({:?})", self.analysis_type, self.physics),
            self.mesh.format(),
            format!("DOFs: {} ({} free)", self.num_dofs, self.num_free_dofs),
        ];
        if self.modes.is_empty() {
            lines.push("No modes computed".to_string());
            return lines.join("\n");
        }

        lines.push(format!(
            "{:>4}  {:>14}  {:>12}  {:>14}  {:>12}  {:>10}",
            "Mode", "Frequency [Hz]", "Tip w", "Stiffness [N/m]", "Charge [C/m]", "Kind"
        ));
        for m in &self.modes {
            let scientific =
                |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.4e}"));
            lines.push(format!(
                "{:>4}  {:>14.2}  {:>12.4e}  {:>14}  {:>12}  {:>10}",
                m.mode,
                m.frequency_hz,
                m.tip_displacement,
                scientific(m.modal_stiffness),
                scientific(m.charge),
                m.kind
            ));
        }
        lines.join("\n")
    }
}

/// Report of a static diffusion analysis
#[derive(Debug, Clone, Serialize)]
pub struct StaticReport {
    pub analysis_type: AnalysisType,
    pub mesh: MeshStatistics,
    pub num_dofs: usize,
    pub num_free_dofs: usize,
    pub field: Option<FieldStatistics>,
    pub residual_norm: Option<f64>,
}

impl StaticReport {
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("Analysis: {:?}", self.analysis_type),
            self.mesh.format(),
            format!("DOFs: {} ({} free)", self.num_dofs, self.num_free_dofs),
        ];
        match &self.field {
            Some(f) => {
                lines.push(format!("Minimum: {:.6e}", f.min));
                lines.push(format!("Maximum: {:.6e}", f.max));
                lines.push(format!("Mean:    {:.6e}", f.mean));
            }
            None => lines.push("Empty domain".to_string()),
        }
        if let Some(r) = self.residual_norm {
            lines.push(format!("Residual: {r:.3e}"));
        }
        lines.join("\n")
    }
}

/// Main analysis pipeline orchestrator
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    /// Create a new analysis pipeline with the given configuration
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline for modal analysis of `num_modes` modes
    pub fn modal(num_modes: usize) -> Self {
        Self::new(AnalysisConfig {
            analysis_type: AnalysisType::Modal,
            num_modes,
            ..Default::default()
        })
    }

    /// Create a pipeline for static diffusion analysis
    pub fn static_diffusion() -> Self {
        Self::new(AnalysisConfig {
            analysis_type: AnalysisType::Static,
            num_modes: 0,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run a modal analysis and compute tip readouts
    pub fn run_modal(
        &self,
        cantilever: Cantilever,
        model: impl Into<MechanicalModel>,
    ) -> Result<ModalReport> {
        self.ensure(AnalysisType::Modal)?;
        let model = model.into();
        let physics = model.physics();
        let fem = CantileverFem::new(cantilever, model);
        let backend = NativeBackend::new(self.config.solver);
        let results = fem.modal_analysis_with(self.config.num_modes, &backend)?;
        let modes = modal_readouts(&fem, &results)?;

        Ok(ModalReport {
            analysis_type: AnalysisType::Modal,
            physics,
            mesh: fem.mesh().statistics(),
            num_dofs: fem.dof().n_dofs(),
            num_free_dofs: fem.dof().free_dofs().len(),
            modes,
        })
    }

    /// Run a static diffusion analysis
    pub fn run_static(&self, domain: DiffusionDomain) -> Result<StaticReport> {
        self.ensure(AnalysisType::Static)?;
        let fem = DiffusionFem::new(domain)?;
        let solution = fem.solve()?;
        info!(nodes = solution.values.len(), "static analysis complete");

        Ok(StaticReport {
            analysis_type: AnalysisType::Static,
            mesh: fem.mesh().statistics(),
            num_dofs: fem.dof().n_dofs(),
            num_free_dofs: fem.dof().free_dofs().len(),
            field: solution.statistics(),
            residual_norm: solution.info.residual_norm,
        })
    }

    fn ensure(&self, analysis_type: AnalysisType) -> Result<()> {
        if self.config.analysis_type != analysis_type {
            return Err(FemError::UnsupportedAnalysis(format!(
                "pipeline is configured for {:?}, not {:?}",
                self.config.analysis_type, analysis_type
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::PlateMaterial;
    use crate::topology::{ElementField, Topology};

    #[test]
    fn default_config_is_modal() {
        let config = AnalysisConfig::default();
        assert_eq!(config.analysis_type, AnalysisType::Modal);
        assert_eq!(config.solver, SolverConfig::default());
    }

    #[test]
    fn modal_pipeline_reports_modes() {
        let cantilever = Cantilever::new(Topology::filled(8, 4), 5.0, 5.0, 40.0, 35.0).unwrap();
        let report = AnalysisPipeline::modal(2)
            .run_modal(cantilever, PlateMaterial::soi_mumps())
            .unwrap();
        assert_eq!(report.modes.len(), 2);
        assert_eq!(report.physics, Physics::Plate);
        assert!(report.modes.iter().all(|m| m.charge.is_none()));
        assert!(report.format().contains("Frequency [Hz]"));
    }

    #[test]
    fn static_pipeline_rejects_modal_job() {
        let cantilever = Cantilever::new(Topology::filled(2, 2), 5.0, 5.0, 5.0, 5.0).unwrap();
        let result =
            AnalysisPipeline::static_diffusion().run_modal(cantilever, PlateMaterial::soi_mumps());
        assert!(matches!(result, Err(FemError::UnsupportedAnalysis(_))));
    }

    #[test]
    fn static_pipeline_reports_field() {
        let domain = DiffusionDomain::new(
            Topology::filled(3, 3),
            ElementField::uniform(3, 3, 1.0),
            ElementField::uniform(3, 3, 1e-3),
            5.0,
            5.0,
        )
        .unwrap();
        let report = AnalysisPipeline::static_diffusion().run_static(domain).unwrap();
        let field = report.field.unwrap();
        assert!(field.max > 0.0);
        assert!(report.format().contains("Maximum"));
    }
}
