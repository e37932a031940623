//! # Analysis Run
//!
//! Builds the selected consumers from a [`PhspConfig`], drives one pass over
//! the input and hands back everything the reports need.
//!
//! ```text
//! AnalysisPlan ──► load tables ──► open reader ──► Pipeline::run_reader
//!                                                      │
//!                       AnalysisReport ◄───────────────┘
//! ```

use phsp_core::{ConsumerKind, PhaseSpaceReader, PhspConfig, PhspError, PhspResult, RecordLayout};
use phsp_scoring::{FieldFluence, ParticleConsumer, Pipeline, RunSummary, SpectrumAggregator, VoxelScorer};
use std::io::Write;
use std::path::PathBuf;

use crate::dump::RecordDump;
use crate::tables;

/// What to run.
#[derive(Clone, Debug)]
pub struct AnalysisPlan {
    /// Phase-space file.
    pub input: PathBuf,
    /// Run configuration.
    pub config: PhspConfig,
    /// Consumers to feed; empty means `[run].consumers`.
    pub consumers: Vec<ConsumerKind>,
    /// Voxel list, required by the voxel consumer.
    pub voxels: Option<PathBuf>,
    /// Jaw settings placed in front of the voxels.
    pub jaws: Option<PathBuf>,
}

impl AnalysisPlan {
    /// Plan with the default configuration and no explicit consumers.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            config: PhspConfig::default(),
            consumers: Vec::new(),
            voxels: None,
            jaws: None,
        }
    }

    /// Consumers that will actually run, deduplicated, in selection order.
    #[must_use]
    pub fn selected(&self) -> Vec<ConsumerKind> {
        let source = if self.consumers.is_empty() {
            &self.config.run.consumers
        } else {
            &self.consumers
        };
        let mut kinds = Vec::with_capacity(source.len());
        for kind in source {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }

    /// Record layout of the input.
    #[must_use]
    pub const fn layout(&self) -> RecordLayout {
        self.config.decode.layout
    }
}

/// Results of one pass.
pub struct AnalysisReport {
    /// How the pass ended.
    pub summary: RunSummary,
    /// Records printed by the dump.
    pub dumped: Option<u64>,
    /// Spectra, if selected.
    pub spectrum: Option<SpectrumAggregator>,
    /// Field fluence, if selected.
    pub fluence: Option<FieldFluence>,
    /// Voxel scores, if selected.
    pub voxels: Option<VoxelScorer>,
}

/// Runs `plan`, dumping records (if selected) to `dump_out`.
///
/// # Errors
///
/// Invalid configuration, a missing or malformed table, or an unopenable
/// input. A failed dump write only stops the dump.
pub fn run<W: Write>(plan: &AnalysisPlan, dump_out: W) -> PhspResult<AnalysisReport> {
    plan.config.validate()?;
    let kinds = plan.selected();
    if kinds.is_empty() {
        return Err(PhspError::InvalidConfig("no consumer selected".into()));
    }

    let mut voxels = if kinds.contains(&ConsumerKind::Voxel) {
        let path = plan
            .voxels
            .as_ref()
            .ok_or_else(|| PhspError::InvalidConfig("voxel scoring needs a voxel table".into()))?;
        let mut scorer = VoxelScorer::new(tables::load_voxels(path)?, &plan.config.voxel);
        if let Some(jaws) = &plan.jaws {
            scorer = scorer.with_jaw(tables::load_jaw(jaws, &plan.config.jaw)?);
        }
        Some(scorer)
    } else {
        None
    };
    let mut spectrum = kinds
        .contains(&ConsumerKind::Spectrum)
        .then(|| SpectrumAggregator::new(&plan.config.spectrum));
    let mut fluence = kinds
        .contains(&ConsumerKind::Fluence)
        .then(|| FieldFluence::new(&plan.config.field));
    let mut dump = kinds
        .contains(&ConsumerKind::Dump)
        .then(|| RecordDump::from_config(dump_out, &plan.config.dump));

    let mut reader = PhaseSpaceReader::open(&plan.input, plan.layout())?;
    tracing::info!(
        input = %plan.input.display(),
        layout = ?plan.layout(),
        consumers = ?kinds,
        "starting pass"
    );

    let summary = {
        let mut consumers: Vec<&mut dyn ParticleConsumer> = Vec::with_capacity(kinds.len());
        if let Some(d) = dump.as_mut() {
            consumers.push(d);
        }
        if let Some(s) = spectrum.as_mut() {
            consumers.push(s);
        }
        if let Some(f) = fluence.as_mut() {
            consumers.push(f);
        }
        if let Some(v) = voxels.as_mut() {
            consumers.push(v);
        }
        Pipeline::run_reader(&mut reader, &mut consumers, plan.config.run.record_budget())
    };

    let dumped = dump.map(|d| {
        let written = d.written();
        if let Err(e) = d.finish() {
            tracing::warn!(error = %e, written, "record dump incomplete");
        }
        written
    });

    Ok(AnalysisReport {
        summary,
        dumped,
        spectrum,
        fluence,
        voxels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_falls_back_to_config() {
        let mut plan = AnalysisPlan::new("beam.IAEAphsp");
        assert_eq!(plan.selected(), vec![ConsumerKind::Spectrum]);

        plan.consumers = vec![ConsumerKind::Fluence, ConsumerKind::Dump, ConsumerKind::Fluence];
        assert_eq!(plan.selected(), vec![ConsumerKind::Fluence, ConsumerKind::Dump]);
    }

    #[test]
    fn test_voxel_without_table_is_invalid() {
        let mut plan = AnalysisPlan::new("beam.IAEAphsp");
        plan.consumers = vec![ConsumerKind::Voxel];
        assert!(matches!(run(&plan, Vec::new()), Err(PhspError::InvalidConfig(_))));
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let plan = AnalysisPlan::new(std::env::temp_dir().join("phsp_no_such_input.IAEAphsp"));
        let err = run(&plan, Vec::new()).err().unwrap();
        assert!(matches!(err, PhspError::InputUnavailable { .. }));
        assert!(err.is_fatal());
    }
}
