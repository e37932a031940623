//! # PHSP Scoring
//!
//! Accumulators fed by one decode pass over a phase-space stream.
//!
//! ## Components
//!
//! - [`SpectrumAggregator`] - per-species energy histograms and averages
//! - [`FieldFluence`] - fraction of a record budget landing in a square field
//! - [`VoxelScorer`] - ray-projection attenuation scoring behind optional jaws
//!
//! ## Example
//!
//! ```rust,ignore
//! use phsp_core::{FieldConfig, PhaseSpaceReader, RecordLayout, SpectrumConfig};
//! use phsp_scoring::{FieldFluence, Pipeline, SpectrumAggregator};
//!
//! let mut reader = PhaseSpaceReader::open("beam.IAEAphsp", RecordLayout::Short)?;
//! let mut spectrum = SpectrumAggregator::new(&SpectrumConfig::default());
//! let mut field = FieldFluence::new(&FieldConfig::default());
//! let summary = Pipeline::run_reader(&mut reader, &mut [&mut spectrum, &mut field], None);
//! println!("{} records, field ratio {:.4}", summary.records, field.ratio());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod consumer;
pub mod fluence;
pub mod masking;
pub mod spectrum;
pub mod voxel;

pub use consumer::{ParticleConsumer, Pipeline, RunEnd, RunSummary};
pub use fluence::FieldFluence;
pub use masking::{JawAperture, MaskDecision};
pub use spectrum::{Histogram, SpeciesTally, SpectrumAggregator};
pub use voxel::{AttenuationModel, Voxel, VoxelScorer, VoxelStats};
