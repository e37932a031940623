//! # PHSP
//!
//! Front end for phase-space analysis: geometry tables, the record dump,
//! reports and the single-pass run used by `phsp_analyzer`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use phsp::{analysis, report, AnalysisPlan};
//! use phsp_core::ConsumerKind;
//!
//! let mut plan = AnalysisPlan::new("Varian_TrueBeam6MV_01.IAEAphsp");
//! plan.consumers = vec![ConsumerKind::Spectrum, ConsumerKind::Fluence];
//! let result = analysis::run(&plan, std::io::stdout())?;
//! if let Some(spectrum) = &result.spectrum {
//!     report::save_histograms("out".as_ref(), spectrum)?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod analysis;
pub mod dump;
pub mod report;
pub mod tables;

pub use analysis::{AnalysisPlan, AnalysisReport};
pub use dump::RecordDump;
