//! # PHSP Core
//!
//! Decoding of IAEA phase-space record streams (radiotherapy Monte Carlo
//! transport output).
//!
//! ## Design Principles
//!
//! 1. **Field-by-field decoding** - Explicit little-endian cursor, no memory overlays
//! 2. **Layout chosen per stream** - `Full` or `Short`, never per record
//! 3. **Best effort** - A short read ends the stream, it is not an error
//! 4. **No retention** - Records are decoded, consumed and dropped one at a time
//!
//! ## Example
//!
//! ```rust,ignore
//! use phsp_core::{PhaseSpaceReader, RecordLayout};
//!
//! let reader = PhaseSpaceReader::open("Varian_TrueBeam6MV_01.IAEAphsp", RecordLayout::Short)?;
//! for particle in reader {
//!     println!("{:?} {} MeV", particle.species, particle.energy);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod record;

pub use config::{
    ConsumerKind, DecodeConfig, DumpConfig, FieldConfig, JawConfig, PhspConfig, RunConfig,
    SpectrumConfig, VoxelConfig,
};
pub use decoder::{decode_all, decode_record, PhaseSpaceReader, RecordCursor, RecordLayout, StreamEnd};
pub use encoder::{RawRecord, RecordEncoder};
pub use error::{PhspError, PhspResult};
pub use record::{reconstruct_direction, Direction, ParticleRecord, Species, Trailer};
