//! # Record Dump
//!
//! Prints the first records of a stream for inspection.

use phsp_core::{DumpConfig, ParticleRecord};
use phsp_scoring::ParticleConsumer;
use std::io::{self, Write};

/// Consumer that writes the first `limit` records and then saturates.
pub struct RecordDump<W: Write> {
    out: W,
    limit: u64,
    written: u64,
    error: Option<io::Error>,
}

impl<W: Write> RecordDump<W> {
    /// Dumps at most `limit` records to `out`.
    pub const fn new(out: W, limit: u64) -> Self {
        Self {
            out,
            limit,
            written: 0,
            error: None,
        }
    }

    /// Dump sized from configuration.
    pub const fn from_config(out: W, config: &DumpConfig) -> Self {
        Self::new(out, config.count)
    }

    /// Records written so far.
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and returns the writer.
    ///
    /// # Errors
    ///
    /// The first write failure, which also stopped the dump.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_record(&mut self, p: &ParticleRecord) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "Particle {}:", self.written + 1)?;
        writeln!(out, "  Position: ({}, {}, {}) cm", p.x, p.y, p.z)?;
        writeln!(out, "  Direction: ({}, {}, {})", p.u, p.v, p.w)?;
        writeln!(out, "  Energy: {} MeV", p.energy)?;
        writeln!(out, "  Type: {} ({})", p.species.code(), p.species.label())?;
        if let Some(trailer) = p.trailer {
            writeln!(out, "  Weight: {}", p.weight)?;
            writeln!(out, "  Trailer: sign_of_w={} new_history={}", trailer.sign_of_w, trailer.new_history)?;
        }
        writeln!(out, "  New history: {}", if p.is_new_history { "Yes" } else { "No" })?;
        writeln!(out)
    }
}

impl<W: Write> ParticleConsumer for RecordDump<W> {
    fn on_particle(&mut self, record: &ParticleRecord) {
        if self.is_saturated() {
            return;
        }
        match self.write_record(record) {
            Ok(()) => self.written += 1,
            Err(e) => {
                tracing::warn!(error = %e, written = self.written, "record dump stopped");
                self.error = Some(e);
            }
        }
    }

    fn name(&self) -> &'static str {
        "dump"
    }

    fn is_saturated(&self) -> bool {
        self.written >= self.limit || self.error.is_some()
    }
}
