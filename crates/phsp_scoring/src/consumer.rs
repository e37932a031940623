//! # Consumers & Pipeline
//!
//! One decode loop feeds any number of consumers in a single pass.
//!
//! ```text
//! PhaseSpaceReader ──► record ──┬──► SpectrumAggregator
//!        ▲                      ├──► FieldFluence
//!        │                      └──► VoxelScorer (jaw mask first)
//!        └──── next record ◄────┘
//! ```
//!
//! The loop stops at end of stream, when the record budget is spent, or when
//! every consumer reports it is saturated.

use phsp_core::{ParticleRecord, PhaseSpaceReader, StreamEnd};
use std::io::Read;

/// Anything that accumulates decoded records.
pub trait ParticleConsumer {
    /// Consumes one record.
    fn on_particle(&mut self, record: &ParticleRecord);

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// True once further records cannot change the result.
    fn is_saturated(&self) -> bool {
        false
    }
}

/// Why a pipeline pass stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunEnd {
    /// The source ran dry.
    Stream(StreamEnd),
    /// The source ran dry; no end reason is known (plain iterators).
    Exhausted,
    /// The record budget was spent.
    BudgetReached,
    /// Every consumer was saturated.
    ConsumersSaturated,
}

/// Outcome of one pipeline pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Records decoded and fed to the consumers.
    pub records: u64,
    /// Budget the pass ran under.
    pub budget: Option<u64>,
    /// Why the pass stopped.
    pub end: RunEnd,
}

/// The shared decode-and-accumulate driver.
pub struct Pipeline;

impl Pipeline {
    /// Feeds records from `source` to every consumer, in order.
    pub fn run<I>(source: I, consumers: &mut [&mut dyn ParticleConsumer], budget: Option<u64>) -> RunSummary
    where
        I: IntoIterator<Item = ParticleRecord>,
    {
        let mut records = 0u64;
        let mut source = source.into_iter();

        let end = loop {
            if budget.is_some_and(|b| records >= b) {
                break RunEnd::BudgetReached;
            }
            if !consumers.is_empty() && consumers.iter().all(|c| c.is_saturated()) {
                break RunEnd::ConsumersSaturated;
            }
            let Some(record) = source.next() else {
                break RunEnd::Exhausted;
            };
            for consumer in consumers.iter_mut() {
                consumer.on_particle(&record);
            }
            records += 1;
        };

        tracing::debug!(records, ?budget, ?end, "pipeline pass finished");
        RunSummary { records, budget, end }
    }

    /// Runs over a reader and reports the reader's own end reason.
    pub fn run_reader<R: Read>(
        reader: &mut PhaseSpaceReader<R>,
        consumers: &mut [&mut dyn ParticleConsumer],
        budget: Option<u64>,
    ) -> RunSummary {
        let mut summary = Self::run(reader.by_ref(), consumers, budget);
        if summary.end == RunEnd::Exhausted {
            if let Some(end) = reader.end() {
                summary.end = RunEnd::Stream(end);
            }
        }
        let names: Vec<&str> = consumers.iter().map(|c| c.name()).collect();
        tracing::info!(
            records = summary.records,
            degenerate = reader.degenerate_directions(),
            consumers = ?names,
            end = ?summary.end,
            "phase-space pass complete"
        );
        summary
    }
}
