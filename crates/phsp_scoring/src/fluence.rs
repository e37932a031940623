//! # Field Fluence
//!
//! Fraction of a fixed record budget that projects onto a square field at a
//! fixed plane. The denominator is the nominal budget, not the number of
//! records actually read, so an early end of stream lowers the ratio.

use phsp_core::{FieldConfig, ParticleRecord};

use crate::consumer::ParticleConsumer;

/// Budget-bounded field-fluence counter.
#[derive(Clone, Debug)]
pub struct FieldFluence {
    half_size: f32,
    plane_z: f32,
    budget: u64,
    seen: u64,
    in_field: u64,
}

impl FieldFluence {
    /// Counter for a square field centered on the beam axis.
    #[must_use]
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            half_size: config.half_size,
            plane_z: config.plane_z,
            budget: config.budget,
            seen: 0,
            in_field: 0,
        }
    }

    /// Adds one record; ignored once the budget is spent.
    pub fn record(&mut self, p: &ParticleRecord) {
        if self.seen >= self.budget {
            return;
        }
        self.seen += 1;
        if self.projects_into_field(p) {
            self.in_field += 1;
        }
    }

    /// True when the record's ray crosses the plane inside the field.
    #[must_use]
    pub fn projects_into_field(&self, p: &ParticleRecord) -> bool {
        if p.w == 0.0 {
            return false;
        }
        let t = (self.plane_z - p.z) / p.w;
        let x = p.x + p.u * t;
        let y = p.y + p.v * t;
        x.abs() <= self.half_size && y.abs() <= self.half_size
    }

    /// Records that landed in the field.
    #[must_use]
    pub const fn count_in_field(&self) -> u64 {
        self.in_field
    }

    /// Records counted against the budget.
    #[must_use]
    pub const fn seen(&self) -> u64 {
        self.seen
    }

    /// Nominal record budget.
    #[must_use]
    pub const fn budget(&self) -> u64 {
        self.budget
    }

    /// `count_in_field / budget`.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.budget == 0 {
            return 0.0;
        }
        self.in_field as f64 / self.budget as f64
    }
}

impl ParticleConsumer for FieldFluence {
    fn on_particle(&mut self, record: &ParticleRecord) {
        self.record(record);
    }

    fn name(&self) -> &'static str {
        "fluence"
    }

    fn is_saturated(&self) -> bool {
        self.seen >= self.budget
    }
}
