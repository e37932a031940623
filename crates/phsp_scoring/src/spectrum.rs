//! # Energy Spectra
//!
//! Per-species running sums and fixed-width energy histograms.
//!
//! Bin index is `floor((E - E_min) / width)` with the single-precision width
//! widened to double for the division; indices outside `[0, bins)` and
//! energies outside `[E_min, E_max)` are discarded, never clipped into the
//! edge bins. Discarded energies still count towards the species average.

use phsp_core::{ParticleRecord, Species, SpectrumConfig};

use crate::consumer::ParticleConsumer;

/// Fixed-width energy histogram.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    energy_min: f32,
    energy_max: f32,
    bin_width: f32,
    bins: Vec<u64>,
}

impl Histogram {
    /// Empty histogram with the configured binning.
    #[must_use]
    pub fn new(config: &SpectrumConfig) -> Self {
        Self {
            energy_min: config.energy_min,
            energy_max: config.energy_max,
            bin_width: config.bin_width,
            bins: vec![0; config.bin_count],
        }
    }

    /// Bin for `energy`, `None` when it falls outside the histogram.
    #[must_use]
    pub fn bin_index(&self, energy: f32) -> Option<usize> {
        if energy.is_nan() || energy < self.energy_min || energy >= self.energy_max {
            return None;
        }
        let index = (f64::from(energy - self.energy_min) / f64::from(self.bin_width)).floor();
        if index >= 0.0 && index < self.bins.len() as f64 {
            Some(index as usize)
        } else {
            None
        }
    }

    /// Counts `energy`; returns false if it was discarded.
    pub fn record(&mut self, energy: f32) -> bool {
        match self.bin_index(energy) {
            Some(i) => {
                self.bins[i] += 1;
                true
            }
            None => false,
        }
    }

    /// Bin counts in energy order.
    #[must_use]
    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    /// Sum over all bins.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().sum()
    }

    /// Bin width (MeV).
    #[must_use]
    pub const fn bin_width(&self) -> f32 {
        self.bin_width
    }

    /// Lower edge of bin `index` (MeV).
    #[must_use]
    pub fn lower_edge(&self, index: usize) -> f64 {
        f64::from(self.energy_min) + index as f64 * f64::from(self.bin_width)
    }

    /// `(lower edge, count)` pairs in energy order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.bins.iter().enumerate().map(|(i, &n)| (self.lower_edge(i), n))
    }
}

/// Running statistics of one species.
#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesTally {
    /// Species tallied.
    pub species: Species,
    /// Records seen, binned or not.
    pub count: u64,
    /// Sum of energies (MeV).
    pub energy_sum: f64,
    /// Energy histogram.
    pub histogram: Histogram,
}

impl SpeciesTally {
    fn new(species: Species, config: &SpectrumConfig) -> Self {
        Self {
            species,
            count: 0,
            energy_sum: 0.0,
            histogram: Histogram::new(config),
        }
    }

    /// Mean energy over every record of the species (MeV).
    #[must_use]
    pub fn mean_energy(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.energy_sum / self.count as f64)
        } else {
            None
        }
    }
}

/// Per-species spectra over the whole stream.
#[derive(Clone, Debug)]
pub struct SpectrumAggregator {
    tallies: [SpeciesTally; 3],
    total: u64,
    other: u64,
    new_histories: u64,
}

impl SpectrumAggregator {
    /// Empty aggregator for photons, electrons and positrons.
    #[must_use]
    pub fn new(config: &SpectrumConfig) -> Self {
        Self {
            tallies: Species::TRACKED.map(|s| SpeciesTally::new(s, config)),
            total: 0,
            other: 0,
            new_histories: 0,
        }
    }

    /// Adds one record.
    pub fn record(&mut self, p: &ParticleRecord) {
        self.total += 1;
        if p.is_new_history {
            self.new_histories += 1;
        }
        match p.species.tracked_index() {
            Some(i) => {
                let tally = &mut self.tallies[i];
                tally.histogram.record(p.energy);
                tally.energy_sum += f64::from(p.energy);
                tally.count += 1;
            }
            None => self.other += 1,
        }
    }

    /// Tally of a tracked species, `None` for [`Species::Other`].
    #[must_use]
    pub fn tally(&self, species: Species) -> Option<&SpeciesTally> {
        species.tracked_index().map(|i| &self.tallies[i])
    }

    /// Tallies of every tracked species.
    #[must_use]
    pub fn tallies(&self) -> &[SpeciesTally] {
        &self.tallies
    }

    /// Every record seen.
    #[must_use]
    pub const fn total_records(&self) -> u64 {
        self.total
    }

    /// Records of untracked species.
    #[must_use]
    pub const fn other_records(&self) -> u64 {
        self.other
    }

    /// Records that started a new history.
    #[must_use]
    pub const fn new_histories(&self) -> u64 {
        self.new_histories
    }
}

impl ParticleConsumer for SpectrumAggregator {
    fn on_particle(&mut self, record: &ParticleRecord) {
        self.record(record);
    }

    fn name(&self) -> &'static str {
        "spectrum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(species: Species, energy: f32) -> ParticleRecord {
        ParticleRecord::new(species, energy, [0.0; 3], [0.0, 0.0, 1.0])
    }

    #[test]
    fn test_reference_bin_indices() {
        let h = Histogram::new(&SpectrumConfig::default());
        assert_eq!(h.bin_index(2.0), Some(19));
        assert_eq!(h.bin_index(1.0), Some(9));
        assert_eq!(h.bin_index(0.0), Some(0));
        assert_eq!(h.bin_index(0.05), Some(0));
        assert_eq!(h.bin_index(9.99), Some(99));
        assert_eq!(h.bin_index(10.0), None);
        assert_eq!(h.bin_index(25.0), None);
        assert_eq!(h.bin_index(f32::NAN), None);
    }

    #[test]
    fn test_out_of_range_counts_in_average_only() {
        let mut agg = SpectrumAggregator::new(&SpectrumConfig::default());
        agg.record(&particle(Species::Photon, 4.0));
        agg.record(&particle(Species::Photon, 12.0));

        let photons = agg.tally(Species::Photon).unwrap();
        assert_eq!(photons.count, 2);
        assert_eq!(photons.histogram.total(), 1);
        assert_eq!(photons.mean_energy(), Some(8.0));
    }

    #[test]
    fn test_other_species_counted_in_total() {
        let mut agg = SpectrumAggregator::new(&SpectrumConfig::default());
        agg.record(&particle(Species::Other(4), 1.0).with_new_history(true));
        agg.record(&particle(Species::Positron, 0.511));

        assert_eq!(agg.total_records(), 2);
        assert_eq!(agg.other_records(), 1);
        assert_eq!(agg.new_histories(), 1);
        assert!(agg.tally(Species::Other(4)).is_none());
        assert_eq!(agg.tally(Species::Positron).unwrap().count, 1);
        assert_eq!(agg.tally(Species::Electron).unwrap().mean_energy(), None);
    }

    #[test]
    fn test_lower_edges() {
        let h = Histogram::new(&SpectrumConfig::default());
        let edges: Vec<f64> = h.iter().map(|(e, _)| e).collect();
        assert_eq!(edges.len(), 100);
        assert_eq!(edges[0], 0.0);
        assert!((edges[99] - 9.9).abs() < 1e-5);
    }

    #[test]
    fn test_custom_binning() {
        let config = SpectrumConfig {
            energy_min: 1.0,
            energy_max: 2.0,
            bin_width: 0.5,
            bin_count: 2,
        };
        let mut h = Histogram::new(&config);
        assert!(!h.record(0.5));
        assert!(h.record(1.2));
        assert!(h.record(1.7));
        assert!(!h.record(2.0));
        assert_eq!(h.bins(), &[1, 1]);
    }
}
