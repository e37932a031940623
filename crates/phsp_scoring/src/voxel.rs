//! # Voxel Accumulator
//!
//! Ray-projection scoring of photons into independent voxels.
//!
//! For every photon that survives masking, each voxel is tested on its own:
//!
//! ```text
//! t      = (voxel.z - z) / w
//! x_proj = x + u·t,  y_proj = y + v·t
//! hit   <=> |x_proj - voxel.x| <= h  and  |y_proj - voxel.y| <= h
//!           and  |voxel.z - voxel.z| <= h        (always true, kept literally)
//! ```
//!
//! with `h` half the voxel edge. A hit adds `wgt = exp(-μ(E)·d)` to the
//! voxel's fluence and `E·wgt` to its energy sum, `d` being the distance from
//! the particle to the voxel center. One photon may hit many voxels.
//!
//! Geometry is evaluated in double precision from the single-precision
//! record fields.

use phsp_core::{ParticleRecord, VoxelConfig};

use crate::consumer::ParticleConsumer;
use crate::masking::{JawAperture, MaskDecision};

/// Empirical attenuation coefficient `μ(E) = constant + inverse_energy / E`.
///
/// Empirical placeholder model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttenuationModel {
    /// Energy-independent term (1/cm).
    pub constant: f64,
    /// Coefficient of `1/E` (MeV/cm).
    pub inverse_energy: f64,
}

impl AttenuationModel {
    /// `μ(E) = 0.07 + 0.1/E`.
    pub const REFERENCE: Self = Self {
        constant: 0.07,
        inverse_energy: 0.1,
    };

    /// Model from configuration.
    #[must_use]
    pub const fn from_config(config: &VoxelConfig) -> Self {
        Self {
            constant: config.mu_constant,
            inverse_energy: config.mu_inverse_energy,
        }
    }

    /// Attenuation coefficient at `energy` MeV (1/cm).
    #[inline]
    #[must_use]
    pub fn mu(&self, energy: f64) -> f64 {
        self.constant + self.inverse_energy / energy
    }

    /// Attenuation weight over `distance` cm.
    #[inline]
    #[must_use]
    pub fn weight(&self, energy: f64, distance: f64) -> f64 {
        (-self.mu(energy) * distance).exp()
    }
}

impl Default for AttenuationModel {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// A scoring cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voxel {
    /// Center x (cm).
    pub x: f64,
    /// Center y (cm).
    pub y: f64,
    /// Center z (cm).
    pub z: f64,
    /// Photons that hit this voxel.
    pub count: u64,
    /// Sum of attenuation weights.
    pub fluence: f64,
    /// Sum of energy times attenuation weight (MeV).
    pub energy_sum: f64,
}

impl Voxel {
    /// Empty voxel centered at `(x, y, z)`.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            count: 0,
            fluence: 0.0,
            energy_sum: 0.0,
        }
    }

    /// Attenuation-weighted mean energy, `energy_sum / fluence`.
    ///
    /// Divides by the fluence, not by the hit count. `None` before the
    /// first hit, and also when every hit's weight underflowed to zero.
    #[must_use]
    pub fn mean_energy(&self) -> Option<f64> {
        if self.count > 0 && self.fluence > 0.0 {
            Some(self.energy_sum / self.fluence)
        } else {
            None
        }
    }
}

/// Counters kept by the scorer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoxelStats {
    /// Records offered to the scorer.
    pub records: u64,
    /// Records that were not forward-moving photons.
    pub ineligible: u64,
    /// Photons stopped by the jaws (plane behind or outside the opening).
    pub rejected_by_jaw: u64,
    /// Photons that hit at least one voxel.
    pub photons_hit: u64,
    /// Total voxel hits.
    pub hits: u64,
    /// Hits dropped because the weight was not finite.
    pub non_finite: u64,
}

#[inline]
fn within(value: f64, center: f64, half: f64) -> bool {
    (value - center).abs() <= half
}

/// Scores photons into a fixed voxel set, optionally behind a jaw aperture.
pub struct VoxelScorer {
    voxels: Vec<Voxel>,
    half: f64,
    model: AttenuationModel,
    jaw: Option<JawAperture>,
    stats: VoxelStats,
}

impl VoxelScorer {
    /// Creates a scorer over `voxels` with an open field.
    #[must_use]
    pub fn new(voxels: Vec<Voxel>, config: &VoxelConfig) -> Self {
        Self {
            voxels,
            half: config.size / 2.0,
            model: AttenuationModel::from_config(config),
            jaw: None,
            stats: VoxelStats::default(),
        }
    }

    /// Places a jaw aperture in front of the voxels.
    #[must_use]
    pub fn with_jaw(mut self, jaw: JawAperture) -> Self {
        self.jaw = Some(jaw);
        self
    }

    /// The voxels, in load order.
    #[must_use]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Consumes the scorer, returning its voxels.
    #[must_use]
    pub fn into_voxels(self) -> Vec<Voxel> {
        self.voxels
    }

    /// Scorer counters.
    #[must_use]
    pub const fn stats(&self) -> &VoxelStats {
        &self.stats
    }

    /// Scores one record, returning the number of voxels it hit.
    pub fn score(&mut self, p: &ParticleRecord) -> usize {
        self.stats.records += 1;

        if !p.is_photon() || !p.moves_forward() {
            self.stats.ineligible += 1;
            return 0;
        }
        if let Some(jaw) = &self.jaw {
            match jaw.classify(p) {
                MaskDecision::Accepted => {}
                MaskDecision::Ineligible => {
                    self.stats.ineligible += 1;
                    return 0;
                }
                MaskDecision::Behind | MaskDecision::Blocked => {
                    self.stats.rejected_by_jaw += 1;
                    return 0;
                }
            }
        }

        let (x, y, z) = (f64::from(p.x), f64::from(p.y), f64::from(p.z));
        let (u, v, w) = (f64::from(p.u), f64::from(p.v), f64::from(p.w));
        let energy = f64::from(p.energy);
        let mut hits = 0;

        for voxel in &mut self.voxels {
            let t = (voxel.z - z) / w;
            let x_proj = x + u * t;
            let y_proj = y + v * t;
            if !(within(x_proj, voxel.x, self.half)
                && within(y_proj, voxel.y, self.half)
                && within(voxel.z, voxel.z, self.half))
            {
                continue;
            }

            let d = ((voxel.x - x).powi(2) + (voxel.y - y).powi(2) + (voxel.z - z).powi(2)).sqrt();
            let wgt = self.model.weight(energy, d);
            if !wgt.is_finite() {
                self.stats.non_finite += 1;
                continue;
            }
            voxel.fluence += wgt;
            voxel.energy_sum += energy * wgt;
            voxel.count += 1;
            hits += 1;
        }

        if hits > 0 {
            self.stats.photons_hit += 1;
            self.stats.hits += hits as u64;
        }
        hits
    }
}

impl ParticleConsumer for VoxelScorer {
    fn on_particle(&mut self, record: &ParticleRecord) {
        self.score(record);
    }

    fn name(&self) -> &'static str {
        "voxel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phsp_core::Species;

    fn photon(energy: f32, pos: [f32; 3], dir: [f32; 3]) -> ParticleRecord {
        ParticleRecord::new(Species::Photon, energy, pos, dir)
    }

    fn scorer(voxels: Vec<Voxel>) -> VoxelScorer {
        VoxelScorer::new(voxels, &VoxelConfig::default())
    }

    #[test]
    fn test_reference_model() {
        let m = AttenuationModel::REFERENCE;
        assert!((m.mu(2.0) - 0.12).abs() < 1e-12);
        assert!((m.weight(2.0, 10.0) - (-1.2f64).exp()).abs() < 1e-12);
        assert_eq!(AttenuationModel::from_config(&VoxelConfig::default()), m);
    }

    #[test]
    fn test_on_axis_hit() {
        let mut s = scorer(vec![Voxel::new(0.0, 0.0, 10.0)]);
        assert_eq!(s.score(&photon(2.0, [0.0; 3], [0.0, 0.0, 1.0])), 1);

        let v = s.voxels()[0];
        let wgt = (-(0.07 + 0.1 / 2.0) * 10.0f64).exp();
        assert_eq!(v.count, 1);
        assert!((v.fluence - wgt).abs() < 1e-12);
        assert!((v.energy_sum - 2.0 * wgt).abs() < 1e-12);
    }

    #[test]
    fn test_miss_outside_half_voxel() {
        let mut s = scorer(vec![Voxel::new(0.15, 0.0, 10.0)]);
        assert_eq!(s.score(&photon(1.0, [0.0; 3], [0.0, 0.0, 1.0])), 0);
        assert_eq!(s.voxels()[0].count, 0);
        assert_eq!(s.voxels()[0].mean_energy(), None);
    }

    #[test]
    fn test_one_photon_many_voxels() {
        let column: Vec<Voxel> = (1..=5).map(|k| Voxel::new(0.0, 0.0, f64::from(k))).collect();
        let mut s = scorer(column);
        assert_eq!(s.score(&photon(1.0, [0.0; 3], [0.0, 0.0, 1.0])), 5);
        assert!(s.voxels().iter().all(|v| v.count == 1));
        // Deeper voxels see more attenuation.
        assert!(s.voxels()[0].fluence > s.voxels()[4].fluence);
        assert_eq!(s.stats().hits, 5);
        assert_eq!(s.stats().photons_hit, 1);
    }

    #[test]
    fn test_backward_photon_never_scores() {
        let mut s = scorer(vec![Voxel::new(0.0, 0.0, -10.0), Voxel::new(0.0, 0.0, 10.0)]);
        assert_eq!(s.score(&photon(1.0, [0.0; 3], [0.0, 0.0, -1.0])), 0);
        assert!(s.voxels().iter().all(|v| v.count == 0 && v.fluence == 0.0));
        assert_eq!(s.stats().ineligible, 1);
    }

    #[test]
    fn test_underflowed_weight_has_no_mean() {
        // μ(0.001 MeV) ≈ 100/cm, so exp(-μ·10 cm) is zero in double precision.
        let mut s = scorer(vec![Voxel::new(0.0, 0.0, 10.0)]);
        assert_eq!(s.score(&photon(0.001, [0.0; 3], [0.0, 0.0, 1.0])), 1);

        let v = s.voxels()[0];
        assert_eq!(v.count, 1);
        assert_eq!(v.fluence, 0.0);
        assert_eq!(v.mean_energy(), None);
        assert_eq!(s.stats().non_finite, 0);
    }

    #[test]
    fn test_jaw_rejection() {
        let jaw = JawAperture::square(5.0, 100.0).unwrap();
        let mut s = scorer(vec![Voxel::new(0.0, 0.0, 10.0)]).with_jaw(jaw);
        // Passes the jaw, hits the voxel.
        assert_eq!(s.score(&photon(1.0, [0.0; 3], [0.0, 0.0, 1.0])), 1);
        // Jaw plane behind the photon.
        assert_eq!(s.score(&photon(1.0, [0.0, 0.0, 150.0], [0.0, 0.0, 1.0])), 0);
        // Outside the opening.
        assert_eq!(s.score(&photon(1.0, [9.0, 0.0, 0.0], [0.0, 0.0, 1.0])), 0);
        assert_eq!(s.stats().rejected_by_jaw, 2);
        assert_eq!(s.voxels()[0].count, 1);
    }

    #[test]
    fn test_mean_energy_divides_by_fluence() {
        let mut s = scorer(vec![Voxel::new(0.0, 0.0, 10.0)]);
        s.score(&photon(1.0, [0.0; 3], [0.0, 0.0, 1.0]));
        s.score(&photon(4.0, [0.0; 3], [0.0, 0.0, 1.0]));

        let v = s.voxels()[0];
        let mean = v.mean_energy().unwrap();
        assert!((mean - v.energy_sum / v.fluence).abs() < 1e-12);
        assert!((mean - v.energy_sum / v.count as f64).abs() > 1e-3);
    }

    #[test]
    fn test_zero_energy_at_voxel_center_is_dropped() {
        let mut s = scorer(vec![Voxel::new(0.0, 0.0, 0.0)]);
        assert_eq!(s.score(&photon(0.0, [0.0; 3], [0.0, 0.0, 1.0])), 0);
        assert_eq!(s.stats().non_finite, 1);
        assert_eq!(s.voxels()[0].count, 0);
    }

    #[test]
    fn test_electrons_ignored() {
        let mut s = scorer(vec![Voxel::new(0.0, 0.0, 10.0)]);
        let e = ParticleRecord::new(Species::Electron, 1.0, [0.0; 3], [0.0, 0.0, 1.0]);
        assert_eq!(s.score(&e), 0);
        assert_eq!(s.stats().ineligible, 1);
    }
}
