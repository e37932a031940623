//! # Jaw Collimator Masking
//!
//! Accept/reject test for photons against a rectangular aperture at a fixed
//! longitudinal plane. Only forward-moving photons are eligible; the ray is
//! projected to the jaw plane and must land inside the opening.

use phsp_core::{ParticleRecord, PhspError, PhspResult};

/// Outcome of a masking test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskDecision {
    /// Passes through the aperture.
    Accepted,
    /// Not a photon, or `w <= 0`: never reaches masking.
    Ineligible,
    /// The jaw plane lies behind the particle.
    Behind,
    /// Projected point lies outside the opening.
    Blocked,
}

/// Rectangular collimator opening at plane `z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JawAperture {
    /// Lower x bound (cm).
    pub x_min: f32,
    /// Upper x bound (cm).
    pub x_max: f32,
    /// Lower y bound (cm).
    pub y_min: f32,
    /// Upper y bound (cm).
    pub y_max: f32,
    /// Jaw plane (cm).
    pub z: f32,
}

impl JawAperture {
    /// Creates an aperture.
    ///
    /// # Errors
    ///
    /// Returns [`PhspError::InvalidGeometry`] when a bound pair is inverted
    /// or not a number.
    pub fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32, z: f32) -> PhspResult<Self> {
        let ordered = |lo: f32, hi: f32| lo <= hi;
        if !ordered(x_min, x_max) || !ordered(y_min, y_max) {
            return Err(PhspError::InvalidGeometry(format!(
                "jaw opening [{x_min}, {x_max}] x [{y_min}, {y_max}] is inverted"
            )));
        }
        if z.is_nan() {
            return Err(PhspError::InvalidGeometry("jaw plane is not a number".into()));
        }
        Ok(Self { x_min, x_max, y_min, y_max, z })
    }

    /// Symmetric square opening of half-side `half` centered on the axis.
    ///
    /// # Errors
    ///
    /// As [`JawAperture::new`].
    pub fn square(half: f32, z: f32) -> PhspResult<Self> {
        Self::new(-half, half, -half, half, z)
    }

    /// Classifies a record against the aperture.
    #[must_use]
    pub fn classify(&self, p: &ParticleRecord) -> MaskDecision {
        if !p.is_photon() || !p.moves_forward() {
            return MaskDecision::Ineligible;
        }
        let t = (self.z - p.z) / p.w;
        if t < 0.0 {
            return MaskDecision::Behind;
        }
        let x = p.x + p.u * t;
        let y = p.y + p.v * t;
        if x < self.x_min || x > self.x_max || y < self.y_min || y > self.y_max {
            return MaskDecision::Blocked;
        }
        MaskDecision::Accepted
    }

    /// True when the record passes through the aperture.
    #[inline]
    #[must_use]
    pub fn accepts(&self, p: &ParticleRecord) -> bool {
        self.classify(p) == MaskDecision::Accepted
    }
}
