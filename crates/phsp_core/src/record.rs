//! # Particle Records
//!
//! One decoded phase-space entry and the species codes of the IAEA format.
//!
//! The third direction cosine `w` is never stored in a phase-space file. It
//! is rebuilt from `u`, `v` and the sign carried by the species byte, see
//! [`reconstruct_direction`].

/// Particle species as encoded in the (absolute value of the) species byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Species {
    /// Code 1.
    Photon,
    /// Code 2.
    Electron,
    /// Code 3.
    Positron,
    /// Any other code (neutrons, protons, unknown), kept verbatim.
    Other(u8),
}

impl Species {
    /// Species that carry their own histogram and running average.
    pub const TRACKED: [Self; 3] = [Self::Photon, Self::Electron, Self::Positron];

    /// Converts from the absolute species code.
    #[inline]
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Photon,
            2 => Self::Electron,
            3 => Self::Positron,
            other => Self::Other(other),
        }
    }

    /// Returns the absolute species code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Photon => 1,
            Self::Electron => 2,
            Self::Positron => 3,
            Self::Other(code) => code,
        }
    }

    /// Lower-case name used in reports and file names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Photon => "photon",
            Self::Electron => "electron",
            Self::Positron => "positron",
            Self::Other(_) => "other",
        }
    }

    /// Index into per-species tables, `None` for untracked species.
    #[inline]
    #[must_use]
    pub const fn tracked_index(self) -> Option<usize> {
        match self {
            Self::Photon => Some(0),
            Self::Electron => Some(1),
            Self::Positron => Some(2),
            Self::Other(_) => None,
        }
    }
}

/// Trailing flag bytes of the full record layout, exactly as stored.
///
/// Informational only: `w` and the new-history flag are always derived
/// from the sign bits, never from these bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Trailer {
    /// Stored sign-of-w flag.
    pub sign_of_w: u8,
    /// Stored new-history flag.
    pub new_history: u8,
}

/// A decoded phase-space particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleRecord {
    /// Particle species.
    pub species: Species,
    /// Kinetic energy in MeV, never negative.
    pub energy: f32,
    /// Position x (cm).
    pub x: f32,
    /// Position y (cm).
    pub y: f32,
    /// Position z (cm).
    pub z: f32,
    /// Direction cosine along x.
    pub u: f32,
    /// Direction cosine along y.
    pub v: f32,
    /// Reconstructed direction cosine along z.
    pub w: f32,
    /// Statistical weight, 1.0 when the layout does not store it.
    pub weight: f32,
    /// True when the stored energy was negative.
    pub is_new_history: bool,
    /// Stored trailing flags (full layout only).
    pub trailer: Option<Trailer>,
}

impl ParticleRecord {
    /// Creates a record with unit weight that does not start a history.
    #[must_use]
    pub const fn new(species: Species, energy: f32, position: [f32; 3], direction: [f32; 3]) -> Self {
        Self {
            species,
            energy,
            x: position[0],
            y: position[1],
            z: position[2],
            u: direction[0],
            v: direction[1],
            w: direction[2],
            weight: 1.0,
            is_new_history: false,
            trailer: None,
        }
    }

    /// Marks the record as the first particle of a new history.
    #[must_use]
    pub const fn with_new_history(mut self, is_new_history: bool) -> Self {
        self.is_new_history = is_new_history;
        self
    }

    /// Sets the statistical weight.
    #[must_use]
    pub const fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    /// Position as `[x, y, z]`.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Direction as `[u, v, w]`.
    #[inline]
    #[must_use]
    pub const fn direction(&self) -> [f32; 3] {
        [self.u, self.v, self.w]
    }

    /// True for photons.
    #[inline]
    #[must_use]
    pub fn is_photon(&self) -> bool {
        self.species == Species::Photon
    }

    /// True when the particle travels towards increasing z.
    #[inline]
    #[must_use]
    pub fn moves_forward(&self) -> bool {
        self.w > 0.0
    }

    /// Sign of the species byte that encodes this record's `w`.
    #[inline]
    #[must_use]
    pub fn parity(&self) -> f32 {
        if self.w < 0.0 {
            -1.0
        } else {
            1.0
        }
    }
}

/// Result of rebuilding a direction from its two stored cosines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Direction {
    /// Cosine along x (renormalized in the degenerate case).
    pub u: f32,
    /// Cosine along y (renormalized in the degenerate case).
    pub v: f32,
    /// Rebuilt cosine along z.
    pub w: f32,
    /// True when `u² + v² > 1` and the pair had to be renormalized.
    pub degenerate: bool,
}

/// Rebuilds `w` from `u`, `v` and the species-byte parity (`+1.0`/`-1.0`).
///
/// `aux = u² + v²` is summed in single precision and widened to double.
/// When `aux <= 1`, `w = parity * sqrt(1 - aux)`.
/// Otherwise `u` and `v` are divided by `sqrt(aux)` and `w` is zero.
#[must_use]
pub fn reconstruct_direction(u: f32, v: f32, parity: f32) -> Direction {
    let aux = f64::from(u * u + v * v);
    if aux <= 1.0 {
        Direction {
            u,
            v,
            w: (f64::from(parity) * (1.0 - aux).sqrt()) as f32,
            degenerate: false,
        }
    } else {
        let norm = aux.sqrt() as f32;
        Direction {
            u: u / norm,
            v: v / norm,
            w: 0.0,
            degenerate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_codes() {
        for code in 0..=u8::MAX {
            assert_eq!(Species::from_code(code).code(), code);
        }
        assert_eq!(Species::from_code(1), Species::Photon);
        assert_eq!(Species::from_code(4), Species::Other(4));
        assert_eq!(Species::Other(5).tracked_index(), None);
        assert_eq!(Species::Positron.tracked_index(), Some(2));
    }

    #[test]
    fn test_reconstruct_unit_norm() {
        let d = reconstruct_direction(0.3, -0.4, 1.0);
        assert!(!d.degenerate);
        let norm = d.u * d.u + d.v * d.v + d.w * d.w;
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((d.w - 0.866_025_4).abs() < 1e-6);
    }

    #[test]
    fn test_reconstruct_parity() {
        assert_eq!(reconstruct_direction(0.0, 0.0, 1.0).w, 1.0);
        assert_eq!(reconstruct_direction(0.0, 0.0, -1.0).w, -1.0);
    }

    #[test]
    fn test_reconstruct_degenerate() {
        let d = reconstruct_direction(3.0, 4.0, -1.0);
        assert!(d.degenerate);
        assert_eq!(d.w, 0.0);
        assert!((d.u - 0.6).abs() < 1e-6);
        assert!((d.v - 0.8).abs() < 1e-6);
        assert!((d.u * d.u + d.v * d.v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_record_helpers() {
        let p = ParticleRecord::new(Species::Photon, 6.0, [1.0, 2.0, 3.0], [0.0, 0.0, -1.0])
            .with_new_history(true)
            .with_weight(0.5);
        assert!(p.is_photon());
        assert!(!p.moves_forward());
        assert_eq!(p.parity(), -1.0);
        assert_eq!(p.position(), [1.0, 2.0, 3.0]);
        assert!(p.is_new_history);
        assert_eq!(p.weight, 0.5);
    }
}
