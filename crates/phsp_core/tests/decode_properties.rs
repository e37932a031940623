//! # Decoder Property Tests
//!
//! Direction reconstruction and stream framing over seeded random records.

use phsp_core::{
    decode_all, PhaseSpaceReader, RecordLayout, Species, StreamEnd,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Writes one short-layout record straight from raw field values.
fn push_raw(bytes: &mut Vec<u8>, species: i8, energy: f32, pos: [f32; 3], u: f32, v: f32) {
    bytes.push(species as u8);
    for value in [energy, pos[0], pos[1], pos[2], u, v] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
}

#[test]
fn test_unit_norm_inside_unit_circle() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut bytes = Vec::new();
    for _ in 0..10_000 {
        let angle: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
        let radius: f32 = rng.gen_range(0.0..1.0);
        let sign: i8 = if rng.gen_bool(0.5) { -1 } else { 1 };
        push_raw(&mut bytes, sign, 1.0, [0.0; 3], radius * angle.cos(), radius * angle.sin());
    }

    let records = decode_all(&bytes, RecordLayout::Short);
    assert_eq!(records.len(), 10_000);
    for (i, r) in records.iter().enumerate() {
        let norm = f64::from(r.u).powi(2) + f64::from(r.v).powi(2) + f64::from(r.w).powi(2);
        assert!((norm - 1.0).abs() < 1e-5, "record {i}: |d|² = {norm}");
        let expected_sign = if bytes[i * RecordLayout::SHORT_SIZE] as i8 > 0 { 1.0 } else { -1.0 };
        assert!(r.w == 0.0 || r.w.signum() == expected_sign, "record {i}: wrong parity");
    }
}

#[test]
fn test_degenerate_directions_are_renormalized() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut bytes = Vec::new();
    for _ in 0..1_000 {
        let u: f32 = rng.gen_range(0.8..3.0);
        let v: f32 = rng.gen_range(0.8..3.0);
        push_raw(&mut bytes, -1, 2.0, [0.0; 3], u, v);
    }

    let mut reader = PhaseSpaceReader::new(bytes.as_slice(), RecordLayout::Short);
    let mut count = 0;
    for r in reader.by_ref() {
        count += 1;
        assert_eq!(r.w, 0.0);
        let planar = f64::from(r.u).powi(2) + f64::from(r.v).powi(2);
        assert!((planar - 1.0).abs() < 1e-5);
    }
    assert_eq!(count, 1_000);
    assert_eq!(reader.degenerate_directions(), 1_000);
    assert_eq!(reader.end(), Some(StreamEnd::Clean));
}

#[test]
fn test_layouts_share_leading_fields() {
    let mut short = Vec::new();
    push_raw(&mut short, 3, -0.75, [1.0, -2.0, 30.0], 0.1, -0.2);
    let mut full = short.clone();
    full.extend_from_slice(&0.5f32.to_le_bytes());
    full.extend_from_slice(&[0, 1]);

    let a = decode_all(&short, RecordLayout::Short)[0];
    let b = decode_all(&full, RecordLayout::Full)[0];
    assert_eq!(a.species, Species::Positron);
    assert_eq!((a.species, a.energy, a.position(), a.direction()), (b.species, b.energy, b.position(), b.direction()));
    assert!(a.is_new_history && b.is_new_history);
    assert_eq!(a.weight, 1.0);
    assert_eq!(b.weight, 0.5);
}

#[test]
fn test_wrong_layout_drops_trailing_bytes() {
    // Three short records read as full records: 75 bytes = 2 * 31 + 13.
    let mut bytes = Vec::new();
    for _ in 0..3 {
        push_raw(&mut bytes, 1, 1.0, [0.0; 3], 0.0, 0.0);
    }
    let mut reader = PhaseSpaceReader::new(bytes.as_slice(), RecordLayout::Full);
    assert_eq!(reader.by_ref().count(), 2);
    assert_eq!(reader.end(), Some(StreamEnd::Truncated { trailing_bytes: 13 }));
}
