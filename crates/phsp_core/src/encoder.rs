//! # Record Encoder
//!
//! Writes records in either on-disk layout. Used to build synthetic streams
//! for tests, benches and fixtures; the inverse of the decoder for every
//! well-formed record.

use bytemuck::{Pod, Zeroable};

use crate::decoder::RecordLayout;
use crate::record::ParticleRecord;

/// Byte-aligned image of a full record.
///
/// Every multi-byte field is stored as little-endian bytes, so the frame has
/// alignment 1 and no padding.
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct RawRecord {
    /// Signed species byte (negative when `w < 0`).
    pub species: i8,
    /// Energy, negated for a new history.
    pub energy: [u8; 4],
    /// Position x.
    pub x: [u8; 4],
    /// Position y.
    pub y: [u8; 4],
    /// Position z.
    pub z: [u8; 4],
    /// Direction cosine u.
    pub u: [u8; 4],
    /// Direction cosine v.
    pub v: [u8; 4],
    /// Statistical weight.
    pub weight: [u8; 4],
    /// 1 when `w < 0`.
    pub sign_of_w: u8,
    /// 1 for a new history.
    pub is_new_history: u8,
}

impl RawRecord {
    /// Size of the frame in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Builds the frame for a record.
    #[must_use]
    pub fn from_record(record: &ParticleRecord) -> Self {
        let negative_w = record.w < 0.0;
        let code = record.species.code().min(i8::MAX as u8) as i8;
        let energy = if record.is_new_history {
            -record.energy.abs()
        } else {
            record.energy.abs()
        };
        Self {
            species: if negative_w { -code } else { code },
            energy: energy.to_le_bytes(),
            x: record.x.to_le_bytes(),
            y: record.y.to_le_bytes(),
            z: record.z.to_le_bytes(),
            u: record.u.to_le_bytes(),
            v: record.v.to_le_bytes(),
            weight: record.weight.to_le_bytes(),
            sign_of_w: u8::from(negative_w),
            is_new_history: u8::from(record.is_new_history),
        }
    }
}

/// Appends encoded records to a byte buffer.
pub struct RecordEncoder;

impl RecordEncoder {
    /// Appends one record in `layout`.
    pub fn encode(record: &ParticleRecord, layout: RecordLayout, buffer: &mut Vec<u8>) {
        let raw = RawRecord::from_record(record);
        let bytes = bytemuck::bytes_of(&raw);
        buffer.extend_from_slice(&bytes[..layout.record_size()]);
    }

    /// Encodes a whole stream.
    #[must_use]
    pub fn encode_all<'a, I>(records: I, layout: RecordLayout) -> Vec<u8>
    where
        I: IntoIterator<Item = &'a ParticleRecord>,
    {
        let mut buffer = Vec::new();
        for record in records {
            Self::encode(record, layout, &mut buffer);
        }
        buffer
    }
}
