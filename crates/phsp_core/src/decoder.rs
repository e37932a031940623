//! # Record Decoder
//!
//! Field-by-field decoding of the headerless IAEA record stream.
//!
//! ## Record Layout
//!
//! ```text
//! ┌──────┬─────────┬─────┬─────┬─────┬─────┬─────┬────────┬──────┬──────┐
//! │ type │ energy  │  x  │  y  │  z  │  u  │  v  │ weight │ sgnW │ newH │
//! │  i8  │   f32   │ f32 │ f32 │ f32 │ f32 │ f32 │  f32   │  u8  │  u8  │
//! └──────┴─────────┴─────┴─────┴─────┴─────┴─────┴────────┴──────┴──────┘
//!  0      1         5     9     13    17    21    25       29     30
//!  └──────────────── short (25 bytes) ──────────┘
//!  └──────────────────────────── full (31 bytes) ──────────────────────┘
//! ```
//!
//! All multi-byte fields are little-endian. There is no header, count or
//! delimiter: end of file is the only framing signal, and a short read at a
//! mandatory field ends the stream without error.

use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{PhspError, PhspResult};
use crate::record::{reconstruct_direction, ParticleRecord, Species, Trailer};

/// Byte offsets of each field inside a record.
///
/// [`decode_record`] reads the fields in this order and checks the record
/// boundaries against these offsets in debug builds.
pub mod offsets {
    /// Signed species byte.
    pub const SPECIES: usize = 0;
    /// Signed energy.
    pub const ENERGY: usize = 1;
    /// Position x.
    pub const X: usize = 5;
    /// Position y.
    pub const Y: usize = 9;
    /// Position z.
    pub const Z: usize = 13;
    /// Direction cosine u.
    pub const U: usize = 17;
    /// Direction cosine v.
    pub const V: usize = 21;
    /// Statistical weight (full layout).
    pub const WEIGHT: usize = 25;
    /// Stored sign-of-w flag (full layout).
    pub const SIGN_OF_W: usize = 29;
    /// Stored new-history flag (full layout).
    pub const NEW_HISTORY: usize = 30;
}

/// On-disk record layout, selected once per stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLayout {
    /// Species through `v`, then weight and the two flag bytes.
    Full,
    /// Species through `v` only.
    #[default]
    Short,
}

impl RecordLayout {
    /// Size of a full record in bytes.
    pub const FULL_SIZE: usize = 31;
    /// Size of a short record in bytes.
    pub const SHORT_SIZE: usize = 25;

    /// Bytes per record.
    #[inline]
    #[must_use]
    pub const fn record_size(self) -> usize {
        match self {
            Self::Full => Self::FULL_SIZE,
            Self::Short => Self::SHORT_SIZE,
        }
    }

    /// Parses `"full"` or `"short"`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "full" => Some(Self::Full),
            "short" => Some(Self::Short),
            _ => None,
        }
    }
}

/// Little-endian read cursor over a byte slice.
pub struct RecordCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> RecordCursor<'a> {
    /// Creates a cursor at the start of `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Returns the current offset.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let value = *self.buffer.get(self.position)?;
        self.position += 1;
        Some(value)
    }

    /// Reads a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Option<i8> {
        self.read_u8().map(|b| i8::from_le_bytes([b]))
    }

    /// Reads a f32 in little-endian format.
    #[inline]
    pub fn read_f32(&mut self) -> Option<f32> {
        let bytes = self.buffer.get(self.position..self.position + 4)?;
        let value = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        self.position += 4;
        Some(value)
    }

    /// Decodes the next record, `None` once the bytes run out.
    pub fn next_record(&mut self, layout: RecordLayout) -> Option<ParticleRecord> {
        if self.remaining() < layout.record_size() {
            return None;
        }
        decode_record(self, layout)
    }
}

/// Decodes one record at the cursor.
///
/// Returns `None` on a short read at any mandatory field of `layout`.
pub fn decode_record(cursor: &mut RecordCursor<'_>, layout: RecordLayout) -> Option<ParticleRecord> {
    decode_fields(cursor, layout).map(|(record, _)| record)
}

/// Decodes one record and reports whether its direction was renormalized.
fn decode_fields(cursor: &mut RecordCursor<'_>, layout: RecordLayout) -> Option<(ParticleRecord, bool)> {
    let start = cursor.position();
    let raw_species = cursor.read_i8()?;
    let parity = if raw_species < 0 { -1.0 } else { 1.0 };
    let species = Species::from_code(raw_species.unsigned_abs());

    let raw_energy = cursor.read_f32()?;
    let is_new_history = raw_energy < 0.0;
    let energy = raw_energy.abs();

    let x = cursor.read_f32()?;
    let y = cursor.read_f32()?;
    let z = cursor.read_f32()?;
    let u = cursor.read_f32()?;
    let v = cursor.read_f32()?;
    debug_assert_eq!(cursor.position() - start, offsets::WEIGHT);

    let direction = reconstruct_direction(u, v, parity);
    if direction.degenerate {
        tracing::trace!(u, v, "direction outside unit circle, renormalized");
    }

    let (weight, trailer) = match layout {
        RecordLayout::Short => (1.0, None),
        RecordLayout::Full => {
            let weight = cursor.read_f32()?;
            let sign_of_w = cursor.read_u8()?;
            let new_history = cursor.read_u8()?;
            (weight, Some(Trailer { sign_of_w, new_history }))
        }
    };
    debug_assert_eq!(cursor.position() - start, layout.record_size());

    let record = ParticleRecord {
        species,
        energy,
        x,
        y,
        z,
        u: direction.u,
        v: direction.v,
        w: direction.w,
        weight,
        is_new_history,
        trailer,
    };
    Some((record, direction.degenerate))
}

/// Decodes every complete record of an in-memory stream.
pub fn decode_all(bytes: &[u8], layout: RecordLayout) -> Vec<ParticleRecord> {
    let mut cursor = RecordCursor::new(bytes);
    let mut records = Vec::with_capacity(bytes.len() / layout.record_size());
    while let Some(record) = cursor.next_record(layout) {
        records.push(record);
    }
    records
}

/// How a record stream ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// End of input exactly at a record boundary.
    Clean,
    /// End of input inside a record; the partial record was dropped.
    Truncated {
        /// Bytes of the dropped partial record.
        trailing_bytes: usize,
    },
    /// A read failed mid-stream; decoding stopped with what was read.
    ReadFailed(io::ErrorKind),
}

/// Pull-based record reader over any byte source.
pub struct PhaseSpaceReader<R> {
    reader: R,
    layout: RecordLayout,
    frame: [u8; RecordLayout::FULL_SIZE],
    records_read: u64,
    degenerate: u64,
    end: Option<StreamEnd>,
}

impl PhaseSpaceReader<BufReader<File>> {
    /// Opens a phase-space file.
    ///
    /// # Errors
    ///
    /// Returns [`PhspError::InputUnavailable`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, layout: RecordLayout) -> PhspResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PhspError::input_unavailable(path, e))?;
        tracing::debug!(
            path = %path.display(),
            ?layout,
            record_size = layout.record_size(),
            "opened phase-space file"
        );
        Ok(Self::new(BufReader::with_capacity(1 << 16, file), layout))
    }
}

impl<R: Read> PhaseSpaceReader<R> {
    /// Wraps a reader positioned at the first record.
    pub fn new(reader: R, layout: RecordLayout) -> Self {
        Self {
            reader,
            layout,
            frame: [0; RecordLayout::FULL_SIZE],
            records_read: 0,
            degenerate: 0,
            end: None,
        }
    }

    /// Stream layout.
    #[must_use]
    pub const fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Records decoded so far.
    #[must_use]
    pub const fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Records whose direction had to be renormalized.
    #[must_use]
    pub const fn degenerate_directions(&self) -> u64 {
        self.degenerate
    }

    /// How the stream ended, `None` while records remain.
    #[must_use]
    pub const fn end(&self) -> Option<StreamEnd> {
        self.end
    }

    /// Decodes the next record.
    pub fn next_record(&mut self) -> Option<ParticleRecord> {
        if self.end.is_some() {
            return None;
        }

        let size = self.layout.record_size();
        let filled = match fill_frame(&mut self.reader, &mut self.frame[..size]) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(
                    records = self.records_read,
                    error = %e,
                    "read failed, stopping with partial statistics"
                );
                self.end = Some(StreamEnd::ReadFailed(e.kind()));
                return None;
            }
        };

        if filled < size {
            self.end = Some(if filled == 0 {
                StreamEnd::Clean
            } else {
                tracing::warn!(
                    records = self.records_read,
                    trailing_bytes = filled,
                    "partial trailing record dropped"
                );
                StreamEnd::Truncated { trailing_bytes: filled }
            });
            return None;
        }

        let mut cursor = RecordCursor::new(&self.frame[..size]);
        let (record, degenerate) = decode_fields(&mut cursor, self.layout)?;
        if degenerate {
            self.degenerate += 1;
        }
        self.records_read += 1;
        Some(record)
    }
}

impl<R: Read> Iterator for PhaseSpaceReader<R> {
    type Item = ParticleRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

/// Reads until `buf` is full or the source is exhausted.
fn fill_frame<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
