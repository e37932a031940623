//! # Geometry Tables
//!
//! Plain-text inputs next to the phase-space file.
//!
//! ```text
//! voxels.txt                 jaws.txt
//! # x     y     z (cm)       # x_min x_max y_min y_max (cm)
//! 0.0   0.0   50.0           -5.0  5.0  -5.0  5.0
//! 0.2   0.0   50.0
//! ```
//!
//! Values are whitespace separated. Blank lines and lines starting with `#`
//! are skipped; anything after a `#` is a comment. The jaw plane is not part
//! of the jaw file, it comes from `[jaw] plane_z`.

use phsp_core::{JawConfig, PhspError, PhspResult};
use phsp_scoring::{JawAperture, Voxel};
use std::path::Path;

/// Lines that carry data, with their one-based numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(i, line)| {
        let data = line.split('#').next().unwrap_or("").trim();
        (!data.is_empty()).then_some((i + 1, data))
    })
}

fn parse_floats<const N: usize>(path: &Path, line: usize, data: &str) -> PhspResult<[f64; N]> {
    let table_error = |reason: String| PhspError::Table {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let fields: Vec<&str> = data.split_whitespace().collect();
    if fields.len() != N {
        return Err(table_error(format!("expected {N} values, found {}", fields.len())));
    }
    let mut values = [0.0; N];
    for (slot, field) in values.iter_mut().zip(&fields) {
        let value: f64 = field
            .parse()
            .map_err(|_| table_error(format!("`{field}` is not a number")))?;
        if !value.is_finite() {
            return Err(table_error(format!("`{field}` is not finite")));
        }
        *slot = value;
    }
    Ok(values)
}

fn read_table(path: &Path) -> PhspResult<String> {
    std::fs::read_to_string(path).map_err(|e| PhspError::input_unavailable(path, e))
}

/// Parses a voxel list; `path` is only used in error messages.
///
/// # Errors
///
/// Returns [`PhspError::Table`] for a line that is not three finite numbers.
pub fn parse_voxels(text: &str, path: &Path) -> PhspResult<Vec<Voxel>> {
    data_lines(text)
        .map(|(line, data)| {
            let [x, y, z] = parse_floats::<3>(path, line, data)?;
            Ok(Voxel::new(x, y, z))
        })
        .collect()
}

/// Loads a voxel list from disk.
///
/// # Errors
///
/// [`PhspError::InputUnavailable`] if the file cannot be read, otherwise as
/// [`parse_voxels`].
pub fn load_voxels(path: impl AsRef<Path>) -> PhspResult<Vec<Voxel>> {
    let path = path.as_ref();
    let voxels = parse_voxels(&read_table(path)?, path)?;
    tracing::debug!(path = %path.display(), voxels = voxels.len(), "voxel table loaded");
    Ok(voxels)
}

/// Parses jaw settings; the plane comes from `config`.
///
/// # Errors
///
/// [`PhspError::Table`] unless the file holds exactly one line of four
/// numbers, [`PhspError::InvalidGeometry`] for an inverted opening.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_jaw(text: &str, path: &Path, config: &JawConfig) -> PhspResult<JawAperture> {
    let mut lines = data_lines(text);
    let Some((line, data)) = lines.next() else {
        return Err(PhspError::Table {
            path: path.to_path_buf(),
            line: 0,
            reason: "no jaw settings".into(),
        });
    };
    if let Some((extra, _)) = lines.next() {
        return Err(PhspError::Table {
            path: path.to_path_buf(),
            line: extra,
            reason: "jaw file holds a single line".into(),
        });
    }

    let [x_min, x_max, y_min, y_max] = parse_floats::<4>(path, line, data)?;
    JawAperture::new(x_min as f32, x_max as f32, y_min as f32, y_max as f32, config.plane_z)
}

/// Loads jaw settings from disk.
///
/// # Errors
///
/// [`PhspError::InputUnavailable`] if the file cannot be read, otherwise as
/// [`parse_jaw`].
pub fn load_jaw(path: impl AsRef<Path>, config: &JawConfig) -> PhspResult<JawAperture> {
    let path = path.as_ref();
    let jaw = parse_jaw(&read_table(path)?, path, config)?;
    tracing::debug!(path = %path.display(), ?jaw, "jaw settings loaded");
    Ok(jaw)
}
