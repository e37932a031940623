//! # Reports
//!
//! CSV and plain-text output of a finished pass.
//!
//! | File | Columns |
//! |------|---------|
//! | `<species>_energy_distribution.csv` | `Energy (MeV),Frequency` |
//! | `voxels.csv` | `x,y,z,count,fluence,energy_sum,mean_energy` |
//!
//! Every writer takes any [`Write`]; the `save_*` functions put files in an
//! output directory and map failures to [`PhspError::Output`].

use phsp_core::{PhspError, PhspResult, Species};
use phsp_scoring::{FieldFluence, Histogram, SpectrumAggregator, Voxel, VoxelStats};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Voxel table file name.
pub const VOXEL_FILE: &str = "voxels.csv";

/// Histogram file name for a species.
#[must_use]
pub fn histogram_file_name(species: Species) -> String {
    format!("{}_energy_distribution.csv", species.label())
}

/// Shortest decimal for an energy or bin edge, six significant digits at most.
fn format_value(value: f64) -> String {
    if value == 0.0 {
        return "0".into();
    }
    let digits = 5 - value.abs().log10().floor().clamp(-20.0, 5.0) as i32;
    let text = format!("{:.*}", digits.max(0) as usize, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Writes one histogram, one row per bin keyed by its lower edge.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_histogram_csv<W: Write>(out: &mut W, histogram: &Histogram) -> io::Result<()> {
    writeln!(out, "Energy (MeV),Frequency")?;
    for (edge, count) in histogram.iter() {
        writeln!(out, "{},{count}", format_value(edge))?;
    }
    Ok(())
}

/// Writes the voxel table in load order; `mean_energy` is empty where it is undefined.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_voxel_csv<W: Write>(out: &mut W, voxels: &[Voxel]) -> io::Result<()> {
    writeln!(out, "x,y,z,count,fluence,energy_sum,mean_energy")?;
    for v in voxels {
        let mean = v.mean_energy().map(|e| e.to_string()).unwrap_or_default();
        writeln!(
            out,
            "{},{},{},{},{},{},{mean}",
            v.x, v.y, v.z, v.count, v.fluence, v.energy_sum
        )?;
    }
    Ok(())
}

/// Writes the spectrum summary: records read and per-species averages.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_spectrum_summary<W: Write>(out: &mut W, spectrum: &SpectrumAggregator) -> io::Result<()> {
    writeln!(out, "Total particles read: {}", spectrum.total_records())?;
    writeln!(out, "New histories: {}", spectrum.new_histories())?;
    writeln!(out, "Other species: {}", spectrum.other_records())?;
    writeln!(out)?;
    writeln!(out, "Average Energy:")?;
    for tally in spectrum.tallies() {
        if let Some(mean) = tally.mean_energy() {
            writeln!(out, "  {:<10} {:.6} MeV ({} records)", tally.species.label(), mean, tally.count)?;
        }
    }
    Ok(())
}

/// Writes the field-fluence summary.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_fluence_summary<W: Write>(out: &mut W, field: &FieldFluence) -> io::Result<()> {
    writeln!(
        out,
        "Fluence: {} of {} records in field ({} read), ratio {}",
        field.count_in_field(),
        field.budget(),
        field.seen(),
        format_value(field.ratio())
    )
}

/// Writes the voxel scorer counters.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_voxel_summary<W: Write>(out: &mut W, stats: &VoxelStats, voxels: &[Voxel]) -> io::Result<()> {
    let touched = voxels.iter().filter(|v| v.count > 0).count();
    writeln!(out, "Voxels: {touched} of {} hit", voxels.len())?;
    writeln!(
        out,
        "Photons: {} hit, {} rejected by jaws, {} ineligible, {} hits total",
        stats.photons_hit, stats.rejected_by_jaw, stats.ineligible, stats.hits
    )?;
    if stats.non_finite > 0 {
        writeln!(out, "Non-finite weights dropped: {}", stats.non_finite)?;
    }
    Ok(())
}

fn save<F>(path: PathBuf, write: F) -> PhspResult<PathBuf>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let result = File::create(&path).and_then(|file| {
        let mut out = BufWriter::new(file);
        write(&mut out)?;
        out.flush()
    });
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "report written");
            Ok(path)
        }
        Err(source) => Err(PhspError::Output { path, source }),
    }
}

fn ensure_dir(dir: &Path) -> PhspResult<()> {
    fs::create_dir_all(dir).map_err(|source| PhspError::Output {
        path: dir.to_path_buf(),
        source,
    })
}

/// Saves one histogram CSV per tracked species, empty ones included.
///
/// # Errors
///
/// [`PhspError::Output`] if the directory or a file cannot be written.
pub fn save_histograms(dir: &Path, spectrum: &SpectrumAggregator) -> PhspResult<Vec<PathBuf>> {
    ensure_dir(dir)?;
    spectrum
        .tallies()
        .iter()
        .map(|tally| {
            let path = dir.join(histogram_file_name(tally.species));
            save(path, |out| write_histogram_csv(out, &tally.histogram))
        })
        .collect()
}

/// Saves the voxel table.
///
/// # Errors
///
/// [`PhspError::Output`] if the directory or the file cannot be written.
pub fn save_voxels(dir: &Path, voxels: &[Voxel]) -> PhspResult<PathBuf> {
    ensure_dir(dir)?;
    save(dir.join(VOXEL_FILE), |out| write_voxel_csv(out, voxels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use phsp_core::{FieldConfig, ParticleRecord, SpectrumConfig};

    fn text(write: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        write(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(f64::from(3.0f32 * 0.1f32)), "0.3");
        assert_eq!(format_value(9.9), "9.9");
        assert_eq!(format_value(2.0), "2");
        assert_eq!(format_value(0.000_123), "0.000123");
    }

    #[test]
    fn test_histogram_csv_rows() {
        let mut h = Histogram::new(&SpectrumConfig::default());
        h.record(2.0);
        let csv = text(|out| write_histogram_csv(out, &h));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 101);
        assert_eq!(lines[0], "Energy (MeV),Frequency");
        assert_eq!(lines[1], "0,0");
        assert_eq!(lines[20], "1.9,1");
        assert_eq!(lines[100], "9.9,0");
    }

    #[test]
    fn test_voxel_csv_untouched_mean_empty() {
        let csv = text(|out| write_voxel_csv(out, &[Voxel::new(0.0, 0.2, 50.0)]));
        assert_eq!(csv, "x,y,z,count,fluence,energy_sum,mean_energy\n0,0.2,50,0,0,0,\n");
    }

    #[test]
    fn test_voxel_csv_zero_fluence_mean_empty() {
        let voxel = Voxel {
            count: 2,
            ..Voxel::new(0.0, 0.0, 10.0)
        };
        let csv = text(|out| write_voxel_csv(out, &[voxel]));
        assert_eq!(csv.lines().nth(1), Some("0,0,10,2,0,0,"));
    }

    #[test]
    fn test_summaries() {
        let mut spectrum = SpectrumAggregator::new(&SpectrumConfig::default());
        spectrum.record(&ParticleRecord::new(Species::Photon, 2.0, [0.0; 3], [0.0, 0.0, 1.0]));
        let summary = text(|out| write_spectrum_summary(out, &spectrum));
        assert!(summary.contains("Total particles read: 1"));
        assert!(summary.contains("photon     2.000000 MeV (1 records)"));
        assert!(!summary.contains("electron"));

        let field = FieldFluence::new(&FieldConfig::default());
        let summary = text(|out| write_fluence_summary(out, &field));
        assert_eq!(summary, "Fluence: 0 of 1000000 records in field (0 read), ratio 0\n");
    }

    #[test]
    fn test_save_histograms_every_tracked_species() {
        let dir = std::env::temp_dir().join(format!("phsp_report_{}", std::process::id()));
        let mut spectrum = SpectrumAggregator::new(&SpectrumConfig::default());
        spectrum.record(&ParticleRecord::new(Species::Electron, 1.0, [0.0; 3], [0.0, 0.0, 1.0]));

        let written = save_histograms(&dir, &spectrum).unwrap();
        assert_eq!(
            written,
            vec![
                dir.join("photon_energy_distribution.csv"),
                dir.join("electron_energy_distribution.csv"),
                dir.join("positron_energy_distribution.csv"),
            ]
        );
        let electrons = fs::read_to_string(&written[1]).unwrap();
        assert!(electrons.contains("\n0.9,1\n"));

        // Species never seen still get the full table of empty bins.
        let photons = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(photons.lines().count(), 101);
        assert!(photons.lines().skip(1).all(|row| row.ends_with(",0")));
        fs::remove_dir_all(&dir).ok();
    }
}
