//! CSV exports: one measurement row per stoma, one density row per image.

use std::path::{Path, PathBuf};

use crate::biology::{AnalysisOptions, ImageSummary, MetricKind};
use crate::error::{Result, StomataError};
use crate::record::{ImageRecord, StomaClass};

#[derive(Debug, serde::Serialize)]
struct MeasurementRow<'a> {
    id: u64,
    image_name: &'a str,
    class: &'static str,
    pore_length: f64,
    pore_width: f64,
    pore_area: f64,
    #[serde(rename = "pore_width/length")]
    width_over_length: f64,
    subsidiary_cell_area: f64,
    guard_cell_area: f64,
    confidence: f32,
}

#[derive(Debug, serde::Serialize)]
struct DensityRow<'a> {
    image_name: &'a str,
    n_stomata: usize,
    density: Option<f64>,
    g_max: Option<f64>,
}

/// Write accepted valid stomata; physical units when calibrated.
pub fn write_measurements_csv<W: std::io::Write>(
    writer: W,
    records: &[ImageRecord],
    options: &AnalysisOptions,
) -> Result<usize> {
    let cal = &options.calibration;
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for record in records {
        for stoma in options.user_filter.apply(&record.detections) {
            wtr.serialize(MeasurementRow {
                id: stoma.stoma_id,
                image_name: &record.image_name,
                class: match stoma.category_id {
                    StomaClass::Open => "open",
                    StomaClass::Closed => "closed",
                },
                pore_length: cal.convert(stoma.pore_length, MetricKind::Length),
                pore_width: cal.convert(stoma.pore_width, MetricKind::Length),
                pore_area: cal.convert(stoma.pore_area, MetricKind::Area),
                width_over_length: stoma.width_over_length,
                subsidiary_cell_area: cal.convert(stoma.subsidiary_cell_area, MetricKind::Area),
                guard_cell_area: cal.convert(stoma.guard_cell_area, MetricKind::Area),
                confidence: stoma.confidence,
            })?;
            rows += 1;
        }
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(rows)
}

/// Write one density row per image. Unavailable densities are left empty.
pub fn write_density_csv<W: std::io::Write>(
    writer: W,
    records: &[ImageRecord],
    options: &AnalysisOptions,
) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        let summary = ImageSummary::from_record(record, options);
        wtr.serialize(DensityRow {
            image_name: &record.image_name,
            n_stomata: summary.n_stomata,
            density: summary.density,
            g_max: summary.g_max,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(records.len())
}

/// Write `pore_measurements_<sample>.csv` and `density_<sample>.csv` into `out_dir`.
pub fn export_csvs(
    out_dir: &Path,
    sample_name: &str,
    records: &[ImageRecord],
    options: &AnalysisOptions,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(out_dir).map_err(|e| StomataError::io(out_dir, e))?;

    let measurements = out_dir.join(format!("pore_measurements_{sample_name}.csv"));
    let file = std::fs::File::create(&measurements).map_err(|e| StomataError::io(&measurements, e))?;
    let n_rows = write_measurements_csv(file, records, options)?;

    let density = out_dir.join(format!("density_{sample_name}.csv"));
    let file = std::fs::File::create(&density).map_err(|e| StomataError::io(&density, e))?;
    write_density_csv(file, records, options)?;

    tracing::info!(
        "Wrote {} measurement rows to {} and densities to {}",
        n_rows,
        measurements.display(),
        density.display()
    );
    Ok((measurements, density))
}
