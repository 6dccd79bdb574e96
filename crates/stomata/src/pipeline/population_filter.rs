//! Batch-level IQR outlier rejection over assembled records.

use crate::detector::PopulationFilterConfig;
use crate::geometry::BBox;
use crate::record::{ImageRecord, StomaRecord};
use crate::stats::{self, RobustSpread};

use super::context::BatchContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Outlier bounds derived from a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PopulationBounds {
    /// Pore lengths below this are invalid. There is no upper bound.
    pub min_pore_length: Option<f64>,
    pub height: Option<Bounds>,
    pub width: Option<Bounds>,
}

fn spread_bounds(values: &[f64], k: f64, what: &str) -> Option<Bounds> {
    let spread = RobustSpread::from_values(values);
    if spread.is_none() {
        tracing::warn!("No {} collected, skipping {} outlier check", what, what);
    }
    spread.map(|s| Bounds {
        lower: s.lower_bound(k),
        upper: s.upper_bound(k),
    })
}

impl PopulationBounds {
    pub fn from_context(ctx: &BatchContext, config: &PopulationFilterConfig) -> Self {
        let k = config.iqr_multiplier;
        Self {
            min_pore_length: spread_bounds(ctx.pore_lengths(), k, "pore lengths").map(|b| b.lower),
            height: spread_bounds(ctx.box_heights(), k, "box heights"),
            width: spread_bounds(ctx.box_widths(), k, "box widths"),
        }
    }
}

/// Number of records invalidated by each check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct PopulationFilterStats {
    pub short_pores: usize,
    pub height_outliers: usize,
    pub width_outliers: usize,
}

impl PopulationFilterStats {
    pub fn total(&self) -> usize {
        self.short_pores + self.height_outliers + self.width_outliers
    }
}

impl std::ops::AddAssign for PopulationFilterStats {
    fn add_assign(&mut self, other: Self) {
        self.short_pores += other.short_pores;
        self.height_outliers += other.height_outliers;
        self.width_outliers += other.width_outliers;
    }
}

/// Invalidate records whose box dimension falls outside `bounds`.
///
/// Near-edge boxes are cut off by the border, so they are only rejected
/// when much smaller than the image's interior boxes.
fn invalidate_box_outliers(
    record: &mut ImageRecord,
    bounds: Bounds,
    config: &PopulationFilterConfig,
    dimension: impl Fn(&BBox) -> f64,
) -> usize {
    let size = record.image_size;
    let near_edge = |s: &StomaRecord| s.bbox.is_near_edge(size, config.edge_distance_px);
    let interior: Vec<f64> = record
        .detections
        .iter()
        .filter(|s| !near_edge(s))
        .map(|s| dimension(&s.bbox))
        .collect();
    let edge_cutoff = stats::mean(&interior).map(|m| config.edge_size_fraction * m);

    record.invalidate_where(|s| {
        let value = dimension(&s.bbox);
        if near_edge(s) {
            edge_cutoff.is_some_and(|cutoff| value < cutoff)
        } else {
            !bounds.contains(value)
        }
    })
}

/// Apply batch bounds to one image's records.
pub fn filter_record(
    record: &mut ImageRecord,
    bounds: &PopulationBounds,
    config: &PopulationFilterConfig,
) -> PopulationFilterStats {
    let mut stats = PopulationFilterStats::default();
    if let Some(min) = bounds.min_pore_length {
        stats.short_pores = record.invalidate_where(|s| s.pore_length < min);
    }
    if let Some(b) = bounds.height {
        stats.height_outliers = invalidate_box_outliers(record, b, config, BBox::height);
    }
    if let Some(b) = bounds.width {
        stats.width_outliers = invalidate_box_outliers(record, b, config, BBox::width);
    }
    stats
}

/// Run the population filter over a complete batch.
pub fn filter_population_outliers(
    records: &mut [ImageRecord],
    ctx: &BatchContext,
    config: &PopulationFilterConfig,
) -> PopulationFilterStats {
    if !config.enable {
        return PopulationFilterStats::default();
    }
    let bounds = PopulationBounds::from_context(ctx, config);
    let mut stats = PopulationFilterStats::default();
    for record in records.iter_mut() {
        stats += filter_record(record, &bounds, config);
    }
    tracing::info!(
        "Population filter: {} short pores, {} height outliers, {} width outliers",
        stats.short_pores,
        stats.height_outliers,
        stats.width_outliers
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ImageSize;
    use crate::test_utils::stoma_record;

    fn record_with(stomata: Vec<StomaRecord>) -> (ImageRecord, BatchContext) {
        let mut record = ImageRecord::new("leaf", ImageSize::new(400, 600));
        let mut ctx = BatchContext::new();
        for s in &stomata {
            ctx.push(s);
        }
        record.detections = stomata;
        (record, ctx)
    }

    fn interior_box(i: usize) -> BBox {
        let x = 50.0 + 70.0 * i as f64;
        BBox::new(x, 100.0, x + 60.0, 140.0)
    }

    #[test]
    fn long_pores_are_never_rejected() {
        let stomata = [10.0, 11.0, 12.0, 13.0, 100.0]
            .iter()
            .enumerate()
            .map(|(i, &len)| stoma_record(i as u64, len, interior_box(i)))
            .collect();
        let (record, ctx) = record_with(stomata);
        let mut records = vec![record];
        let stats =
            filter_population_outliers(&mut records, &ctx, &PopulationFilterConfig::default());
        assert_eq!(stats.total(), 0);
        assert_eq!(records[0].detections.len(), 5);
    }

    #[test]
    fn short_pore_is_invalidated() {
        let stomata = [3.0, 10.0, 11.0, 12.0, 13.0]
            .iter()
            .enumerate()
            .map(|(i, &len)| stoma_record(i as u64, len, interior_box(i)))
            .collect();
        let (record, ctx) = record_with(stomata);
        let mut records = vec![record];
        let stats =
            filter_population_outliers(&mut records, &ctx, &PopulationFilterConfig::default());
        assert_eq!(stats.short_pores, 1);
        assert_eq!(records[0].invalid_detections[0].pore_length, 3.0);
        assert_eq!(records[0].stoma_count(), 5);
    }

    #[test]
    fn near_edge_boxes_use_relative_size() {
        let mut stomata: Vec<StomaRecord> = (0..5)
            .map(|i| stoma_record(i as u64, 12.0, interior_box(i)))
            .collect();
        // Cut off at the top border: height 10 < 0.5 * 40.
        stomata.push(stoma_record(5, 12.0, BBox::new(100.0, 0.0, 160.0, 10.0)));
        // Near the top border with height 30 >= 20: kept.
        stomata.push(stoma_record(6, 12.0, BBox::new(200.0, 5.0, 260.0, 35.0)));
        let (record, ctx) = record_with(stomata);
        let mut records = vec![record];
        let stats =
            filter_population_outliers(&mut records, &ctx, &PopulationFilterConfig::default());
        assert_eq!(stats.height_outliers, 1);
        assert_eq!(records[0].invalid_detections[0].stoma_id, 5);
        assert_eq!(records[0].detections.len(), 6);
    }

    #[test]
    fn interior_height_outlier_is_invalidated() {
        let mut stomata: Vec<StomaRecord> = (0..5)
            .map(|i| stoma_record(i as u64, 12.0, interior_box(i)))
            .collect();
        stomata.push(stoma_record(5, 12.0, BBox::new(100.0, 200.0, 160.0, 320.0)));
        let (record, ctx) = record_with(stomata);
        let mut records = vec![record];
        let stats =
            filter_population_outliers(&mut records, &ctx, &PopulationFilterConfig::default());
        assert_eq!(stats.height_outliers, 1);
        assert_eq!(stats.width_outliers, 0);
    }

    #[test]
    fn empty_batch_skips_checks() {
        let ctx = BatchContext::new();
        let bounds = PopulationBounds::from_context(&ctx, &PopulationFilterConfig::default());
        assert_eq!(bounds, PopulationBounds::default());
    }
}
