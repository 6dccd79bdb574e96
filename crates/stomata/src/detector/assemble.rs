//! Turn each surviving stomatal complex into a [`StomaRecord`].

use crate::detection::{RawDetection, StructureKind};
use crate::geometry::{
    find_collinear_axis, find_perpendicular_axis, take_largest, KeypointPair, Polygon,
};
use crate::pipeline::BatchContext;
use crate::record::{GuardCellPolygon, StomaClass, StomaRecord};

use super::config::AssembleConfig;
use super::pore_axis::{closed_pore_axes, open_pore_axes, PoreAxes};
use super::spatial_filter::SpatialFilterOutput;

fn guard_cell_polygon(complex: &RawDetection) -> GuardCellPolygon {
    match take_largest(complex.mask.polygons()) {
        Some((exterior, rest)) => {
            let interior = rest.into_iter().find(|p| p.is_within(&exterior));
            GuardCellPolygon {
                exterior: Some(exterior),
                interior,
            }
        }
        None => GuardCellPolygon::default(),
    }
}

fn largest_polygon(detection: &RawDetection) -> Option<Polygon> {
    take_largest(detection.mask.polygons()).map(|(largest, _)| largest)
}

/// Guard-cell width spans: the perpendicular through the pore axis against
/// the guard-cell outline, joined to the pore width endpoints (or the pore
/// centre when the pore has no width).
fn guard_cell_width_keypoints(
    exterior: Option<&Polygon>,
    pore: &PoreAxes,
) -> Option<[KeypointPair; 2]> {
    let ab = pore.ab.as_ref()?;
    let outer = find_perpendicular_axis(exterior?, ab)?;
    let inner = pore.cd.unwrap_or_else(|| {
        let m = ab.midpoint();
        KeypointPair::new(m, m)
    });
    Some([
        KeypointPair::new(outer.a, inner.a),
        KeypointPair::new(inner.b, outer.b),
    ])
}

/// Groove spans: the pore axis extended to the guard-cell outline.
fn guard_cell_groove_keypoints(
    exterior: Option<&Polygon>,
    pore: &PoreAxes,
) -> Option<[KeypointPair; 2]> {
    let ab = pore.ab.as_ref()?;
    let outer = find_collinear_axis(exterior?, ab)?;
    Some([
        KeypointPair::new(outer.a, ab.a),
        KeypointPair::new(ab.b, outer.b),
    ])
}

/// Measure one complex. Returns `None` when the pore is implausibly round.
///
/// The returned record carries `stoma_id = 0`; ids are assigned by
/// [`assemble_records`].
pub fn assemble_stoma(
    complex: &RawDetection,
    filtered: &SpatialFilterOutput,
    image_name: &str,
    config: &AssembleConfig,
) -> Option<StomaRecord> {
    let guard_cells = guard_cell_polygon(complex);

    let is_open = complex.kind() == StructureKind::OpenStoma;
    let pore = if is_open {
        filtered.pores().find(|p| p.bbox.is_within(&complex.bbox))
    } else {
        None
    };
    let category = if pore.is_some() {
        StomaClass::Open
    } else {
        StomaClass::Closed
    };
    if is_open && pore.is_none() {
        tracing::debug!(
            "Open complex without a pore at {:?}, treated as closed",
            complex.bbox
        );
    }

    let pore_polygon = pore.and_then(largest_polygon);
    let pore_area = pore.map_or(0.0, |p| p.mask.area() as f64);

    let subsidiary: Vec<&RawDetection> = filtered
        .subsidiary_cells()
        .filter(|s| s.bbox.is_mostly_within(&complex.bbox, config.subsidiary_overlap))
        .collect();
    let subsidiary_cell_polygons: Vec<Polygon> =
        subsidiary.iter().filter_map(|s| largest_polygon(s)).collect();
    let mut subsidiary_cell_area: f64 = subsidiary.iter().map(|s| s.mask.area() as f64).sum();
    if subsidiary.len() == 1 {
        subsidiary_cell_area *= 2.0;
    }

    let model_axis = complex
        .model_axis()
        .or_else(|| pore.and_then(RawDetection::model_axis));
    let axes = match category {
        StomaClass::Open => open_pore_axes(model_axis, pore_polygon.as_ref(), config),
        StomaClass::Closed => closed_pore_axes(model_axis),
    };

    let width_over_length = axes.width_over_length();
    if width_over_length > config.max_width_over_length {
        tracing::debug!(
            "Discarding complex at {:?}: pore width/length {:.3}",
            complex.bbox,
            width_over_length
        );
        return None;
    }

    let exterior = guard_cells.exterior.as_ref();
    let width_keypoints = guard_cell_width_keypoints(exterior, &axes);
    let groove_keypoints = guard_cell_groove_keypoints(exterior, &axes);
    let guard_cell_width = width_keypoints
        .as_ref()
        .map_or(0.0, |[c, d]| 0.5 * (c.length() + d.length()));
    let groove_length = groove_keypoints
        .as_ref()
        .map_or(0.0, |[a, b]| KeypointPair::new(a.a, b.b).length());

    Some(StomaRecord {
        stoma_id: 0,
        image_name: image_name.to_string(),
        bbox: complex.bbox,
        category_id: category,
        confidence: complex.confidence,
        guard_cell_area: complex.mask.area() as f64,
        guard_cell_polygon: guard_cells,
        guard_cell_width_keypoints: width_keypoints,
        guard_cell_groove_keypoints: groove_keypoints,
        guard_cell_width,
        groove_length,
        pore_polygon,
        pore_area,
        ab_keypoints: axes.ab,
        cd_keypoints: axes.cd,
        pore_length: axes.length,
        pore_width: axes.width,
        width_over_length,
        subsidiary_cell_polygons,
        subsidiary_cell_area,
    })
}

/// Assemble every surviving complex of one image, assigning batch ids and
/// feeding the population accumulator.
pub fn assemble_records(
    filtered: &SpatialFilterOutput,
    image_name: &str,
    config: &AssembleConfig,
    ctx: &mut BatchContext,
) -> Vec<StomaRecord> {
    filtered
        .complexes()
        .filter_map(|complex| assemble_stoma(complex, filtered, image_name, config))
        .map(|mut stoma| {
            stoma.stoma_id = ctx.next_id();
            ctx.push(&stoma);
            stoma
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{filter_invalid_detections, SpatialFilterConfig};
    use crate::geometry::{ImageSize, MISSING_PAIR};
    use crate::test_utils::{closed_stoma, open_stoma, subsidiary_cell};

    fn size() -> ImageSize {
        ImageSize::new(200, 240)
    }

    fn filtered(dets: Vec<RawDetection>) -> SpatialFilterOutput {
        filter_invalid_detections(dets, size(), &SpatialFilterConfig::default())
    }

    #[test]
    fn open_stoma_is_measured_from_its_pore() {
        let dets = open_stoma(size(), [120.0, 100.0], [40.0, 20.0], [18.0, 5.0], 0.9);
        let out = filtered(dets);
        let mut ctx = BatchContext::new();
        let records = assemble_records(&out, "leaf", &AssembleConfig::default(), &mut ctx);
        assert_eq!(records.len(), 1);
        let stoma = &records[0];
        assert_eq!(stoma.category_id, StomaClass::Open);
        assert!(stoma.pore_length >= stoma.pore_width);
        assert!(stoma.pore_length > 30.0 && stoma.pore_length < 38.0);
        assert!(stoma.pore_width > 6.0 && stoma.pore_width < 12.0);
        assert!(stoma.pore_area > 0.0);
        assert!(stoma.guard_cell_polygon.exterior.is_some());
        assert!(stoma.guard_cell_polygon.interior.is_some());
        // Guard-cell spans run from the outline to the pore edge.
        assert!(stoma.guard_cell_width > 5.0 && stoma.guard_cell_width < 20.0);
        assert!(stoma.groove_length > stoma.pore_length);
        assert_eq!(ctx.pore_lengths(), &[stoma.pore_length]);
    }

    #[test]
    fn closed_stoma_has_no_pore() {
        let dets = vec![closed_stoma(size(), [120.0, 100.0], [40.0, 20.0], 0.8)];
        let out = filtered(dets);
        let mut ctx = BatchContext::new();
        let records = assemble_records(&out, "leaf", &AssembleConfig::default(), &mut ctx);
        let stoma = &records[0];
        assert_eq!(stoma.category_id, StomaClass::Closed);
        assert_eq!(stoma.pore_area, 0.0);
        assert_eq!(stoma.pore_width, 0.0);
        assert!(stoma.cd_keypoints.is_none());
        let json = serde_json::to_value(stoma).unwrap();
        assert_eq!(json["CD_keypoints"], serde_json::json!(MISSING_PAIR));
    }

    #[test]
    fn open_complex_without_pore_is_downgraded() {
        let mut dets = open_stoma(size(), [120.0, 100.0], [40.0, 20.0], [18.0, 5.0], 0.9);
        dets.retain(|d| !d.is_stomatal_pore());
        let out = filtered(dets);
        let mut ctx = BatchContext::new();
        let records = assemble_records(&out, "leaf", &AssembleConfig::default(), &mut ctx);
        assert_eq!(records[0].category_id, StomaClass::Closed);
        assert_eq!(records[0].pore_area, 0.0);
    }

    #[test]
    fn single_subsidiary_cell_area_is_doubled() {
        let mut dets = vec![closed_stoma(size(), [120.0, 100.0], [40.0, 20.0], 0.8)];
        let cell = subsidiary_cell(size(), [120.0, 84.0], [30.0, 8.0], 0.7);
        let cell_area = cell.mask.area() as f64;
        dets.push(cell);
        let out = filtered(dets);
        let mut ctx = BatchContext::new();
        let records = assemble_records(&out, "leaf", &AssembleConfig::default(), &mut ctx);
        assert_eq!(records[0].subsidiary_cell_polygons.len(), 1);
        assert_eq!(records[0].subsidiary_cell_area, 2.0 * cell_area);
    }

    #[test]
    fn round_pore_is_discarded_without_consuming_an_id() {
        let round = open_stoma(size(), [120.0, 100.0], [40.0, 40.0], [12.0, 12.0], 0.9);
        let out = filtered(round);
        let mut ctx = BatchContext::new();
        let records = assemble_records(&out, "leaf", &AssembleConfig::default(), &mut ctx);
        assert!(records.is_empty());
        assert!(ctx.is_empty());
        assert_eq!(ctx.next_id(), 0);
    }

    #[test]
    fn ids_increase_across_images() {
        let mut ctx = BatchContext::new();
        for name in ["a", "b"] {
            let out = filtered(vec![closed_stoma(size(), [120.0, 100.0], [40.0, 20.0], 0.8)]);
            let records = assemble_records(&out, name, &AssembleConfig::default(), &mut ctx);
            assert_eq!(records[0].image_name, name);
        }
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.next_id(), 2);
    }
}
