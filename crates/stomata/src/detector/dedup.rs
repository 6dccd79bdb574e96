use crate::detection::RawDetection;

/// Keep-mask over `detections`: a complex survives iff no other complex
/// overlapping it above `iou_threshold` is strictly more confident.
///
/// Equal confidences keep both. Non-complex detections are always kept.
pub(crate) fn overlap_keep_mask(detections: &[RawDetection], iou_threshold: f64) -> Vec<bool> {
    detections
        .iter()
        .enumerate()
        .map(|(i, det)| {
            if !det.is_stomata_complex() {
                return true;
            }
            !detections.iter().enumerate().any(|(j, other)| {
                j != i
                    && other.is_stomata_complex()
                    && other.confidence > det.confidence
                    && det.bbox.iou(&other.bbox) > iou_threshold
            })
        })
        .collect()
}

/// Split detections into overlap survivors and overlap losers.
pub fn resolve_overlaps(
    detections: Vec<RawDetection>,
    iou_threshold: f64,
) -> (Vec<RawDetection>, Vec<RawDetection>) {
    let keep = overlap_keep_mask(&detections, iou_threshold);
    let (kept, dropped): (Vec<_>, Vec<_>) = detections
        .into_iter()
        .enumerate()
        .partition(|(index, _)| keep[*index]);
    (
        kept.into_iter().map(|(_, d)| d).collect(),
        dropped.into_iter().map(|(_, d)| d).collect(),
    )
}
