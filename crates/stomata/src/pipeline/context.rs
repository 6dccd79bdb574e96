use crate::record::{ImageRecord, StomaRecord};

/// Batch-scoped accumulator feeding the population outlier filter.
///
/// Holds the pore length and box `(height, width)` of every assembled
/// record plus the next stoma id. Reset at the start of every batch.
#[derive(Debug, Clone, Default)]
pub struct BatchContext {
    pore_lengths: Vec<f64>,
    box_heights: Vec<f64>,
    box_widths: Vec<f64>,
    next_stoma_id: u64,
}

impl BatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an accumulator from saved records (valid and invalid).
    pub fn from_records(records: &[ImageRecord]) -> Self {
        let mut ctx = Self::new();
        for stoma in records
            .iter()
            .flat_map(|r| r.detections.iter().chain(&r.invalid_detections))
        {
            ctx.push(stoma);
            ctx.next_stoma_id = ctx.next_stoma_id.max(stoma.stoma_id + 1);
        }
        ctx
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next_stoma_id;
        self.next_stoma_id += 1;
        id
    }

    pub fn push(&mut self, stoma: &StomaRecord) {
        self.pore_lengths.push(stoma.pore_length);
        self.box_heights.push(stoma.bbox.height());
        self.box_widths.push(stoma.bbox.width());
    }

    pub fn pore_lengths(&self) -> &[f64] {
        &self.pore_lengths
    }

    pub fn box_heights(&self) -> &[f64] {
        &self.box_heights
    }

    pub fn box_widths(&self) -> &[f64] {
        &self.box_widths
    }

    pub fn len(&self) -> usize {
        self.pore_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pore_lengths.is_empty()
    }
}
