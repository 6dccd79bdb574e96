//! File hand-off between pipeline stages: detection dumps in, per-image
//! record JSON and CSV exports out.

mod dump;
mod export;
mod records;

pub use dump::{detection_dump_inputs, load_detection_dump, DetectionDump, DumpInstance};
pub use export::{export_csvs, write_density_csv, write_measurements_csv};
pub use records::{
    is_ground_truth, load_image_records, read_image_record, record_path, write_image_record,
    GROUND_TRUTH_SUFFIX,
};
