mod grid;
mod intervals;

pub use grid::SlotGrid;
pub use intervals::{allowed_bases, free_segments, merge_overlapping, normalize_busy, subtract_intervals};
