use crate::model::Minute;

/// Exclusive upper bound of a day in minutes.
pub const MINUTES_PER_DAY: Minute = 1440;

/// Longest slot length a provider may report.
pub const MAX_GRANULARITY: Minute = MINUTES_PER_DAY;

pub const MAX_BUSY_INTERVALS_PER_DAY: usize = 4096;
pub const MAX_DAY_INTERVALS: usize = 96;
pub const MAX_BLOCKS_PER_SESSION: usize = 64;
