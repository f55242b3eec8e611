use crate::limits::MINUTES_PER_DAY;
use crate::model::*;

use super::intervals::free_segments;

/// Legal-value enumeration for one resource-day at one granularity.
///
/// Start candidates step forward from the work window start, end candidates
/// step backward from the work window end. When the other boundary is held,
/// candidates anchored on it (`end - k*step`, `start + k*step`) are used too,
/// so a value derived from that anchor stays a member of its own domain.
#[derive(Debug, Clone)]
pub struct SlotGrid {
    work: WorkWindow,
    step: Minute,
    /// Sorted, pairwise disjoint; touching segments come from different day intervals.
    segments: Vec<Span>,
}

impl SlotGrid {
    /// `busy` must be sorted and merged (see `normalize_busy`). `step` must be positive.
    pub fn new(work: WorkWindow, busy: &[Span], day_intervals: Option<&[Span]>, step: Minute) -> Self {
        debug_assert!(step > 0, "grid step must be positive");
        Self {
            work,
            step,
            segments: free_segments(&work, busy, day_intervals),
        }
    }

    pub fn step(&self) -> Minute {
        self.step
    }

    pub fn work(&self) -> &WorkWindow {
        &self.work
    }

    pub fn segments(&self) -> &[Span] {
        &self.segments
    }

    /// `[start, end)` is bookable: inside the work window, clear of busy time,
    /// and within a single allowed day interval.
    pub fn fits(&self, start: Minute, end: Minute) -> bool {
        if start >= end {
            return false;
        }
        self.segment_from(start).is_some_and(|seg| end <= seg.end)
    }

    /// Segment with `seg.start <= t < seg.end`.
    fn segment_from(&self, t: Minute) -> Option<&Span> {
        let idx = self.segments.partition_point(|seg| seg.end <= t);
        self.segments.get(idx).filter(|seg| seg.start <= t)
    }

    /// Segment with `seg.start < t <= seg.end`.
    fn segment_until(&self, t: Minute) -> Option<&Span> {
        let idx = self.segments.partition_point(|seg| seg.end < t);
        self.segments.get(idx).filter(|seg| seg.start < t)
    }

    /// Largest `k` such that `[start, start + k*step)` is bookable; 0 if none.
    pub fn max_periods_forward(&self, start: Minute) -> u32 {
        self.segment_from(start)
            .map_or(0, |seg| ((seg.end - start) / self.step) as u32)
    }

    /// Largest `k` such that `[end - k*step, end)` is bookable; 0 if none.
    pub fn max_periods_backward(&self, end: Minute) -> u32 {
        self.segment_until(end)
            .map_or(0, |seg| ((end - seg.start) / self.step) as u32)
    }

    /// Largest period count achievable anywhere on the grid.
    pub fn max_periods_global(&self) -> u32 {
        let forward = self
            .forward_grid()
            .map(|s| self.max_periods_forward(s))
            .max()
            .unwrap_or(0);
        let backward = self
            .backward_grid()
            .into_iter()
            .map(|e| self.max_periods_backward(e))
            .max()
            .unwrap_or(0);
        forward.max(backward)
    }

    fn forward_grid(&self) -> impl Iterator<Item = Minute> + '_ {
        (self.work.start..self.work.end).step_by(self.step as usize)
    }

    /// Ascending end candidates aligned on the work window end.
    fn backward_grid(&self) -> Vec<Minute> {
        let mut ends = Vec::new();
        let mut e = self.work.end;
        while e > self.work.start {
            ends.push(e);
            e -= self.step;
        }
        ends.reverse();
        ends
    }

    /// Length of `periods` periods; `None` when that cannot fit in a day.
    pub fn span_of(&self, periods: u32) -> Option<Minute> {
        Minute::try_from(periods)
            .ok()
            .and_then(|p| p.checked_mul(self.step))
            .filter(|&len| len <= MINUTES_PER_DAY)
    }

    pub fn start_domain(&self, periods: Option<u32>, end: Option<Minute>) -> Vec<Minute> {
        match (periods, end) {
            (Some(0), _) => Vec::new(),
            (Some(p), anchor) => {
                let Some(len) = self.span_of(p) else {
                    return Vec::new();
                };
                let mut candidates: Vec<Minute> = self.forward_grid().collect();
                if let Some(s) = anchor.and_then(|e| e.checked_sub(len)) {
                    candidates.push(s);
                    candidates.sort_unstable();
                    candidates.dedup();
                }
                candidates.retain(|&s| self.fits(s, s + len));
                candidates
            }
            (None, Some(e)) => {
                let max = self.max_periods_backward(e);
                let mut starts: Vec<Minute> = (1..=max)
                    .filter_map(|k| self.span_of(k).map(|len| e - len))
                    .collect();
                starts.reverse();
                starts
            }
            (None, None) => self
                .forward_grid()
                .filter(|&s| self.fits(s, s + self.step))
                .collect(),
        }
    }

    pub fn end_domain(&self, periods: Option<u32>, start: Option<Minute>) -> Vec<Minute> {
        match (periods, start) {
            (Some(0), _) => Vec::new(),
            (Some(p), anchor) => {
                let Some(len) = self.span_of(p) else {
                    return Vec::new();
                };
                let mut candidates = self.backward_grid();
                if let Some(e) = anchor.and_then(|s| s.checked_add(len)) {
                    candidates.push(e);
                    candidates.sort_unstable();
                    candidates.dedup();
                }
                candidates.retain(|&e| self.fits(e - len, e));
                candidates
            }
            (None, Some(s)) => {
                let max = self.max_periods_forward(s);
                (1..=max)
                    .filter_map(|k| self.span_of(k).map(|len| s + len))
                    .collect()
            }
            (None, None) => self
                .backward_grid()
                .into_iter()
                .filter(|&e| self.fits(e - self.step, e))
                .collect(),
        }
    }

    /// Duration options: bounded by the held start, else the held end, else the whole day.
    pub fn periods_domain(&self, start: Option<Minute>, end: Option<Minute>) -> Vec<u32> {
        let max = match (start, end) {
            (Some(s), _) => self.max_periods_forward(s),
            (None, Some(e)) => self.max_periods_backward(e),
            (None, None) => self.max_periods_global(),
        };
        (1..=max).collect()
    }
}
