use crate::model::*;

// ── Interval arithmetic ───────────────────────────────────────────

/// Merge sorted overlapping/adjacent intervals into disjoint intervals.
pub fn merge_overlapping(sorted: &[Span]) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::new();
    for &span in sorted {
        if let Some(last) = merged.last_mut()
            && span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        merged.push(span);
    }
    merged
}

/// Remove `to_remove` (sorted, disjoint) from every span of `base` (sorted).
/// Base spans are processed independently, so two touching base spans stay two
/// separate results.
pub fn subtract_intervals(base: &[Span], to_remove: &[Span]) -> Vec<Span> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_start = b.start;
        let current_end = b.end;

        while ri < to_remove.len() && to_remove[ri].end <= current_start {
            ri += 1;
        }

        let mut j = ri;
        while j < to_remove.len() && to_remove[j].start < current_end {
            let r = &to_remove[j];
            if r.start > current_start {
                result.push(Span::new(current_start, r.start));
            }
            current_start = current_start.max(r.end);
            j += 1;
        }

        if current_start < current_end {
            result.push(Span::new(current_start, current_end));
        }
    }

    result
}

/// Clamp busy intervals to the work window, sort and merge them.
pub fn normalize_busy(busy: &[BusyInterval], work: &WorkWindow) -> Vec<Span> {
    let mut spans: Vec<Span> = busy
        .iter()
        .filter_map(|b| b.span.clamp(work.start, work.end))
        .collect();
    spans.sort_by_key(|s| s.start);
    merge_overlapping(&spans)
}

/// The windows a booking may be placed in before busy time is removed:
/// the work window itself, or each tariff day interval clipped to it.
/// Day intervals are never merged with each other, even when they touch.
pub fn allowed_bases(work: &WorkWindow, day_intervals: Option<&[Span]>) -> Vec<Span> {
    match day_intervals {
        None => work.as_span().into_iter().collect(),
        Some(intervals) => {
            let mut bases: Vec<Span> = intervals
                .iter()
                .filter_map(|i| i.clamp(work.start, work.end))
                .collect();
            bases.sort_by_key(|s| s.start);
            bases
        }
    }
}

/// Free segments of the day. A candidate slot is legal iff it lies inside one of them.
pub fn free_segments(work: &WorkWindow, busy: &[Span], day_intervals: Option<&[Span]>) -> Vec<Span> {
    let bases = allowed_bases(work, day_intervals);
    if busy.is_empty() {
        return bases;
    }
    subtract_intervals(&bases, busy)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── subtract_intervals ────────────────────────────────

    #[test]
    fn subtract_no_overlap() {
        let base = vec![Span::new(540, 600), Span::new(700, 800)];
        let remove = vec![Span::new(600, 700)];
        assert_eq!(subtract_intervals(&base, &remove), base);
    }

    #[test]
    fn subtract_full_overlap() {
        let base = vec![Span::new(600, 660)];
        let remove = vec![Span::new(540, 720)];
        assert!(subtract_intervals(&base, &remove).is_empty());
    }

    #[test]
    fn subtract_middle_punch() {
        let base = vec![Span::new(540, 1080)];
        let remove = vec![Span::new(600, 660), Span::new(900, 960)];
        assert_eq!(
            subtract_intervals(&base, &remove),
            vec![Span::new(540, 600), Span::new(660, 900), Span::new(960, 1080)]
        );
    }

    #[test]
    fn subtract_keeps_touching_bases_apart() {
        let base = vec![Span::new(540, 720), Span::new(720, 900)];
        let remove = vec![Span::new(600, 630)];
        assert_eq!(
            subtract_intervals(&base, &remove),
            vec![Span::new(540, 600), Span::new(630, 720), Span::new(720, 900)]
        );
    }

    #[test]
    fn subtract_removal_spanning_two_bases() {
        let base = vec![Span::new(540, 720), Span::new(780, 900)];
        let remove = vec![Span::new(700, 800)];
        assert_eq!(
            subtract_intervals(&base, &remove),
            vec![Span::new(540, 700), Span::new(800, 900)]
        );
    }

    // ── merge / normalize ────────────────────────────────

    #[test]
    fn merge_overlapping_adjacent() {
        let spans = vec![Span::new(600, 660), Span::new(660, 720), Span::new(800, 830)];
        assert_eq!(
            merge_overlapping(&spans),
            vec![Span::new(600, 720), Span::new(800, 830)]
        );
    }

    #[test]
    fn normalize_clamps_sorts_and_merges() {
        let busy = vec![
            BusyInterval::new(700, 760),
            BusyInterval::new(480, 570),
            BusyInterval::new(740, 800),
            BusyInterval::new(1100, 1200),
        ];
        let work = WorkWindow::new(540, 1080);
        assert_eq!(
            normalize_busy(&busy, &work),
            vec![Span::new(540, 570), Span::new(700, 800)]
        );
    }

    // ── free_segments ────────────────────────────────────

    #[test]
    fn free_segments_unconstrained() {
        let work = WorkWindow::new(540, 1080);
        let busy = vec![Span::new(600, 660)];
        assert_eq!(
            free_segments(&work, &busy, None),
            vec![Span::new(540, 600), Span::new(660, 1080)]
        );
    }

    #[test]
    fn free_segments_constrained_clip_to_work_window() {
        let work = WorkWindow::new(600, 1080);
        let intervals = vec![Span::new(780, 900), Span::new(540, 720)];
        assert_eq!(
            free_segments(&work, &[], Some(&intervals)),
            vec![Span::new(600, 720), Span::new(780, 900)]
        );
    }

    #[test]
    fn free_segments_closed_day() {
        let work = WorkWindow::closed();
        assert!(free_segments(&work, &[], None).is_empty());
        assert!(free_segments(&work, &[], Some(&[Span::new(540, 720)])).is_empty());
    }

    #[test]
    fn free_segments_empty_constraint_blocks_everything() {
        let work = WorkWindow::new(540, 1080);
        assert!(free_segments(&work, &[], Some(&[])).is_empty());
    }
}
