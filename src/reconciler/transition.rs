use serde::Serialize;
use tracing::debug;

use crate::model::*;
use crate::slots::SlotGrid;

use super::context::SlotView;
use super::warnings::{Warnings, WarningFlagger};

/// A single user edit or a context refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum Edit {
    Start(Option<Minute>),
    End(Option<Minute>),
    Periods(Option<u32>),
    /// Date, tariff, granularity or availability changed underneath the selection.
    Refresh,
}

impl Edit {
    pub fn field(&self) -> Option<Field> {
        match self {
            Edit::Start(_) => Some(Field::Start),
            Edit::End(_) => Some(Field::End),
            Edit::Periods(_) => Some(Field::Periods),
            Edit::Refresh => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotState {
    pub selection: SlotSelection,
    /// Granularity `end`/`periods` were computed under.
    pub derived_step: Option<Minute>,
    pub last_edited: Option<Field>,
}

/// Legal values per field, ascending. Recomputed on every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Domains {
    pub start_options: Vec<Minute>,
    pub end_options: Vec<Minute>,
    pub periods_options: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub state: SlotState,
    pub domains: Domains,
    pub warnings: Warnings,
}

/// Pure state transition: `(state, edit, view) -> (state', domains, warnings)`.
///
/// The edited field is never overwritten; only the other two are derived,
/// auto-filled or cleared. Held values that become illegal through a refresh
/// are kept and reported through the warnings instead.
pub fn apply(state: &SlotState, edit: Edit, view: &SlotView) -> Outcome {
    let mut next = *state;
    if let Some(field) = edit.field() {
        next.last_edited = Some(field);
    }
    let edit = match edit {
        Edit::Periods(Some(0)) => Edit::Periods(None),
        other => other,
    };

    match view.granularity {
        Granularity::Frozen { .. } => {
            next.selection.end = None;
            next.selection.periods = None;
            next.derived_step = None;
            if let Edit::Start(start) = edit {
                next.selection.start = start;
            }
        }
        Granularity::Active(step) => {
            if next.derived_step.is_some_and(|d| d != step) {
                debug!("granularity changed to {step}, clearing end and periods");
                next.selection.end = None;
                next.selection.periods = None;
            }

            let grid = view.grid();
            let sel = &mut next.selection;
            match edit {
                Edit::Start(Some(s)) => on_start(sel, s, grid),
                Edit::Start(None) => sel.start = None,
                Edit::End(Some(e)) => on_end(sel, e, grid),
                Edit::End(None) => sel.end = None,
                Edit::Periods(Some(p)) => on_periods(sel, p, grid),
                Edit::Periods(None) => sel.periods = None,
                Edit::Refresh => on_refresh(sel, grid),
            }

            if !sel.is_coherent(step) {
                // Only reachable from an externally built state.
                debug!("incoherent selection {sel:?}, dropping periods");
                sel.periods = None;
            }
            next.derived_step = (sel.end.is_some() || sel.periods.is_some()).then_some(step);
        }
    }

    let domains = domains_for(&next.selection, view);
    let warnings = WarningFlagger::flag(&next.selection, &domains);
    Outcome {
        state: next,
        domains,
        warnings,
    }
}

/// Domains for the current selection.
pub fn domains_for(sel: &SlotSelection, view: &SlotView) -> Domains {
    let grid = view.grid();
    match view.granularity {
        Granularity::Frozen { .. } => Domains {
            start_options: grid.start_domain(Some(1), None),
            end_options: Vec::new(),
            periods_options: Vec::new(),
        },
        Granularity::Active(_) => Domains {
            start_options: grid.start_domain(sel.periods, sel.end),
            end_options: grid.end_domain(sel.periods, sel.start),
            periods_options: grid.periods_domain(sel.start, sel.end),
        },
    }
}

/// Nearest whole period count from `from` to `to`; 0 when `to` is not after `from`.
fn periods_between(from: Minute, to: Minute, step: Minute) -> u32 {
    let diff = to.saturating_sub(from);
    if diff <= 0 {
        return 0;
    }
    (diff.saturating_add(step / 2) / step) as u32
}

/// Callers bound `periods` by a max-periods lookup first, so the product stays within a day.
fn span_of(periods: u32, step: Minute) -> Minute {
    periods as Minute * step
}

fn on_start(sel: &mut SlotSelection, s: Minute, grid: &SlotGrid) {
    let step = grid.step();
    let max = grid.max_periods_forward(s);
    sel.start = Some(s);

    if let Some(p) = sel.periods.filter(|&p| p <= max) {
        sel.end = Some(s + span_of(p, step));
        return;
    }

    if let Some(e) = sel.end {
        let p = periods_between(s, e, step);
        if p >= 1 && p <= max && e == s + span_of(p, step) {
            sel.periods = Some(p);
            return;
        }
    }

    sel.end = None;
    sel.periods = None;
    if max == 1 {
        sel.periods = Some(1);
        sel.end = Some(s + step);
    }
}

fn on_end(sel: &mut SlotSelection, e: Minute, grid: &SlotGrid) {
    let step = grid.step();
    let max = grid.max_periods_backward(e);
    sel.end = Some(e);

    if let Some(p) = sel.periods.filter(|&p| p <= max) {
        sel.start = Some(e - span_of(p, step));
        return;
    }

    if let Some(s) = sel.start {
        let p = periods_between(s, e, step);
        if p >= 1 && p <= max && s == e - span_of(p, step) {
            sel.periods = Some(p);
            return;
        }
    }

    sel.start = None;
    sel.periods = None;
    if max == 1 {
        sel.periods = Some(1);
        sel.start = Some(e - step);
    }
}

/// Start anchors when both boundaries are held. An anchor that cannot carry the
/// new duration is cleared together with the boundary derived from it.
fn on_periods(sel: &mut SlotSelection, p: u32, grid: &SlotGrid) {
    let step = grid.step();
    sel.periods = Some(p);

    if let Some(s) = sel.start {
        if p <= grid.max_periods_forward(s) {
            sel.end = Some(s + span_of(p, step));
        } else {
            sel.start = None;
            sel.end = None;
        }
    } else if let Some(e) = sel.end {
        if p <= grid.max_periods_backward(e) {
            sel.start = Some(e - span_of(p, step));
        } else {
            sel.start = None;
            sel.end = None;
        }
    }
}

/// Never clears a held value; only fills the single-option case.
fn on_refresh(sel: &mut SlotSelection, grid: &SlotGrid) {
    let step = grid.step();
    match (sel.start, sel.end, sel.periods) {
        (Some(s), None, None) if grid.max_periods_forward(s) == 1 => {
            sel.periods = Some(1);
            sel.end = Some(s + step);
        }
        (None, Some(e), None) if grid.max_periods_backward(e) == 1 => {
            sel.periods = Some(1);
            sel.start = Some(e - step);
        }
        _ => {}
    }
}
