use crate::model::Field;
use crate::reconciler::Edit;

// ── Availability loads ──────────────────────────────────────────

/// Counter: availability loads. Labels: status (ok, failed, discarded).
pub const LOADS_TOTAL: &str = "roomslot_availability_loads_total";

/// Histogram: availability load latency in seconds.
pub const LOAD_DURATION_SECONDS: &str = "roomslot_availability_load_duration_seconds";

/// Counter: resource-days evicted from the availability cache.
pub const CACHE_EVICTIONS_TOTAL: &str = "roomslot_cache_evictions_total";

// ── Reconciliation ──────────────────────────────────────────────

/// Counter: reconciliation passes. Labels: edit.
pub const RECONCILE_PASSES_TOTAL: &str = "roomslot_reconcile_passes_total";

/// Counter: fields that turned stale. Labels: field.
pub const STALE_WARNINGS_TOTAL: &str = "roomslot_stale_warnings_total";

/// Map an Edit variant to a short label for metrics.
pub fn edit_label(edit: &Edit) -> &'static str {
    match edit {
        Edit::Start(_) => "start",
        Edit::End(_) => "end",
        Edit::Periods(_) => "periods",
        Edit::Refresh => "refresh",
    }
}

pub fn field_label(field: Field) -> &'static str {
    match field {
        Field::Start => "start",
        Field::End => "end",
        Field::Periods => "periods",
    }
}
