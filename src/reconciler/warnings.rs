use serde::Serialize;

use crate::model::SlotSelection;

use super::transition::Domains;

/// Non-blocking staleness flags. A stale field keeps its value but blocks submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Warnings {
    pub start_stale: bool,
    pub end_stale: bool,
}

impl Warnings {
    pub fn any(&self) -> bool {
        self.start_stale || self.end_stale
    }
}

pub struct WarningFlagger;

impl WarningFlagger {
    /// A held value is stale when it is not a member of its fresh domain.
    pub fn flag(sel: &SlotSelection, domains: &Domains) -> Warnings {
        Warnings {
            start_stale: sel
                .start
                .is_some_and(|s| domains.start_options.binary_search(&s).is_err()),
            end_stale: sel
                .end
                .is_some_and(|e| domains.end_options.binary_search(&e).is_err()),
        }
    }
}
