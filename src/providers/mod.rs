//! Collaborators the reconciler pulls context from: slot length, tariff day
//! intervals, and the scenario work window.

mod catalog;
mod day_intervals;
mod schedule;

pub use catalog::{CatalogGranularity, ServiceCatalog, SpecialistService, Tariff, TariffCatalog};
pub use day_intervals::{parse_day_intervals, parse_day_intervals_str};
pub use schedule::WeeklySchedule;

use chrono::NaiveDate;

use crate::error::SlotError;
use crate::limits::MAX_GRANULARITY;
use crate::model::*;

/// Source of the current slot length.
///
/// Implementations must reject non-positive values themselves; the reconciler
/// assumes every `Granularity` it receives is positive.
pub trait GranularityProvider: Send + Sync {
    fn current(
        &self,
        scenario: &str,
        tariff: Option<TariffId>,
        service: Option<ServiceId>,
    ) -> Result<Granularity, SlotError>;
}

/// Tariff-defined allowed windows. `None` means unconstrained.
pub trait ConstraintProvider: Send + Sync {
    fn day_intervals(&self, tariff: Option<TariffId>, date: NaiveDate) -> Option<Vec<Span>>;
}

pub trait WorkSchedule: Send + Sync {
    fn work_window(&self, scenario: &str, date: NaiveDate) -> WorkWindow;
}

/// Provider-boundary check for slot lengths.
pub fn checked_granularity(minutes: Minute) -> Result<Minute, SlotError> {
    if minutes <= 0 || minutes > MAX_GRANULARITY {
        return Err(SlotError::InvalidGranularity(minutes));
    }
    Ok(minutes)
}

/// No tariff constraints at all.
pub struct Unconstrained;

impl ConstraintProvider for Unconstrained {
    fn day_intervals(&self, _tariff: Option<TariffId>, _date: NaiveDate) -> Option<Vec<Span>> {
        None
    }
}

/// One granularity for every scenario; handy for single-scenario embedders.
pub struct FixedGranularity(pub Minute);

impl GranularityProvider for FixedGranularity {
    fn current(
        &self,
        _scenario: &str,
        _tariff: Option<TariffId>,
        _service: Option<ServiceId>,
    ) -> Result<Granularity, SlotError> {
        checked_granularity(self.0).map(Granularity::Active)
    }
}
