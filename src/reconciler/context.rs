use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::SlotError;
use crate::index::{AvailabilityIndex, DayData};
use crate::model::*;
use crate::providers::{ConstraintProvider, GranularityProvider, WorkSchedule};
use crate::slots::{SlotGrid, normalize_busy};

/// Everything a form's slot selection depends on besides the triple itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerContext {
    pub scenario: ScenarioId,
    pub resource: ResourceId,
    pub date: NaiveDate,
    pub tariff: Option<TariffId>,
    pub service: Option<ServiceId>,
    /// Booking being edited; its own interval does not block.
    pub editing: Option<BookingId>,
}

impl ReconcilerContext {
    pub fn new(scenario: impl Into<ScenarioId>, resource: ResourceId, date: NaiveDate) -> Self {
        Self {
            scenario: scenario.into(),
            resource,
            date,
            tariff: None,
            service: None,
            editing: None,
        }
    }

    pub fn with_tariff(mut self, tariff: Option<TariffId>) -> Self {
        self.tariff = tariff;
        self
    }

    pub fn with_service(mut self, service: Option<ServiceId>) -> Self {
        self.service = service;
        self
    }

    pub fn day_key(&self) -> DayKey {
        DayKey::new(self.resource, self.date).excluding(self.editing)
    }
}

/// Injected collaborators, shared by every reconciler of a session.
#[derive(Clone)]
pub struct Providers {
    pub granularity: Arc<dyn GranularityProvider>,
    pub constraints: Arc<dyn ConstraintProvider>,
    pub schedule: Arc<dyn WorkSchedule>,
    pub index: Arc<AvailabilityIndex>,
}

impl Providers {
    /// Snapshot the providers for `ctx`. Missing or failed availability data
    /// yields a closed day.
    pub fn view(&self, ctx: &ReconcilerContext) -> Result<SlotView, SlotError> {
        let granularity = self
            .granularity
            .current(&ctx.scenario, ctx.tariff, ctx.service)?;
        let work = self.schedule.work_window(&ctx.scenario, ctx.date);
        let day_intervals = self.constraints.day_intervals(ctx.tariff, ctx.date);

        Ok(match self.index.snapshot(&ctx.day_key()) {
            Some(DayData::Busy(busy)) => SlotView::new(work, &busy, day_intervals.as_deref(), granularity),
            Some(DayData::Failed) | None => SlotView::closed(granularity),
        })
    }
}

/// Provider snapshot a single reconciliation pass runs against.
#[derive(Debug, Clone)]
pub struct SlotView {
    pub granularity: Granularity,
    grid: SlotGrid,
}

impl SlotView {
    pub fn new(
        work: WorkWindow,
        busy: &[BusyInterval],
        day_intervals: Option<&[Span]>,
        granularity: Granularity,
    ) -> Self {
        let busy = normalize_busy(busy, &work);
        Self {
            granularity,
            grid: SlotGrid::new(work, &busy, day_intervals, granularity.grid_step()),
        }
    }

    pub fn closed(granularity: Granularity) -> Self {
        Self::new(WorkWindow::closed(), &[], None, granularity)
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }
}
