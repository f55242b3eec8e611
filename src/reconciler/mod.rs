mod context;
mod transition;
mod warnings;

pub use context::{Providers, ReconcilerContext, SlotView};
pub use transition::{Domains, Edit, Outcome, SlotState, apply, domains_for};
pub use warnings::{WarningFlagger, Warnings};

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::SlotError;
use crate::index::LoadStatus;
use crate::model::*;
use crate::notify::{NotifyHub, SlotNotice};

/// Owner of one form's slot selection.
///
/// Every entry point runs a full reconciliation pass synchronously before it
/// returns. The only asynchronous step is reloading availability; while a load
/// is in flight the reconciler keeps working on the cached data.
pub struct Reconciler {
    id: FormId,
    ctx: ReconcilerContext,
    providers: Providers,
    hub: Option<Arc<NotifyHub>>,
    view: SlotView,
    outcome: Outcome,
}

impl Reconciler {
    /// Empty selection for a new booking.
    pub fn new(id: FormId, ctx: ReconcilerContext, providers: Providers) -> Result<Self, SlotError> {
        Self::seeded(id, ctx, providers, SlotState::default())
    }

    /// Selection pre-seeded from an existing booking. Periods are derived when
    /// the booking length is a whole number of periods.
    pub fn edit_existing(
        id: FormId,
        mut ctx: ReconcilerContext,
        providers: Providers,
        booking: BookingId,
        start: Minute,
        end: Minute,
    ) -> Result<Self, SlotError> {
        ctx.editing = Some(booking);
        let granularity = providers
            .granularity
            .current(&ctx.scenario, ctx.tariff, ctx.service)?;
        let mut state = SlotState::default();
        if let Some(step) = granularity.minutes() {
            let len = end.saturating_sub(start);
            state.selection = SlotSelection {
                start: Some(start),
                end: Some(end),
                periods: (len > 0 && len % step == 0).then(|| (len / step) as u32),
            };
            state.derived_step = Some(step);
        } else {
            state.selection.start = Some(start);
        }
        Self::seeded(id, ctx, providers, state)
    }

    fn seeded(
        id: FormId,
        ctx: ReconcilerContext,
        providers: Providers,
        state: SlotState,
    ) -> Result<Self, SlotError> {
        let view = providers.view(&ctx)?;
        let outcome = apply(&state, Edit::Refresh, &view);
        Ok(Self {
            id,
            ctx,
            providers,
            hub: None,
            view,
            outcome,
        })
    }

    /// Publish domain/selection/warning changes to `hub` under this form's id.
    pub fn with_notify(mut self, hub: Arc<NotifyHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn id(&self) -> FormId {
        self.id
    }

    pub fn context(&self) -> &ReconcilerContext {
        &self.ctx
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn selection(&self) -> SlotSelection {
        self.outcome.state.selection
    }

    pub fn domains(&self) -> &Domains {
        &self.outcome.domains
    }

    pub fn warnings(&self) -> Warnings {
        self.outcome.warnings
    }

    pub fn granularity(&self) -> Granularity {
        self.view.granularity
    }

    // ── Field edits ──────────────────────────────────────────

    pub fn set_start(&mut self, start: Option<Minute>) -> &Outcome {
        self.dispatch(Edit::Start(start))
    }

    pub fn set_end(&mut self, end: Option<Minute>) -> &Outcome {
        self.dispatch(Edit::End(end))
    }

    pub fn set_periods(&mut self, periods: Option<u32>) -> &Outcome {
        self.dispatch(Edit::Periods(periods))
    }

    // ── Context changes ──────────────────────────────────────

    /// Switch date using whatever availability is cached for it.
    pub fn set_date(&mut self, date: NaiveDate) -> Result<&Outcome, SlotError> {
        info!("form {}: date {} -> {date}", self.id, self.ctx.date);
        let ctx = ReconcilerContext {
            date,
            ..self.ctx.clone()
        };
        self.switch_context(ctx)
    }

    /// Switch date and force a fresh availability load for it.
    pub async fn change_date(&mut self, date: NaiveDate) -> Result<&Outcome, SlotError> {
        self.set_date(date)?;
        self.reload(true).await
    }

    pub fn set_tariff(&mut self, tariff: Option<TariffId>) -> Result<&Outcome, SlotError> {
        info!("form {}: tariff {:?} -> {tariff:?}", self.id, self.ctx.tariff);
        let ctx = self.ctx.clone().with_tariff(tariff);
        self.switch_context(ctx)
    }

    pub fn set_service(&mut self, service: Option<ServiceId>) -> Result<&Outcome, SlotError> {
        info!("form {}: service {:?} -> {service:?}", self.id, self.ctx.service);
        let ctx = self.ctx.clone().with_service(service);
        self.switch_context(ctx)
    }

    /// Re-read every provider and re-validate the held selection.
    pub fn refresh(&mut self) -> Result<&Outcome, SlotError> {
        self.view = self.providers.view(&self.ctx)?;
        Ok(self.dispatch(Edit::Refresh))
    }

    /// Context and view are replaced together; a rejected context leaves both untouched.
    fn switch_context(&mut self, ctx: ReconcilerContext) -> Result<&Outcome, SlotError> {
        let view = match self.providers.view(&ctx) {
            Ok(view) => view,
            Err(e) => {
                warn!("form {}: context change rejected: {e}", self.id);
                return Err(e);
            }
        };
        self.ctx = ctx;
        self.view = view;
        Ok(self.dispatch(Edit::Refresh))
    }

    /// Load availability for the current day, then refresh.
    ///
    /// A failed load still refreshes (the day turns closed) before the error
    /// is returned to the caller.
    pub async fn reload(&mut self, force: bool) -> Result<&Outcome, SlotError> {
        let loaded = self.providers.index.load(self.ctx.day_key(), force).await;
        if let Ok(LoadStatus::Superseded) = loaded {
            debug!("form {}: reload superseded by a newer request", self.id);
        }
        self.refresh()?;
        loaded?;
        Ok(&self.outcome)
    }

    /// The booked slot, once the triple is complete and nothing is stale.
    pub fn submission(&self) -> Result<BookedSlot, SlotError> {
        let Some(step) = self.view.granularity.minutes() else {
            return Err(SlotError::NotSubmittable("duration prerequisite not chosen"));
        };
        let SlotSelection {
            start: Some(start),
            end: Some(end),
            periods: Some(periods),
        } = self.outcome.state.selection
        else {
            return Err(SlotError::NotSubmittable("selection incomplete"));
        };
        if self.outcome.warnings.start_stale {
            return Err(SlotError::NotSubmittable("start is no longer available"));
        }
        if self.outcome.warnings.end_stale {
            return Err(SlotError::NotSubmittable("end is no longer available"));
        }
        Ok(BookedSlot {
            date: self.ctx.date,
            start,
            end,
            periods,
            granularity: step,
        })
    }

    fn dispatch(&mut self, edit: Edit) -> &Outcome {
        let next = apply(&self.outcome.state, edit, &self.view);
        metrics::counter!(
            crate::observability::RECONCILE_PASSES_TOTAL,
            "edit" => crate::observability::edit_label(&edit)
        )
        .increment(1);
        debug!(
            "form {}: {edit:?} -> {:?} warnings={:?}",
            self.id, next.state.selection, next.warnings
        );
        self.publish(&next);
        self.outcome = next;
        &self.outcome
    }

    fn publish(&self, next: &Outcome) {
        let prev = &self.outcome;
        if next.warnings.start_stale && !prev.warnings.start_stale {
            metrics::counter!(crate::observability::STALE_WARNINGS_TOTAL, "field" => crate::observability::field_label(Field::Start)).increment(1);
        }
        if next.warnings.end_stale && !prev.warnings.end_stale {
            metrics::counter!(crate::observability::STALE_WARNINGS_TOTAL, "field" => crate::observability::field_label(Field::End)).increment(1);
        }

        let Some(hub) = &self.hub else { return };
        if next.domains != prev.domains {
            hub.send(self.id, SlotNotice::DomainsChanged(next.domains.clone()));
        }
        if next.state.selection != prev.state.selection {
            hub.send(self.id, SlotNotice::SelectionChanged(next.state.selection));
        }
        if next.warnings != prev.warnings {
            hub.send(self.id, SlotNotice::WarningsChanged(next.warnings));
        }
    }
}
