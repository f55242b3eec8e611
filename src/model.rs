use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::MINUTES_PER_DAY;

/// Minutes since local midnight. The only time-of-day type.
pub type Minute = i32;

pub type ResourceId = Ulid;
pub type BookingId = Ulid;
pub type TariffId = Ulid;
pub type ServiceId = Ulid;
pub type FormId = Ulid;
pub type ScenarioId = String;

/// Half-open interval `[start, end)` in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Minute,
    pub end: Minute,
}

impl Span {
    pub fn new(start: Minute, end: Minute) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn len(&self) -> Minute {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Intersection with `[lo, hi)`, or `None` when nothing is left.
    pub fn clamp(&self, lo: Minute, hi: Minute) -> Option<Span> {
        let start = self.start.max(lo);
        let end = self.end.min(hi);
        (start < end).then(|| Span::new(start, end))
    }
}

/// An existing reservation or an out-of-schedule gap. Both block identically;
/// the id is only kept so an edit flow can exclude its own booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub id: Option<BookingId>,
    pub span: Span,
}

impl BusyInterval {
    pub fn new(start: Minute, end: Minute) -> Self {
        Self {
            id: None,
            span: Span::new(start, end),
        }
    }

    pub fn booking(id: BookingId, start: Minute, end: Minute) -> Self {
        Self {
            id: Some(id),
            span: Span::new(start, end),
        }
    }
}

/// Daily window during which booking is permitted at all. `start == end` means closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    pub start: Minute,
    pub end: Minute,
}

impl WorkWindow {
    pub fn new(start: Minute, end: Minute) -> Self {
        let start = start.clamp(0, MINUTES_PER_DAY);
        let end = end.clamp(start, MINUTES_PER_DAY);
        Self { start, end }
    }

    pub fn closed() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn is_closed(&self) -> bool {
        self.start >= self.end
    }

    pub fn as_span(&self) -> Option<Span> {
        (!self.is_closed()).then(|| Span::new(self.start, self.end))
    }
}

/// Current slot length. `Frozen` means a granularity prerequisite (tariff or
/// specialist service) is still missing; `probe` is only used to size the
/// single-period start domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Active(Minute),
    Frozen { probe: Minute },
}

impl Granularity {
    pub fn minutes(&self) -> Option<Minute> {
        match self {
            Granularity::Active(m) => Some(*m),
            Granularity::Frozen { .. } => None,
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, Granularity::Frozen { .. })
    }

    /// Step used for grid enumeration, frozen or not.
    pub fn grid_step(&self) -> Minute {
        match self {
            Granularity::Active(m) => *m,
            Granularity::Frozen { probe } => *probe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Start,
    End,
    Periods,
}

/// The mutable triple. When all three are set, `end - start == periods * granularity`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSelection {
    pub start: Option<Minute>,
    pub end: Option<Minute>,
    pub periods: Option<u32>,
}

impl SlotSelection {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.periods.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some() && self.periods.is_some()
    }

    /// Coherence holds trivially while any field is unset.
    pub fn is_coherent(&self, step: Minute) -> bool {
        match (self.start, self.end, self.periods) {
            (Some(s), Some(e), Some(p)) => i64::from(e) - i64::from(s) == i64::from(p) * i64::from(step),
            _ => true,
        }
    }
}

/// Cache key for one resource-day of availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayKey {
    pub resource: ResourceId,
    pub date: NaiveDate,
    /// Booking ignored while editing it.
    pub exclude: Option<BookingId>,
}

impl DayKey {
    pub fn new(resource: ResourceId, date: NaiveDate) -> Self {
        Self {
            resource,
            date,
            exclude: None,
        }
    }

    pub fn excluding(mut self, booking: Option<BookingId>) -> Self {
        self.exclude = booking;
        self
    }
}

/// A finished, coherent selection handed to submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSlot {
    pub date: NaiveDate,
    pub start: Minute,
    pub end: Minute,
    pub periods: u32,
    pub granularity: Minute,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let s = Span::new(540, 600);
        assert_eq!(s.len(), 60);
        assert!(s.contains_span(&Span::new(550, 600)));
        assert!(!s.contains_span(&Span::new(530, 560)));
    }

    #[test]
    fn span_overlap_is_half_open() {
        let a = Span::new(600, 660);
        assert!(a.overlaps(&Span::new(630, 690)));
        assert!(!a.overlaps(&Span::new(660, 720)));
        assert!(!a.overlaps(&Span::new(540, 600)));
    }

    #[test]
    fn span_clamp() {
        let s = Span::new(500, 700);
        assert_eq!(s.clamp(540, 1080), Some(Span::new(540, 700)));
        assert_eq!(s.clamp(700, 1080), None);
    }

    #[test]
    fn work_window_normalizes() {
        let w = WorkWindow::new(-10, 2000);
        assert_eq!(w, WorkWindow { start: 0, end: MINUTES_PER_DAY });
        let inverted = WorkWindow::new(600, 540);
        assert!(inverted.is_closed());
        assert_eq!(inverted.as_span(), None);
    }

    #[test]
    fn selection_coherence() {
        let sel = SlotSelection {
            start: Some(600),
            end: Some(720),
            periods: Some(2),
        };
        assert!(sel.is_complete());
        assert!(sel.is_coherent(60));
        assert!(!sel.is_coherent(30));

        let partial = SlotSelection {
            start: Some(600),
            end: None,
            periods: Some(3),
        };
        assert!(partial.is_coherent(60));
        assert!(!partial.is_empty());

        let extreme = SlotSelection {
            start: Some(Minute::MIN),
            end: Some(Minute::MAX),
            periods: Some(u32::MAX),
        };
        assert!(!extreme.is_coherent(60));
    }

    #[test]
    fn granularity_step() {
        assert_eq!(Granularity::Active(30).minutes(), Some(30));
        let frozen = Granularity::Frozen { probe: 60 };
        assert!(frozen.is_frozen());
        assert_eq!(frozen.minutes(), None);
        assert_eq!(frozen.grid_step(), 60);
    }
}
