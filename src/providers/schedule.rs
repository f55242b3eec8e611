use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::model::*;

use super::WorkSchedule;

/// Work hours by weekday, with per-scenario overrides.
///
/// Lookup order: a closed or custom weekday entry, then the scenario's hours,
/// then the default window.
#[derive(Debug, Clone)]
pub struct WeeklySchedule {
    default: WorkWindow,
    weekdays: HashMap<Weekday, WorkWindow>,
    scenarios: HashMap<ScenarioId, WorkWindow>,
}

impl WeeklySchedule {
    pub fn new(default: WorkWindow) -> Self {
        Self {
            default,
            weekdays: HashMap::new(),
            scenarios: HashMap::new(),
        }
    }

    pub fn with_weekday(mut self, day: Weekday, window: WorkWindow) -> Self {
        self.weekdays.insert(day, window);
        self
    }

    pub fn closed_on(self, day: Weekday) -> Self {
        self.with_weekday(day, WorkWindow::closed())
    }

    pub fn with_scenario(mut self, scenario: impl Into<ScenarioId>, window: WorkWindow) -> Self {
        self.scenarios.insert(scenario.into(), window);
        self
    }
}

impl WorkSchedule for WeeklySchedule {
    fn work_window(&self, scenario: &str, date: NaiveDate) -> WorkWindow {
        if let Some(w) = self.weekdays.get(&date.weekday()) {
            return *w;
        }
        self.scenarios.get(scenario).copied().unwrap_or(self.default)
    }
}
