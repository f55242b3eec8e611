use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Scenario, ScenarioCatalog};
use crate::error::SlotError;
use crate::model::*;

use super::day_intervals::parse_day_intervals;
use super::{ConstraintProvider, GranularityProvider, checked_granularity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub id: TariffId,
    pub name: Option<String>,
    /// Slot length imposed by the tariff, if any.
    pub base_duration: Option<Minute>,
    /// Raw day-interval metadata; parsed lazily per date.
    pub day_intervals: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistService {
    pub id: ServiceId,
    pub name: Option<String>,
    pub duration: Minute,
}

#[derive(Default)]
pub struct TariffCatalog {
    tariffs: DashMap<TariffId, Tariff>,
}

impl TariffCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tariff: Tariff) {
        self.tariffs.insert(tariff.id, tariff);
    }

    pub fn get(&self, id: &TariffId) -> Option<Tariff> {
        self.tariffs.get(id).map(|e| e.value().clone())
    }

    pub fn remove(&self, id: &TariffId) -> Option<Tariff> {
        self.tariffs.remove(id).map(|(_, t)| t)
    }
}

impl ConstraintProvider for TariffCatalog {
    /// Bad metadata never fails closed: it is logged and treated as unconstrained.
    fn day_intervals(&self, tariff: Option<TariffId>, date: NaiveDate) -> Option<Vec<Span>> {
        let id = tariff?;
        let Some(entry) = self.tariffs.get(&id) else {
            debug!("day intervals: unknown tariff {id}, treating as unconstrained");
            return None;
        };
        let payload = entry.day_intervals.as_ref()?;
        match parse_day_intervals(payload, date.weekday()) {
            Ok(spans) => Some(spans),
            Err(e) => {
                warn!("tariff {id}: ignoring malformed day intervals: {e}");
                None
            }
        }
    }
}

#[derive(Default)]
pub struct ServiceCatalog {
    services: DashMap<ServiceId, SpecialistService>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, service: SpecialistService) {
        self.services.insert(service.id, service);
    }

    pub fn get(&self, id: &ServiceId) -> Option<SpecialistService> {
        self.services.get(id).map(|e| e.value().clone())
    }
}

/// Resolves the slot length from scenario rules plus tariff/service catalogs.
///
/// Precedence: tariff base duration (scenario requires a tariff), then service
/// fixed duration (scenario requires a service), then the scenario default. In
/// the simplified variant with a required service, the service duration wins.
/// A required prerequisite that is not chosen yields `Granularity::Frozen`.
pub struct CatalogGranularity {
    scenarios: Arc<ScenarioCatalog>,
    tariffs: Arc<TariffCatalog>,
    services: Arc<ServiceCatalog>,
}

impl CatalogGranularity {
    pub fn new(
        scenarios: Arc<ScenarioCatalog>,
        tariffs: Arc<TariffCatalog>,
        services: Arc<ServiceCatalog>,
    ) -> Self {
        Self {
            scenarios,
            tariffs,
            services,
        }
    }

    fn service_duration(&self, id: ServiceId) -> Result<Minute, SlotError> {
        self.services
            .get(&id)
            .map(|s| s.duration)
            .ok_or(SlotError::UnknownService(id))
    }

    fn tariff_duration(&self, id: TariffId) -> Result<Option<Minute>, SlotError> {
        self.tariffs
            .get(&id)
            .map(|t| t.base_duration)
            .ok_or(SlotError::UnknownTariff(id))
    }

    fn resolve(
        &self,
        sc: &Scenario,
        tariff: Option<TariffId>,
        service: Option<ServiceId>,
    ) -> Result<Granularity, SlotError> {
        let frozen = Granularity::Frozen {
            probe: sc.default_min_duration,
        };

        if sc.simplified && sc.requires_service {
            if sc.requires_tariff && tariff.is_none() {
                return Ok(frozen);
            }
            return match service {
                Some(id) => Ok(Granularity::Active(self.service_duration(id)?)),
                None => Ok(frozen),
            };
        }

        if sc.requires_tariff {
            match tariff {
                None => return Ok(frozen),
                Some(id) => {
                    if let Some(d) = self.tariff_duration(id)? {
                        return Ok(Granularity::Active(d));
                    }
                }
            }
        }

        if sc.requires_service {
            return match service {
                Some(id) => Ok(Granularity::Active(self.service_duration(id)?)),
                None => Ok(frozen),
            };
        }

        Ok(Granularity::Active(sc.default_min_duration))
    }
}

impl GranularityProvider for CatalogGranularity {
    fn current(
        &self,
        scenario: &str,
        tariff: Option<TariffId>,
        service: Option<ServiceId>,
    ) -> Result<Granularity, SlotError> {
        let sc = self.scenarios.get(scenario)?;
        let g = self.resolve(sc, tariff, service)?;
        checked_granularity(g.grid_step())?;
        Ok(g)
    }
}
