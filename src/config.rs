use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SlotError;
use crate::model::Minute;
use crate::providers::checked_granularity;

const DEFAULT_NOTIFY_CAPACITY: usize = 64;
const DEFAULT_MAX_CACHED_DAYS: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Buffered notices per form before slow consumers start lagging.
    pub notify_capacity: usize,
    /// Resource-days kept in the availability cache.
    pub max_cached_days: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
            max_cached_days: DEFAULT_MAX_CACHED_DAYS,
        }
    }
}

impl EngineConfig {
    /// Entry point for embedders and the bench. Reads `ROOMSLOT_*`
    /// variables; missing or unparseable values keep defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let notify_capacity = lookup("ROOMSLOT_NOTIFY_CAPACITY")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_NOTIFY_CAPACITY);
        let max_cached_days = lookup("ROOMSLOT_MAX_CACHED_DAYS")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_MAX_CACHED_DAYS);
        Self {
            notify_capacity,
            max_cached_days,
        }
    }
}

/// A booking scenario: what the slot length depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    /// Slot length when nothing more specific applies; also the frozen-state probe.
    pub default_min_duration: Minute,
    #[serde(default)]
    pub requires_tariff: bool,
    #[serde(default)]
    pub requires_service: bool,
    /// Tariff-bearing variant where a fixed-duration service sets the slot length.
    #[serde(default)]
    pub simplified: bool,
}

impl Scenario {
    pub fn new(id: impl Into<String>, default_min_duration: Minute) -> Self {
        Self {
            id: id.into(),
            default_min_duration,
            requires_tariff: false,
            requires_service: false,
            simplified: false,
        }
    }

    pub fn requiring_tariff(mut self) -> Self {
        self.requires_tariff = true;
        self
    }

    pub fn requiring_service(mut self) -> Self {
        self.requires_service = true;
        self
    }

    pub fn simplified(mut self) -> Self {
        self.simplified = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: HashMap<String, Scenario>,
}

impl ScenarioCatalog {
    pub fn new(scenarios: impl IntoIterator<Item = Scenario>) -> Result<Self, SlotError> {
        let mut map = HashMap::new();
        for sc in scenarios {
            checked_granularity(sc.default_min_duration)?;
            if map.insert(sc.id.clone(), sc).is_some() {
                return Err(SlotError::InvalidConfig("duplicate scenario id".into()));
            }
        }
        Ok(Self { scenarios: map })
    }

    /// Parse a JSON array of scenarios.
    pub fn from_json(json: &str) -> Result<Self, SlotError> {
        let list: Vec<Scenario> =
            serde_json::from_str(json).map_err(|e| SlotError::InvalidConfig(e.to_string()))?;
        Self::new(list)
    }

    pub fn get(&self, id: &str) -> Result<&Scenario, SlotError> {
        self.scenarios
            .get(id)
            .ok_or_else(|| SlotError::UnknownScenario(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_defaults_and_overrides() {
        let cfg = EngineConfig::from_lookup(|_| None);
        assert_eq!(cfg, EngineConfig::default());

        let cfg = EngineConfig::from_lookup(|k| match k {
            "ROOMSLOT_NOTIFY_CAPACITY" => Some("8".into()),
            "ROOMSLOT_MAX_CACHED_DAYS" => Some("not a number".into()),
            _ => None,
        });
        assert_eq!(cfg.notify_capacity, 8);
        assert_eq!(cfg.max_cached_days, DEFAULT_MAX_CACHED_DAYS);

        let cfg = EngineConfig::from_lookup(|_| Some("0".into()));
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn catalog_from_json() {
        let json = r#"[
            {"id": "room", "default_min_duration": 60},
            {"id": "tariff_room", "default_min_duration": 30, "requires_tariff": true},
            {"id": "specialist", "default_min_duration": 15, "requires_service": true, "simplified": true}
        ]"#;
        let catalog = ScenarioCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.get("tariff_room").unwrap().requires_tariff);
        assert!(catalog.get("specialist").unwrap().simplified);
        assert_eq!(
            catalog.get("missing"),
            Err(SlotError::UnknownScenario("missing".into()))
        );
    }

    #[test]
    fn catalog_rejects_bad_scenarios() {
        let zero = r#"[{"id": "room", "default_min_duration": 0}]"#;
        assert_eq!(
            ScenarioCatalog::from_json(zero).unwrap_err(),
            SlotError::InvalidGranularity(0)
        );
        let dup = vec![Scenario::new("a", 30), Scenario::new("a", 60)];
        assert!(ScenarioCatalog::new(dup).is_err());
        assert!(ScenarioCatalog::from_json("{").is_err());
    }
}
