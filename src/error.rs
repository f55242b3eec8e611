use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    InvalidGranularity(i32),
    UnknownScenario(String),
    UnknownTariff(Ulid),
    UnknownService(Ulid),
    LoadFailed(String),
    LimitExceeded(&'static str),
    NotSubmittable(&'static str),
    InvalidConfig(String),
}

impl std::fmt::Display for SlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotError::InvalidGranularity(m) => {
                write!(f, "granularity must be a positive number of minutes, got {m}")
            }
            SlotError::UnknownScenario(id) => write!(f, "unknown scenario: {id}"),
            SlotError::UnknownTariff(id) => write!(f, "unknown tariff: {id}"),
            SlotError::UnknownService(id) => write!(f, "unknown specialist service: {id}"),
            SlotError::LoadFailed(e) => write!(f, "availability load failed: {e}"),
            SlotError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            SlotError::NotSubmittable(why) => write!(f, "selection cannot be submitted: {why}"),
            SlotError::InvalidConfig(e) => write!(f, "invalid config: {e}"),
        }
    }
}

impl std::error::Error for SlotError {}
