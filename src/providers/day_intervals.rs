use std::collections::HashMap;

use chrono::Weekday;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SlotError;
use crate::limits::{MAX_DAY_INTERVALS, MINUTES_PER_DAY};
use crate::model::*;

/// Either whole minutes or `"HH:MM"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Bound {
    Minutes(Minute),
    Clock(String),
}

#[derive(Debug, Deserialize)]
struct RawInterval {
    start: Bound,
    end: Bound,
}

/// A list applies to every day; an object is keyed by weekday (`"mon"`, `"tuesday"`, ...).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Daily(Vec<RawInterval>),
    Weekly(HashMap<String, Vec<RawInterval>>),
}

fn bad(msg: impl Into<String>) -> SlotError {
    SlotError::InvalidConfig(format!("day intervals: {}", msg.into()))
}

fn parse_clock(s: &str) -> Result<Minute, SlotError> {
    let (h, m) = s.trim().split_once(':').ok_or_else(|| bad(format!("bad time {s:?}")))?;
    let h: Minute = h.parse().map_err(|_| bad(format!("bad hour in {s:?}")))?;
    let m: Minute = m.parse().map_err(|_| bad(format!("bad minute in {s:?}")))?;
    if !(0..=24).contains(&h) || !(0..60).contains(&m) {
        return Err(bad(format!("time out of range {s:?}")));
    }
    Ok(h * 60 + m)
}

fn bound_minutes(b: &Bound) -> Result<Minute, SlotError> {
    match b {
        Bound::Minutes(m) => Ok(*m),
        Bound::Clock(s) => parse_clock(s),
    }
}

fn to_spans(raw: &[RawInterval]) -> Result<Vec<Span>, SlotError> {
    if raw.len() > MAX_DAY_INTERVALS {
        return Err(SlotError::LimitExceeded("too many day intervals"));
    }
    let mut spans = Vec::with_capacity(raw.len());
    for r in raw {
        let start = bound_minutes(&r.start)?;
        let end = bound_minutes(&r.end)?;
        if start < 0 || end > MINUTES_PER_DAY || start >= end {
            return Err(bad(format!("invalid interval [{start}, {end})")));
        }
        spans.push(Span::new(start, end));
    }
    spans.sort_by_key(|s| s.start);
    if spans.windows(2).any(|w| w[0].end > w[1].start) {
        return Err(bad("intervals overlap"));
    }
    Ok(spans)
}

/// Parse a tariff day-interval payload for one weekday.
///
/// A weekly payload without an entry for `weekday` yields an empty list: the
/// tariff does not operate that day.
pub fn parse_day_intervals(payload: &Value, weekday: Weekday) -> Result<Vec<Span>, SlotError> {
    let parsed = Payload::deserialize(payload).map_err(|e| bad(e.to_string()))?;
    match parsed {
        Payload::Daily(raw) => to_spans(&raw),
        Payload::Weekly(days) => {
            let mut selected = None;
            for (key, raw) in &days {
                let day: Weekday = key
                    .parse()
                    .map_err(|_| bad(format!("unknown weekday {key:?}")))?;
                if day == weekday {
                    selected = Some(raw);
                }
            }
            selected.map_or_else(|| Ok(Vec::new()), |raw| to_spans(raw))
        }
    }
}

pub fn parse_day_intervals_str(payload: &str, weekday: Weekday) -> Result<Vec<Span>, SlotError> {
    let value: Value = serde_json::from_str(payload).map_err(|e| bad(e.to_string()))?;
    parse_day_intervals(&value, weekday)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn daily_clock_strings() {
        let payload = json!([
            {"start": "13:00", "end": "15:00"},
            {"start": "09:00", "end": "12:00"}
        ]);
        let spans = parse_day_intervals(&payload, Weekday::Mon).unwrap();
        assert_eq!(spans, vec![Span::new(540, 720), Span::new(780, 900)]);
    }

    #[test]
    fn daily_minutes_and_midnight() {
        let payload = json!([{"start": 1320, "end": "24:00"}]);
        let spans = parse_day_intervals(&payload, Weekday::Sat).unwrap();
        assert_eq!(spans, vec![Span::new(1320, 1440)]);
    }

    #[test]
    fn weekly_picks_weekday() {
        let payload = json!({
            "mon": [{"start": "09:00", "end": "12:00"}],
            "Friday": [{"start": "18:00", "end": "22:00"}]
        });
        assert_eq!(
            parse_day_intervals(&payload, Weekday::Fri).unwrap(),
            vec![Span::new(1080, 1320)]
        );
        assert_eq!(
            parse_day_intervals(&payload, Weekday::Mon).unwrap(),
            vec![Span::new(540, 720)]
        );
        assert!(parse_day_intervals(&payload, Weekday::Wed).unwrap().is_empty());
    }

    #[test]
    fn malformed_payloads_are_errors() {
        let cases = [
            json!("nine to five"),
            json!([{"start": "9am", "end": "12:00"}]),
            json!([{"start": "12:00", "end": "09:00"}]),
            json!([{"start": "09:00", "end": "12:00"}, {"start": "11:00", "end": "13:00"}]),
            json!([{"start": 0, "end": 1500}]),
            json!({"someday": [{"start": "09:00", "end": "12:00"}]}),
            json!([{"begin": "09:00"}]),
        ];
        for payload in cases {
            assert!(
                parse_day_intervals(&payload, Weekday::Mon).is_err(),
                "accepted {payload}"
            );
        }
    }

    #[test]
    fn from_str_rejects_broken_json() {
        assert!(parse_day_intervals_str("[{", Weekday::Mon).is_err());
        assert_eq!(
            parse_day_intervals_str(r#"[{"start":"10:30","end":"11:00"}]"#, Weekday::Mon).unwrap(),
            vec![Span::new(630, 660)]
        );
    }
}
