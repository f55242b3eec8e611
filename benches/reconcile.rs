use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use ulid::Ulid;

use roomslot::SlotError;
use roomslot::config::EngineConfig;
use roomslot::index::{AvailabilityIndex, AvailabilitySource};
use roomslot::model::*;
use roomslot::notify::NotifyHub;
use roomslot::providers::{FixedGranularity, Unconstrained, WeeklySchedule};
use roomslot::reconciler::{Edit, Providers, Reconciler, ReconcilerContext, SlotState, SlotView, apply};
use roomslot::session::BookingSession;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.1}us, p50={:.1}us, p95={:.1}us, p99={:.1}us, max={:.1}us",
        latencies.len(),
        avg.as_secs_f64() * 1e6,
        percentile(latencies, 50.0).as_secs_f64() * 1e6,
        percentile(latencies, 95.0).as_secs_f64() * 1e6,
        percentile(latencies, 99.0).as_secs_f64() * 1e6,
        latencies.last().map_or(0.0, |d| d.as_secs_f64() * 1e6),
    );
}

/// Deterministic pseudo-random numbers so runs are comparable.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// Roughly a third of the working day booked, in 15-minute multiples.
fn busy_day(rng: &mut Lcg) -> Vec<BusyInterval> {
    let mut busy = Vec::new();
    let mut t = 480;
    while t < 1200 {
        t += 15 * (1 + rng.below(8)) as Minute;
        let len = 15 * (1 + rng.below(6)) as Minute;
        if rng.below(3) == 0 && t + len <= 1200 {
            busy.push(BusyInterval::new(t, t + len));
        }
        t += len;
    }
    busy
}

fn random_edit(rng: &mut Lcg, step: Minute) -> Edit {
    let minute = 480 + step * rng.below((720 / step) as u64) as Minute;
    match rng.below(4) {
        0 => Edit::Start(Some(minute)),
        1 => Edit::End(Some(minute + step)),
        2 => Edit::Periods(Some(1 + rng.below(8) as u32)),
        _ => Edit::Refresh,
    }
}

struct SeededSource {
    seed: u64,
}

#[async_trait]
impl AvailabilitySource for SeededSource {
    async fn busy_intervals(&self, key: &DayKey) -> Result<Vec<BusyInterval>, SlotError> {
        let mut rng = Lcg(self.seed ^ key.date.num_days_from_ce() as u64 ^ key.resource.0 as u64);
        tokio::task::yield_now().await;
        Ok(busy_day(&mut rng))
    }
}

fn providers(seed: u64, step: Minute, config: &EngineConfig) -> Providers {
    Providers {
        granularity: Arc::new(FixedGranularity(step)),
        constraints: Arc::new(Unconstrained),
        schedule: Arc::new(WeeklySchedule::new(WorkWindow::new(480, 1200))),
        index: Arc::new(AvailabilityIndex::new(
            Arc::new(SeededSource { seed }),
            config,
        )),
    }
}

fn date(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.checked_add_days(chrono::Days::new(offset)))
        .unwrap_or_default()
}

fn phase1_pure_passes() {
    let mut rng = Lcg(1);
    let views: Vec<SlotView> = [5, 15, 30, 60]
        .iter()
        .map(|&step| {
            let busy = busy_day(&mut rng);
            SlotView::new(WorkWindow::new(480, 1200), &busy, None, Granularity::Active(step))
        })
        .collect();

    let n = 50_000;
    let mut latencies = Vec::with_capacity(n);
    let mut state = SlotState::default();
    let start = Instant::now();
    for i in 0..n {
        let view = &views[i % views.len()];
        let edit = random_edit(&mut rng, view.granularity.grid_step());
        let t = Instant::now();
        let out = apply(&state, edit, view);
        latencies.push(t.elapsed());
        state = out.state;
    }
    let elapsed = start.elapsed();
    println!(
        "  {n} passes in {:.2}s = {:.0} passes/sec",
        elapsed.as_secs_f64(),
        n as f64 / elapsed.as_secs_f64()
    );
    print_latency("pass latency", &mut latencies);
}

async fn phase2_date_switching(config: &EngineConfig) {
    let hub = Arc::new(NotifyHub::new(config.notify_capacity));
    let ctx = ReconcilerContext::new("room", Ulid::new(), date(0));
    let Ok(r) = Reconciler::new(Ulid::new(), ctx, providers(2, 15, config)) else {
        println!("  reconciler setup failed");
        return;
    };
    let mut r = r.with_notify(hub.clone());
    let _rx = hub.subscribe(r.id());
    let _ = r.set_start(Some(600));

    let n = 2_000;
    let mut latencies = Vec::with_capacity(n);
    let mut stale = 0;
    for i in 0..n {
        let t = Instant::now();
        if let Ok(out) = r.change_date(date((i % 60) as u64)).await {
            stale += out.warnings.any() as usize;
        }
        latencies.push(t.elapsed());
    }
    println!("  {n} date switches, {stale} left the selection stale");
    print_latency("change_date latency", &mut latencies);
}

async fn phase3_bulk_session(config: &EngineConfig) {
    let hub = Arc::new(NotifyHub::new(config.notify_capacity));
    let base = ReconcilerContext::new("room", Ulid::new(), date(0));
    let mut session = BookingSession::new(base.clone(), providers(3, 30, config), hub);
    for i in 0..32 {
        let ctx = ReconcilerContext {
            date: date(i % 8),
            ..base.clone()
        };
        if session.add_block_with(ctx).is_err() {
            break;
        }
    }

    let rounds = 200;
    let mut latencies = Vec::with_capacity(rounds);
    for _ in 0..rounds {
        let t = Instant::now();
        let _ = session.reload_all(true).await;
        latencies.push(t.elapsed());
    }
    println!("  {} blocks over 8 days, {rounds} forced reloads", session.blocks().len());
    print_latency("reload_all latency", &mut latencies);
}

#[tokio::main]
async fn main() {
    let config = EngineConfig::from_env();
    println!("=== roomslot reconcile benchmark ===");
    println!(
        "notify_capacity={}, max_cached_days={}\n",
        config.notify_capacity, config.max_cached_days
    );

    println!("[phase 1] pure reconciliation passes");
    phase1_pure_passes();

    println!("\n[phase 2] date switching with forced reloads");
    phase2_date_switching(&config).await;

    println!("\n[phase 3] bulk session reloads");
    phase3_bulk_session(&config).await;

    println!("\n=== benchmark complete ===");
}
