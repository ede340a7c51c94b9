//! Coordination metrics
//!
//! Lock-free counters, gauges and histograms rendered in the Prometheus
//! text exposition format.

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} {}", name, kind);
}

/// Monotonically increasing counter
pub struct Counter {
    value: AtomicU64,
    name: &'static str,
    help: &'static str,
}

impl Counter {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            value: AtomicU64::new(0),
            name,
            help,
        }
    }

    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "counter");
        let _ = writeln!(out, "{} {}", self.name, self.get());
    }
}

/// Value that can go up and down
pub struct Gauge {
    value: AtomicI64,
    name: &'static str,
    help: &'static str,
}

impl Gauge {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            value: AtomicI64::new(0),
            name,
            help,
        }
    }

    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn dec(&self) {
        self.sub(1);
    }

    pub fn add(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn sub(&self, delta: i64) {
        self.value.fetch_sub(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "gauge");
        let _ = writeln!(out, "{} {}", self.name, self.get());
    }
}

/// Latency buckets in seconds, suited to cluster-wide round trips
pub static LATENCY_BUCKETS: [f64; 10] = [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0];

/// Cumulative histogram over fixed upper bounds
pub struct Histogram {
    bounds: &'static [f64],
    counts: Vec<AtomicU64>,
    sum_micros: AtomicU64,
    count: AtomicU64,
    name: &'static str,
    help: &'static str,
}

impl Histogram {
    pub fn new(name: &'static str, help: &'static str, bounds: &'static [f64]) -> Self {
        Self {
            bounds,
            counts: bounds.iter().map(|_| AtomicU64::new(0)).collect(),
            sum_micros: AtomicU64::new(0),
            count: AtomicU64::new(0),
            name,
            help,
        }
    }

    pub fn observe(&self, seconds: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros
            .fetch_add((seconds * 1_000_000.0) as u64, Ordering::Relaxed);
        for (bound, count) in self.bounds.iter().zip(&self.counts) {
            if seconds <= *bound {
                count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn render(&self, out: &mut String) {
        write_header(out, self.name, self.help, "histogram");
        for (bound, count) in self.bounds.iter().zip(&self.counts) {
            let _ = writeln!(
                out,
                "{}_bucket{{le=\"{}\"}} {}",
                self.name,
                bound,
                count.load(Ordering::Relaxed)
            );
        }
        let _ = writeln!(out, "{}_bucket{{le=\"+Inf\"}} {}", self.name, self.count());
        let sum = self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        let _ = writeln!(out, "{}_sum {}", self.name, sum);
        let _ = writeln!(out, "{}_count {}", self.name, self.count());
    }
}

/// Process-wide coordination metrics
pub mod standard {
    use super::*;
    use std::sync::LazyLock;

    pub static BROADCASTS: Counter = Counter::new(
        "vortex_dist_broadcasts_total",
        "Create/close broadcasts issued",
    );

    pub static REMOTE_CALLS: Counter = Counter::new(
        "vortex_dist_remote_calls_total",
        "Per-task context calls issued",
    );

    pub static REMOTE_CALL_FAILURES: Counter = Counter::new(
        "vortex_dist_remote_call_failures_total",
        "Per-task context calls that failed",
    );

    pub static REMOTE_CLIENTS: Gauge = Gauge::new(
        "vortex_dist_remote_clients",
        "Remote clients held by live contexts",
    );

    pub static ACTIVE_CONTEXTS: Gauge = Gauge::new(
        "vortex_dist_active_contexts",
        "Distributed contexts registered with a server",
    );

    pub static BROADCAST_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
        Histogram::new(
            "vortex_dist_broadcast_duration_seconds",
            "Time from broadcast issue to aggregate completion",
            &LATENCY_BUCKETS,
        )
    });
}

/// Render every standard metric
pub fn gather_system_metrics() -> String {
    let mut out = String::new();
    standard::BROADCASTS.render(&mut out);
    standard::REMOTE_CALLS.render(&mut out);
    standard::REMOTE_CALL_FAILURES.render(&mut out);
    standard::REMOTE_CLIENTS.render(&mut out);
    standard::ACTIVE_CONTEXTS.render(&mut out);
    standard::BROADCAST_DURATION.render(&mut out);
    out
}
