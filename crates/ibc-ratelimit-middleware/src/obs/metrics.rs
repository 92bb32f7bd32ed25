//! Counters for admission and revert outcomes.
//!
//! Labelled counters backed by `DashMap`, rendered in Prometheus text format.
//! Labels are flattened into sorted key vectors to keep output deterministic.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current value for an exact label set.
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.value().load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        let mut rows: Vec<(String, u64)> = self
            .map
            .iter()
            .map(|r| {
                let label_str = r
                    .key()
                    .iter()
                    .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                (label_str, r.value().load(Ordering::Relaxed))
            })
            .collect();
        rows.sort();
        for (label_str, val) in rows {
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str, val);
        }
    }
}

#[derive(Default)]
pub struct RateLimitMetrics {
    /// Labels: `op` (send_packet/recv_packet), `outcome` (pass/reject/bypass).
    pub admissions: CounterVec,
    /// Labels: `trigger` (ack/timeout), `outcome` (ok/failed/skipped).
    pub reverts: CounterVec,
    /// Labels: `code` (error code of the rejected receive).
    pub recv_error_acks: CounterVec,
}

impl RateLimitMetrics {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.admissions.render("ibcratelimit_admissions_total", &mut out);
        self.reverts.render("ibcratelimit_reverts_total", &mut out);
        self.recv_error_acks.render("ibcratelimit_recv_error_acks_total", &mut out);
        out
    }
}
