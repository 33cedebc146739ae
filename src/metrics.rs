//! Run-wide counters.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Counters shared by every session task of a run.
#[derive(Debug, Default)]
pub struct RunMetrics {
    sessions_started: AtomicU64,
    sessions_completed: AtomicU64,
    sessions_failed: AtomicU64,
    frames_received: AtomicU64,
    bytes_received: AtomicU64,
    requests_sent: AtomicU64,
    bytes_sent: AtomicU64,
    edits_sent: AtomicU64,
    attachments_saved: AtomicU64,
    attachments_failed: AtomicU64,
    start_time: Mutex<Option<Instant>>,
}

/// Point-in-time copy of [`RunMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub elapsed_secs: f64,
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub sessions_failed: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub requests_sent: u64,
    pub bytes_sent: u64,
    pub edits_sent: u64,
    pub attachments_saved: u64,
    pub attachments_failed: u64,
}

impl RunMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        if let Ok(mut start) = self.start_time.lock() {
            *start = Some(Instant::now());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time
            .lock()
            .ok()
            .and_then(|t| t.map(|t| t.elapsed()))
            .unwrap_or_default()
    }

    pub fn session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_completed(&self) {
        self.sessions_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_failed(&self) {
        self.sessions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_received(&self, size: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn request_sent(&self, size: usize) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn edits_sent(&self, count: u32) {
        self.edits_sent.fetch_add(u64::from(count), Ordering::Relaxed);
    }

    pub fn attachment_saved(&self) {
        self.attachments_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attachment_failed(&self) {
        self.attachments_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            elapsed_secs: self.elapsed().as_secs_f64(),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            sessions_failed: self.sessions_failed.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            edits_sent: self.edits_sent.load(Ordering::Relaxed),
            attachments_saved: self.attachments_saved.load(Ordering::Relaxed),
            attachments_failed: self.attachments_failed.load(Ordering::Relaxed),
        }
    }

    /// Single-line JSON summary.
    #[must_use]
    pub fn report_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }

    /// Boxed human-readable summary.
    #[must_use]
    pub fn report(&self) -> String {
        let s = self.snapshot();
        let rate = if s.elapsed_secs > 0.0 {
            s.edits_sent as f64 / s.elapsed_secs
        } else {
            0.0
        };

        let rule = "╠══════════════════════════════════════════════════════════════╣";
        let lines = [
            "╔══════════════════════════════════════════════════════════════╗".to_string(),
            "║                    LOAD RUN SUMMARY                          ║".to_string(),
            rule.to_string(),
            format!("║  Duration:            {:>10.3}s                           ║", s.elapsed_secs),
            rule.to_string(),
            "║  SESSIONS                                                    ║".to_string(),
            format!("║    Started:           {:>10}                             ║", s.sessions_started),
            format!("║    Completed:         {:>10}                             ║", s.sessions_completed),
            format!("║    Failed:            {:>10}                             ║", s.sessions_failed),
            rule.to_string(),
            "║  TRAFFIC                                                     ║".to_string(),
            format!("║    Frames received:   {:>10}                             ║", s.frames_received),
            format!("║    Requests sent:     {:>10}                             ║", s.requests_sent),
            format!("║    Edits sent:        {:>10}                             ║", s.edits_sent),
            format!("║    Edit rate:         {:>10.1} edit/s                     ║", rate),
            rule.to_string(),
            "║  ATTACHMENTS                                                 ║".to_string(),
            format!("║    Saved:             {:>10}                             ║", s.attachments_saved),
            format!("║    Failed:            {:>10}                             ║", s.attachments_failed),
            "╚══════════════════════════════════════════════════════════════╝".to_string(),
        ];
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = RunMetrics::new();
        metrics.session_started();
        metrics.session_started();
        metrics.session_completed();
        metrics.session_failed();
        metrics.frame_received(10);
        metrics.request_sent(20);
        metrics.request_sent(5);
        metrics.edits_sent(3);
        metrics.attachment_saved();

        let s = metrics.snapshot();
        assert_eq!(s.sessions_started, 2);
        assert_eq!(s.sessions_completed, 1);
        assert_eq!(s.sessions_failed, 1);
        assert_eq!(s.frames_received, 1);
        assert_eq!(s.bytes_received, 10);
        assert_eq!(s.requests_sent, 2);
        assert_eq!(s.bytes_sent, 25);
        assert_eq!(s.edits_sent, 3);
        assert_eq!(s.attachments_saved, 1);
        assert_eq!(s.attachments_failed, 0);
    }

    #[test]
    fn test_elapsed_before_start_is_zero() {
        assert_eq!(RunMetrics::new().elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_report_json_is_one_line() {
        let metrics = RunMetrics::new();
        metrics.edits_sent(7);
        let json = metrics.report_json();
        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["edits_sent"], 7);
    }

    #[test]
    fn test_report_mentions_counts() {
        let metrics = RunMetrics::new();
        metrics.session_started();
        let report = metrics.report();
        assert!(report.contains("LOAD RUN SUMMARY"));
        assert!(report.contains("Started:"));
    }
}
