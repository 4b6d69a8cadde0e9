//! C7 — ReportAggregator: a pure function turning a window of StatusEvents
//! into the uptime totals ReportWorker mails out (spec §4.5).

use crate::contracts::mailer::ReportContent;
use crate::contracts::Status;
use crate::timeseries::StatusEvent;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// One container's events within `[window_start, window_end)`, plus the
/// single event observed at or after `window_end` if any (the "overlap"
/// fetch from spec §4.5 step 4, resolved in SPEC_FULL.md §G.1). It serves
/// two purposes: clipping a still-open run at `window_end` instead of
/// re-extending it, and — per spec §4.4 — standing in for `on_count` when a
/// container has no in-window events at all.
pub struct ContainerWindow {
    pub container_id: String,
    pub events: Vec<StatusEvent>,
    pub overlap: Option<StatusEvent>,
}

/// Computes the uptime report for `[window_start, window_end)` across every
/// container window supplied. Pure: no I/O, no clock reads — the caller
/// (`ReportWorker`) is responsible for fetching `events` and `overlap` first.
pub fn compute(
    windows: &[ContainerWindow],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> ReportContent {
    let total = windows.len() as u64;
    let mut on_count = 0u64;
    let mut off_count = 0u64;
    let mut total_uptime_seconds: i64 = 0;

    for window in windows {
        // spec §4.4: fall back to the overlap event only when there is no
        // in-window event at all; if that is also empty, count as OFF.
        let last_status = window
            .events
            .last()
            .map(|e| e.status)
            .or_else(|| window.overlap.as_ref().map(|e| e.status));
        match last_status {
            Some(Status::On) => on_count += 1,
            Some(Status::Off) | None => off_count += 1,
        }

        total_uptime_seconds += on_seconds_in_window(window, window_start, window_end);
    }

    ReportContent {
        total,
        on_count,
        off_count,
        total_uptime_hours: total_uptime_seconds as f64 / 3600.0,
        start: window_start,
        end: window_end,
    }
}

/// Sums the ON seconds a single container contributed to `[window_start,
/// window_end)`, clipping every run to the window boundaries (spec §4.5
/// step 5: "a run's contribution is clamped to the window, never
/// double-counted across window boundaries").
fn on_seconds_in_window(
    window: &ContainerWindow,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> i64 {
    let mut seconds = 0i64;

    for (i, event) in window.events.iter().enumerate() {
        if event.status != Status::On {
            continue;
        }

        let run_start = event.run_start().max(window_start);
        let is_last = i + 1 == window.events.len();
        let run_end = if is_last && window.overlap.is_some() {
            // The run is still open at window_end; clip there rather than
            // extending past it (SPEC_FULL.md §G.1).
            window_end
        } else {
            event.last_updated.min(window_end)
        };

        if run_end > run_start {
            seconds += (run_end - run_start).num_seconds();
        }
    }

    seconds
}

/// Convenience for `ReportWorker`: turns per-id fetch results into the
/// `ContainerWindow` list `compute` expects, in the order `ids` was given.
pub fn build_windows(
    ids: &[String],
    mut events: HashMap<String, Vec<StatusEvent>>,
    mut overlap: HashMap<String, Vec<StatusEvent>>,
) -> Vec<ContainerWindow> {
    ids.iter()
        .map(|id| ContainerWindow {
            container_id: id.clone(),
            events: events.remove(id).unwrap_or_default(),
            overlap: overlap.remove(id).and_then(|mut v| v.pop()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn event(status: Status, last_updated: i64, uptime: i64, counter: i64) -> StatusEvent {
        StatusEvent {
            container_id: "c1".to_string(),
            status,
            last_updated: at(last_updated),
            uptime,
            counter,
        }
    }

    #[test]
    fn full_run_inside_window_counts_entirely() {
        // ON from t=100 to t=200, window is [0, 1000).
        let windows = vec![ContainerWindow {
            container_id: "c1".to_string(),
            events: vec![event(Status::On, 200, 100, 0)],
            overlap: None,
        }];
        let report = compute(&windows, at(0), at(1000));
        assert_eq!(report.total_uptime_hours, 100.0 / 3600.0);
        assert_eq!(report.on_count, 1);
        assert_eq!(report.off_count, 0);
    }

    #[test]
    fn run_starting_before_window_is_clipped_at_window_start() {
        // Run started at t=-500 (last_updated=200, uptime=700), window [0, 1000).
        let windows = vec![ContainerWindow {
            container_id: "c1".to_string(),
            events: vec![event(Status::On, 200, 700, 0)],
            overlap: None,
        }];
        let report = compute(&windows, at(0), at(1000));
        // Only [0, 200) counts: 200 seconds, not 700.
        assert_eq!(report.total_uptime_hours, 200.0 / 3600.0);
    }

    #[test]
    fn still_open_run_at_window_end_clips_there_without_double_counting() {
        // Event observed at t=900 (run started 850), window ends at 1000, and
        // an overlap event confirms the container is still ON past t=1000.
        let windows = vec![ContainerWindow {
            container_id: "c1".to_string(),
            events: vec![event(Status::On, 900, 50, 0)],
            overlap: Some(event(Status::On, 1050, 150, 1)),
        }];
        let report = compute(&windows, at(0), at(1000));
        // [850, 1000) = 150 seconds, not the full run which continues past 1000.
        assert_eq!(report.total_uptime_hours, 150.0 / 3600.0);
    }

    #[test]
    fn off_events_contribute_no_uptime() {
        let windows = vec![ContainerWindow {
            container_id: "c1".to_string(),
            events: vec![event(Status::Off, 200, 100, 0)],
            overlap: None,
        }];
        let report = compute(&windows, at(0), at(1000));
        assert_eq!(report.total_uptime_hours, 0.0);
        assert_eq!(report.off_count, 1);
        assert_eq!(report.on_count, 0);
    }

    #[test]
    fn container_with_no_events_counts_as_off() {
        let windows = vec![ContainerWindow {
            container_id: "c1".to_string(),
            events: vec![],
            overlap: None,
        }];
        let report = compute(&windows, at(0), at(1000));
        assert_eq!(report.total, 1);
        assert_eq!(report.off_count, 1);
        assert_eq!(report.total_uptime_hours, 0.0);
    }

    #[test]
    fn container_silent_in_window_falls_back_to_overlap_status() {
        // No events at all within [0, 1000), but the overlap fetch found an
        // ON event just past window_end — spec §4.4's fallback counts this
        // container as ON rather than defaulting it to OFF. It contributes
        // no uptime, since the run it reflects started after window_end.
        let windows = vec![ContainerWindow {
            container_id: "c1".to_string(),
            events: vec![],
            overlap: Some(event(Status::On, 1050, 10, 0)),
        }];
        let report = compute(&windows, at(0), at(1000));
        assert_eq!(report.on_count, 1);
        assert_eq!(report.off_count, 0);
        assert_eq!(report.total_uptime_hours, 0.0);
    }

    #[test]
    fn multiple_runs_in_window_are_summed() {
        let windows = vec![ContainerWindow {
            container_id: "c1".to_string(),
            events: vec![
                event(Status::On, 100, 50, 0),  // [50, 100) = 50s
                event(Status::Off, 150, 50, 1), // off, no uptime
                event(Status::On, 300, 100, 2), // [200, 300) = 100s
            ],
            overlap: None,
        }];
        let report = compute(&windows, at(0), at(1000));
        assert_eq!(report.total_uptime_hours, 150.0 / 3600.0);
    }
}
