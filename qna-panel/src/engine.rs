//! Cue-point reconciliation engine
//!
//! Answers, for an externally driven virtual clock, "which time-scoped
//! notifications should currently be visible". The clock is monotonic
//! during continuous playback but jumps arbitrarily on seeks, live-edge
//! reconnects, and player reloads; candidates arrive late (with start
//! times already in the past) and can be removed at any moment.
//!
//! Two query regimes:
//! - **Snapshot** — full recomputation of the active set, taken on the
//!   first query after construction and whenever the clock jumps by more
//!   than the seek threshold.
//! - **Delta** — the show/hide sets between two close-together queries
//!   during continuous playback.
//!
//! The engine never mutates its own candidate set. Owners reconcile
//! incoming batches against a working list and construct a fresh engine
//! whenever the list changes; the rebuild resets continuity, so the next
//! query after any mutation is always a snapshot. That forced recompute is
//! what makes candidate-batch delivery and clock-tick delivery
//! order-independent.

use tracing::debug;

/// Anything the engine can schedule: identity plus an active interval
/// `[start_time_ms, end_time_ms)`, open-ended when no end time is set.
pub trait CuePointLike {
    fn id(&self) -> &str;
    fn start_time_ms(&self) -> u64;
    fn end_time_ms(&self) -> Option<u64>;
}

impl CuePointLike for qna_common::Message {
    fn id(&self) -> &str {
        &self.id
    }

    fn start_time_ms(&self) -> u64 {
        self.start_time_ms
    }

    fn end_time_ms(&self) -> Option<u64> {
        self.end_time_ms
    }
}

/// Result of one [`CuepointEngine::update_time`] query
#[derive(Debug, Clone, PartialEq)]
pub enum TimeUpdate<T> {
    /// Everything active at the queried time (discontinuity regime)
    Snapshot(Vec<T>),

    /// Items newly active / newly inactive since the previous query
    /// (continuous-playback regime). The two sets are disjoint.
    Delta { show: Vec<T>, hide: Vec<T> },
}

/// Reconciliation engine over a fixed candidate set
///
/// Construction captures the candidate list; `last_query_ms` starts unset,
/// so the first query always takes the snapshot branch.
#[derive(Debug, Clone)]
pub struct CuepointEngine<T> {
    candidates: Vec<T>,
    last_query_ms: Option<u64>,
    seek_threshold_ms: u64,
}

impl<T: CuePointLike + Clone> CuepointEngine<T> {
    /// Create an engine over `candidates`
    ///
    /// `seek_threshold_ms` is the maximum virtual-time jump between two
    /// consecutive queries still treated as continuous playback.
    pub fn new(candidates: Vec<T>, seek_threshold_ms: u64) -> Self {
        Self {
            candidates,
            last_query_ms: None,
            seek_threshold_ms,
        }
    }

    /// Current working set
    pub fn candidates(&self) -> &[T] {
        &self.candidates
    }

    /// Query visibility at `current_ms`
    ///
    /// `filter` further narrows eligibility (snapshot contents and the
    /// `show` half of a delta); `hide` is never filtered, since an item
    /// that was shown must always be allowed to leave.
    pub fn update_time(
        &mut self,
        current_ms: u64,
        filter: Option<&dyn Fn(&T) -> bool>,
    ) -> TimeUpdate<T> {
        let eligible = |item: &T| filter.map_or(true, |f| f(item));

        let result = match self.last_query_ms {
            Some(last_ms) if current_ms.abs_diff(last_ms) <= self.seek_threshold_ms => {
                // Continuous playback: report interval boundary crossings only.
                let show: Vec<T> = self
                    .candidates
                    .iter()
                    .filter(|c| Self::active_at(*c, current_ms) && !Self::active_at(*c, last_ms))
                    .filter(|c| eligible(*c))
                    .cloned()
                    .collect();
                let hide: Vec<T> = self
                    .candidates
                    .iter()
                    .filter(|c| Self::active_at(*c, last_ms) && !Self::active_at(*c, current_ms))
                    .cloned()
                    .collect();
                TimeUpdate::Delta { show, hide }
            }
            last => {
                if let Some(last_ms) = last {
                    debug!(
                        "virtual clock jumped {} ms, recomputing snapshot",
                        current_ms.abs_diff(last_ms)
                    );
                }
                let snapshot: Vec<T> = self
                    .candidates
                    .iter()
                    .filter(|c| Self::active_at(*c, current_ms))
                    .filter(|c| eligible(*c))
                    .cloned()
                    .collect();
                TimeUpdate::Snapshot(snapshot)
            }
        };

        self.last_query_ms = Some(current_ms);
        result
    }

    /// Whether `item`'s interval contains time `t`
    fn active_at(item: &T, t: u64) -> bool {
        t >= item.start_time_ms() && item.end_time_ms().map_or(true, |end| t < end)
    }

    /// Deterministic single-notification reduction: most recent start time
    /// wins; ties resolve to the earliest item in original order (stable
    /// sort), i.e. insertion order and nothing further.
    pub fn most_recent(items: &[T]) -> Option<&T> {
        let mut by_start: Vec<&T> = items.iter().collect();
        by_start.sort_by(|a, b| b.start_time_ms().cmp(&a.start_time_ms()));
        by_start.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Window {
        id: String,
        start: u64,
        end: Option<u64>,
    }

    impl Window {
        fn new(id: &str, start: u64, end: Option<u64>) -> Self {
            Self {
                id: id.to_string(),
                start,
                end,
            }
        }
    }

    impl CuePointLike for Window {
        fn id(&self) -> &str {
            &self.id
        }

        fn start_time_ms(&self) -> u64 {
            self.start
        }

        fn end_time_ms(&self) -> Option<u64> {
            self.end
        }
    }

    fn engine(windows: Vec<Window>) -> CuepointEngine<Window> {
        CuepointEngine::new(windows, 7000)
    }

    fn ids(items: &[Window]) -> Vec<&str> {
        items.iter().map(|w| w.id.as_str()).collect()
    }

    #[test]
    fn test_first_query_is_snapshot() {
        let mut engine = engine(vec![Window::new("a", 0, Some(10))]);
        match engine.update_time(5, None) {
            TimeUpdate::Snapshot(items) => assert_eq!(ids(&items), ["a"]),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_on_seek() {
        let mut engine = engine(vec![
            Window::new("a", 0, Some(10)),
            Window::new("b", 20_000, Some(30_000)),
        ]);
        engine.update_time(5, None);

        // Jump far beyond the threshold: snapshot of what is active there
        match engine.update_time(25_000, None) {
            TimeUpdate::Snapshot(items) => assert_eq!(ids(&items), ["b"]),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_backward_seek_is_snapshot() {
        let mut engine = engine(vec![Window::new("a", 0, Some(10_000))]);
        engine.update_time(50_000, None);
        match engine.update_time(5000, None) {
            TimeUpdate::Snapshot(items) => assert_eq!(ids(&items), ["a"]),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_delta_empty_when_no_boundary_crossed() {
        let mut engine = engine(vec![Window::new("a", 0, Some(10))]);
        engine.update_time(5, None);
        match engine.update_time(6, None) {
            TimeUpdate::Delta { show, hide } => {
                assert!(show.is_empty());
                assert!(hide.is_empty());
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_delta_hide_on_interval_end() {
        let mut engine = engine(vec![Window::new("a", 0, Some(10))]);
        engine.update_time(9, None);
        match engine.update_time(11, None) {
            TimeUpdate::Delta { show, hide } => {
                assert!(show.is_empty());
                assert_eq!(ids(&hide), ["a"]);
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_delta_show_on_interval_start() {
        let mut engine = engine(vec![Window::new("a", 1000, None)]);
        engine.update_time(500, None);
        match engine.update_time(1500, None) {
            TimeUpdate::Delta { show, hide } => {
                assert_eq!(ids(&show), ["a"]);
                assert!(hide.is_empty());
            }
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_threshold_boundary_is_still_continuous() {
        let mut engine = engine(vec![Window::new("a", 0, None)]);
        engine.update_time(0, None);
        // Exactly the threshold apart is continuous; one past it is a seek
        assert!(matches!(
            engine.update_time(7000, None),
            TimeUpdate::Delta { .. }
        ));
        assert!(matches!(
            engine.update_time(14_001, None),
            TimeUpdate::Snapshot(_)
        ));
    }

    #[test]
    fn test_open_ended_interval_never_hides() {
        let mut engine = engine(vec![Window::new("a", 0, None)]);
        engine.update_time(5, None);
        match engine.update_time(6000, None) {
            TimeUpdate::Delta { hide, .. } => assert!(hide.is_empty()),
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_narrows_snapshot_and_show() {
        let filter = |w: &Window| w.id == "keep";

        let mut snapshot_engine = engine(vec![
            Window::new("keep", 0, None),
            Window::new("drop", 0, None),
        ]);
        match snapshot_engine.update_time(5, Some(&filter)) {
            TimeUpdate::Snapshot(items) => assert_eq!(ids(&items), ["keep"]),
            other => panic!("expected snapshot, got {other:?}"),
        }

        let mut delta_engine = engine(vec![Window::new("drop", 1000, None)]);
        delta_engine.update_time(500, Some(&filter));
        match delta_engine.update_time(1500, Some(&filter)) {
            TimeUpdate::Delta { show, .. } => assert!(show.is_empty()),
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_hide_is_never_filtered() {
        // An item that was shown must be allowed to leave even if the
        // filter would now exclude it.
        let mut engine = engine(vec![Window::new("drop", 0, Some(10))]);
        let exclude_all = |_: &Window| false;
        engine.update_time(5, None);
        match engine.update_time(11, Some(&exclude_all)) {
            TimeUpdate::Delta { hide, .. } => assert_eq!(ids(&hide), ["drop"]),
            other => panic!("expected delta, got {other:?}"),
        }
    }

    #[test]
    fn test_rebuild_resets_continuity() {
        let mut engine = engine(vec![Window::new("a", 0, None)]);
        engine.update_time(5, None);

        // Owner reconciled a new candidate in and rebuilt: even a 1 ms step
        // afterwards is a snapshot, never a delta.
        let mut rebuilt = CuepointEngine::new(
            vec![Window::new("a", 0, None), Window::new("b", 3, None)],
            7000,
        );
        match rebuilt.update_time(6, None) {
            TimeUpdate::Snapshot(items) => assert_eq!(ids(&items), ["a", "b"]),
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_most_recent_picks_latest_start() {
        let items = vec![Window::new("old", 100, None), Window::new("new", 200, None)];
        assert_eq!(CuepointEngine::most_recent(&items).unwrap().id, "new");
    }

    #[test]
    fn test_most_recent_tie_breaks_by_insertion_order() {
        let items = vec![
            Window::new("first", 100, None),
            Window::new("second", 100, None),
        ];
        assert_eq!(CuepointEngine::most_recent(&items).unwrap().id, "first");
    }

    #[test]
    fn test_most_recent_empty() {
        let items: Vec<Window> = Vec::new();
        assert!(CuepointEngine::<Window>::most_recent(&items).is_none());
    }
}
