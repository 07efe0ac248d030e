//! The debounced render pipeline.
//!
//! Text snapshots are coalesced by a quiet-period timer. When the timer
//! fires, a numbered [`RenderRequest`] is handed to an executor. Only the
//! most recently issued request that has not been cancelled may commit its
//! output; every other completion is discarded on arrival.

use crate::preview::PreviewSurface;

use super::debounce::Debouncer;
use super::executor::{RenderExecutor, RenderRequest};
use super::RenderError;

/// Quiet period between the last `schedule` and the render it triggers.
pub const QUIET_PERIOD_MS: u64 = 300;

/// What happened to one completion drained from the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The output became the preview's display state.
    Committed { seq: u64 },
    /// The active request failed; the previous output stays on display.
    Failed { seq: u64, error: RenderError },
    /// Superseded, cancelled, or arrived with no preview mounted.
    Discarded { seq: u64 },
}

/// Coalesces text snapshots and renders only the settled one.
#[derive(Debug)]
pub struct DebouncedRenderer<E> {
    executor: E,
    timer: Debouncer<String>,
    /// Sequence number of the most recently issued request.
    last_issued: u64,
    /// The request still allowed to commit, if any.
    awaiting: Option<u64>,
}

impl<E: RenderExecutor> DebouncedRenderer<E> {
    pub const fn new(executor: E) -> Self {
        Self::with_quiet_period(executor, QUIET_PERIOD_MS)
    }

    pub const fn with_quiet_period(executor: E, quiet_period_ms: u64) -> Self {
        Self {
            executor,
            timer: Debouncer::new(quiet_period_ms),
            last_issued: 0,
            awaiting: None,
        }
    }

    pub const fn quiet_period_ms(&self) -> u64 {
        self.timer.delay_ms()
    }

    /// Record `text` as the latest input and restart the quiet period.
    ///
    /// A text that was pending before is never rendered.
    pub fn schedule(&mut self, text: impl Into<String>, now_ms: u64) {
        let text = text.into();
        crate::perf::log_event(
            "render.schedule",
            format!("at={now_ms} len={}", text.len()),
        );
        self.timer.queue(text, now_ms);
    }

    /// Drop the pending timer and invalidate any conversion in flight.
    pub fn cancel(&mut self) {
        let had_timer = self.timer.cancel().is_some();
        let in_flight = self.awaiting.take();
        if had_timer || in_flight.is_some() {
            crate::perf::log_event(
                "render.cancel",
                format!("timer={had_timer} in_flight={in_flight:?}"),
            );
        }
    }

    /// Fire the timer if its quiet period has elapsed.
    ///
    /// Returns the sequence number of the request issued, if any.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        let text = self.timer.take_ready(now_ms)?;
        Some(self.issue(text, now_ms))
    }

    /// Skip the quiet period: cancel any pending timer and issue now.
    pub fn render_now(&mut self, text: impl Into<String>, now_ms: u64) -> u64 {
        self.timer.cancel();
        self.issue(text.into(), now_ms)
    }

    /// Apply finished conversions to `surface`.
    ///
    /// Passing `None` (no preview mounted) discards everything that arrived.
    pub fn drain(&mut self, mut surface: Option<&mut PreviewSurface>) -> Vec<RenderOutcome> {
        let mut outcomes = Vec::new();
        while let Some(done) = self.executor.try_complete() {
            let seq = done.seq;
            let active = self.awaiting == Some(seq) && seq == self.last_issued;
            let outcome = match (active, surface.as_deref_mut(), done.result) {
                (true, Some(surface), Ok(html)) => {
                    self.awaiting = None;
                    let changed = surface.set_output(html);
                    crate::perf::log_event(
                        "render.commit",
                        format!("seq={seq} changed={changed}"),
                    );
                    RenderOutcome::Committed { seq }
                }
                (true, Some(_), Err(error)) => {
                    self.awaiting = None;
                    tracing::warn!(seq, %error, "markdown render failed; keeping previous preview");
                    crate::perf::log_event("render.failed", format!("seq={seq} err={error}"));
                    RenderOutcome::Failed { seq, error }
                }
                (active, _, _) => {
                    if active {
                        self.awaiting = None;
                    }
                    crate::perf::log_event(
                        "render.discard",
                        format!("seq={seq} latest={}", self.last_issued),
                    );
                    RenderOutcome::Discarded { seq }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    /// True while a timer is pending or the active request has not returned.
    pub const fn is_busy(&self) -> bool {
        self.timer.is_pending() || self.awaiting.is_some()
    }

    pub const fn has_pending_timer(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.timer.deadline_ms()
    }

    pub const fn last_issued(&self) -> u64 {
        self.last_issued
    }

    pub const fn executor(&self) -> &E {
        &self.executor
    }

    pub const fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    fn issue(&mut self, text: String, now_ms: u64) -> u64 {
        self.last_issued += 1;
        let seq = self.last_issued;
        self.awaiting = Some(seq);
        crate::perf::log_event("render.issue", format!("seq={seq} at={now_ms}"));
        self.executor.submit(RenderRequest {
            seq,
            text,
            issued_at_ms: now_ms,
        });
        seq
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::render::executor::{InlineExecutor, RenderCompletion};

    /// Holds submitted requests until the test completes them, in any order.
    #[derive(Debug, Default)]
    struct ManualExecutor {
        submitted: Vec<RenderRequest>,
        ready: VecDeque<RenderCompletion>,
    }

    impl ManualExecutor {
        fn complete(&mut self, seq: u64) {
            let request = self
                .submitted
                .iter()
                .find(|r| r.seq == seq)
                .expect("request was submitted");
            self.ready.push_back(RenderCompletion {
                seq,
                result: Ok(format!("<p>{}</p>", request.text)),
            });
        }

        fn fail(&mut self, seq: u64) {
            self.ready.push_back(RenderCompletion {
                seq,
                result: Err(RenderError::Conversion("boom".to_string())),
            });
        }
    }

    impl RenderExecutor for ManualExecutor {
        fn submit(&mut self, request: RenderRequest) {
            self.submitted.push(request);
        }

        fn try_complete(&mut self) -> Option<RenderCompletion> {
            self.ready.pop_front()
        }
    }

    fn echo(text: &str) -> Result<String, RenderError> {
        Ok(format!("<p>{text}</p>"))
    }

    type EchoFn = fn(&str) -> Result<String, RenderError>;

    fn inline() -> DebouncedRenderer<InlineExecutor<EchoFn>> {
        DebouncedRenderer::new(InlineExecutor::new(echo as EchoFn))
    }

    #[test]
    fn test_burst_renders_only_last_text() {
        let mut renderer = inline();
        let mut surface = PreviewSurface::new();
        renderer.schedule("a", 0);
        renderer.schedule("ab", 50);
        renderer.schedule("abc", 100);

        assert_eq!(renderer.poll(399), None);
        assert!(renderer.drain(Some(&mut surface)).is_empty());
        assert!(surface.is_empty());

        assert_eq!(renderer.poll(400), Some(1));
        let outcomes = renderer.drain(Some(&mut surface));
        assert_eq!(outcomes, vec![RenderOutcome::Committed { seq: 1 }]);
        assert_eq!(surface.html(), "<p>abc</p>");
        assert_eq!(surface.revision(), 1);
    }

    #[test]
    fn test_same_text_still_restarts_window() {
        let mut renderer = inline();
        renderer.schedule("same", 0);
        renderer.schedule("same", 250);
        assert_eq!(renderer.poll(300), None);
        assert_eq!(renderer.poll(550), Some(1));
    }

    #[test]
    fn test_cancel_before_quiet_period_prevents_render() {
        let mut renderer = inline();
        let mut surface = PreviewSurface::new();
        renderer.schedule("text", 0);
        renderer.cancel();
        assert_eq!(renderer.poll(10_000), None);
        assert!(renderer.drain(Some(&mut surface)).is_empty());
        assert!(!renderer.is_busy());
        assert!(surface.is_empty());
    }

    #[test]
    fn test_cancel_while_in_flight_discards_result() {
        let mut renderer = DebouncedRenderer::new(ManualExecutor::default());
        let mut surface = PreviewSurface::new();
        renderer.schedule("late", 0);
        let seq = renderer.poll(300).unwrap();
        renderer.cancel();

        renderer.executor_mut().complete(seq);
        let outcomes = renderer.drain(Some(&mut surface));
        assert_eq!(outcomes, vec![RenderOutcome::Discarded { seq }]);
        assert!(surface.is_empty());
    }

    #[test]
    fn test_late_completion_never_overwrites_newer_output() {
        let mut renderer = DebouncedRenderer::new(ManualExecutor::default());
        let mut surface = PreviewSurface::new();

        renderer.schedule("old", 0);
        let old = renderer.poll(300).unwrap();
        renderer.schedule("new", 400);
        let new = renderer.poll(700).unwrap();

        renderer.executor_mut().complete(new);
        renderer.executor_mut().complete(old);
        let outcomes = renderer.drain(Some(&mut surface));
        assert_eq!(
            outcomes,
            vec![
                RenderOutcome::Committed { seq: new },
                RenderOutcome::Discarded { seq: old },
            ]
        );
        assert_eq!(surface.html(), "<p>new</p>");
    }

    #[test]
    fn test_superseded_completion_arriving_first_is_discarded() {
        let mut renderer = DebouncedRenderer::new(ManualExecutor::default());
        let mut surface = PreviewSurface::new();

        renderer.schedule("old", 0);
        let old = renderer.poll(300).unwrap();
        renderer.schedule("new", 400);
        let new = renderer.poll(700).unwrap();

        renderer.executor_mut().complete(old);
        assert_eq!(
            renderer.drain(Some(&mut surface)),
            vec![RenderOutcome::Discarded { seq: old }]
        );
        assert!(surface.is_empty());
        assert!(renderer.is_busy());

        renderer.executor_mut().complete(new);
        renderer.drain(Some(&mut surface));
        assert_eq!(surface.html(), "<p>new</p>");
        assert!(!renderer.is_busy());
    }

    #[test]
    fn test_failure_keeps_previous_output() {
        let mut renderer = DebouncedRenderer::new(ManualExecutor::default());
        let mut surface = PreviewSurface::new();

        renderer.schedule("good", 0);
        let first = renderer.poll(300).unwrap();
        renderer.executor_mut().complete(first);
        renderer.drain(Some(&mut surface));

        renderer.schedule("bad", 1_000);
        let second = renderer.poll(1_300).unwrap();
        renderer.executor_mut().fail(second);
        let outcomes = renderer.drain(Some(&mut surface));

        assert!(matches!(
            outcomes.as_slice(),
            [RenderOutcome::Failed { seq, .. }] if *seq == second
        ));
        assert_eq!(surface.html(), "<p>good</p>");
        assert!(!renderer.is_busy());
    }

    #[test]
    fn test_render_now_skips_quiet_period_and_clears_timer() {
        let mut renderer = inline();
        let mut surface = PreviewSurface::new();
        renderer.schedule("stale", 0);
        let seq = renderer.render_now("fresh", 10);
        assert!(!renderer.has_pending_timer());
        assert_eq!(renderer.drain(Some(&mut surface)), vec![RenderOutcome::Committed { seq }]);
        assert_eq!(surface.html(), "<p>fresh</p>");
        assert_eq!(renderer.poll(10_000), None);
    }

    #[test]
    fn test_drain_without_surface_discards() {
        let mut renderer = inline();
        renderer.schedule("x", 0);
        let seq = renderer.poll(300).unwrap();
        assert_eq!(renderer.drain(None), vec![RenderOutcome::Discarded { seq }]);
    }

    #[test]
    fn test_separate_bursts_render_each_settled_text() {
        let mut renderer = inline();
        let mut surface = PreviewSurface::new();

        renderer.schedule("first", 0);
        renderer.poll(300);
        renderer.drain(Some(&mut surface));
        assert_eq!(surface.html(), "<p>first</p>");

        renderer.schedule("second", 1_000);
        renderer.poll(1_300);
        renderer.drain(Some(&mut surface));
        assert_eq!(surface.html(), "<p>second</p>");
        assert_eq!(renderer.last_issued(), 2);
    }

    #[test]
    fn test_custom_quiet_period() {
        let mut renderer = DebouncedRenderer::with_quiet_period(ManualExecutor::default(), 50);
        assert_eq!(renderer.quiet_period_ms(), 50);
        renderer.schedule("x", 0);
        assert_eq!(renderer.deadline_ms(), Some(50));
        assert_eq!(renderer.poll(50), Some(1));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn burst_faster_than_quiet_period_renders_once(
                gaps in proptest::collection::vec(0..QUIET_PERIOD_MS, 1..40),
            ) {
                let mut renderer = inline();
                let mut surface = PreviewSurface::new();
                let mut now = 0;
                let mut last = String::new();
                for (idx, gap) in gaps.iter().enumerate() {
                    now += gap;
                    last = format!("t{idx}");
                    renderer.schedule(last.clone(), now);
                    prop_assert_eq!(renderer.poll(now), None);
                }
                prop_assert_eq!(renderer.poll(now + QUIET_PERIOD_MS), Some(1));
                renderer.drain(Some(&mut surface));
                prop_assert_eq!(surface.html(), format!("<p>{last}</p>"));
                prop_assert_eq!(surface.revision(), 1);
            }

            #[test]
            fn gaps_longer_than_quiet_period_render_each_time(
                count in 1usize..20,
                extra in 0..500u64,
            ) {
                let mut renderer = inline();
                let mut surface = PreviewSurface::new();
                let mut now = 0;
                for idx in 0..count {
                    let text = format!("step {idx}");
                    renderer.schedule(text.clone(), now);
                    now += QUIET_PERIOD_MS + extra;
                    prop_assert!(renderer.poll(now).is_some());
                    renderer.drain(Some(&mut surface));
                    prop_assert_eq!(surface.html(), format!("<p>{text}</p>"));
                }
                prop_assert_eq!(renderer.last_issued(), count as u64);
            }
        }
    }
}
