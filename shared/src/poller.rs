//! Live status polling for a single environment.
//!
//! [`StatusPoller`] owns the scheduling rules (immediate first poll, fixed
//! interval, skip while the page is hidden, one request in flight, nothing
//! delivered after teardown) but not the timer itself: the browser drives
//! [`StatusPoller::poll_once`] from a `gloo` interval, the CLI awaits
//! [`StatusPoller::run`] with a tokio sleep.

use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, EnvironmentApi};
use crate::environment::EnvironmentId;
use crate::status::{DisplayStatus, StatusPair};
use crate::ContainerStatusResponse;

/// Poll interval used by the dashboard cards.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Source of raw container statuses.
///
/// Every [`EnvironmentApi`] reachable through `&`, `Rc` or `Arc` is a feed; a
/// push-based source only has to implement this one method.
#[allow(async_fn_in_trait)]
pub trait StatusFeed {
    async fn fetch_status(&self, id: EnvironmentId) -> Result<ContainerStatusResponse, ApiError>;
}

impl<A: EnvironmentApi> StatusFeed for &A {
    async fn fetch_status(&self, id: EnvironmentId) -> Result<ContainerStatusResponse, ApiError> {
        (**self).environment_status(id).await
    }
}

impl<A: EnvironmentApi> StatusFeed for Rc<A> {
    async fn fetch_status(&self, id: EnvironmentId) -> Result<ContainerStatusResponse, ApiError> {
        self.as_ref().environment_status(id).await
    }
}

impl<A: EnvironmentApi> StatusFeed for Arc<A> {
    async fn fetch_status(&self, id: EnvironmentId) -> Result<ContainerStatusResponse, ApiError> {
        self.as_ref().environment_status(id).await
    }
}

/// Whether the host page is currently on screen.
pub trait PageVisibility {
    fn is_visible(&self) -> bool;
}

/// Visibility for hosts without a notion of a hidden page (e.g. a terminal).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl PageVisibility for AlwaysVisible {
    fn is_visible(&self) -> bool {
        true
    }
}

impl<F: Fn() -> bool> PageVisibility for F {
    fn is_visible(&self) -> bool {
        self()
    }
}

/// Teardown handle shared between a poller and its owner.
#[derive(Debug, Clone, Default)]
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of one scheduled tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Fetch succeeded; both statuses were classified
    Updated(StatusPair),
    /// Fetch failed; both statuses are shown as `Error`
    Failed(ApiError),
    /// Page hidden, no request issued
    SkippedHidden,
    /// Previous request still outstanding, no request issued
    SkippedInFlight,
    /// Poller was torn down; any late result was dropped
    Cancelled,
}

impl PollOutcome {
    /// The statuses to display after this tick, if they change at all.
    pub fn statuses(&self) -> Option<StatusPair> {
        match self {
            PollOutcome::Updated(pair) => Some(*pair),
            PollOutcome::Failed(_) => Some(StatusPair::uniform(DisplayStatus::Error)),
            PollOutcome::SkippedHidden | PollOutcome::SkippedInFlight | PollOutcome::Cancelled => {
                None
            }
        }
    }
}

/// Clears the in-flight flag even if the poll future is dropped mid-request.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Periodically fetches and classifies the statuses of one environment.
pub struct StatusPoller<F, V = AlwaysVisible> {
    environment_id: EnvironmentId,
    feed: F,
    visibility: V,
    interval: Duration,
    in_flight: AtomicBool,
    handle: PollHandle,
}

impl<F: StatusFeed> StatusPoller<F, AlwaysVisible> {
    pub fn new(environment_id: EnvironmentId, feed: F) -> Self {
        Self::with_visibility(environment_id, feed, AlwaysVisible)
    }
}

impl<F: StatusFeed, V: PageVisibility> StatusPoller<F, V> {
    pub fn with_visibility(environment_id: EnvironmentId, feed: F, visibility: V) -> Self {
        Self {
            environment_id,
            feed,
            visibility,
            interval: DEFAULT_POLL_INTERVAL,
            in_flight: AtomicBool::new(false),
            handle: PollHandle::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn environment_id(&self) -> EnvironmentId {
        self.environment_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Handle for tearing the poller down from outside.
    pub fn handle(&self) -> PollHandle {
        self.handle.clone()
    }

    /// Run one scheduled tick.
    pub async fn poll_once(&self) -> PollOutcome {
        if self.handle.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        if !self.visibility.is_visible() {
            return PollOutcome::SkippedHidden;
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return PollOutcome::SkippedInFlight;
        };

        let result = self.feed.fetch_status(self.environment_id).await;

        if self.handle.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        match result {
            Ok(raw) => PollOutcome::Updated(StatusPair::from(&raw)),
            Err(e) => PollOutcome::Failed(e),
        }
    }

    /// Poll immediately, then once per interval, until the handle is cancelled.
    ///
    /// `sleep` is the host's timer, `on_tick` receives every outcome except
    /// the final `Cancelled`.
    pub async fn run<S, Fut, C>(&self, sleep: S, mut on_tick: C)
    where
        S: Fn(Duration) -> Fut,
        Fut: Future<Output = ()>,
        C: FnMut(PollOutcome),
    {
        loop {
            let outcome = self.poll_once().await;
            if outcome == PollOutcome::Cancelled {
                break;
            }
            on_tick(outcome);

            sleep(self.interval).await;
            if self.handle.is_cancelled() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::FakeApi;
    use std::cell::{Cell, RefCell};

    #[tokio::test]
    async fn success_classifies_each_role() {
        let api = FakeApi::default();
        api.push_status("Running", "Provisioning");
        let poller = StatusPoller::new(EnvironmentId(1), &api);

        let outcome = poller.poll_once().await;
        assert_eq!(
            outcome.statuses(),
            Some(StatusPair {
                frontend: DisplayStatus::Running,
                backend: DisplayStatus::Starting,
            })
        );
    }

    #[tokio::test]
    async fn failure_marks_both_roles_as_error() {
        let api = FakeApi::default();
        api.push_error(ApiError::Server {
            status: 500,
            message: "boom".into(),
        });
        let poller = StatusPoller::new(EnvironmentId(1), &api);

        let outcome = poller.poll_once().await;
        assert!(matches!(outcome, PollOutcome::Failed(_)));
        assert_eq!(
            outcome.statuses(),
            Some(StatusPair::uniform(DisplayStatus::Error))
        );
    }

    #[tokio::test]
    async fn hidden_page_skips_fetch() {
        let api = FakeApi::default();
        api.push_status("Running", "Running");
        let visible = Cell::new(false);
        let poller =
            StatusPoller::with_visibility(EnvironmentId(1), &api, || visible.get());

        let outcome = poller.poll_once().await;
        assert_eq!(outcome, PollOutcome::SkippedHidden);
        assert_eq!(outcome.statuses(), None);
        assert_eq!(api.status_calls.get(), 0);

        visible.set(true);
        assert!(matches!(poller.poll_once().await, PollOutcome::Updated(_)));
        assert_eq!(api.status_calls.get(), 1);
    }

    #[tokio::test]
    async fn cancelled_poller_does_not_fetch() {
        let api = FakeApi::default();
        let poller = StatusPoller::new(EnvironmentId(1), &api);
        poller.handle().cancel();

        assert_eq!(poller.poll_once().await, PollOutcome::Cancelled);
        assert_eq!(api.status_calls.get(), 0);
    }

    /// Feed that cancels the poller while its request is outstanding.
    struct CancelDuringFetch {
        handle: RefCell<Option<PollHandle>>,
    }

    impl StatusFeed for CancelDuringFetch {
        async fn fetch_status(
            &self,
            _id: EnvironmentId,
        ) -> Result<ContainerStatusResponse, ApiError> {
            if let Some(handle) = self.handle.borrow().as_ref() {
                handle.cancel();
            }
            Ok(ContainerStatusResponse {
                frontend_status: "Running".into(),
                backend_status: "Running".into(),
            })
        }
    }

    #[tokio::test]
    async fn late_result_after_teardown_is_dropped() {
        let feed = CancelDuringFetch {
            handle: RefCell::new(None),
        };
        let poller = StatusPoller::new(EnvironmentId(1), feed);
        *poller.feed.handle.borrow_mut() = Some(poller.handle());

        assert_eq!(poller.poll_once().await, PollOutcome::Cancelled);
    }

    /// Feed that never completes, to hold a request in flight.
    struct Stalled;

    impl StatusFeed for Stalled {
        async fn fetch_status(
            &self,
            _id: EnvironmentId,
        ) -> Result<ContainerStatusResponse, ApiError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_tick_is_skipped() {
        let poller = StatusPoller::new(EnvironmentId(1), Stalled);

        let first = poller.poll_once();
        tokio::pin!(first);
        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), first.as_mut()).await;
        assert!(timed_out.is_err());

        assert_eq!(poller.poll_once().await, PollOutcome::SkippedInFlight);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_flag_resets_when_poll_is_dropped() {
        let poller = StatusPoller::new(EnvironmentId(1), Stalled);
        {
            let first = poller.poll_once();
            let _ = tokio::time::timeout(Duration::from_millis(10), first).await;
        }
        assert!(!poller.in_flight.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_immediately_then_on_interval() {
        let api = FakeApi::default();
        api.push_status("Stopped", "Stopped");
        api.push_status("Running", "Running");
        api.push_error(ApiError::Network("down".into()));

        let poller = StatusPoller::new(EnvironmentId(2), &api).with_interval(Duration::from_secs(60));
        let handle = poller.handle();
        let seen = RefCell::new(Vec::new());

        poller
            .run(tokio::time::sleep, |outcome| {
                seen.borrow_mut().push(outcome.statuses());
                if seen.borrow().len() == 3 {
                    handle.cancel();
                }
            })
            .await;

        let seen = seen.into_inner();
        assert_eq!(
            seen,
            vec![
                Some(StatusPair::uniform(DisplayStatus::Stopped)),
                Some(StatusPair::uniform(DisplayStatus::Running)),
                Some(StatusPair::uniform(DisplayStatus::Error)),
            ]
        );
        assert_eq!(api.status_calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn run_waits_full_interval_between_polls() {
        let api = FakeApi::default();
        for _ in 0..5 {
            api.push_status("Running", "Running");
        }
        let poller = StatusPoller::new(EnvironmentId(3), &api);
        let handle = poller.handle();
        let start = tokio::time::Instant::now();

        let stopper = async {
            tokio::time::sleep(Duration::from_secs(150)).await;
            handle.cancel();
        };
        tokio::join!(poller.run(tokio::time::sleep, |_| {}), stopper);

        // t=0, t=60, t=120; cancelled before t=180
        assert_eq!(api.status_calls.get(), 3);
        assert!(start.elapsed() >= Duration::from_secs(180));
    }
}
