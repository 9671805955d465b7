//! The fetch lifecycle of one mounted feed view.
//!
//! ```text
//! Idle ──mount──▶ Pending ──ok──▶ Resolved
//!                    │  └──err──▶ Failed
//!                    └──unmount──▶ Cancelled
//! ```
//!
//! The fetch runs at most once per lifecycle. `Pending` is published before
//! the request is issued, and the outcome replaces it in a single commit, so
//! `loading` flips to `false` exactly once. After [`FetchLifecycle::unmount`]
//! the request is aborted and anything it would have delivered is dropped.

use crate::api::{FetchError, FetchNews};
use crate::models::Payload;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Where the lifecycle currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchPhase {
    Idle,
    Pending,
    Resolved(Payload),
    Failed(FetchError),
    Cancelled,
}

impl FetchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FetchPhase::Resolved(_) | FetchPhase::Failed(_) | FetchPhase::Cancelled
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            FetchPhase::Idle => "idle",
            FetchPhase::Pending => "pending",
            FetchPhase::Resolved(_) => "resolved",
            FetchPhase::Failed(_) => "failed",
            FetchPhase::Cancelled => "cancelled",
        }
    }

    /// The `{articles, loading, error}` view of this phase.
    pub fn state(&self) -> FetchState {
        match self {
            FetchPhase::Idle | FetchPhase::Pending => FetchState {
                articles: Payload::empty(),
                loading: true,
                error: None,
            },
            FetchPhase::Resolved(payload) => FetchState {
                articles: payload.clone(),
                loading: false,
                error: None,
            },
            FetchPhase::Failed(e) => FetchState {
                articles: Payload::empty(),
                loading: false,
                error: Some(e.clone()),
            },
            FetchPhase::Cancelled => FetchState {
                articles: Payload::empty(),
                loading: false,
                error: None,
            },
        }
    }
}

/// Snapshot of the fetch state as a view consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState {
    pub articles: Payload,
    pub loading: bool,
    pub error: Option<FetchError>,
}

/// Owns the single fetch of a mounted view.
///
/// Dropping the lifecycle unmounts it.
#[derive(Debug)]
pub struct FetchLifecycle {
    phase: Arc<watch::Sender<FetchPhase>>,
    cancel: CancellationToken,
}

impl FetchLifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FetchPhase::Idle);
        Self {
            phase: Arc::new(tx),
            cancel: CancellationToken::new(),
        }
    }

    /// Move to `Pending` and start the fetch on the current runtime.
    ///
    /// Returns `false` without issuing anything if this lifecycle was already
    /// mounted.
    #[instrument(level = "info", skip_all)]
    pub fn mount<F: FetchNews>(&mut self, fetcher: Arc<F>) -> bool {
        if !matches!(*self.phase.borrow(), FetchPhase::Idle) {
            warn!(phase = self.phase.borrow().name(), "Lifecycle already mounted; not refetching");
            return false;
        }

        self.phase.send_replace(FetchPhase::Pending);
        info!("News fetch pending");

        let phase = Arc::clone(&self.phase);
        let token = self.cancel.child_token();
        tokio::spawn(async move {
            // a panic inside the fetcher comes back as a JoinError
            let mut request = tokio::spawn(async move { fetcher.fetch().await });
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    request.abort();
                    debug!("Fetch aborted by unmount");
                    return;
                }
                joined = &mut request => match joined {
                    Ok(result) => result,
                    Err(e) => {
                        error!(error = %e, "News fetch task did not complete");
                        Err(FetchError::Transport(format!("fetch task failed: {e}")))
                    }
                },
            };

            let committed = phase.send_if_modified(|current| {
                if !matches!(current, FetchPhase::Pending) {
                    return false;
                }
                *current = match outcome {
                    Ok(payload) => FetchPhase::Resolved(payload),
                    Err(e) => FetchPhase::Failed(e),
                };
                true
            });

            if committed {
                info!(phase = phase.borrow().name(), "News fetch settled");
            } else {
                debug!("Discarded fetch result delivered after unmount");
            }
        });
        true
    }

    /// Abort the fetch. A result that arrives later is discarded.
    pub fn unmount(&mut self) {
        self.cancel.cancel();
        let cancelled = self.phase.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            *current = FetchPhase::Cancelled;
            true
        });
        if cancelled {
            info!("News fetch cancelled");
        }
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase.borrow().clone()
    }

    pub fn state(&self) -> FetchState {
        self.phase.borrow().state()
    }

    /// Watch phase changes as they are committed.
    pub fn subscribe(&self) -> watch::Receiver<FetchPhase> {
        self.phase.subscribe()
    }

    /// Wait until the fetch has settled or been cancelled.
    ///
    /// An unmounted lifecycle returns `Idle` immediately.
    pub async fn settled(&self) -> FetchPhase {
        let mut rx = self.subscribe();
        let phase = match rx
            .wait_for(|p| p.is_terminal() || matches!(p, FetchPhase::Idle))
            .await
        {
            Ok(phase) => phase.clone(),
            Err(_) => FetchPhase::Cancelled,
        };
        phase
    }
}

impl Default for FetchLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FetchLifecycle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NewsClient;
    use crate::config::FeedConfig;
    use crate::render::{RenderContext, build_view};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Fetcher that answers with a canned outcome once released.
    struct Gate {
        release: Notify,
        outcome: Result<Payload, FetchError>,
        calls: AtomicUsize,
    }

    impl Gate {
        fn new(outcome: Result<Payload, FetchError>) -> Arc<Self> {
            Arc::new(Self {
                release: Notify::new(),
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl FetchNews for Gate {
        async fn fetch(&self) -> Result<Payload, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            self.outcome.clone()
        }
    }

    /// Fetcher that panics mid-request.
    struct Explodes;

    impl FetchNews for Explodes {
        async fn fetch(&self) -> Result<Payload, FetchError> {
            panic!("fetcher blew up");
        }
    }

    fn render_ctx() -> RenderContext {
        RenderContext::new(
            &FeedConfig::default(),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_new_lifecycle_is_idle_and_loading() {
        let lifecycle = FetchLifecycle::new();
        assert_eq!(lifecycle.phase(), FetchPhase::Idle);

        let state = lifecycle.state();
        assert!(state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.articles.len(), Some(0));
        assert_eq!(lifecycle.settled().await, FetchPhase::Idle);
    }

    #[tokio::test]
    async fn test_success_path() {
        let payload = Payload(json!([{"title": "T1", "link": "http://x/1"}]));
        let gate = Gate::new(Ok(payload.clone()));
        let mut lifecycle = FetchLifecycle::new();

        assert!(lifecycle.mount(Arc::clone(&gate)));
        assert_eq!(lifecycle.phase(), FetchPhase::Pending);
        assert!(lifecycle.state().loading);

        gate.release.notify_one();
        assert_eq!(lifecycle.settled().await, FetchPhase::Resolved(payload.clone()));

        let state = lifecycle.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(state.articles, payload);
    }

    #[tokio::test]
    async fn test_failure_path() {
        let gate = Gate::new(Err(FetchError::Transport("Network Error".to_string())));
        let mut lifecycle = FetchLifecycle::new();
        lifecycle.mount(Arc::clone(&gate));

        gate.release.notify_one();
        let phase = lifecycle.settled().await;

        assert!(matches!(phase, FetchPhase::Failed(_)));
        let state = lifecycle.state();
        assert!(!state.loading);
        assert_eq!(
            state.error,
            Some(FetchError::Transport("Network Error".to_string()))
        );
        assert_eq!(state.articles.len(), Some(0));
    }

    #[tokio::test]
    async fn test_loading_clears_exactly_once() {
        let gate = Gate::new(Ok(Payload(json!([]))));
        let mut lifecycle = FetchLifecycle::new();
        let mut rx = lifecycle.subscribe();
        rx.borrow_and_update();

        lifecycle.mount(Arc::clone(&gate));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().state().loading);

        gate.release.notify_one();
        rx.changed().await.unwrap();
        let settled = rx.borrow_and_update().clone();
        assert!(!settled.state().loading);
        assert!(settled.is_terminal());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_mount_twice_fetches_once() {
        let gate = Gate::new(Ok(Payload(json!([]))));
        let mut lifecycle = FetchLifecycle::new();

        assert!(lifecycle.mount(Arc::clone(&gate)));
        assert!(!lifecycle.mount(Arc::clone(&gate)));

        gate.release.notify_one();
        lifecycle.settled().await;
        assert!(!lifecycle.mount(Arc::clone(&gate)));
        assert_eq!(gate.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unmount_discards_late_result() {
        let gate = Gate::new(Ok(Payload(json!([{"title": "late"}]))));
        let mut lifecycle = FetchLifecycle::new();
        lifecycle.mount(Arc::clone(&gate));

        lifecycle.unmount();
        assert_eq!(lifecycle.phase(), FetchPhase::Cancelled);
        assert!(!lifecycle.state().loading);

        gate.release.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(lifecycle.phase(), FetchPhase::Cancelled);
        assert_eq!(lifecycle.settled().await, FetchPhase::Cancelled);
    }

    #[tokio::test]
    async fn test_unmount_after_settle_keeps_outcome() {
        let gate = Gate::new(Err(FetchError::Status(404)));
        let mut lifecycle = FetchLifecycle::new();
        lifecycle.mount(Arc::clone(&gate));
        gate.release.notify_one();
        lifecycle.settled().await;

        lifecycle.unmount();
        assert_eq!(lifecycle.phase(), FetchPhase::Failed(FetchError::Status(404)));
    }

    #[tokio::test]
    async fn test_panicking_fetcher_still_settles() {
        let mut lifecycle = FetchLifecycle::new();
        lifecycle.mount(Arc::new(Explodes));

        let phase = tokio::time::timeout(Duration::from_secs(2), lifecycle.settled())
            .await
            .expect("lifecycle never settled");

        assert!(matches!(phase, FetchPhase::Failed(FetchError::Transport(_))));
        let state = lifecycle.state();
        assert!(!state.loading);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn test_server_error_renders_error_message() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let config = FeedConfig {
            endpoint: format!("{}/news", server.uri()),
            ..Default::default()
        };
        let mut lifecycle = FetchLifecycle::new();
        lifecycle.mount(Arc::new(NewsClient::new(&config).unwrap()));
        assert_eq!(build_view(&lifecycle.phase(), &render_ctx()).message(), None);

        let view = build_view(&lifecycle.settled().await, &render_ctx());
        assert_eq!(
            view.message().as_deref(),
            Some("Error fetching news: Request failed with status code 500")
        );
        assert!(view.cards().is_empty());
    }

    #[tokio::test]
    async fn test_served_articles_render_as_cards() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"title": "T1", "description": "D1", "link": "http://x/1"},
                {"title": "T2", "description": "D2", "link": "http://x/2", "img_url": "http://x/2.jpg"}
            ])))
            .mount(&server)
            .await;

        let config = FeedConfig {
            endpoint: format!("{}/news", server.uri()),
            ..Default::default()
        };
        let mut lifecycle = FetchLifecycle::new();
        lifecycle.mount(Arc::new(NewsClient::new(&config).unwrap()));

        let view = build_view(&lifecycle.settled().await, &render_ctx());
        let titles: Vec<&str> = view.cards().iter().map(|c| c.article.title.as_str()).collect();
        assert_eq!(titles, vec!["T1", "T2"]);
        assert_eq!(view.report().images, 1);
    }
}
