use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use matchmate_client::ProfileSource;
use matchmate_types::models::{Decision, HistoryProfile, Profile};

use crate::repository::ProfileRepository;

/// Snapshot of everything a feed screen renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    pub profiles: Vec<Profile>,
    pub history: Vec<HistoryProfile>,
    /// Full-screen spinner: first load, refresh, history.
    pub is_loading: bool,
    /// Footer spinner: next page in flight.
    pub is_paginating: bool,
}

/// View-state holder for the profile feed and the history list.
///
/// Every operation runs as a task tied to the model's scope; [`FeedModel::close`]
/// cancels whatever is still running. Cloning shares the same state.
pub struct FeedModel<S> {
    inner: Arc<FeedInner<S>>,
}

struct FeedInner<S> {
    repo: ProfileRepository<S>,
    state_tx: watch::Sender<FeedState>,
    error_tx: broadcast::Sender<String>,
    fetching: Arc<AtomicBool>,
    scope: CancellationToken,
}

impl<S> Clone for FeedModel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Holds the single-flight flag; releases it on drop, including cancellation.
struct InFlight(Arc<AtomicBool>);

impl InFlight {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag.clone()))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone, Copy)]
enum Spinner {
    Loading,
    Paginating,
}

/// Raises a spinner flag and lowers it on drop, so a cancelled task
/// doesn't leave the screen spinning.
struct SpinnerGuard<S> {
    model: FeedModel<S>,
    spinner: Spinner,
}

impl<S> SpinnerGuard<S> {
    fn raise(model: FeedModel<S>, spinner: Spinner) -> Self {
        model.inner.state_tx.send_modify(|s| set_spinner(s, spinner, true));
        Self { model, spinner }
    }
}

impl<S> Drop for SpinnerGuard<S> {
    fn drop(&mut self) {
        let spinner = self.spinner;
        self.model.inner.state_tx.send_modify(|s| set_spinner(s, spinner, false));
    }
}

fn set_spinner(state: &mut FeedState, spinner: Spinner, on: bool) {
    match spinner {
        Spinner::Loading => state.is_loading = on,
        Spinner::Paginating => state.is_paginating = on,
    }
}

impl<S: ProfileSource + 'static> FeedModel<S> {
    pub fn new(repo: ProfileRepository<S>) -> Self {
        let (state_tx, _) = watch::channel(FeedState::default());
        let (error_tx, _) = broadcast::channel(64);

        Self {
            inner: Arc::new(FeedInner {
                repo,
                state_tx,
                error_tx,
                fetching: Arc::new(AtomicBool::new(false)),
                scope: CancellationToken::new(),
            }),
        }
    }

    pub fn repository(&self) -> &ProfileRepository<S> {
        &self.inner.repo
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.inner.state_tx.subscribe()
    }

    /// Observe user-facing error messages.
    pub fn errors(&self) -> broadcast::Receiver<String> {
        self.inner.error_tx.subscribe()
    }

    pub fn state(&self) -> FeedState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.fetching.load(Ordering::Acquire)
    }

    /// Scroll trigger: the last item is on screen and nothing is loading.
    /// `first_visible` is `None` when the list shows nothing yet.
    pub fn should_load_more(&self, visible: usize, first_visible: Option<usize>, total: usize) -> bool {
        if self.inner.state_tx.borrow().is_loading {
            return false;
        }
        match first_visible {
            Some(first) => visible + first >= total,
            None => false,
        }
    }

    /// Fetch the next page and republish the cached list.
    /// Skipped (returns `None`) while another fetch is in flight.
    pub fn load_more(&self) -> Option<JoinHandle<()>> {
        let Some(guard) = InFlight::acquire(&self.inner.fetching) else {
            debug!("load_more skipped, fetch already in flight");
            return None;
        };

        let model = self.clone();
        Some(self.spawn(async move {
            let _guard = guard;
            let _spinner = SpinnerGuard::raise(model.clone(), Spinner::Paginating);

            let repo = &model.inner.repo;
            repo.fetch_next_batch(repo.batch_size()).await;
            match repo.get_all_cached().await {
                Ok(profiles) => model.update(|s| s.profiles = profiles),
                Err(e) => model.report(format!("Failed to fetch profiles: {}", e)),
            }
        }))
    }

    /// Drop the cache and start over from a fresh batch.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        let Some(guard) = InFlight::acquire(&self.inner.fetching) else {
            debug!("refresh skipped, fetch already in flight");
            return None;
        };

        let model = self.clone();
        Some(self.spawn(async move {
            let _guard = guard;
            let _spinner = SpinnerGuard::raise(model.clone(), Spinner::Loading);

            match model.refetch_from_scratch().await {
                Ok(profiles) => model.update(|s| s.profiles = profiles),
                Err(e) => model.report(format!("Failed to refresh profiles: {}", e)),
            }
        }))
    }

    /// Republish the cached list, fetching a first batch if it is empty.
    pub fn load_profiles(&self, show_loading: bool) -> JoinHandle<()> {
        let model = self.clone();
        self.spawn(async move { model.reload_profiles(show_loading).await })
    }

    pub fn load_history(&self) -> JoinHandle<()> {
        let model = self.clone();
        self.spawn(async move {
            let _spinner = SpinnerGuard::raise(model.clone(), Spinner::Loading);
            match model.inner.repo.history().await {
                Ok(history) => model.update(|s| s.history = history),
                Err(e) => model.report(format!("Failed to load history: {}", e)),
            }
        })
    }

    /// Accept or decline a profile from the current feed.
    pub fn decide(&self, uid: &str, decision: Decision) -> Option<JoinHandle<()>> {
        let profile = self
            .inner
            .state_tx
            .borrow()
            .profiles
            .iter()
            .find(|p| p.uid == uid)
            .cloned();

        let Some(mut profile) = profile else {
            self.report(format!("Failed to move profile to history: unknown profile {}", uid));
            return None;
        };
        profile.interaction_status = decision.into();

        let model = self.clone();
        Some(self.spawn(async move {
            match model.inner.repo.move_to_history(&profile).await {
                Ok(()) => model.reload_profiles(false).await,
                Err(e) => model.report(format!("Failed to move profile to history: {}", e)),
            }
        }))
    }

    /// Cancel every running task. The model is unusable afterwards.
    pub fn close(&self) {
        self.inner.scope.cancel();
    }

    async fn refetch_from_scratch(&self) -> anyhow::Result<Vec<Profile>> {
        let repo = &self.inner.repo;
        repo.clear_all_profiles().await?;
        repo.fetch_next_batch(repo.batch_size()).await;
        repo.get_all_cached().await
    }

    async fn reload_profiles(&self, show_loading: bool) {
        let _spinner = show_loading.then(|| SpinnerGuard::raise(self.clone(), Spinner::Loading));
        match self.inner.repo.get_all_cached().await {
            Ok(profiles) => self.update(|s| s.profiles = profiles),
            Err(e) => self.report(format!("Failed to fetch profiles: {}", e)),
        }
    }

    fn update(&self, f: impl FnOnce(&mut FeedState)) {
        self.inner.state_tx.send_modify(f);
    }

    fn report(&self, message: String) {
        warn!("{}", message);
        // No subscribers is fine: nobody is showing errors right now.
        let _ = self.inner.error_tx.send(message);
    }

    fn spawn<F>(&self, fut: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let scope = self.inner.scope.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = scope.cancelled() => debug!("Feed task cancelled"),
                _ = fut => {}
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use matchmate_db::Database;
    use matchmate_types::models::InteractionStatus;

    use crate::testing::{ScriptedSource, batch, outage};

    fn model(source: ScriptedSource) -> FeedModel<ScriptedSource> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        FeedModel::new(ProfileRepository::new(db, source, 20))
    }

    fn uids(state: &FeedState) -> Vec<&str> {
        state.profiles.iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn initial_load_fetches_and_publishes() {
        let model = model(ScriptedSource::new(vec![batch(&["a", "b"])]));
        let mut rx = model.subscribe();

        model.load_profiles(true).await.unwrap();

        let state = rx.borrow_and_update().clone();
        assert_eq!(uids(&state), vec!["a", "b"]);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn load_more_appends_next_page() {
        let model = model(ScriptedSource::new(vec![batch(&["a", "b"]), batch(&["b", "c"])]));
        model.load_profiles(true).await.unwrap();

        model.load_more().unwrap().await.unwrap();

        let state = model.state();
        assert_eq!(uids(&state), vec!["a", "b", "c"]);
        assert!(!state.is_paginating);
        assert!(!model.is_fetching());
    }

    #[tokio::test]
    async fn overlapping_load_more_is_skipped() {
        let source = ScriptedSource::new(vec![batch(&["a"]), batch(&["b"])])
            .with_delay(Duration::from_millis(100));
        let model = model(source);

        let first = model.load_more().expect("first call runs");
        assert!(model.load_more().is_none());
        assert!(model.refresh().is_none());
        first.await.unwrap();

        assert_eq!(model.repository().source().calls(), 1);
        assert!(model.load_more().is_some());
    }

    #[tokio::test]
    async fn decide_moves_profile_to_history() {
        let model = model(ScriptedSource::new(vec![batch(&["a", "b"])]));
        model.load_profiles(true).await.unwrap();

        model.decide("a", Decision::Accept).unwrap().await.unwrap();
        assert_eq!(uids(&model.state()), vec!["b"]);

        model.load_history().await.unwrap();
        let history = model.state().history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].profile.uid, "a");
        assert_eq!(history[0].profile.interaction_status, InteractionStatus::Accepted);
    }

    #[tokio::test]
    async fn deciding_unknown_profile_reports_error() {
        let model = model(ScriptedSource::new(vec![]));
        let mut errors = model.errors();

        assert!(model.decide("nobody", Decision::Decline).is_none());
        let message = errors.recv().await.unwrap();
        assert!(message.contains("nobody"));
    }

    #[tokio::test]
    async fn refresh_replaces_cache_but_keeps_history() {
        let model = model(ScriptedSource::new(vec![
            batch(&["a", "b"]),
            batch(&["a", "b", "c"]),
        ]));
        model.load_profiles(true).await.unwrap();
        model.decide("a", Decision::Decline).unwrap().await.unwrap();

        model.refresh().unwrap().await.unwrap();

        // "a" is decided so it stays out; "b" was cleared and comes back fresh.
        let state = model.state();
        assert_eq!(uids(&state), vec!["b", "c"]);
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn failed_page_keeps_existing_list() {
        let model = model(ScriptedSource::new(vec![batch(&["a"]), outage()]));
        model.load_profiles(false).await.unwrap();

        model.load_more().unwrap().await.unwrap();
        assert_eq!(uids(&model.state()), vec!["a"]);
    }

    #[tokio::test]
    async fn scroll_trigger_needs_last_item_visible() {
        let model = model(ScriptedSource::new(vec![]));

        assert!(model.should_load_more(5, Some(15), 20));
        assert!(!model.should_load_more(5, Some(10), 20));
        assert!(!model.should_load_more(0, None, 0));

        model.update(|s| s.is_loading = true);
        assert!(!model.should_load_more(5, Some(15), 20));
    }

    #[tokio::test]
    async fn close_cancels_in_flight_work() {
        let source = ScriptedSource::new(vec![batch(&["a"])]).with_delay(Duration::from_secs(30));
        let model = model(source);

        let mut rx = model.subscribe();
        let handle = model.load_more().unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.borrow_and_update().is_paginating);
        model.close();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("task should stop promptly")
            .unwrap();
        assert!(!model.is_fetching());
        assert!(model.state().profiles.is_empty());
        assert!(!model.state().is_paginating);
    }

    #[tokio::test]
    async fn close_during_refresh_lowers_loading_spinner() {
        let source = ScriptedSource::new(vec![batch(&["a"])]).with_delay(Duration::from_secs(30));
        let model = model(source);

        let handle = model.refresh().unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(model.state().is_loading);
        model.close();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("task should stop promptly")
            .unwrap();
        assert!(!model.state().is_loading);
        assert!(!model.is_fetching());
    }
}
