//! Request Lifecycle
//!
//! `ListQuery` drives one list view: it issues the fetch for the current key,
//! cancels reads that no longer matter, and applies only the completion of
//! the most recently issued request. Views observe it through `subscribe`.
//!
//! `cancellable` wraps a single read for callers that only need an abort
//! switch (an edit form loading a fresh record).

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{AbortHandle, AbortRegistration, Abortable, LocalBoxFuture};
use futures::FutureExt;

use crate::domain::{ClientError, ClientResult, Entity};

type Fetcher<K, T> = Arc<dyn Fn(K) -> LocalBoxFuture<'static, ClientResult<Vec<T>>> + Send + Sync>;
type Listener<T> = Arc<dyn Fn(&ListSnapshot<T>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What a view renders: the data, where the query stands, and the last error.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot<T> {
    pub data: Vec<T>,
    pub state: LoadState,
    /// Short message for the UI; never set by a cancellation
    pub error: Option<String>,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            state: LoadState::Idle,
            error: None,
        }
    }
}

impl<T> ListSnapshot<T> {
    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }
}

/// How an issued fetch ended, from the query's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The result became the current data.
    Applied,
    /// The fetch failed and the error was recorded.
    Failed(ClientError),
    /// Aborted before completion; nothing changed.
    Cancelled,
    /// A newer request was issued meanwhile; the result was dropped.
    Superseded,
    /// `refetch` without a tracked key.
    Idle,
}

struct QueryState<K, T> {
    generation: u64,
    key: Option<K>,
    /// Every read not yet settled, by generation.
    in_flight: Vec<(u64, AbortHandle)>,
    snapshot: ListSnapshot<T>,
    listeners: Vec<Listener<T>>,
}

/// Per-view list controller with last-issued-wins semantics.
pub struct ListQuery<K, T> {
    label: &'static str,
    fetcher: Fetcher<K, T>,
    inner: Arc<Mutex<QueryState<K, T>>>,
}

impl<K, T> Clone for ListQuery<K, T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            fetcher: self.fetcher.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<K, T> ListQuery<K, T>
where
    K: Clone + 'static,
    T: Clone + 'static,
{
    pub fn new<F, Fut>(label: &'static str, fetch: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ClientResult<Vec<T>>> + 'static,
    {
        let fetcher: Fetcher<K, T> = Arc::new(move |key| fetch(key).boxed_local());
        Self {
            label,
            fetcher,
            inner: Arc::new(Mutex::new(QueryState {
                generation: 0,
                key: None,
                in_flight: Vec::new(),
                snapshot: ListSnapshot::default(),
                listeners: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueryState<K, T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switches to `key`: aborts every in-flight read and issues a new one.
    pub fn track(&self, key: K) -> impl Future<Output = LoadOutcome> + 'static {
        let (generation, registration) = {
            let mut state = self.state();
            Self::abort_all(&mut state);
            state.key = Some(key.clone());
            Self::begin(&mut state)
        };
        self.notify();
        self.run(generation, registration, key)
    }

    /// Fetches the current key again under a new token. Earlier requests keep
    /// running until `track` or `cancel`; whatever they return is discarded.
    pub fn refetch(&self) -> LocalBoxFuture<'static, LoadOutcome> {
        let issued = {
            let mut state = self.state();
            match state.key.clone() {
                Some(key) => Some((key, Self::begin(&mut state))),
                None => None,
            }
        };
        match issued {
            Some((key, (generation, registration))) => {
                self.notify();
                self.run(generation, registration, key).boxed_local()
            }
            None => futures::future::ready(LoadOutcome::Idle).boxed_local(),
        }
    }

    /// Aborts every in-flight read. A result that still arrives is dropped.
    pub fn cancel(&self) {
        let changed = {
            let mut state = self.state();
            state.generation += 1;
            Self::abort_all(&mut state);
            let was_loading = state.snapshot.state == LoadState::Loading;
            if was_loading {
                state.snapshot.state = LoadState::Idle;
            }
            was_loading
        };
        if changed {
            log::debug!("{}: cancelled", self.label);
            self.notify();
        }
    }

    /// Optimistic local edit; the next successful fetch replaces it.
    pub fn set_data(&self, update: impl FnOnce(&mut Vec<T>)) {
        update(&mut self.state().snapshot.data);
        self.notify();
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.state().snapshot.clone()
    }

    pub fn key(&self) -> Option<K> {
        self.state().key.clone()
    }

    /// Calls `listener` with every new snapshot.
    pub fn subscribe(&self, listener: impl Fn(&ListSnapshot<T>) + Send + Sync + 'static) {
        self.state().listeners.push(Arc::new(listener));
    }

    fn begin(state: &mut QueryState<K, T>) -> (u64, AbortRegistration) {
        state.generation += 1;
        let (handle, registration) = AbortHandle::new_pair();
        state.in_flight.push((state.generation, handle));
        state.snapshot.state = LoadState::Loading;
        state.snapshot.error = None;
        (state.generation, registration)
    }

    fn abort_all(state: &mut QueryState<K, T>) {
        for (_, handle) in state.in_flight.drain(..) {
            handle.abort();
        }
    }

    fn settle(&self, generation: u64) {
        self.state().in_flight.retain(|(issued, _)| *issued != generation);
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.state().in_flight.len()
    }

    fn run(
        &self,
        generation: u64,
        registration: AbortRegistration,
        key: K,
    ) -> impl Future<Output = LoadOutcome> + 'static {
        let request = Abortable::new((self.fetcher)(key), registration);
        let query = self.clone();
        async move {
            match request.await {
                Ok(result) => query.complete(generation, result),
                Err(_aborted) => {
                    query.settle(generation);
                    LoadOutcome::Cancelled
                }
            }
        }
    }

    fn complete(&self, generation: u64, result: ClientResult<Vec<T>>) -> LoadOutcome {
        let outcome = {
            let mut state = self.state();
            state.in_flight.retain(|(issued, _)| *issued != generation);
            if state.generation != generation {
                log::debug!(
                    "{}: dropped stale response (generation {} < {})",
                    self.label,
                    generation,
                    state.generation
                );
                return LoadOutcome::Superseded;
            }
            match result {
                Ok(items) => {
                    state.snapshot.data = items;
                    state.snapshot.state = LoadState::Ready;
                    state.snapshot.error = None;
                    LoadOutcome::Applied
                }
                Err(ClientError::Cancelled) => {
                    state.snapshot.state = LoadState::Idle;
                    LoadOutcome::Cancelled
                }
                Err(err) => {
                    log::debug!("{}: {}", self.label, err);
                    state.snapshot.state = LoadState::Failed;
                    state.snapshot.error = Some(err.user_message());
                    LoadOutcome::Failed(err)
                }
            }
        };
        self.notify();
        outcome
    }

    /// Listeners run after the lock is released so they may read the query.
    fn notify(&self) {
        let (snapshot, listeners) = {
            let state = self.state();
            (state.snapshot.clone(), state.listeners.clone())
        };
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

impl<K, T> ListQuery<K, T>
where
    K: Clone + 'static,
    T: Entity + 'static,
{
    /// Replaces the row with the same id, or appends it.
    pub fn upsert(&self, item: T) {
        self.set_data(|rows| match rows.iter_mut().find(|row| row.id() == item.id()) {
            Some(row) => *row = item,
            None => rows.push(item),
        });
    }
}

// ========================
// Single reads
// ========================

/// Abort switch for one `cancellable` read.
#[derive(Debug, Clone)]
pub struct CancelHandle(AbortHandle);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_aborted()
    }
}

/// Wraps a read so it can be aborted; an aborted read yields `Cancelled`.
pub fn cancellable<F, T>(read: F) -> (impl Future<Output = ClientResult<T>>, CancelHandle)
where
    F: Future<Output = ClientResult<T>>,
{
    let (handle, registration) = AbortHandle::new_pair();
    let wrapped = Abortable::new(read, registration)
        .map(|finished| finished.unwrap_or_else(|_aborted| Err(ClientError::Cancelled)));
    (wrapped, CancelHandle(handle))
}
