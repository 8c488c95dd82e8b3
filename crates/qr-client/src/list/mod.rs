//! List view controllers
//!
//! A [`ListViewController`] owns the filters and pagination of one list, the
//! fetch epoch and the last applied page of entities. Every fetch is tagged
//! with the epoch at issue time and its result is applied only while that
//! tag is still current, so the last issued request always wins regardless
//! of the order in which responses arrive.

mod debounce;

pub use debounce::Debouncer;

use crate::error::{Error, ErrorKind, Result};
use crate::gateway::RequestExecutor;
use crate::resources::{FilterKind, ListQuery, ListResult, ResourceAdapter, DEFAULT_PAGE_SIZE};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

/// Default quiet period for free-text filters
pub const DEFAULT_TEXT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default coalescing window for dropdown-style filters
pub const DEFAULT_DISCRETE_DEBOUNCE: Duration = Duration::from_millis(10);

/// Presentation of a list; the controller never draws anything itself
///
/// Both methods are called with the controller state locked, so calls are
/// ordered by epoch. Implementations must not call back into the controller.
pub trait ListRenderer<E>: Send + Sync {
    fn render(&self, view: &ListView<E>);

    /// `context` is the resource label, e.g. `users`
    fn show_error(&self, context: &str, error: &Error);
}

/// Visible state of a list
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<E> {
    pub items: Vec<E>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u64,
    pub filters: BTreeMap<String, String>,
    pub loading: bool,
}

/// How a single fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result was current and has been rendered
    Applied,
    /// A newer fetch was issued meanwhile; the result was dropped silently
    Superseded,
    /// The fetch was current and failed; the error has been shown
    Failed(ErrorKind),
}

#[derive(Debug, Clone)]
pub struct ListSettings {
    pub page_size: NonZeroU32,
    pub text_debounce: Duration,
    /// Delay for dropdown-style filters; changes made within it coalesce
    /// into one fetch
    pub discrete_debounce: Duration,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            text_debounce: DEFAULT_TEXT_DEBOUNCE,
            discrete_debounce: DEFAULT_DISCRETE_DEBOUNCE,
        }
    }
}

struct ControllerState<E> {
    query: ListQuery,
    epoch: u64,
    items: Vec<E>,
    total: u64,
    loading: bool,
}

impl<E: Clone> ControllerState<E> {
    fn view(&self) -> ListView<E> {
        let page_size = self.query.page_size();
        ListView {
            items: self.items.clone(),
            total: self.total,
            page: self.query.page(),
            page_size: page_size.get(),
            page_count: self.total.div_ceil(u64::from(page_size.get())),
            filters: self.query.filters().clone(),
            loading: self.loading,
        }
    }
}

struct Inner<A: ResourceAdapter> {
    adapter: A,
    executor: Arc<dyn RequestExecutor>,
    renderer: Arc<dyn ListRenderer<A::Entity>>,
    settings: ListSettings,
    state: Mutex<ControllerState<A::Entity>>,
    debouncer: Debouncer,
}

enum Step {
    Done(FetchOutcome),
    Refetch,
}

/// Filterable, paginated list of one resource type
///
/// Cheap to clone; clones share state. Dropping the last handle cancels any
/// pending debounced fetch.
pub struct ListViewController<A: ResourceAdapter> {
    inner: Arc<Inner<A>>,
}

impl<A: ResourceAdapter> Clone for ListViewController<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: ResourceAdapter> ListViewController<A> {
    pub fn new(
        adapter: A,
        executor: Arc<dyn RequestExecutor>,
        renderer: Arc<dyn ListRenderer<A::Entity>>,
    ) -> Self {
        Self::with_settings(adapter, executor, renderer, ListSettings::default())
    }

    pub fn with_settings(
        adapter: A,
        executor: Arc<dyn RequestExecutor>,
        renderer: Arc<dyn ListRenderer<A::Entity>>,
        settings: ListSettings,
    ) -> Self {
        let state = ControllerState {
            query: ListQuery::new(settings.page_size),
            epoch: 0,
            items: Vec::new(),
            total: 0,
            loading: false,
        };

        Self {
            inner: Arc::new(Inner {
                adapter,
                executor,
                renderer,
                settings,
                state: Mutex::new(state),
                debouncer: Debouncer::new(),
            }),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.inner.adapter
    }

    pub fn query(&self) -> ListQuery {
        self.inner.state.lock().query.clone()
    }

    pub fn snapshot(&self) -> ListView<A::Entity> {
        self.inner.state.lock().view()
    }

    pub fn epoch(&self) -> u64 {
        self.inner.state.lock().epoch
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().loading
    }

    /// Whether a debounced fetch is waiting to be issued
    pub fn has_pending_fetch(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    /// Update a filter and schedule a fetch of page 1.
    ///
    /// Text filters wait for the typing pause; discrete filters fetch on the
    /// next tick. A blank value removes the filter.
    pub fn set_filter(&self, name: &str, value: &str) -> Result<()> {
        let kind = self.inner.adapter.filter_kind(name).ok_or_else(|| {
            Error::Validation(format!(
                "Unknown filter '{}' for {}",
                name,
                self.inner.adapter.resource()
            ))
        })?;

        self.inner.state.lock().query.set_filter(name, value);

        let delay = match kind {
            FilterKind::Text => self.inner.settings.text_debounce,
            FilterKind::Discrete => self.inner.settings.discrete_debounce,
        };
        debug!(
            resource = self.inner.adapter.resource(),
            filter = name,
            delay_ms = delay.as_millis() as u64,
            "Filter changed"
        );
        self.schedule_fetch(delay);
        Ok(())
    }

    /// Go to page `page` (1-based) and fetch it; filters are kept
    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome> {
        let page = NonZeroU32::new(page).ok_or_else(|| Error::Validation("Page must be at least 1".into()))?;
        self.inner.state.lock().query.set_page(page);
        Ok(self.fetch().await)
    }

    /// Change the page size, go back to page 1 and fetch
    pub async fn set_page_size(&self, page_size: u32) -> Result<FetchOutcome> {
        let page_size = NonZeroU32::new(page_size)
            .ok_or_else(|| Error::Validation("Page size must be at least 1".into()))?;
        self.inner.state.lock().query.set_page_size(page_size);
        Ok(self.fetch().await)
    }

    pub async fn next_page(&self) -> FetchOutcome {
        let next = {
            let mut state = self.inner.state.lock();
            let next = state.query.page().saturating_add(1);
            if let Some(page) = NonZeroU32::new(next) {
                state.query.set_page(page);
            }
            next
        };
        debug!(resource = self.inner.adapter.resource(), page = next, "Next page");
        self.fetch().await
    }

    pub async fn previous_page(&self) -> FetchOutcome {
        {
            let mut state = self.inner.state.lock();
            let previous = state.query.page().saturating_sub(1);
            if let Some(page) = NonZeroU32::new(previous) {
                state.query.set_page(page);
            }
        }
        self.fetch().await
    }

    /// Fetch with the current query. Any pending debounced fetch is
    /// superseded by this one.
    pub async fn fetch(&self) -> FetchOutcome {
        self.inner.debouncer.cancel();
        self.inner.fetch().await
    }

    /// Alias of [`fetch`](Self::fetch) for the refresh button
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch().await
    }

    /// Cancel pending work and make in-flight results stale
    pub fn dispose(&self) {
        self.inner.debouncer.cancel();
        let mut state = self.inner.state.lock();
        state.epoch += 1;
        state.loading = false;
    }

    fn schedule_fetch(&self, delay: Duration) {
        let weak: Weak<Inner<A>> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(delay, async move {
            if let Some(inner) = weak.upgrade() {
                inner.fetch().await;
            }
        });
    }
}

impl<A: ResourceAdapter> Inner<A> {
    async fn fetch(&self) -> FetchOutcome {
        loop {
            let (epoch, request) = {
                let mut state = self.state.lock();
                state.epoch += 1;
                state.loading = true;
                (state.epoch, self.adapter.list_request(&state.query))
            };
            debug!(resource = self.adapter.resource(), epoch, "Fetching list");

            let result = match self.executor.execute(&request).await {
                Ok(response) => self.adapter.parse_list(&response),
                Err(e) => Err(e),
            };

            match self.complete(epoch, result) {
                Step::Done(outcome) => return outcome,
                Step::Refetch => continue,
            }
        }
    }

    fn complete(&self, epoch: u64, result: Result<ListResult<A::Entity>>) -> Step {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            debug!(
                resource = self.adapter.resource(),
                epoch,
                current = state.epoch,
                "Discarding superseded list response"
            );
            return Step::Done(FetchOutcome::Superseded);
        }

        match result {
            Ok(list) => {
                let last_page = list.page_count(state.query.page_size()).max(1);
                if u64::from(state.query.page()) > last_page {
                    let clamped = u32::try_from(last_page)
                        .ok()
                        .and_then(NonZeroU32::new)
                        .unwrap_or(NonZeroU32::MIN);
                    debug!(
                        resource = self.adapter.resource(),
                        page = state.query.page(),
                        clamped = clamped.get(),
                        "Page beyond last page, clamping"
                    );
                    state.query.set_page(clamped);
                    return Step::Refetch;
                }

                state.items = list.items;
                state.total = list.total;
                state.loading = false;
                self.renderer.render(&state.view());
                Step::Done(FetchOutcome::Applied)
            }
            Err(err) => {
                state.loading = false;
                warn!(
                    resource = self.adapter.resource(),
                    epoch,
                    error = %err,
                    "List fetch failed"
                );
                self.renderer.show_error(self.adapter.resource(), &err);
                Step::Done(FetchOutcome::Failed(err.kind()))
            }
        }
    }
}
