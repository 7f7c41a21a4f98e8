//! Client sync controller.
//!
//! Owns the user snapshot and the creation form, polls the users and health
//! endpoints, and pushes view models to a [`Surface`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::metrics;
use crate::poll::{spawn_poll, PollHandle, PollKind, RequestTracker};
use crate::render::Surface;
use crate::users::{FormInput, User, UsersApi};
use crate::view::{HealthState, HealthView, Notice, NoticeId, UsersView, GENERIC_CREATE_ERROR};

/// Timing settings for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Interval between user list refreshes.
    pub users_interval: Duration,
    /// Interval between health checks.
    pub health_interval: Duration,
    /// How long a notice stays visible.
    pub notice_ttl: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            users_interval: Duration::from_secs(5),
            health_interval: Duration::from_secs(10),
            notice_ttl: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for SyncSettings {
    fn from(config: &Config) -> Self {
        Self {
            users_interval: Duration::from_millis(config.users_poll_interval_ms),
            health_interval: Duration::from_millis(config.health_poll_interval_ms),
            notice_ttl: Duration::from_millis(config.notice_ttl_ms),
        }
    }
}

/// Result of a user list fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Snapshot replaced with this many users.
    Applied(usize),
    /// Fetch failed; the error placeholder is shown.
    Failed(ApiError),
    /// A newer response was already applied; this one was dropped.
    Stale,
    /// Poll tick skipped because a fetch was still outstanding.
    Skipped,
}

/// Result of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Server stored the user.
    Created(User),
    /// Submission failed with this user-facing message.
    Rejected(String),
}

/// Handles to the two poll tasks started by [`SyncController::initialize`].
#[derive(Debug)]
pub struct SyncHandles {
    /// User list poll.
    pub users: PollHandle,
    /// Health poll.
    pub health: PollHandle,
}

impl SyncHandles {
    /// Stop both polls.
    pub fn cancel(&self) {
        self.users.cancel();
        self.health.cancel();
    }
}

/// Keeps the rendered users list and health indicator in sync with the server.
pub struct SyncController<A, S> {
    api: A,
    surface: Arc<Mutex<S>>,
    snapshot: RwLock<Vec<User>>,
    form: Mutex<FormInput>,
    settings: SyncSettings,
    users_requests: RequestTracker,
    health_requests: RequestTracker,
    next_notice: AtomicU64,
}

impl<A, S> SyncController<A, S>
where
    A: UsersApi + 'static,
    S: Surface + 'static,
{
    /// Create a controller rendering into `surface`.
    pub fn new(api: A, surface: S, settings: SyncSettings) -> Self {
        Self {
            api,
            surface: Arc::new(Mutex::new(surface)),
            snapshot: RwLock::new(Vec::new()),
            form: Mutex::new(FormInput::default()),
            settings,
            users_requests: RequestTracker::new(),
            health_requests: RequestTracker::new(),
            next_notice: AtomicU64::new(0),
        }
    }

    /// Shared handle to the render surface.
    pub fn surface(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.surface)
    }

    /// Copy of the current snapshot.
    pub async fn snapshot(&self) -> Vec<User> {
        self.snapshot.read().await.clone()
    }

    /// Replace the form field values.
    pub async fn fill_form(&self, input: FormInput) {
        *self.form.lock().await = input;
    }

    /// Current form field values.
    pub async fn form(&self) -> FormInput {
        self.form.lock().await.clone()
    }

    /// Fetch users and check health now, then keep polling both.
    pub fn initialize(self: &Arc<Self>) -> SyncHandles {
        info!(
            users_interval = ?self.settings.users_interval,
            health_interval = ?self.settings.health_interval,
            "Starting sync"
        );

        let controller = Arc::clone(self);
        let users = spawn_poll(PollKind::Users, self.settings.users_interval, move || {
            let controller = Arc::clone(&controller);
            async move {
                controller.poll_users().await;
            }
        });

        let controller = Arc::clone(self);
        let health = spawn_poll(PollKind::Health, self.settings.health_interval, move || {
            let controller = Arc::clone(&controller);
            async move {
                controller.poll_health().await;
            }
        });

        SyncHandles { users, health }
    }

    /// Poll tick for the user list: fetch unless a fetch is outstanding.
    pub async fn poll_users(&self) -> FetchOutcome {
        if self.users_requests.is_busy() {
            debug!("User fetch still outstanding, skipping tick");
            metrics::inc_poll_ticks_skipped(PollKind::Users.as_str());
            return FetchOutcome::Skipped;
        }
        self.fetch_users().await
    }

    /// Fetch the user list and replace the snapshot.
    ///
    /// On failure the snapshot is discarded and the error placeholder shown.
    #[instrument(skip(self))]
    pub async fn fetch_users(&self) -> FetchOutcome {
        let ticket = self.users_requests.begin();
        let result = self.api.list_users().await;
        metrics::inc_users_fetched(result.is_ok());

        let mut surface = self.surface.lock().await;
        if !self.users_requests.try_apply(&ticket) {
            debug!(seq = ticket.seq(), "Discarding stale user list");
            return FetchOutcome::Stale;
        }

        let mut snapshot = self.snapshot.write().await;
        match result {
            Ok(users) => {
                let count = users.len();
                *snapshot = users;
                surface.render_users(&UsersView::from_snapshot(&snapshot));
                debug!(count, "User list refreshed");
                FetchOutcome::Applied(count)
            }
            Err(e) => {
                error!(error = %e, kind = %e.kind(), "Error loading users");
                snapshot.clear();
                surface.render_users(&UsersView::Failed);
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Render the current snapshot.
    pub async fn render_users(&self) {
        let mut surface = self.surface.lock().await;
        let snapshot = self.snapshot.read().await;
        surface.render_users(&UsersView::from_snapshot(&snapshot));
    }

    /// Submit the form.
    ///
    /// Success clears the form, shows a notice and refreshes the list. Failure
    /// keeps the form as typed and shows the server's reason.
    #[instrument(skip(self))]
    pub async fn submit_user(&self) -> SubmitOutcome {
        let payload = self.form.lock().await.to_new_user();

        match self.api.create_user(&payload).await {
            Ok(user) => {
                metrics::inc_users_created(true);
                info!(id = user.id, name = %user.name, "User created");

                self.show_message(Notice::created(&user.name)).await;
                self.form.lock().await.clear();
                self.fetch_users().await;

                SubmitOutcome::Created(user)
            }
            Err(e) => {
                metrics::inc_users_created(false);
                error!(error = %e, "Error creating user");

                let message = e
                    .server_message()
                    .unwrap_or(GENERIC_CREATE_ERROR)
                    .to_string();
                self.show_message(Notice::failed(&message)).await;

                SubmitOutcome::Rejected(message)
            }
        }
    }

    /// Poll tick for health: check unless a check is outstanding.
    pub async fn poll_health(&self) -> Option<HealthState> {
        if self.health_requests.is_busy() {
            debug!("Health check still outstanding, skipping tick");
            metrics::inc_poll_ticks_skipped(PollKind::Health.as_str());
            return None;
        }
        Some(self.check_health().await)
    }

    /// Check server health and update the indicator.
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> HealthState {
        let ticket = self.health_requests.begin();
        self.surface.lock().await.set_health(&HealthView::checking());

        let view = match self.api.health().await {
            Ok(status) => {
                metrics::inc_health_checks(true);
                HealthView::healthy(&status)
            }
            Err(e) => {
                metrics::inc_health_checks(false);
                warn!(error = %e, "Health check error");
                HealthView::unhealthy()
            }
        };

        let mut surface = self.surface.lock().await;
        if self.health_requests.try_apply(&ticket) {
            surface.set_health(&view);
        } else {
            debug!(seq = ticket.seq(), "Discarding stale health result");
        }

        view.state
    }

    /// Show a notice and remove it once the notice TTL has passed.
    pub async fn show_message(&self, notice: Notice) -> NoticeId {
        let id = self.next_notice.fetch_add(1, Ordering::SeqCst) + 1;
        self.surface.lock().await.show_notice(id, &notice);

        let surface = Arc::clone(&self.surface);
        let ttl = self.settings.notice_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            surface.lock().await.dismiss_notice(id);
        });

        id
    }
}
