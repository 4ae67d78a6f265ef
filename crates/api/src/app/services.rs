//! Service wiring: directory, password encoder, token service, notification
//! transport, and the background tasks that go with them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use userhub_accounts::{NewUser, UserDirectory, UserWorkflow};
use userhub_auth::{AccessGate, Argon2PasswordEncoder, PasswordEncoder, TokenService};
use userhub_core::{DomainError, DomainResult};
use userhub_events::{InMemoryEventBus, NotificationEnvelope, NotificationSink};
use userhub_infra::workers::notification_worker::log_delivery;
use userhub_infra::{InMemoryUserDirectory, NotificationWorker, WorkerHandle};

use crate::config::AppConfig;

/// Demo accounts: (email, username, password, role, verified).
const DEMO_USERS: [(&str, &str, &str, &str, bool); 5] = [
    ("tomas@gmail.com", "Tomas", "Tomas123.", "USER", true),
    ("tom@gmail.com", "Tomi", "Tomito123.", "USER", false),
    ("manuel@gmail.com", "Manuel", "Manuel123.", "ADMIN", true),
    ("manu@gmail.com", "Manu", "Manuelito123.", "USER", true),
    ("manubal@gmail.com", "Manuca", "Manuca123.", "USER", false),
];

pub struct AppServices {
    workflow: Arc<UserWorkflow>,
    gate: AccessGate,
    // Stops the delivery thread when the services are dropped.
    _delivery: WorkerHandle,
}

impl AppServices {
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Run a workflow operation on the blocking pool; hashing is CPU-bound.
    pub async fn run<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&UserWorkflow) -> DomainResult<T> + Send + 'static,
    {
        let workflow = self.workflow.clone();
        tokio::task::spawn_blocking(move || op(&workflow))
            .await
            .unwrap_or_else(|e| Err(DomainError::internal(format!("workflow task failed: {e}"))))
    }
}

pub fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let tokens = Arc::new(TokenService::new(&config.token));
    let cost = config.hash_cost;
    let encoder: Arc<dyn PasswordEncoder> = Arc::new(
        Argon2PasswordEncoder::with_cost(cost.memory_kib, cost.iterations, cost.parallelism)
            .context("invalid ARGON2_* parameters")?,
    );
    let directory: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());

    let (notifications, delivery) = build_notifications(config)?;

    let workflow = UserWorkflow::new(
        directory,
        encoder,
        tokens.clone(),
        notifications,
        config.password_policy.clone(),
    );

    Ok(AppServices {
        workflow: Arc::new(workflow),
        gate: AccessGate::new(tokens),
        _delivery: delivery,
    })
}

type NotificationBus = Arc<InMemoryEventBus<NotificationEnvelope>>;

/// The workflow only ever publishes to the in-process bus; a worker thread
/// does the delivery, so a slow transport never holds up a request.
fn build_notifications(config: &AppConfig) -> anyhow::Result<(Arc<dyn NotificationSink>, WorkerHandle)> {
    let bus: NotificationBus = Arc::new(InMemoryEventBus::new());
    let worker = spawn_delivery(config, bus.clone())?;
    Ok((Arc::new(bus), worker))
}

#[cfg(feature = "redis")]
fn spawn_delivery(config: &AppConfig, bus: NotificationBus) -> anyhow::Result<WorkerHandle> {
    use userhub_infra::event_bus::RedisNotificationPublisher;

    let worker = match &config.redis_url {
        Some(url) => {
            let mut publisher = RedisNotificationPublisher::new(url).context("invalid REDIS_URL")?;
            info!("forwarding notifications to redis");
            NotificationWorker::spawn("notification-redis", bus, move |envelope: &NotificationEnvelope| {
                publisher.deliver(envelope)
            })
        }
        None => NotificationWorker::spawn("notification-delivery", bus, log_delivery),
    };
    worker.context("failed to spawn notification worker")
}

#[cfg(not(feature = "redis"))]
fn spawn_delivery(config: &AppConfig, bus: NotificationBus) -> anyhow::Result<WorkerHandle> {
    if config.redis_url.is_some() {
        warn!("REDIS_URL is set but this build has no redis support; delivering in-process");
    }
    NotificationWorker::spawn("notification-delivery", bus, log_delivery).context("failed to spawn notification worker")
}

/// Import the demo accounts through the validated seed path.
pub async fn seed_demo_users(services: &AppServices) -> DomainResult<usize> {
    services
        .run(|workflow| {
            for (email, username, password, role, verified) in DEMO_USERS {
                workflow.import_user(&NewUser::new(email, username, password, role), verified)?;
            }
            Ok(DEMO_USERS.len())
        })
        .await
}

/// Periodically delete unverified accounts. The first run happens one full
/// interval after startup.
pub fn spawn_purge_task(services: Arc<AppServices>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match services.run(|workflow| workflow.scheduled_purge()).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "scheduled purge removed unverified users"),
                Err(err) => warn!(error = %err, "scheduled purge failed"),
            }
        }
    })
}
