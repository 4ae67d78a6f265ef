use std::collections::{HashSet, VecDeque};
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use userhub_events::{EventBus, NotificationEnvelope, Subscription};

/// How many recent event ids are remembered for duplicate suppression.
const DEDUP_WINDOW: usize = 1024;

/// Handle to control and join a background worker. Dropping it without
/// calling [`WorkerHandle::shutdown`] also stops the worker, without joining.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Notification delivery loop.
///
/// - Subscribes to a notification bus
/// - Hands each envelope to `handler` (the mail transport seam)
/// - Drops redelivered envelopes it has already handled, by `event_id`
/// - Supports graceful shutdown
#[derive(Debug)]
pub struct NotificationWorker;

impl NotificationWorker {
    pub fn spawn<B, H, E>(name: &'static str, bus: B, mut handler: H) -> io::Result<WorkerHandle>
    where
        B: EventBus<NotificationEnvelope> + Send + Sync + 'static,
        H: FnMut(&NotificationEnvelope) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

/// Default handler: record the delivery in the log. Stands in for a mail
/// transport.
pub fn log_delivery(envelope: &NotificationEnvelope) -> Result<(), std::convert::Infallible> {
    info!(
        event_id = %envelope.event_id(),
        occurred_at = %envelope.occurred_at(),
        routing_key = envelope.event().routing_key(),
        recipient = envelope.event().email(),
        "notification delivered"
    );
    Ok(())
}

#[derive(Debug, Default)]
struct SeenIds {
    order: VecDeque<Uuid>,
    ids: HashSet<Uuid>,
}

impl SeenIds {
    /// False if `id` was already recorded.
    fn record(&mut self, id: Uuid) -> bool {
        if !self.ids.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > DEDUP_WINDOW {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
        true
    }
}

fn worker_loop<H, E>(
    name: &'static str,
    sub: Subscription<NotificationEnvelope>,
    shutdown_rx: mpsc::Receiver<()>,
    handler: &mut H,
) where
    H: FnMut(&NotificationEnvelope) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(250);
    let mut seen = SeenIds::default();

    loop {
        // Explicit shutdown, or the handle was dropped.
        match shutdown_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        match sub.recv_timeout(tick) {
            Ok(envelope) => {
                if !seen.record(envelope.event_id()) {
                    continue;
                }
                if let Err(err) = handler(&envelope) {
                    warn!(
                        worker = name,
                        routing_key = envelope.event().routing_key(),
                        error = ?err,
                        "notification delivery failed"
                    );
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use userhub_events::{InMemoryEventBus, NotificationEvent};

    use super::*;

    fn wait_for(delivered: &Arc<Mutex<Vec<String>>>, n: usize) -> Vec<String> {
        for _ in 0..200 {
            let seen = delivered.lock().unwrap().clone();
            if seen.len() >= n {
                return seen;
            }
            thread::sleep(Duration::from_millis(10));
        }
        delivered.lock().unwrap().clone()
    }

    #[test]
    fn delivers_each_envelope_once() {
        let bus = Arc::new(InMemoryEventBus::<NotificationEnvelope>::new());
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = delivered.clone();

        let handle = NotificationWorker::spawn("test-notifications", bus.clone(), move |env: &NotificationEnvelope| {
            sink.lock().unwrap().push(env.event().routing_key().to_string());
            Ok::<(), ()>(())
        })
        .unwrap();

        let welcome = NotificationEnvelope::new(NotificationEvent::welcome("a@bcdefgh.com"));
        bus.publish(welcome.clone()).unwrap();
        bus.publish(welcome).unwrap();
        bus.publish(NotificationEnvelope::new(NotificationEvent::verification("a@bcdefgh.com", "tok")))
            .unwrap();

        let seen = wait_for(&delivered, 2);
        handle.shutdown();

        assert_eq!(seen, vec!["welcome.email", "verification.email"]);
    }

    #[test]
    fn handler_failure_does_not_stop_the_worker() {
        let bus = Arc::new(InMemoryEventBus::<NotificationEnvelope>::new());
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = delivered.clone();

        let handle = NotificationWorker::spawn("test-failing", bus.clone(), move |env: &NotificationEnvelope| {
            let email = env.event().email().to_string();
            if email.starts_with("bad") {
                return Err("smtp down");
            }
            sink.lock().unwrap().push(email);
            Ok(())
        })
        .unwrap();

        bus.publish(NotificationEnvelope::new(NotificationEvent::welcome("bad@bcdefgh.com"))).unwrap();
        bus.publish(NotificationEnvelope::new(NotificationEvent::welcome("ok@bcdefgh.com"))).unwrap();

        let seen = wait_for(&delivered, 1);
        handle.shutdown();

        assert_eq!(seen, vec!["ok@bcdefgh.com"]);
    }

    #[test]
    fn dedup_window_is_bounded() {
        let mut seen = SeenIds::default();
        let first = Uuid::now_v7();
        assert!(seen.record(first));
        assert!(!seen.record(first));

        for _ in 0..DEDUP_WINDOW {
            seen.record(Uuid::now_v7());
        }
        assert_eq!(seen.order.len(), DEDUP_WINDOW);
        assert!(seen.record(first));
    }
}
