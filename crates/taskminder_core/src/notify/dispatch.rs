//! Delivery of due notifications.
//!
//! The dispatcher pulls due rows from the backend and hands them to a sink
//! (terminal, desktop bridge, test recorder), decorated with the injected
//! presentation settings.

use crate::clock::Clock;
use crate::notify::backend::{BackendResult, ScheduledNotification};
use crate::notify::handler::NotificationHandlerConfig;
use crate::notify::sqlite_backend::SqliteNotificationBackend;
use log::{info, warn};
use std::time::Duration;
use tokio::sync::watch;

/// One notification ready to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub notification: ScheduledNotification,
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

/// Receiver of delivered notifications.
pub trait DeliverySink: Send + Sync {
    fn deliver(&self, presentation: &Presentation);
}

/// Delivers every notification due at `now_ms`; returns how many fired.
pub fn deliver_due(
    backend: &SqliteNotificationBackend,
    now_ms: i64,
    handler: &NotificationHandlerConfig,
    sink: &dyn DeliverySink,
) -> BackendResult<usize> {
    let due = backend.take_due(now_ms)?;
    let count = due.len();
    for notification in due {
        let presentation = Presentation {
            play_sound: handler.play_sound && notification.content.sound,
            show_alert: handler.show_alert,
            set_badge: handler.set_badge,
            notification,
        };
        info!(
            "event=notification_deliver module=notify status=ok identifier={} task_id={} slot={}",
            presentation.notification.identifier,
            presentation.notification.content.data.task_id,
            presentation.notification.content.data.slot
        );
        sink.deliver(&presentation);
    }
    Ok(count)
}

/// Runs [`deliver_due`] every `interval` until `shutdown` flips to `true`.
///
/// Backend failures are logged and retried on the next tick.
pub async fn run_delivery_loop(
    backend: &SqliteNotificationBackend,
    clock: &dyn Clock,
    handler: NotificationHandlerConfig,
    sink: &dyn DeliverySink,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    info!(
        "event=delivery_loop module=notify status=start interval_ms={}",
        interval.as_millis()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = deliver_due(backend, clock.now_ms(), &handler, sink) {
                    warn!("event=delivery_loop module=notify status=degraded error={err}");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("event=delivery_loop module=notify status=stopped");
}
