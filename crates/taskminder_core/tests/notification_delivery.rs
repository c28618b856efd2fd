use std::sync::{Arc, Mutex};
use std::time::Duration;
use taskminder_core::db::open_db_in_memory;
use taskminder_core::{
    deliver_due, run_delivery_loop, Clock, DeliverySink, InMemoryTaskStore, ManualClock,
    NotificationBackend, NotificationContent, NotificationHandlerConfig, Presentation, Priority,
    ReminderScheduler, ReminderSlot, SqliteNotificationBackend, Task, TaskCoordinator,
};

const T0: i64 = 1_700_000_000_000;
const MINUTE_MS: i64 = 60 * 1000;

#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<Presentation>>,
}

impl RecordingSink {
    fn identifiers(&self) -> Vec<String> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .map(|presentation| presentation.notification.identifier.clone())
            .collect()
    }
}

impl DeliverySink for RecordingSink {
    fn deliver(&self, presentation: &Presentation) {
        self.delivered.lock().unwrap().push(presentation.clone());
    }
}

fn backend() -> SqliteNotificationBackend {
    SqliteNotificationBackend::new(open_db_in_memory().unwrap())
}

fn content(task_id: &str) -> NotificationContent {
    let task = Task::with_id(task_id, "Buy milk", Priority::Medium, T0).unwrap();
    NotificationContent::for_task(&task, ReminderSlot::Primary)
}

#[tokio::test]
async fn schedule_upserts_by_identifier() {
    let backend = backend();

    backend.schedule("t1", T0 + 1, &content("t1")).await.unwrap();
    backend.schedule("t1", T0 + 2, &content("t1")).await.unwrap();

    let pending = backend.list_pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].fire_at, T0 + 2);
    assert_eq!(pending[0].content, content("t1"));
}

#[tokio::test]
async fn cancel_unknown_identifier_is_ok() {
    let backend = backend();
    backend.cancel("never-scheduled").await.unwrap();
    backend.cancel("never-scheduled").await.unwrap();
    assert!(backend.pending_identifiers().await.unwrap().is_empty());
}

#[tokio::test]
async fn cancel_all_clears_everything() {
    let backend = backend();
    backend.schedule("a", T0, &content("a")).await.unwrap();
    backend.schedule("b", T0, &content("b")).await.unwrap();

    backend.cancel_all().await.unwrap();

    assert!(backend.pending_identifiers().await.unwrap().is_empty());
}

#[tokio::test]
async fn take_due_returns_each_notification_once_in_fire_order() {
    let backend = backend();
    backend.schedule("late", T0 + 30, &content("late")).await.unwrap();
    backend.schedule("early", T0 + 10, &content("early")).await.unwrap();
    backend.schedule("future", T0 + 99, &content("future")).await.unwrap();

    let due = backend.take_due(T0 + 30).unwrap();
    let ids: Vec<_> = due.iter().map(|n| n.identifier.as_str()).collect();
    assert_eq!(ids, vec!["early", "late"]);

    assert!(backend.take_due(T0 + 30).unwrap().is_empty());
    assert_eq!(
        backend.pending_identifiers().await.unwrap(),
        vec!["future".to_string()]
    );
}

#[tokio::test]
async fn delivered_rows_stay_known_until_rescheduled_or_cancelled() {
    let backend = backend();
    backend.schedule("t1", T0, &content("t1")).await.unwrap();

    backend.take_due(T0).unwrap();
    assert!(backend.pending_identifiers().await.unwrap().is_empty());
    assert!(backend.list_pending().unwrap().is_empty());
    assert_eq!(backend.delivered_identifiers().await.unwrap(), vec!["t1"]);

    backend.schedule("t1", T0 + 5, &content("t1")).await.unwrap();
    assert!(backend.delivered_identifiers().await.unwrap().is_empty());
    assert_eq!(backend.pending_identifiers().await.unwrap(), vec!["t1"]);

    backend.take_due(T0 + 5).unwrap();
    backend.cancel("t1").await.unwrap();
    assert!(backend.delivered_identifiers().await.unwrap().is_empty());
}

#[tokio::test]
async fn restart_after_delivery_leaves_fired_reminder_spent() {
    let backend = Arc::new(backend());
    let store = Arc::new(InMemoryTaskStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let coordinator = TaskCoordinator::new(Arc::clone(&store), Arc::clone(&backend), clock.clone());
    let task = coordinator.add_task("Buy milk", Priority::Medium).await.unwrap();

    clock.advance_ms(6 * MINUTE_MS);
    let sink = RecordingSink::default();
    deliver_due(&backend, clock.now_ms(), &NotificationHandlerConfig::default(), &sink).unwrap();
    assert_eq!(sink.identifiers(), vec![task.id.clone()]);

    let restarted = TaskCoordinator::new(store, Arc::clone(&backend), clock.clone());
    restarted.load().await;

    assert!(backend.list_pending().unwrap().is_empty());
    assert_eq!(backend.delivered_identifiers().await.unwrap(), vec![task.id]);
}

#[tokio::test]
async fn deliver_due_applies_handler_config() {
    let backend = backend();
    backend.schedule("t1", T0, &content("t1")).await.unwrap();
    let sink = RecordingSink::default();
    let handler = NotificationHandlerConfig {
        play_sound: false,
        ..NotificationHandlerConfig::default()
    };

    let count = deliver_due(&backend, T0, &handler, &sink).unwrap();

    assert_eq!(count, 1);
    let delivered = sink.delivered.lock().unwrap();
    assert!(delivered[0].show_alert);
    assert!(!delivered[0].play_sound);
    assert!(!delivered[0].set_badge);
    assert_eq!(delivered[0].notification.content.data.task_id, "t1");
}

#[tokio::test]
async fn completed_task_reminders_never_fire() {
    let backend = Arc::new(backend());
    let clock = Arc::new(ManualClock::new(T0));
    let scheduler = ReminderScheduler::new(Arc::clone(&backend), clock.clone());
    let kept = Task::with_id("kept", "still pending", Priority::High, T0).unwrap();
    let done = Task::with_id("done", "finished", Priority::High, T0).unwrap();
    scheduler.on_task_created(&kept).await;
    scheduler.on_task_created(&done).await;
    scheduler.on_task_completed("done", Some(Priority::High)).await;

    let sink = RecordingSink::default();
    let handler = NotificationHandlerConfig::default();
    deliver_due(&backend, T0 + 60 * MINUTE_MS, &handler, &sink).unwrap();

    assert_eq!(
        sink.identifiers(),
        vec!["kept", "kept-followup-1", "kept-followup-2"]
    );
}

#[tokio::test]
async fn delivery_loop_stops_on_shutdown() {
    let backend = backend();
    backend.schedule("t1", T0, &content("t1")).await.unwrap();
    let clock = ManualClock::new(T0);
    let sink = RecordingSink::default();
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let run = run_delivery_loop(
        &backend,
        &clock,
        NotificationHandlerConfig::default(),
        &sink,
        Duration::from_millis(5),
        shutdown_rx,
    );
    let stop = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
    };
    tokio::join!(run, stop);

    assert_eq!(sink.identifiers(), vec!["t1"]);
}
