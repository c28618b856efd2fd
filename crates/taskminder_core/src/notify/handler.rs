//! Presentation settings applied to every delivered notification.

/// How delivered notifications are presented.
///
/// Built once at process start and handed to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationHandlerConfig {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl Default for NotificationHandlerConfig {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: false,
        }
    }
}
