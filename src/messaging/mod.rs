// Messaging - notifications lock-free pour la console

pub mod channels;
pub mod notification;

pub use channels::{
    NotificationConsumer, NotificationProducer, create_notification_channel, drain_notifications,
    send_notification,
};
pub use notification::{Notification, NotificationCategory, NotificationLevel};
