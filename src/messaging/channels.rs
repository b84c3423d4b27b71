// Communication channels lock-free

use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Producer, Split};

use crate::messaging::notification::Notification;

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity.max(1));
    rb.split()
}

/// Push without blocking; a full channel drops the notification
pub fn send_notification(producer: &mut NotificationProducer, notification: Notification) -> bool {
    producer.try_push(notification).is_ok()
}

/// Everything currently queued, oldest first
pub fn drain_notifications(consumer: &mut NotificationConsumer) -> Vec<Notification> {
    consumer.pop_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::notification::NotificationCategory;

    #[test]
    fn test_full_channel_drops_newest() {
        let (mut tx, mut rx) = create_notification_channel(2);
        assert!(send_notification(&mut tx, Notification::info(NotificationCategory::Audio, "a")));
        assert!(send_notification(&mut tx, Notification::info(NotificationCategory::Audio, "b")));
        assert!(!send_notification(&mut tx, Notification::info(NotificationCategory::Audio, "c")));

        let drained = drain_notifications(&mut rx);
        let messages: Vec<_> = drained.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b"]);
        assert!(drain_notifications(&mut rx).is_empty());
    }
}
