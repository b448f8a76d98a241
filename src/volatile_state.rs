use serenity::all::{Message, UserId};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// State which is lost across sessions
pub struct VolatileState {
    pub pending_replies: PendingReplies,
}

impl VolatileState {
    pub fn new() -> Self {
        Self {
            pending_replies: PendingReplies::new(),
        }
    }
}

pub type PendingReplies = PendingRepliesFor<Message>;

/// At most one waiting interactive flow per user.  Registering a new wait
/// drops any outstanding sender for that user, which resolves the previous
/// flow as abandoned.
pub struct PendingRepliesFor<T>(HashMap<UserId, oneshot::Sender<T>>);

impl<T> PendingRepliesFor<T> {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Start waiting for the next message from `user_id`
    pub fn register(&mut self, user_id: UserId) -> oneshot::Receiver<T> {
        let (tx, rx) = oneshot::channel();
        self.0.insert(user_id, tx);
        rx
    }

    /// Route an incoming message to a waiting flow.  Returns whether the
    /// message was consumed.
    pub fn deliver(&mut self, user_id: UserId, payload: T) -> bool {
        match self.0.remove(&user_id) {
            // send() fails if the flow already timed out and dropped its
            // receiver; the message then flows on to the other plugins.
            Some(tx) => tx.send(payload).is_ok(),
            None => false,
        }
    }

    /// Forget a wait, e.g. after its timeout fired
    pub fn cancel(&mut self, user_id: UserId) {
        self.0.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_to_registered_waiter() {
        let user = UserId::new(7);
        let mut pending = PendingRepliesFor::new();
        let rx = pending.register(user);

        assert!(pending.deliver(user, "0.5".to_string()));
        assert_eq!(rx.await.unwrap(), "0.5");
    }

    #[tokio::test]
    async fn ignores_messages_from_other_users() {
        let mut pending = PendingRepliesFor::<String>::new();
        let _rx = pending.register(UserId::new(7));

        assert!(!pending.deliver(UserId::new(8), "0.5".to_string()));
    }

    #[tokio::test]
    async fn second_registration_replaces_the_first() {
        let user = UserId::new(7);
        let mut pending = PendingRepliesFor::new();
        let rx_first = pending.register(user);
        let rx_second = pending.register(user);

        assert!(pending.deliver(user, "0.5".to_string()));
        assert!(rx_first.await.is_err());
        assert_eq!(rx_second.await.unwrap(), "0.5");
    }

    #[tokio::test]
    async fn dropped_receiver_consumes_nothing() {
        let user = UserId::new(7);
        let mut pending = PendingRepliesFor::new();
        let rx = pending.register(user);
        drop(rx);

        assert!(!pending.deliver(user, "0.5".to_string()));
        pending.cancel(user);
    }
}
