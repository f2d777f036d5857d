use crossbeam_channel::{Receiver, Sender};
use winit::{
    event::{ElementState, KeyEvent},
    keyboard::Key,
};

/// Ordered, unbounded queue of key tokens.
///
/// The window event handler is the producer and the frame driver is
/// the sole consumer: every key press appends one token, and each
/// frame drains the whole queue in arrival order. A token arriving
/// while a drain is in progress lands in either that drain or the
/// next one; arrival order is preserved and nothing is dropped.
pub struct KeyQueue {
    sender: Sender<String>,
    receiver: Receiver<String>,
}

impl KeyQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Append a token to the tail of the queue.
    ///
    /// Any string is accepted, including keys with no mapped effect.
    pub fn push(&self, token: impl Into<String>) {
        // The queue owns both channel ends, so the send cannot fail.
        let _ = self.sender.send(token.into());
    }

    /// Handle a keyboard input event from winit.
    ///
    /// Presses (auto-repeats included, matching browser `keydown`
    /// behavior) are queued; releases are ignored.
    pub fn handle_key(&self, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        if let Some(token) = token_for(&event.logical_key) {
            self.push(token);
        }
    }

    /// Consume every token currently queued, in arrival order.
    ///
    /// The queue is empty afterward (until new presses arrive).
    pub fn drain(&self) -> Vec<String> {
        self.receiver.try_iter().collect()
    }

    /// Number of tokens currently queued.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for KeyQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a winit logical key to a queue token.
///
/// Character keys map to their string ("w", "a", ...); named keys map
/// to their name ("Shift", "ArrowUp", ...). Dead and unidentified
/// keys produce no token.
fn token_for(key: &Key) -> Option<String> {
    match key {
        Key::Character(text) => Some(text.as_str().to_owned()),
        Key::Named(named) => Some(format!("{named:?}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::NamedKey;

    #[test]
    fn drain_preserves_arrival_order() {
        let queue = KeyQueue::new();
        queue.push("w");
        queue.push("a");
        queue.push("w");
        assert_eq!(queue.drain(), vec!["w", "a", "w"]);
    }

    #[test]
    fn drain_leaves_queue_empty() {
        let queue = KeyQueue::new();
        queue.push("d");
        let _ = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(queue.drain(), Vec::<String>::new());
    }

    #[test]
    fn drain_of_empty_queue_is_empty() {
        let queue = KeyQueue::new();
        assert_eq!(queue.drain(), Vec::<String>::new());
    }

    #[test]
    fn queue_is_unbounded() {
        let queue = KeyQueue::new();
        for _ in 0..10_000 {
            queue.push("s");
        }
        assert_eq!(queue.len(), 10_000);
        assert_eq!(queue.drain().len(), 10_000);
    }

    #[test]
    fn any_token_is_accepted() {
        let queue = KeyQueue::new();
        queue.push("Shift");
        queue.push("");
        queue.push("q");
        assert_eq!(queue.drain(), vec!["Shift", "", "q"]);
    }

    #[test]
    fn pushes_across_drains_are_not_lost() {
        let queue = KeyQueue::new();
        queue.push("w");
        assert_eq!(queue.drain(), vec!["w"]);
        queue.push("s");
        queue.push("d");
        assert_eq!(queue.drain(), vec!["s", "d"]);
    }

    #[test]
    fn named_keys_map_to_their_name() {
        assert_eq!(
            token_for(&Key::Named(NamedKey::Shift)),
            Some("Shift".to_owned())
        );
        assert_eq!(
            token_for(&Key::Named(NamedKey::ArrowUp)),
            Some("ArrowUp".to_owned())
        );
    }

    #[test]
    fn character_keys_map_to_their_text() {
        assert_eq!(
            token_for(&Key::Character("w".into())),
            Some("w".to_owned())
        );
    }
}
