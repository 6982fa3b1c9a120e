//! Registry of interest: message `type` tag → ordered callbacks.
//!
//! Callbacks are identified by their `Rc` allocation. Registering the same
//! callback twice is allowed and yields two invocations per message; `off`
//! removes one registration per call. There is no implicit de-duplication.

use std::collections::HashMap;
use std::rc::Rc;

use hexchess_protocol::ServerMessage;

/// A subscriber for one message tag.
pub type MessageCallback = Rc<dyn Fn(&ServerMessage)>;

#[derive(Default)]
pub struct SubscriptionRegistry {
    by_tag: HashMap<String, Vec<MessageCallback>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, tag: impl Into<String>, callback: MessageCallback) {
        self.by_tag.entry(tag.into()).or_default().push(callback);
    }

    /// Remove the earliest registration of `callback` for `tag`.
    ///
    /// Returns false if it was not registered.
    pub fn off(&mut self, tag: &str, callback: &MessageCallback) -> bool {
        let Some(callbacks) = self.by_tag.get_mut(tag) else {
            return false;
        };
        let Some(index) = callbacks.iter().position(|cb| Rc::ptr_eq(cb, callback)) else {
            return false;
        };
        callbacks.remove(index);
        if callbacks.is_empty() {
            self.by_tag.remove(tag);
        }
        true
    }

    /// Invoke every callback registered for the message's tag.
    ///
    /// Returns how many callbacks ran.
    pub fn dispatch(&self, message: &ServerMessage) -> usize {
        let Some(callbacks) = self.by_tag.get(message.tag()) else {
            return 0;
        };
        for callback in callbacks {
            callback(message);
        }
        callbacks.len()
    }

    pub fn count(&self, tag: &str) -> usize {
        self.by_tag.get(tag).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (tag, callbacks) in &self.by_tag {
            map.entry(tag, &callbacks.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexchess_protocol::{BattleNotice, LevelUpNotice};
    use std::cell::RefCell;

    fn level_up() -> ServerMessage {
        ServerMessage::LevelUpNotice(LevelUpNotice {
            level: 4,
            xp: None,
        })
    }

    fn counter() -> (Rc<RefCell<u32>>, MessageCallback) {
        let count = Rc::new(RefCell::new(0));
        let count_clone = Rc::clone(&count);
        let callback: MessageCallback =
            Rc::new(move |_: &ServerMessage| *count_clone.borrow_mut() += 1);
        (count, callback)
    }

    #[test]
    fn test_double_registration_invokes_twice() {
        let mut registry = SubscriptionRegistry::new();
        let (count, callback) = counter();

        registry.on("LevelUpNotice", Rc::clone(&callback));
        registry.on("LevelUpNotice", Rc::clone(&callback));

        assert_eq!(registry.dispatch(&level_up()), 2);
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_off_removes_exactly_one_registration() {
        let mut registry = SubscriptionRegistry::new();
        let (count, callback) = counter();

        registry.on("LevelUpNotice", Rc::clone(&callback));
        registry.on("LevelUpNotice", Rc::clone(&callback));

        assert!(registry.off("LevelUpNotice", &callback));
        assert_eq!(registry.count("LevelUpNotice"), 1);
        registry.dispatch(&level_up());
        assert_eq!(*count.borrow(), 1);

        assert!(registry.off("LevelUpNotice", &callback));
        assert!(!registry.off("LevelUpNotice", &callback));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_off_matches_by_identity_not_behaviour() {
        let mut registry = SubscriptionRegistry::new();
        let (_, first) = counter();
        let (_, second) = counter();

        registry.on("LevelUpNotice", Rc::clone(&first));
        assert!(!registry.off("LevelUpNotice", &second));
        assert!(!registry.off("BattleNotice", &first));
        assert_eq!(registry.count("LevelUpNotice"), 1);
    }

    #[test]
    fn test_dispatch_is_keyed_by_tag_and_ordered() {
        let mut registry = SubscriptionRegistry::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for id in ["a", "b", "c"] {
            let order = Rc::clone(&order);
            registry.on(
                "LevelUpNotice",
                Rc::new(move |_: &ServerMessage| order.borrow_mut().push(id)),
            );
        }

        let battle = ServerMessage::BattleNotice(BattleNotice {
            in_battle: true,
            round: None,
        });
        assert_eq!(registry.dispatch(&battle), 0);
        registry.dispatch(&level_up());
        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }
}
