//! Engine subsystems
//!
//! Subsystems are engine-lifetime services (audio mixer, physics stepper,
//! window pump) identified by a string ID. They update every frame no matter
//! the engine state; only the delta they receive is affected (zero under
//! `ZeroDelta`).

use crate::core::messages::{Message, MessageResult};

/// A service owned by the [`Engine`](crate::core::Engine) for its whole
/// lifetime.
pub trait Subsystem {
    /// Identifier used for lookup and removal
    fn id(&self) -> &str;

    /// Called once per frame, before the scene updates
    fn update(&mut self, _delta: f32) {}

    /// Message hook; default ignores everything
    fn receive_message(&mut self, _message: &Message) -> MessageResult {
        MessageResult::Unhandled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::{Command, MessageTarget};

    struct Counter {
        ticks: u32,
    }

    impl Subsystem for Counter {
        fn id(&self) -> &str {
            "counter"
        }

        fn update(&mut self, _delta: f32) {
            self.ticks += 1;
        }

        fn receive_message(&mut self, message: &Message) -> MessageResult {
            match &message.command {
                Command::Signal(s) if s == "reset" => {
                    self.ticks = 0;
                    MessageResult::Handled
                }
                _ => MessageResult::Unhandled,
            }
        }
    }

    #[test]
    fn test_subsystem_default_hooks() {
        let mut counter = Counter { ticks: 0 };
        counter.update(0.016);
        counter.update(0.016);
        assert_eq!(counter.ticks, 2);

        let msg = Message::new(MessageTarget::Subsystems, Command::Signal("reset".into()));
        assert_eq!(counter.receive_message(&msg), MessageResult::Handled);
        assert_eq!(counter.ticks, 0);

        let other = Message::new(MessageTarget::Subsystems, Command::SetActive(true));
        assert_eq!(counter.receive_message(&other), MessageResult::Unhandled);
    }
}
