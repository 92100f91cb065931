//! Typed Message Dispatch
//!
//! Messages are commands routed through the engine: the engine broadcasts to
//! subsystems and the current scene, scenes forward to their objects, and
//! objects route to themselves and/or their components based on the message's
//! target selector.
//!
//! Every receiver reports a [`MessageResult`]; aggregation points fold
//! `Escalate` into `Unhandled` (the escalation channel is reserved and unused
//! by the core).

use glam::{Quat, Vec3};

// ============================================================================
// Results
// ============================================================================

/// Outcome of delivering a message to a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageResult {
    /// The receiver consumed the message
    Handled,
    /// The receiver ignored the message
    Unhandled,
    /// The receiver wants the message passed further up.
    ///
    /// Not used by the core dispatch paths; treated as `Unhandled` wherever
    /// results are aggregated.
    Escalate,
}

impl MessageResult {
    /// Combine two results: handled wins, escalate decays to unhandled.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        if self == Self::Handled || other == Self::Handled {
            Self::Handled
        } else {
            Self::Unhandled
        }
    }

    /// Whether this result counts as handled
    #[must_use]
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

// ============================================================================
// Targets and commands
// ============================================================================

/// Selects which receivers a message is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    /// Subsystems, scene, objects and components
    All,
    /// Scene objects only (components are skipped)
    Objects,
    /// Components only (the owning object does not interpret the command)
    Components,
    /// Engine subsystems only
    Subsystems,
}

impl MessageTarget {
    /// Whether objects should interpret the command themselves
    #[must_use]
    pub fn includes_objects(self) -> bool {
        matches!(self, Self::All | Self::Objects)
    }

    /// Whether the command is forwarded to components
    #[must_use]
    pub fn includes_components(self) -> bool {
        matches!(self, Self::All | Self::Components)
    }

    /// Whether the command is delivered to subsystems
    #[must_use]
    pub fn includes_subsystems(self) -> bool {
        matches!(self, Self::All | Self::Subsystems)
    }

    /// Whether the command reaches the scene graph at all
    #[must_use]
    pub fn includes_scene(self) -> bool {
        matches!(self, Self::All | Self::Objects | Self::Components)
    }
}

/// The command a message carries.
///
/// Objects interpret the structural commands directly; everything else is
/// meaningful only to specific components or subsystems.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Command {
    /// Set the receiving object's active flag
    SetActive(bool),
    /// Rename the receiving object
    SetId(String),
    /// Move the receiving object by a local-space delta
    Translate(Vec3),
    /// Set the receiving object's local position
    SetPosition(Vec3),
    /// Set the receiving object's local rotation
    SetRotation(Quat),
    /// Set the receiving object's local scale
    SetScale(Vec3),
    /// Application-defined signal, interpreted by components or subsystems
    Signal(String),
}

/// A routed command.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Receiver selector
    pub target: MessageTarget,
    /// Optional object-id filter: when set, only objects whose id matches
    /// interpret the command (components of other objects still see the
    /// message if the target includes them and their owner matches).
    pub object_filter: Option<String>,
    /// The command payload
    pub command: Command,
}

impl Message {
    /// Create a message for the given target
    #[must_use]
    pub fn new(target: MessageTarget, command: Command) -> Self {
        Self {
            target,
            object_filter: None,
            command,
        }
    }

    /// Create a broadcast message
    #[must_use]
    pub fn broadcast(command: Command) -> Self {
        Self::new(MessageTarget::All, command)
    }

    /// Restrict the message to objects with a matching id
    #[must_use]
    pub fn filtered(mut self, object_id: impl Into<String>) -> Self {
        self.object_filter = Some(object_id.into());
        self
    }

    /// Whether the filter admits an object with the given id
    #[must_use]
    pub fn matches_object(&self, id: &str) -> bool {
        self.object_filter.as_deref().is_none_or(|f| f == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_prefers_handled() {
        assert_eq!(
            MessageResult::Unhandled.combine(MessageResult::Handled),
            MessageResult::Handled
        );
        assert_eq!(
            MessageResult::Unhandled.combine(MessageResult::Unhandled),
            MessageResult::Unhandled
        );
    }

    #[test]
    fn test_escalate_decays_to_unhandled() {
        assert_eq!(
            MessageResult::Escalate.combine(MessageResult::Unhandled),
            MessageResult::Unhandled
        );
        assert_eq!(
            MessageResult::Escalate.combine(MessageResult::Handled),
            MessageResult::Handled
        );
    }

    #[test]
    fn test_target_selector() {
        assert!(MessageTarget::All.includes_components());
        assert!(MessageTarget::Objects.includes_objects());
        assert!(!MessageTarget::Objects.includes_components());
        assert!(!MessageTarget::Components.includes_objects());
        assert!(!MessageTarget::Subsystems.includes_scene());
    }

    #[test]
    fn test_object_filter() {
        let msg = Message::new(MessageTarget::Objects, Command::SetActive(false))
            .filtered("player");
        assert!(msg.matches_object("player"));
        assert!(!msg.matches_object("enemy"));

        let unfiltered = Message::broadcast(Command::Signal("ping".into()));
        assert!(unfiltered.matches_object("anything"));
    }
}
