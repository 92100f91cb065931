//! Engine core: the singleton, frame timing, subsystems and messaging

mod engine;
pub mod messages;
mod subsystem;
mod time;

pub use engine::{Engine, EngineState, FIXED_STEP};
pub use messages::{Command, Message, MessageResult, MessageTarget};
pub use subsystem::Subsystem;
pub use time::Time;
