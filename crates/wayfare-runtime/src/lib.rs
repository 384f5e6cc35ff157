//! Wayfare Runtime — typed actions, session lifecycle, and the assistant
//! facade that wires the extraction pipeline to the watch engine.

pub mod actions;
pub mod assistant;
pub mod session;

pub use actions::{Action, DetailScope};
pub use assistant::Assistant;
pub use session::Session;
