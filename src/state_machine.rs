//! Activity creation conversation
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
mod preview;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::{Event, Sender};
pub use state::{ActivityDraft, ConvContext, ConvState};
pub use transition::transition;
