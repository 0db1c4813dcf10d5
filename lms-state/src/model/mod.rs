//! Model types for lms-state

mod mode;
mod player;
mod property;

pub use mode::Mode;
pub use player::{Forwarded, Player, VolumeUpdate};
pub use property::PlayerProperty;
