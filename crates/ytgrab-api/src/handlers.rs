//! Request handlers.

pub mod health;
pub mod system;
pub mod videos;

pub use health::*;
pub use system::*;
pub use videos::*;
