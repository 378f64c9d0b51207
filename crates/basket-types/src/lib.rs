//! Shared types for the Basket price-explorer client.

mod conversation;
mod health;
mod jobs;
mod wire;

pub use conversation::*;
pub use health::*;
pub use jobs::*;
pub use wire::*;
