//! Basket command-line front end.
//!
//! Configuration, logging, terminal rendering and the interactive REPL. Kept
//! separate from main.rs so the pieces can be tested.

pub mod config;
pub mod logging;
pub mod render;
pub mod repl;
