// src/brainstorm/mod.rs

pub mod collaborators;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod event;
pub mod participant;
pub mod prompts;
pub mod round;
pub mod scheduler;
pub mod session;
pub mod transcript;

// Let's explicitly export BrainstormSession so we don't have to access it via
// brainstorm::session::BrainstormSession and instead as brainstorm::BrainstormSession.
pub use session::BrainstormSession;
