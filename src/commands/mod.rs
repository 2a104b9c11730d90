//! Chat command layer
//!
//! Parses prefixed text commands, gates administration behind the admin
//! registry, calls the matchmaking manager and renders plain-text replies.

pub mod admin;
pub mod dispatcher;
pub mod parser;
pub mod render;

pub use admin::AdminRegistry;
pub use dispatcher::CommandDispatcher;
pub use parser::{Command, CommandError};
pub use render::{render_event, render_help, render_status};
