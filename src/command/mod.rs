//! Chat command layer
//!
//! Parses chat text into commands, checks authorization for mutating
//! ones, runs them against the registry and renders the reply text.
//! Unknown commands and plain text get no reply.

mod facade;
mod parser;
mod replies;

pub use facade::CommandFacade;
pub use parser::{parse, ChatCommand, Parsed};
