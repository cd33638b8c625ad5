//! Uturu is a terminal chat client for the Gregory University FAQ,
//! backed by the Gemini generation API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns session state (the append-only transcript), the
//!   embedded FAQ corpus, prompt assembly, configuration, and the
//!   streaming API client.
//! - [`ui`] renders the terminal interface and runs the interactive
//!   event loop that drives input and display updates.
//! - [`commands`] implements the slash commands available from the
//!   input line.
//! - [`auth`] resolves and stores the API key.
//! - [`api`] defines the request/response payloads on the wire.
//!
//! The binary entrypoint (`src/main.rs`) routes through [`cli::main`],
//! which dispatches into [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod ui;
pub mod utils;
