// Library root
// ------------
// The binary (`main.rs`) only parses arguments, sets up logging and hands
// over to `ui::run`. Everything that talks to the server lives here so the
// workflows can be driven from tests against a mock server.
//
// Module responsibilities:
// - `api`: the authenticated session and the reply envelope.
// - `catalog`: folders, results and name/folder filtering.
// - `transfer`: export, import and moving results between folders.
// - `cli` / `config`: argument surface and credential resolution.
// - `ui`: prompts, progress output and the list/export/import workflows.
pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod transfer;
pub mod ui;

pub use error::{NessusError, Result};
