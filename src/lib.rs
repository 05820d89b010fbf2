// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds the CLI, logging and the terminal loop.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod export;
pub mod mastery;
pub mod participant;
pub mod progress;
pub mod prompting;
pub mod record;
pub mod runtime;
pub mod session;
pub mod speech;
pub mod store;
pub mod ui;
pub mod util;
pub mod words;
