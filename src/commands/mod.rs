pub mod contest;

pub use contest::{execute, run_console, spawn_stdin_reader, CommandOutcome, USAGE};
