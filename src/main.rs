//! # vellum
//!
//! Entry point: `vellum [path]`. With no argument, starts on an empty document; with one
//! argument, opens that file. Additional arguments are ignored.

use std::process::ExitCode;

use vellum::{Config, Editor, Error};

fn run(path: Option<&str>) -> Result<(), Error> {
    Editor::new(Config::default())?.run(path)
}

fn main() -> ExitCode {
    let path = std::env::args().nth(1);
    let result = run(path.as_deref());
    // The editor (and the terminal-mode guard it owns) has already been dropped by the time
    // `result` is bound, so the terminal is restored before anything below is printed.
    print!("{}{}", vellum::ansi_escape::CLEAR_SCREEN, vellum::ansi_escape::MOVE_CURSOR_TO_START);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fatal: {err}");
            ExitCode::FAILURE
        }
    }
}
