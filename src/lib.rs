//! # vellum
//!
//! A small terminal text editor: raw-mode input, a row-oriented text buffer with derived
//! render/highlight views, incremental search, and per-file syntax highlighting.

pub use crate::{config::Config, document::Document, editor::Editor, error::Error};

pub mod ansi_escape;
mod config;
mod document;
mod editor;
mod error;
mod key;
mod row;
mod syntax;
mod terminal;

#[cfg(windows)] mod windows;
#[cfg(windows)] use windows as sys;

#[cfg(unix)] mod unix;
#[cfg(unix)] use unix as sys;

#[cfg(target_os = "wasi")] mod wasi;
#[cfg(target_os = "wasi")] use wasi as sys;
