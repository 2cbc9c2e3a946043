//! # Key decoder
//!
//! Turns the raw byte stream from the terminal into a stream of logical [`Key`] tokens: a
//! printable/control byte, or one of a fixed set of named keys recognized from ANSI escape
//! sequences.

use std::io::Read;

use crate::{Error, sys};

/// A decoded key.
#[derive(Clone, Copy)]
pub enum Key {
    Arrow(Arrow),
    Page(Page),
    Home,
    End,
    Delete,
    Backspace,
    Enter,
    Escape,
    Char(u8),
}

#[derive(Clone, Copy)]
pub enum Arrow {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Clone, Copy)]
pub enum Page {
    Up,
    Down,
}

/// Read and decode a single key from stdin. Blocks until a byte is available (the underlying
/// read has a short poll timeout, so callers loop on `Ok(None)`-like behavior is not needed here
/// since this function itself loops until a byte arrives).
pub fn read_key() -> Result<Key, Error> {
    loop {
        let mut bytes = sys::stdin()?.bytes();
        match bytes.next().transpose()? {
            Some(0x7F) => return Ok(Key::Backspace),
            Some(b'\r') => return Ok(Key::Enter),
            Some(b'\x1b') => {
                return Ok(match bytes.next().transpose()? {
                    Some(b @ (b'[' | b'O')) => match (b, bytes.next().transpose()?) {
                        (b'[', Some(b'A')) => Key::Arrow(Arrow::Up),
                        (b'[', Some(b'B')) => Key::Arrow(Arrow::Down),
                        (b'[', Some(b'C')) => Key::Arrow(Arrow::Right),
                        (b'[', Some(b'D')) => Key::Arrow(Arrow::Left),
                        (b'[' | b'O', Some(b'H')) => Key::Home,
                        (b'[' | b'O', Some(b'F')) => Key::End,
                        (b'[', Some(c @ b'0'..=b'8')) => match (c, bytes.next().transpose()?) {
                            (c, Some(b'~')) if c == b'1' || c == b'7' => Key::Home,
                            (c, Some(b'~')) if c == b'4' || c == b'8' => Key::End,
                            (b'3', Some(b'~')) => Key::Delete,
                            (b'5', Some(b'~')) => Key::Page(Page::Up),
                            (b'6', Some(b'~')) => Key::Page(Page::Down),
                            _ => Key::Escape,
                        },
                        _ => Key::Escape,
                    },
                    _ => Key::Escape,
                });
            }
            Some(a) => return Ok(Key::Char(a)),
            None => continue,
        }
    }
}
