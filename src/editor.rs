//! # Controller
//!
//! The event loop: refresh the screen, read one decoded key, dispatch it against the
//! [`crate::document::Document`] and the cursor. Also hosts the two modal sub-loops (save-as and
//! incremental find), each a small loop of its own rather than a state carried across iterations
//! of the main loop.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::iter::repeat_with;
use std::time::Instant;

use crate::document::Document;
use crate::key::{self, Key};
use crate::{Config, Error, ansi_escape::*, sys, terminal};

const fn ctrl_key(key: u8) -> u8 { key & 0x1f }
const EXIT: u8 = ctrl_key(b'Q');
const DELETE_BIS: u8 = ctrl_key(b'H');
const REFRESH_SCREEN: u8 = ctrl_key(b'L');
const SAVE: u8 = ctrl_key(b'S');
const FIND: u8 = ctrl_key(b'F');

const HELP_MESSAGE: &str = "^S save | ^Q quit | ^F find";

/// Sets a formatted status message for the editor. Example: `set_status!(editor, "{} bytes", n)`.
macro_rules! set_status {
    ($editor:expr, $($arg:expr),*) => {
        $editor.status_msg = Some(StatusMessage::new(format!($($arg),*)))
    };
}

/// Whether `c` should be inserted as-is into the document: a tab, or any byte at or above the
/// space character (including bytes ≥ 0x80, which this byte-stream-only editor never interprets).
const fn is_insertable(c: u8) -> bool { c == b'\t' || c >= 0x20 }

/// Whether `c` is acceptable in a modal prompt's input buffer: printable ASCII, i.e. below 128
/// and not a control byte.
fn is_printable_ascii(c: u8) -> bool { c < 128 && !c.is_ascii_control() }

/// RAII guard around the terminal's original mode, restored unconditionally on drop, including on
/// the unwind path out of a fatal error, since it is dropped as a field of a partially built
/// [`Editor`] if construction fails partway through.
struct TermGuard(sys::TermMode);

impl Drop for TermGuard {
    fn drop(&mut self) { let _ = terminal::restore_terminal(&self.0); }
}

/// A status-bar message and the time it was posted, so it can be aged out after
/// `config.message_duration`.
struct StatusMessage {
    msg: String,
    time: Instant,
}

impl StatusMessage {
    fn new(msg: String) -> Self { Self { msg, time: Instant::now() } }
}

/// The editor's state: the document, the cursor, the view offsets, and everything needed to drive
/// the controller loop.
pub struct Editor {
    config: Config,
    document: Document,
    /// Insertion index into the current row's raw bytes. `0` when `cy == len(rows)`.
    cx: usize,
    /// Row index; `len(rows)` denotes the virtual tail row.
    cy: usize,
    row_off: usize,
    col_off: usize,
    screen_rows: usize,
    screen_cols: usize,
    status_msg: Option<StatusMessage>,
    /// Consecutive `Ctrl-Q` presses while the document is dirty; reset by any other key.
    quit_warnings: usize,
    /// Restores the original terminal mode when the editor is dropped. Constructed before any
    /// other fallible step in `new`, so an early `?` still restores the terminal.
    _term_guard: TermGuard,
}

impl Editor {
    /// Put the terminal into raw mode, query the window size, and return an editor ready to
    /// `run`.
    pub fn new(config: Config) -> Result<Self, Error> {
        let _ = sys::register_winsize_change_signal_handler();
        let _term_guard = TermGuard(sys::enable_raw_mode()?);
        let tab_stop = config.tab_stop;
        let mut editor = Self {
            config,
            document: Document::new(tab_stop),
            cx: 0,
            cy: 0,
            row_off: 0,
            col_off: 0,
            screen_rows: 0,
            screen_cols: 0,
            status_msg: None,
            quit_warnings: 0,
            _term_guard,
        };
        editor.update_window_size()?;
        set_status!(editor, "{}", HELP_MESSAGE);
        Ok(editor)
    }

    fn update_window_size(&mut self) -> Result<(), Error> {
        let (rows, cols) =
            sys::get_window_size().or_else(|_| terminal::get_window_size_using_cursor())?;
        (self.screen_rows, self.screen_cols) = (rows.saturating_sub(2), cols);
        Ok(())
    }

    fn current_row_len(&self) -> usize {
        self.document.rows.get(self.cy).map_or(0, |r| r.raw.len())
    }

    /// The cursor's rendered column, `0` on the virtual tail row.
    fn rx(&self) -> usize {
        self.document.rows.get(self.cy).map_or(0, |r| r.cx_to_rx(self.cx, self.config.tab_stop))
    }

    fn clamp_cx(&mut self) { self.cx = self.cx.min(self.current_row_len()); }

    fn move_cursor(&mut self, arrow: key::Arrow) {
        match arrow {
            key::Arrow::Left if self.cx > 0 => self.cx -= 1,
            key::Arrow::Left if self.cy > 0 => {
                self.cy -= 1;
                self.cx = self.current_row_len();
            }
            key::Arrow::Left => (),
            key::Arrow::Right if self.cx < self.current_row_len() => self.cx += 1,
            key::Arrow::Right if self.cy < self.document.rows.len() => {
                self.cy += 1;
                self.cx = 0;
            }
            key::Arrow::Right => (),
            key::Arrow::Up => self.cy = self.cy.saturating_sub(1),
            key::Arrow::Down if self.cy < self.document.rows.len() => self.cy += 1,
            key::Arrow::Down => (),
        }
        self.clamp_cx();
    }

    fn move_page(&mut self, page: key::Page) {
        self.cy = match page {
            key::Page::Up => self.row_off,
            key::Page::Down => (self.row_off + self.screen_rows).min(self.document.rows.len()),
        };
        self.clamp_cx();
        let arrow = match page {
            key::Page::Up => key::Arrow::Up,
            key::Page::Down => key::Arrow::Down,
        };
        for _ in 0..self.screen_rows {
            self.move_cursor(arrow);
        }
    }

    fn insert_newline(&mut self) {
        if self.cx == 0 {
            self.document.insert_row(self.cy, Vec::new());
        } else {
            self.document.split_row(self.cy, self.cx);
        }
        self.cy += 1;
        self.cx = 0;
    }

    fn backspace(&mut self) {
        if self.cy == 0 && self.cx == 0 {
            return;
        }
        if self.cy >= self.document.rows.len() {
            return;
        }
        if self.cx > 0 {
            self.document.row_delete_char(self.cy, self.cx - 1);
            self.cx -= 1;
        } else {
            self.cx = self.document.join_with_previous_row(self.cy);
            self.cy -= 1;
        }
    }

    fn insert_byte(&mut self, c: u8) {
        if self.cy == self.document.rows.len() {
            self.document.insert_row(self.cy, vec![c]);
        } else {
            self.document.row_insert_char(self.cy, self.cx, c);
        }
        self.cx += 1;
    }

    fn is_empty(&self) -> bool {
        self.document.rows.len() <= 1 && self.document.rows.first().is_none_or(|r| r.raw.is_empty())
    }

    /// Reconcile the view offsets so the cursor stays inside the visible window. Uses the
    /// rendered column on both sides of the horizontal check, for strictly render-coordinate
    /// scrolling (see DESIGN.md).
    fn scroll(&mut self) {
        let rx = self.rx();
        if self.cy < self.row_off {
            self.row_off = self.cy;
        }
        if self.cy >= self.row_off + self.screen_rows {
            self.row_off = self.cy - self.screen_rows + 1;
        }
        if rx < self.col_off {
            self.col_off = rx;
        }
        if rx >= self.col_off + self.screen_cols {
            self.col_off = rx - self.screen_cols + 1;
        }
    }

    fn draw_rows(&self, buffer: &mut String) -> Result<(), Error> {
        let rows = self.document.rows.iter().map(Some).chain(repeat_with(|| None));
        for (i, row) in rows.enumerate().skip(self.row_off).take(self.screen_rows) {
            buffer.push_str(CLEAR_LINE_RIGHT_OF_CURSOR);
            match row {
                Some(row) => row.draw(self.col_off, self.screen_cols, buffer)?,
                None if self.is_empty() && i == self.screen_rows / 3 => {
                    let welcome = "editor: no file open";
                    write!(buffer, "~{welcome:^1$.1$}", self.screen_cols.saturating_sub(1))?;
                }
                None => buffer.push('~'),
            }
            buffer.push_str("\r\n");
        }
        Ok(())
    }

    fn draw_status_bar(&self, buffer: &mut String) -> Result<(), Error> {
        let modified = if self.document.dirty > 0 { " (modified)" } else { "" };
        let name = self
            .document
            .filename
            .as_ref()
            .map_or_else(|| "[No Name]".to_string(), |p| p.to_string_lossy().into_owned());
        let mut left = format!("{name:.20}{modified} ({} lines)", self.document.rows.len());
        left.truncate(self.screen_cols);
        let filetype = self.document.syntax.map_or("no ft", |s| s.name);
        let right = format!("{filetype} | {}/{}", self.cy + 1, self.document.rows.len());
        let pad = self.screen_cols.saturating_sub(left.len());
        write!(buffer, "{REVERSE_VIDEO}{left}{right:>pad$.pad$}{RESET_FMT}\r\n")?;
        Ok(())
    }

    fn draw_message_bar(&self, buffer: &mut String) {
        buffer.push_str(CLEAR_LINE_RIGHT_OF_CURSOR);
        let fresh =
            self.status_msg.as_ref().filter(|sm| sm.time.elapsed() < self.config.message_duration);
        if let Some(sm) = fresh {
            buffer.push_str(&sm.msg[..sm.msg.len().min(self.screen_cols)]);
        }
    }

    fn refresh_screen(&mut self) -> Result<(), Error> {
        self.scroll();
        let mut buffer = format!("{HIDE_CURSOR}{MOVE_CURSOR_TO_START}");
        self.draw_rows(&mut buffer)?;
        self.draw_status_bar(&mut buffer)?;
        self.draw_message_bar(&mut buffer);
        let (cursor_col, cursor_row) = (self.rx() - self.col_off + 1, self.cy - self.row_off + 1);
        write!(buffer, "\x1b[{cursor_row};{cursor_col}H{SHOW_CURSOR}")?;
        print!("{buffer}");
        io::stdout().flush().map_err(Error::from)
    }

    /// Host the modal prompt: `prompt_fmt` contains one `%s` slot for the growing input buffer.
    /// `callback` is invoked once per keystroke, including the final accept/cancel keystroke.
    /// Returns the accepted buffer, or `None` if the prompt was cancelled.
    fn prompt<F: FnMut(&mut Self, &str, Key)>(
        &mut self,
        prompt_fmt: &str,
        mut callback: F,
    ) -> Result<Option<String>, Error> {
        let mut buf = String::with_capacity(128);
        loop {
            set_status!(self, "{}", prompt_fmt.replacen("%s", &buf, 1));
            self.refresh_screen()?;
            let key = key::read_key()?;
            match key {
                Key::Backspace | Key::Delete | Key::Char(DELETE_BIS) => {
                    buf.pop();
                }
                Key::Escape => {
                    self.status_msg = None;
                    callback(self, &buf, key);
                    return Ok(None);
                }
                Key::Enter if !buf.is_empty() => {
                    self.status_msg = None;
                    callback(self, &buf, key);
                    return Ok(Some(buf));
                }
                Key::Char(c) if is_printable_ascii(c) => buf.push(c as char),
                Key::Arrow(_) | Key::Page(_) | Key::Home | Key::End | Key::Enter | Key::Char(_) => (),
            }
            callback(self, &buf, key);
        }
    }

    fn save(&mut self) -> Result<(), Error> {
        if self.document.filename.is_none() {
            let name = self.prompt("Save as: %s (ESC to cancel)", |_, _, _| ())?;
            match name {
                Some(name) if !name.is_empty() => self.document.filename = Some(sys::path(&name)),
                _ => {
                    set_status!(self, "Save aborted");
                    return Ok(());
                }
            }
        }
        let Some(path) = self.document.filename.clone() else { return Ok(()) };
        self.document.select_syntax(&path);
        match self.document.save_to(&path) {
            Ok(n) => set_status!(self, "{n} bytes written to disk"),
            Err(err) => set_status!(self, "Can't save! I/O error: {err}"),
        }
        Ok(())
    }

    fn find_next(&mut self, query: &str, last_match: Option<usize>, direction: i64) -> Option<usize> {
        let n = self.document.rows.len();
        if n == 0 {
            return None;
        }
        #[allow(clippy::cast_possible_wrap)]
        let start = last_match.map_or(n - 1, |m| m) as i64;
        let mut current = start;
        for _ in 0..n {
            current = (current + direction).rem_euclid(n as i64);
            #[allow(clippy::cast_sign_loss)]
            let row_idx = current as usize;
            let row = &mut self.document.rows[row_idx];
            if let Some(offset) = find_substring(row.rendered(), query.as_bytes()) {
                self.cy = row_idx;
                self.cx = row.rx_to_cx(offset, self.config.tab_stop);
                self.row_off = n;
                row.match_segment = Some(offset..offset + query.len());
                return Some(row_idx);
            }
        }
        None
    }

    fn find(&mut self) -> Result<(), Error> {
        let (saved_cx, saved_cy, saved_row_off, saved_col_off) =
            (self.cx, self.cy, self.row_off, self.col_off);
        let mut last_match: Option<usize> = None;
        let mut direction: i64 = 1;

        let result = self.prompt("Search (Use ESC/Arrows/Enter): %s", |editor, query, key| {
            for row in &mut editor.document.rows {
                row.match_segment = None;
            }
            match key {
                Key::Arrow(key::Arrow::Right | key::Arrow::Down) => direction = 1,
                Key::Arrow(key::Arrow::Left | key::Arrow::Up) => direction = -1,
                Key::Enter | Key::Escape => {}
                _ => {
                    last_match = None;
                    direction = 1;
                }
            }
            if last_match.is_none() {
                direction = 1;
            }
            last_match = editor.find_next(query, last_match, direction);
        })?;

        for row in &mut self.document.rows {
            row.match_segment = None;
        }
        if result.is_none() {
            (self.cx, self.cy, self.row_off, self.col_off) =
                (saved_cx, saved_cy, saved_row_off, saved_col_off);
        }
        Ok(())
    }

    fn handle_quit(&mut self) -> bool {
        if self.document.dirty == 0 {
            return true;
        }
        self.quit_warnings += 1;
        if self.quit_warnings > self.config.quit_times {
            return true;
        }
        let remaining = self.config.quit_times - self.quit_warnings;
        let times = if remaining == 1 { "time" } else { "times" };
        set_status!(
            self,
            "WARNING!!! File has unsaved changes. Press Ctrl-Q {remaining} more {times} to quit."
        );
        false
    }

    /// Process one decoded key. Returns whether the controller loop should terminate.
    fn process_keypress(&mut self, key: Key) -> Result<bool, Error> {
        if !matches!(key, Key::Char(EXIT)) {
            self.quit_warnings = 0;
        }
        match key {
            Key::Arrow(arrow) => self.move_cursor(arrow),
            Key::Page(page) => self.move_page(page),
            Key::Home => self.cx = 0,
            Key::End => self.cx = self.current_row_len(),
            Key::Enter => self.insert_newline(),
            Key::Backspace | Key::Char(DELETE_BIS) => self.backspace(),
            Key::Delete => {
                self.move_cursor(key::Arrow::Right);
                self.backspace();
            }
            Key::Escape | Key::Char(REFRESH_SCREEN) => (),
            Key::Char(EXIT) => return Ok(self.handle_quit()),
            Key::Char(SAVE) => self.save()?,
            Key::Char(FIND) => self.find()?,
            Key::Char(c) if is_insertable(c) => self.insert_byte(c),
            Key::Char(_) => (),
        }
        Ok(false)
    }

    /// If `path` is given, load it; then run the controller loop until the user quits or a fatal
    /// error occurs.
    pub fn run(&mut self, path: Option<&str>) -> Result<(), Error> {
        if let Some(path) = path {
            self.document.open(&sys::path(path))?;
        } else {
            self.document.insert_row(0, Vec::new());
            self.document.dirty = 0;
        }
        loop {
            if sys::has_window_size_changed() {
                self.update_window_size()?;
            }
            self.refresh_screen()?;
            let key = key::read_key()?;
            if self.process_keypress(key)? {
                return Ok(());
            }
        }
    }
}

/// Return the index of `needle` in `haystack`, if it appears as a contiguous subslice.
fn find_substring(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    (0..=haystack.len().saturating_sub(needle.len())).find(|&i| haystack[i..].starts_with(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> Editor {
        Editor {
            config: Config::default(),
            document: Document::new(8),
            cx: 0,
            cy: 0,
            row_off: 0,
            col_off: 0,
            screen_rows: 24,
            screen_cols: 80,
            status_msg: None,
            quit_warnings: 0,
            _term_guard: TermGuard(test_term_mode()),
        }
    }

    #[cfg(unix)]
    fn test_term_mode() -> sys::TermMode {
        // SAFETY: a zeroed `termios` is never passed to a syscall in these tests; `Drop` calls
        // `tcsetattr`, which simply fails (and is ignored) against the all-zero value in CI
        // environments without a controlling terminal.
        unsafe { std::mem::zeroed() }
    }

    #[cfg(windows)]
    fn test_term_mode() -> sys::TermMode { (0, 0) }

    #[cfg(target_os = "wasi")]
    fn test_term_mode() -> sys::TermMode { sys::TermMode {} }

    #[test]
    fn insert_byte_appends_and_advances_cursor() {
        let mut ed = editor();
        ed.document.insert_row(0, Vec::new());
        ed.insert_byte(b'a');
        ed.insert_byte(b'b');
        assert_eq!(ed.document.rows[0].raw, b"ab");
        assert_eq!(ed.cx, 2);
    }

    #[test]
    fn enter_then_insert_produces_two_rows_and_parks_cursor() {
        let mut ed = editor();
        ed.document.insert_row(0, Vec::new());
        for c in b"abc" {
            ed.process_keypress(Key::Char(*c)).expect("keypress");
        }
        ed.process_keypress(Key::Enter).expect("keypress");
        ed.process_keypress(Key::Char(b'd')).expect("keypress");
        assert_eq!(ed.document.rows.len(), 2);
        assert_eq!(ed.document.rows[0].raw, b"abc");
        assert_eq!(ed.document.rows[1].raw, b"d");
        assert_eq!((ed.cy, ed.cx), (1, 1));
    }

    #[test]
    fn home_moves_cursor_to_start_of_row() {
        let mut ed = editor();
        ed.document.insert_row(0, Vec::new());
        ed.process_keypress(Key::Char(b'h')).expect("keypress");
        ed.process_keypress(Key::Char(b'i')).expect("keypress");
        ed.process_keypress(Key::Home).expect("keypress");
        ed.process_keypress(Key::Char(b'X')).expect("keypress");
        assert_eq!(ed.document.rows[0].raw, b"Xhi");
        assert_eq!((ed.cy, ed.cx), (0, 1));
    }

    #[test]
    fn backspace_at_column_zero_joins_with_previous_row() {
        let mut ed = editor();
        ed.document.insert_row(0, b"foo".to_vec());
        ed.document.insert_row(1, b"bar".to_vec());
        ed.cy = 1;
        ed.cx = 0;
        ed.backspace();
        assert_eq!(ed.document.rows.len(), 1);
        assert_eq!(ed.document.rows[0].raw, b"foobar");
        assert_eq!((ed.cy, ed.cx), (0, 3));
    }

    #[test]
    fn backspace_at_origin_is_a_no_op() {
        let mut ed = editor();
        ed.document.insert_row(0, b"x".to_vec());
        ed.backspace();
        assert_eq!(ed.document.rows[0].raw, b"x");
    }

    #[test]
    fn move_cursor_left_at_column_zero_wraps_to_previous_row_end() {
        let mut ed = editor();
        ed.document.insert_row(0, b"abc".to_vec());
        ed.document.insert_row(1, b"de".to_vec());
        ed.cy = 1;
        ed.cx = 0;
        ed.move_cursor(key::Arrow::Left);
        assert_eq!((ed.cy, ed.cx), (0, 3));
    }

    #[test]
    fn move_cursor_right_at_row_end_wraps_to_next_row_start() {
        let mut ed = editor();
        ed.document.insert_row(0, b"abc".to_vec());
        ed.document.insert_row(1, b"de".to_vec());
        ed.cx = 3;
        ed.move_cursor(key::Arrow::Right);
        assert_eq!((ed.cy, ed.cx), (1, 0));
    }

    #[test]
    fn quit_guard_requires_four_consecutive_presses_when_dirty() {
        let mut ed = editor();
        ed.document.insert_row(0, Vec::new());
        ed.document.dirty = 1;
        assert!(!ed.handle_quit());
        assert!(!ed.handle_quit());
        assert!(!ed.handle_quit());
        assert!(ed.handle_quit());
    }

    #[test]
    fn quit_guard_resets_on_intervening_key() {
        let mut ed = editor();
        ed.document.insert_row(0, Vec::new());
        ed.document.dirty = 1;
        assert!(!ed.process_keypress(Key::Char(EXIT)).expect("keypress"));
        assert!(!ed.process_keypress(Key::Char(EXIT)).expect("keypress"));
        assert!(!ed.process_keypress(Key::Char(b'x')).expect("keypress"));
        assert_eq!(ed.quit_warnings, 0);
    }

    #[test]
    fn quit_with_clean_document_exits_immediately() {
        let mut ed = editor();
        ed.document.insert_row(0, Vec::new());
        assert!(ed.handle_quit());
    }

    #[test]
    fn find_wraps_and_cycles_through_matches() {
        let mut ed = editor();
        ed.document.insert_row(0, b"abc".to_vec());
        ed.document.insert_row(1, b"abX".to_vec());
        ed.document.insert_row(2, b"yabZ".to_vec());
        assert_eq!(ed.find_next("ab", None, 1), Some(0));
        assert_eq!((ed.cy, ed.cx), (0, 0));
        assert_eq!(ed.find_next("ab", Some(0), 1), Some(1));
        assert_eq!((ed.cy, ed.cx), (1, 0));
        assert_eq!(ed.find_next("ab", Some(1), 1), Some(2));
        assert_eq!((ed.cy, ed.cx), (2, 1));
        assert_eq!(ed.find_next("ab", Some(2), 1), Some(0));
    }

    #[test]
    fn find_substring_matches_plain_needle() {
        assert_eq!(find_substring(b"hello world", b"world"), Some(6));
        assert_eq!(find_substring(b"hello world", b"xyz"), None);
    }
}
