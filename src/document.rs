//! # Document
//!
//! The row store: an ordered collection of [`Row`]s plus the bits of state tied to persistence
//! (filename, dirty counter, selected syntax). Every mutator recomputes the affected row's
//! rendered bytes and highlight classes before returning, and propagates a changed
//! `open_comment` forward until a row's state stops changing.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::Error;
use crate::row::Row;
use crate::syntax::{self, Conf as SyntaxConf};

/// The in-memory text buffer plus its persistence state.
#[derive(Default)]
pub struct Document {
    pub rows: Vec<Row>,
    pub filename: Option<PathBuf>,
    /// Non-zero iff the in-memory text differs from the last persisted snapshot.
    pub dirty: usize,
    pub syntax: Option<&'static SyntaxConf>,
    tab_stop: usize,
}

impl Document {
    pub fn new(tab_stop: usize) -> Self { Self { tab_stop, ..Self::default() } }

    /// Re-render and re-highlight row `at`, then cascade to following rows as long as their
    /// `open_comment` keeps changing. The row at `at` is always processed at least once.
    fn rehighlight_from(&mut self, at: usize) {
        let mut prev_open = if at > 0 { self.rows[at - 1].open_comment } else { false };
        for i in at..self.rows.len() {
            let row = &mut self.rows[i];
            row.render(self.tab_stop);
            let (hl, open_comment) = syntax::highlight_row(row.rendered(), self.syntax, prev_open);
            let state_changed = row.open_comment != open_comment;
            row.set_highlight(hl);
            row.open_comment = open_comment;
            prev_open = open_comment;
            if i > at && !state_changed {
                break;
            }
        }
    }

    /// Re-render and re-highlight every row from scratch, e.g. after a syntax change.
    pub fn rehighlight_all(&mut self) { self.rehighlight_from(0); }

    fn renumber_from(&mut self, at: usize) {
        for (i, row) in self.rows.iter_mut().enumerate().skip(at) {
            row.index = i;
        }
    }

    /// Insert a new row at `at` with the given raw bytes. A no-op if `at > len(rows)`.
    pub fn insert_row(&mut self, at: usize, raw: Vec<u8>) {
        if at > self.rows.len() {
            return;
        }
        self.rows.insert(at, Row::new(at, raw));
        self.renumber_from(at);
        self.rehighlight_from(at);
        self.dirty += 1;
    }

    /// Delete the row at `at`. A no-op if out of range.
    pub fn delete_row(&mut self, at: usize) {
        if at >= self.rows.len() {
            return;
        }
        self.rows.remove(at);
        self.renumber_from(at);
        if at < self.rows.len() {
            self.rehighlight_from(at);
        }
        self.dirty += 1;
    }

    pub fn row_insert_char(&mut self, row: usize, at: usize, c: u8) {
        let Some(r) = self.rows.get_mut(row) else { return };
        r.insert_char(at, c);
        self.rehighlight_from(row);
        self.dirty += 1;
    }

    pub fn row_delete_char(&mut self, row: usize, at: usize) {
        let Some(r) = self.rows.get_mut(row) else { return };
        r.delete_char(at);
        self.rehighlight_from(row);
        self.dirty += 1;
    }

    pub fn row_append_bytes(&mut self, row: usize, bytes: &[u8]) {
        let Some(r) = self.rows.get_mut(row) else { return };
        r.append_raw(bytes);
        self.rehighlight_from(row);
        self.dirty += 1;
    }

    /// Split row `row` at raw-byte index `col`: the bytes from `col` onward become a new row
    /// immediately after, and `row` keeps the prefix. A no-op if `row` is out of range. One
    /// atomic mutation (a single `dirty` increment), the Row Store counterpart of pressing
    /// `Enter` in the middle of a line.
    pub fn split_row(&mut self, row: usize, col: usize) {
        let Some(r) = self.rows.get_mut(row) else { return };
        let col = col.min(r.raw.len());
        let suffix = r.raw.split_off(col);
        self.rows.insert(row + 1, Row::new(row + 1, suffix));
        self.renumber_from(row + 1);
        self.rehighlight_from(row);
        self.dirty += 1;
    }

    /// Join row `row` onto the end of row `row - 1`, then remove row `row`. Returns the raw-byte
    /// length `row - 1` had before the join, i.e. the column the cursor should land on. A no-op
    /// (returning 0) when `row` is 0 or out of range: the counterpart of `Backspace` at column 0.
    pub fn join_with_previous_row(&mut self, row: usize) -> usize {
        if row == 0 || row >= self.rows.len() {
            return 0;
        }
        let suffix = self.rows[row].raw.clone();
        let prev_len = self.rows[row - 1].raw.len();
        self.rows[row - 1].raw.extend_from_slice(&suffix);
        self.rows.remove(row);
        self.renumber_from(row);
        self.rehighlight_from(row - 1);
        self.dirty += 1;
        prev_len
    }

    /// Serialize every row's raw bytes, each followed by exactly one `\n`, including the last.
    pub fn rows_to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for row in &self.rows {
            buf.extend_from_slice(&row.raw);
            buf.push(b'\n');
        }
        buf
    }

    /// Select a syntax definition by matching `path`'s filename against the built-in table, then
    /// re-highlight every row. A no match clears the syntax.
    pub fn select_syntax(&mut self, path: &Path) {
        let name = path.file_name().and_then(std::ffi::OsStr::to_str).unwrap_or_default();
        self.syntax = syntax::Conf::find(name);
        self.rehighlight_all();
    }

    /// Load `path`'s contents, splitting on `\n` and stripping a trailing `\r`. Replaces the
    /// current rows. Missing files are not an error at this layer (the editor starts empty).
    pub fn open(&mut self, path: &Path) -> Result<(), Error> {
        self.filename = Some(path.to_path_buf());
        self.select_syntax(path);
        self.rows.clear();
        match File::open(path) {
            Ok(file) => {
                for line in BufReader::new(file).split(b'\n') {
                    let mut line = line?;
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    let idx = self.rows.len();
                    self.rows.push(Row::new(idx, line));
                }
                if self.rows.is_empty() {
                    self.rows.push(Row::new(0, Vec::new()));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.rows.push(Row::new(0, Vec::new())),
            Err(e) => return Err(e.into()),
        }
        self.rehighlight_all();
        self.dirty = 0;
        Ok(())
    }

    /// Write every row to `path`, truncating to the new length, and clear the dirty counter.
    /// Returns the number of bytes written. The file is created with owner-read-write
    /// permissions if it does not already exist.
    pub fn save_to(&mut self, path: &Path) -> Result<usize, io::Error> {
        let bytes = self.rows_to_bytes();
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(&bytes)?;
        file.set_len(bytes.len() as u64)?;
        file.sync_all()?;
        self.dirty = 0;
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        let mut d = Document::new(8);
        d.insert_row(0, b"abc".to_vec());
        d
    }

    #[test]
    fn insert_and_delete_row_keep_indices_in_sync() {
        let mut d = doc();
        d.insert_row(0, b"zzz".to_vec());
        d.insert_row(2, b"yyy".to_vec());
        for (i, row) in d.rows.iter().enumerate() {
            assert_eq!(row.index, i);
        }
        d.delete_row(1);
        for (i, row) in d.rows.iter().enumerate() {
            assert_eq!(row.index, i);
        }
        assert_eq!(d.rows.len(), 2);
    }

    #[test]
    fn out_of_range_row_ops_are_silent_no_ops() {
        let mut d = doc();
        d.delete_row(99);
        d.row_insert_char(99, 0, b'x');
        d.row_delete_char(99, 0);
        assert_eq!(d.rows.len(), 1);
        assert_eq!(d.rows[0].raw, b"abc");
    }

    #[test]
    fn dirty_increments_on_mutation() {
        let mut d = Document::new(8);
        assert_eq!(d.dirty, 0);
        d.insert_row(0, b"x".to_vec());
        assert_eq!(d.dirty, 1);
        d.row_insert_char(0, 1, b'y');
        assert_eq!(d.dirty, 2);
    }

    #[test]
    fn multiline_comment_cascades_until_closed() {
        let mut d = Document::new(8);
        d.syntax = syntax::Conf::find("f.c");
        d.insert_row(0, b"/*".to_vec());
        d.insert_row(1, b"hello".to_vec());
        d.insert_row(2, b"*/".to_vec());
        d.insert_row(3, b"world".to_vec());
        assert!(d.rows[0].open_comment);
        assert!(d.rows[1].open_comment);
        assert!(!d.rows[2].open_comment);
        assert!(!d.rows[3].open_comment);

        // Delete the closing `*/`: everything after should reopen.
        d.rows[2].raw.clear();
        d.rehighlight_from(2);
        assert!(d.rows[0].open_comment);
        assert!(d.rows[1].open_comment);
        assert!(d.rows[2].open_comment);
        assert!(d.rows[3].open_comment);
    }

    #[test]
    fn rows_to_bytes_round_trips_through_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("doc.txt");
        let mut original = Document::new(8);
        original.insert_row(0, b"line one".to_vec());
        original.insert_row(1, b"line two".to_vec());
        original.save_to(&path).expect("save");

        let mut reloaded = Document::new(8);
        reloaded.open(&path).expect("open");
        assert_eq!(reloaded.rows.len(), original.rows.len());
        for (a, b) in original.rows.iter().zip(reloaded.rows.iter()) {
            assert_eq!(a.raw, b.raw);
        }
    }
}
