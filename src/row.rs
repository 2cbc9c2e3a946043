//! # Row
//!
//! A single line of text: its raw bytes, its rendered bytes (tabs expanded to the next tab
//! stop), and the highlight class of every rendered byte. Rendering is a pure byte-level
//! operation; multi-byte characters are not interpreted specially.

use std::fmt::Write as _;

use crate::ansi_escape::{RESET_FMT, REVERSE_VIDEO};
use crate::error::Error;
use crate::syntax::HlType;

/// A row of text, together with its derived render and highlight views.
#[derive(Default)]
pub struct Row {
    /// This row's position in the document. Kept in sync by `Document`'s insert/delete.
    pub index: usize,
    /// The raw bytes of the row, excluding any line terminator.
    pub raw: Vec<u8>,
    /// `raw` with tabs expanded into spaces up to the next multiple of the tab stop.
    rendered: Vec<u8>,
    /// The highlight class of each byte in `rendered`. Always the same length as `rendered`.
    highlight: Vec<HlType>,
    /// Whether this row ends while still inside an open multi-line comment.
    pub open_comment: bool,
    /// The rendered-coordinate range currently highlighted as a search match, if any.
    pub match_segment: Option<std::ops::Range<usize>>,
}

impl Row {
    /// Create a new row at `index`, with the given raw bytes. `rendered`/`highlight` are left
    /// empty; call `render` to populate them.
    pub fn new(index: usize, raw: Vec<u8>) -> Self { Self { index, raw, ..Self::default() } }

    /// Recompute `rendered` from `raw`, expanding tabs so that the column after a tab is always a
    /// multiple of `tab_stop`.
    pub fn render(&mut self, tab_stop: usize) {
        self.rendered.clear();
        let mut col = 0;
        for &b in &self.raw {
            if b == b'\t' {
                let spaces = tab_stop - (col % tab_stop);
                self.rendered.extend(std::iter::repeat(b' ').take(spaces));
                col += spaces;
            } else {
                self.rendered.push(b);
                col += 1;
            }
        }
    }

    /// The rendered bytes of this row.
    pub fn rendered(&self) -> &[u8] { &self.rendered }

    /// Replace the highlight classes (computed by the syntax highlighter against `rendered`).
    pub fn set_highlight(&mut self, hl: Vec<HlType>) {
        debug_assert_eq!(hl.len(), self.rendered.len());
        self.highlight = hl;
    }

    /// Convert a raw-byte cursor index `cx` into its rendered column `rx`.
    pub fn cx_to_rx(&self, cx: usize, tab_stop: usize) -> usize {
        let mut rx = 0;
        for &b in &self.raw[..cx.min(self.raw.len())] {
            rx += if b == b'\t' { tab_stop - (rx % tab_stop) } else { 1 };
        }
        rx
    }

    /// Convert a rendered column `rx` into the raw-byte cursor index whose expansion first
    /// reaches or exceeds it. Returns `raw.len()` if `rx` is never reached.
    pub fn rx_to_cx(&self, rx: usize, tab_stop: usize) -> usize {
        let mut cur_rx = 0;
        for (cx, &b) in self.raw.iter().enumerate() {
            cur_rx += if b == b'\t' { tab_stop - (cur_rx % tab_stop) } else { 1 };
            if cur_rx > rx {
                return cx;
            }
        }
        self.raw.len()
    }

    /// Draw this row into `buffer`, starting at rendered column `offset` and drawing at most
    /// `max_len` rendered bytes. Control bytes are rendered in reverse video as a printable
    /// stand-in (`'@' + b` for `b <= 26`, else `'?'`). The prior color is re-asserted after each
    /// such stand-in.
    pub fn draw(&self, offset: usize, max_len: usize, buffer: &mut String) -> Result<(), Error> {
        let mut current = HlType::Normal;
        let end = (offset + max_len).min(self.rendered.len());
        for rx in offset.min(self.rendered.len())..end {
            let b = self.rendered[rx];
            let mut hl = self.highlight.get(rx).copied().unwrap_or(HlType::Normal);
            if b.is_ascii_control() {
                let rendered_char = if b <= 26 { (b'@' + b) as char } else { '?' };
                write!(buffer, "{REVERSE_VIDEO}{rendered_char}{RESET_FMT}")?;
                if current != HlType::Normal {
                    write!(buffer, "{current}")?;
                }
                continue;
            }
            if let Some(seg) = &self.match_segment {
                if seg.contains(&rx) {
                    hl = HlType::Match;
                } else if rx == seg.end {
                    buffer.push_str(RESET_FMT);
                    current = HlType::Normal;
                }
            }
            if current != hl {
                write!(buffer, "{hl}")?;
                current = hl;
            }
            buffer.push(b as char);
        }
        buffer.push_str(RESET_FMT);
        Ok(())
    }

    /// Insert a byte at raw-byte index `at`, clamped into `[0, len(raw)]`.
    pub fn insert_char(&mut self, at: usize, c: u8) { self.raw.insert(at.min(self.raw.len()), c); }

    /// Delete the byte at raw-byte index `at`; a no-op if out of range.
    pub fn delete_char(&mut self, at: usize) {
        if at < self.raw.len() {
            self.raw.remove(at);
        }
    }

    /// Append `bytes` to the end of this row's raw bytes.
    pub fn append_raw(&mut self, bytes: &[u8]) { self.raw.extend_from_slice(bytes); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered_row(raw: &[u8], tab_stop: usize) -> Row {
        let mut row = Row::new(0, raw.to_vec());
        row.render(tab_stop);
        row
    }

    #[test]
    fn tab_expansion_stops_at_multiples_of_tab_stop() {
        let row = rendered_row(b"a\tb", 8);
        assert_eq!(row.rendered(), b"a       b"); // 1 + 7 spaces + 1 = 9 bytes
        assert!(!row.rendered().contains(&b'\t'));
    }

    #[test]
    fn cx_rx_round_trip() {
        let row = rendered_row(b"a\tb", 8);
        for cx in 0..=row.raw.len() {
            let rx = row.cx_to_rx(cx, 8);
            assert_eq!(row.rx_to_cx(rx, 8), cx);
        }
    }

    #[test]
    fn cx_to_rx_matches_scenario_4() {
        let row = rendered_row(b"a\tb", 8);
        assert_eq!(row.cx_to_rx(2, 8), 8);
        assert_eq!(row.rx_to_cx(4, 8), 1);
    }

    #[test]
    fn insert_and_delete_char_clamp_at_bounds() {
        let mut row = Row::new(0, b"abc".to_vec());
        row.insert_char(10, b'!'); // clamps to end
        assert_eq!(row.raw, b"abc!");
        row.delete_char(10); // no-op, out of range
        assert_eq!(row.raw, b"abc!");
        row.delete_char(0);
        assert_eq!(row.raw, b"bc!");
    }

    #[test]
    fn draw_plain_row() {
        let row = rendered_row(b"hi", 8);
        let mut buf = String::new();
        row.draw(0, 10, &mut buf).unwrap();
        assert_eq!(buf, format!("hi{RESET_FMT}"));
    }

    #[test]
    fn draw_control_byte_uses_reverse_video_stand_in() {
        let row = rendered_row(b"a\x01b", 8);
        let mut buf = String::new();
        row.draw(0, 10, &mut buf).unwrap();
        assert_eq!(buf, format!("a{REVERSE_VIDEO}B{RESET_FMT}b{RESET_FMT}"));
    }
}
