#![no_main]

use libfuzzer_sys::fuzz_target;
use vellum::Document;

/// Writes arbitrary bytes to a scratch file, opens it as a document, and checks invariants that
/// must hold regardless of content: every row renders without panicking, no tab bytes survive
/// into the rendered view, and the rendered/highlight views stay the same length.
fuzz_target!(|data: &[u8]| {
    let Ok(dir) = tempfile::tempdir() else { return };
    let path = dir.path().join("fuzzed.c");
    if std::fs::write(&path, data).is_err() {
        return;
    }

    let mut document = Document::new(4);
    if document.open(&path).is_err() {
        return;
    }

    for row in &document.rows {
        assert!(!row.rendered().contains(&b'\t'));
        let mut buf = String::new();
        let _ = row.draw(0, row.rendered().len() + 16, &mut buf);
    }

    document.rehighlight_all();
});
