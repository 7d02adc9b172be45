// tests/line_buffer.rs

use jobrun::exec::LineBuffer;
use proptest::prelude::*;

fn feed<C: AsRef<[u8]>>(chunks: &[C]) -> Vec<String> {
    let mut buffer = LineBuffer::new();
    let mut lines = Vec::new();
    for chunk in chunks {
        lines.extend(buffer.push(chunk.as_ref()));
    }
    lines.extend(buffer.finish());
    lines
}

#[test]
fn complete_lines_are_returned_immediately() {
    let mut buffer = LineBuffer::new();
    assert_eq!(buffer.push(b"one\ntwo\n"), vec!["one", "two"]);
    assert_eq!(buffer.pending_len(), 0);
    assert_eq!(buffer.finish(), None);
}

#[test]
fn partial_line_waits_for_its_newline() {
    let mut buffer = LineBuffer::new();
    assert!(buffer.push(b"hel").is_empty());
    assert_eq!(buffer.pending_len(), 3);
    assert_eq!(buffer.push(b"lo\nwor"), vec!["hello"]);
    assert_eq!(buffer.finish().as_deref(), Some("wor"));
    assert_eq!(buffer.finish(), None);
}

#[test]
fn crlf_is_normalised_but_inner_cr_is_kept() {
    assert_eq!(feed(&["a\r\nb\r", "\nc\rd\n"]), vec!["a", "b", "c\rd"]);
}

#[test]
fn empty_lines_are_preserved() {
    assert_eq!(feed(&["\n\nx\n\n"]), vec!["", "", "x", ""]);
}

#[test]
fn utf8_split_across_chunks_decodes() {
    let text = "grüße\n".as_bytes();
    // Split inside the two-byte 'ü'.
    assert_eq!(feed(&[&text[..3], &text[3..]]), vec!["grüße"]);
}

#[test]
fn invalid_utf8_is_replaced_not_dropped() {
    let lines = feed(&[b"ok\xff\n"]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("ok"));
    assert!(lines[0].contains('\u{FFFD}'));
}

proptest! {
    /// However the bytes are chunked, the same lines come out.
    #[test]
    fn chunking_does_not_change_lines(
        text in "[a-z \r\n]{0,200}",
        cuts in prop::collection::vec(0usize..200, 0..10),
    ) {
        let bytes = text.as_bytes();
        let whole = feed(&[bytes]);

        let mut cuts: Vec<usize> = cuts.into_iter().map(|c| c.min(bytes.len())).collect();
        cuts.sort_unstable();
        let mut chunks: Vec<&[u8]> = Vec::new();
        let mut start = 0;
        for cut in cuts {
            chunks.push(&bytes[start..cut]);
            start = cut;
        }
        chunks.push(&bytes[start..]);

        prop_assert_eq!(feed(&chunks[..]), whole);
    }
}
