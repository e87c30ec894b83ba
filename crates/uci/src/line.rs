//! Incremental reassembly of newline-delimited engine output.

/// Longest partial line retained across feeds. No UCI line comes close
/// to this length; a partial that exceeds it is discarded so an engine
/// that stops emitting newlines cannot grow the buffer without bound.
const MAX_PARTIAL: usize = 64 * 1024;

/// Buffers raw output chunks and yields only complete lines.
///
/// Pipe reads deliver bytes at arbitrary boundaries, including mid-line.
/// `LineBuffer` retains the trailing partial line across feeds, so the
/// sequence of lines it produces is independent of how the input was
/// chunked. Trailing `\r` is stripped for engines that emit CRLF. A
/// partial line longer than [`MAX_PARTIAL`] is dropped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes; returns the lines completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.partial.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.partial.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        if self.partial.len() > MAX_PARTIAL {
            self.partial.clear();
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_lines_pass_through() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.feed(b"uciok\nreadyok\n"), vec!["uciok", "readyok"]);
    }

    #[test]
    fn partial_line_is_retained() {
        let mut buf = LineBuffer::new();
        assert!(buf.feed(b"best").is_empty());
        assert_eq!(buf.feed(b"move e2e4\n"), vec!["bestmove e2e4"]);
    }

    #[test]
    fn chunking_does_not_change_the_line_sequence() {
        let input = b"id name Stub\nuciok\nreadyok\ninfo depth 1\nbestmove e2e4 ponder e7e5\n";

        let mut whole = LineBuffer::new();
        let expected = whole.feed(input);

        // Every possible single split point yields the same sequence.
        for split in 0..input.len() {
            let mut buf = LineBuffer::new();
            let mut lines = buf.feed(&input[..split]);
            lines.extend(buf.feed(&input[split..]));
            assert_eq!(lines, expected, "split at byte {}", split);
        }

        // Byte-at-a-time as the degenerate case.
        let mut buf = LineBuffer::new();
        let mut lines = Vec::new();
        for byte in input.iter() {
            lines.extend(buf.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, expected);
    }

    #[test]
    fn oversized_partial_is_discarded() {
        let mut buf = LineBuffer::new();
        assert!(buf.feed(&vec![b'a'; MAX_PARTIAL + 1]).is_empty());
        // The runaway bytes are gone; buffering resumes cleanly.
        assert_eq!(buf.feed(b"bestmove e2e4\n"), vec!["bestmove e2e4"]);
    }

    #[test]
    fn partial_at_the_cap_is_kept() {
        let mut buf = LineBuffer::new();
        assert!(buf.feed(&vec![b'a'; MAX_PARTIAL]).is_empty());
        let lines = buf.feed(b"\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_PARTIAL);
    }

    #[test]
    fn crlf_is_stripped() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.feed(b"readyok\r\n"), vec!["readyok"]);
    }

    #[test]
    fn incomplete_tail_is_not_emitted() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.feed(b"uciok\nready"), vec!["uciok"]);
        assert_eq!(buf.feed(b"ok"), Vec::<String>::new());
        assert_eq!(buf.feed(b"\n"), vec!["readyok"]);
    }
}
