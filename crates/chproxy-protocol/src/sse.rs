/// Recovers `data:` payloads from an SSE byte stream of arbitrary chunking.
///
/// The buffer holds raw bytes, not text: `\n` never occurs inside a
/// multi-byte UTF-8 sequence, so a character split across transport reads
/// stays pending until its line completes.
#[derive(Debug, Default)]
pub struct SseLineParser {
    buffer: Vec<u8>,
}

impl SseLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a byte segment and returns the payloads of every complete
    /// `data:` line. The final split element is never emitted; it becomes
    /// the new buffer content.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut payloads = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line[..pos]) {
                payloads.push(payload);
            }
        }

        payloads
    }

    /// Flushes a trailing unterminated line after the stream ends.
    pub fn finish(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let mut line = line;
    if line.ends_with(b"\r") {
        line = &line[..line.len() - 1];
    }
    // A line that is not valid UTF-8 is malformed; skip it like any other
    // unparsable frame.
    let text = std::str::from_utf8(line).ok()?;
    if text.trim().is_empty() {
        return None;
    }
    let payload = text.strip_prefix("data: ")?;
    Some(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_lines() {
        let mut parser = SseLineParser::new();
        let payloads = parser.push(b"data: one\ndata: two\n");
        assert_eq!(payloads, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn holds_back_partial_line() {
        let mut parser = SseLineParser::new();
        assert!(parser.push(b"data: par").is_empty());
        assert_eq!(parser.push(b"tial\n"), vec!["partial".to_string()]);
    }

    #[test]
    fn ignores_blank_and_non_data_lines() {
        let mut parser = SseLineParser::new();
        let payloads = parser.push(b"\n: comment\nevent: ping\ndata: x\n\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }

    #[test]
    fn strips_carriage_return() {
        let mut parser = SseLineParser::new();
        assert_eq!(parser.push(b"data: crlf\r\n"), vec!["crlf".to_string()]);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let bytes = "data: héllo\n".as_bytes();
        // Split in the middle of the two-byte 'é'.
        let cut = bytes.iter().position(|&b| b == 0xc3).unwrap() + 1;
        let mut parser = SseLineParser::new();
        assert!(parser.push(&bytes[..cut]).is_empty());
        assert_eq!(parser.push(&bytes[cut..]), vec!["héllo".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut parser = SseLineParser::new();
        assert!(parser.push(b"data: tail").is_empty());
        assert_eq!(parser.finish(), vec!["tail".to_string()]);
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn chunking_is_boundary_invariant() {
        let stream = b"data: a\n\ndata: bb\nnoise\ndata: ccc\n";
        let whole: Vec<String> = {
            let mut parser = SseLineParser::new();
            let mut out = parser.push(stream);
            out.extend(parser.finish());
            out
        };
        for cut in 0..stream.len() {
            let mut parser = SseLineParser::new();
            let mut out = parser.push(&stream[..cut]);
            out.extend(parser.push(&stream[cut..]));
            out.extend(parser.finish());
            assert_eq!(out, whole, "split at {cut} diverged");
        }
    }
}
