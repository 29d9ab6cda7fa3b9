//! Incremental SSE stream assembly.
//!
//! The gateway relays the hosted model's event stream byte-for-byte, so the
//! client assembles the reply itself: buffer incoming bytes, process only
//! complete newline-terminated lines, and tolerate JSON frames split across
//! read boundaries by leaving the offending line buffered until more bytes
//! arrive.

use dearly_protocol::{first_candidate_text, GenerateContentResponse};

const DATA_PREFIX: &str = "data: ";
const DONE_TOKEN: &str = "[DONE]";

/// Assembles the streamed assistant reply from raw SSE bytes.
///
/// Feed arbitrarily chunked bytes through [`push`](Self::push); each call
/// returns the text tokens completed by that chunk. The accumulated reply
/// from [`content`](Self::content) does not depend on how the byte stream
/// was chunked.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    /// Unconsumed bytes. A line is dropped only once it has been processed
    /// or deliberately skipped; a line whose JSON fails to parse stays
    /// buffered for retry, since it may have been truncated mid-chunk.
    buffer: Vec<u8>,
    content: String,
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated assistant text so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    /// Append a chunk and drain complete lines, returning extracted tokens.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut tokens = Vec::new();
        let mut consumed = 0;

        while let Some(offset) = find_newline(&self.buffer[consumed..]) {
            let line_end = consumed + offset;
            let mut raw = &self.buffer[consumed..line_end];
            if raw.ends_with(b"\r") {
                raw = &raw[..raw.len() - 1];
            }
            let line = String::from_utf8_lossy(raw);

            // Comment and blank lines carry nothing.
            if line.starts_with(':') || line.trim().is_empty() {
                consumed = line_end + 1;
                continue;
            }
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                consumed = line_end + 1;
                continue;
            };
            let payload = payload.trim();

            if payload == DONE_TOKEN {
                // Terminator: stop draining this buffer.
                consumed = line_end + 1;
                break;
            }

            match serde_json::from_str::<GenerateContentResponse>(payload) {
                Ok(frame) => {
                    if let Some(text) = first_candidate_text(&frame) {
                        if !text.is_empty() {
                            self.content.push_str(text);
                            tokens.push(text.to_string());
                        }
                    }
                    consumed = line_end + 1;
                }
                // Possibly a frame truncated mid-chunk: leave the line in
                // place and retry it once more bytes arrive.
                Err(_) => break,
            }
        }

        self.buffer.drain(..consumed);
        tokens
    }
}

fn find_newline(bytes: &[u8]) -> Option<usize> {
    bytes.iter().position(|&b| b == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> String {
        format!(
            "data: {{\"candidates\":[{{\"content\":{{\"parts\":[{{\"text\":\"{text}\"}}]}}}}]}}\n"
        )
    }

    #[test]
    fn test_tokens_concatenate_in_line_order() {
        let mut assembler = StreamAssembler::new();
        let stream = format!("{}{}{}", frame("Hello"), frame(" there"), frame("!"));

        let tokens = assembler.push(stream.as_bytes());

        assert_eq!(tokens, vec!["Hello", " there", "!"]);
        assert_eq!(assembler.content(), "Hello there!");
    }

    #[test]
    fn test_chunking_does_not_change_output() {
        let stream = format!(
            ": comment\r\n{}\r\n{}\ndata: [DONE]\n",
            frame("Hello").trim_end(),
            frame(" world").trim_end()
        );

        // Whole stream at once
        let mut whole = StreamAssembler::new();
        whole.push(stream.as_bytes());

        // One byte at a time
        let mut byte_wise = StreamAssembler::new();
        let mut tokens = Vec::new();
        for byte in stream.as_bytes() {
            tokens.extend(byte_wise.push(&[*byte]));
        }

        assert_eq!(whole.content(), "Hello world");
        assert_eq!(byte_wise.content(), "Hello world");
        assert_eq!(tokens.concat(), "Hello world");
    }

    #[test]
    fn test_comment_and_blank_lines_are_skipped() {
        let mut assembler = StreamAssembler::new();
        let stream = format!(": keep-alive\n\n   \n{}", frame("hi"));

        let tokens = assembler.push(stream.as_bytes());

        assert_eq!(tokens, vec!["hi"]);
        assert_eq!(assembler.content(), "hi");
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        let mut assembler = StreamAssembler::new();
        let stream = format!("event: message\nid: 4\n{}", frame("hi"));

        assembler.push(stream.as_bytes());

        assert_eq!(assembler.content(), "hi");
    }

    #[test]
    fn test_parse_failure_rebuffers_line_and_preserves_content() {
        let mut assembler = StreamAssembler::new();

        let tokens = assembler.push(frame("first").as_bytes());
        assert_eq!(tokens, vec!["first"]);

        // A complete line with unparseable JSON stays buffered and is
        // retried unchanged on each subsequent push.
        assert!(assembler.push(b"data: {\"candidates\": [tru\n").is_empty());
        assert_eq!(assembler.content(), "first");

        assert!(assembler.push(frame("second").as_bytes()).is_empty());

        // Nothing already accumulated was lost or duplicated.
        assert_eq!(assembler.content(), "first");
    }

    #[test]
    fn test_frame_split_across_chunks_assembles_once() {
        let mut assembler = StreamAssembler::new();
        let full = frame("token");
        let (head, tail) = full.split_at(25);

        assert!(assembler.push(head.as_bytes()).is_empty());
        let tokens = assembler.push(tail.as_bytes());

        assert_eq!(tokens, vec!["token"]);
        assert_eq!(assembler.content(), "token");
    }

    #[test]
    fn test_done_stops_draining_current_buffer() {
        let mut assembler = StreamAssembler::new();
        let stream = format!("{}data: [DONE]\n{}", frame("before"), frame("after"));

        let tokens = assembler.push(stream.as_bytes());

        assert_eq!(tokens, vec!["before"]);
        assert_eq!(assembler.content(), "before");
    }

    #[test]
    fn test_carriage_returns_are_stripped() {
        let mut assembler = StreamAssembler::new();
        let stream = frame("crlf").replace('\n', "\r\n");

        let tokens = assembler.push(stream.as_bytes());

        assert_eq!(tokens, vec!["crlf"]);
    }

    #[test]
    fn test_frames_without_text_contribute_nothing() {
        let mut assembler = StreamAssembler::new();
        let stream = "data: {\"candidates\":[]}\ndata: {\"candidates\":[{\"content\":{\"parts\":[]}}]}\n";

        let tokens = assembler.push(stream.as_bytes());

        assert!(tokens.is_empty());
        assert_eq!(assembler.content(), "");
    }
}
