//! Server-sent-event decoding for streaming completions.
//!
//! Both Gemini (`alt=sse`) and OpenAI-compatible servers (`stream: true`)
//! frame each JSON chunk as one or more `data:` lines followed by a blank
//! line. [`SseDecoder`] turns arbitrary network chunks into complete event
//! payloads; [`relay`] wires it onto a `reqwest` byte stream.

use std::collections::VecDeque;

use futures_util::{Stream, StreamExt, stream};

use super::{ProviderError, TokenStream};

/// Incremental `text/event-stream` decoder.
///
/// Bytes are buffered until a full line is available, so events split
/// across chunks (including inside a multi-byte UTF-8 sequence) decode
/// correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every event payload completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut events = Vec::new();
        for &b in bytes {
            if b == b'\n' {
                let line = std::mem::take(&mut self.line);
                self.handle_line(&line, &mut events);
            } else {
                self.line.push(b);
            }
        }
        events
    }

    /// Flush whatever is buffered at end of stream.
    pub fn finish(&mut self) -> Vec<String> {
        let mut events = Vec::new();
        if !self.line.is_empty() {
            let line = std::mem::take(&mut self.line);
            self.handle_line(&line, &mut events);
        }
        self.flush_event(&mut events);
        events
    }

    fn handle_line(&mut self, raw: &[u8], events: &mut Vec<String>) {
        let line = String::from_utf8_lossy(raw);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.is_empty() {
            self.flush_event(events);
            return;
        }
        // Comments (`:keep-alive`) and other fields (`event:`, `id:`) carry
        // no payload for us.
        if let Some(rest) = line.strip_prefix("data:") {
            self.data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
    }

    fn flush_event(&mut self, events: &mut Vec<String>) {
        if !self.data.is_empty() {
            events.push(self.data.join("\n"));
            self.data.clear();
        }
    }
}

struct RelayState<S, F> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    extract: F,
    done: bool,
}

/// Turn an SSE byte stream into a [`TokenStream`].
///
/// `extract` maps one event payload to its text delta (`Ok(None)` for
/// events without text). A `[DONE]` payload ends the stream; transport or
/// extraction errors are yielded once and end it too.
pub fn relay<S, B, F>(bytes: S, extract: F) -> TokenStream
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin + Send + 'static,
    B: AsRef<[u8]>,
    F: Fn(&str) -> Result<Option<String>, ProviderError> + Send + 'static,
{
    let state = RelayState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        extract,
        done: false,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(payload) = st.pending.pop_front() {
                if payload.trim() == "[DONE]" {
                    st.done = true;
                    st.pending.clear();
                    continue;
                }
                match (st.extract)(&payload) {
                    Ok(Some(text)) if !text.is_empty() => return Some((Ok(text), st)),
                    Ok(_) => continue,
                    Err(e) => {
                        st.done = true;
                        st.pending.clear();
                        return Some((Err(e), st));
                    }
                }
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = st.decoder.push(chunk.as_ref());
                    st.pending.extend(events);
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(ProviderError::Request(format!("stream interrupted: {e}"))), st));
                }
                None => {
                    st.done = true;
                    let events = st.decoder.finish();
                    st.pending.extend(events);
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_event() {
        let mut d = SseDecoder::new();
        assert_eq!(d.push(b"data: {\"a\":1}\n\n"), vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn event_split_across_chunks() {
        let mut d = SseDecoder::new();
        assert!(d.push(b"data: {\"te").is_empty());
        assert!(d.push(b"xt\":\"hi\"}\r\n").is_empty());
        assert_eq!(d.push(b"\r\n"), vec!["{\"text\":\"hi\"}".to_string()]);
    }

    #[test]
    fn utf8_split_inside_codepoint() {
        let bytes = "data: Grüße\n\n".as_bytes();
        let (a, b) = bytes.split_at(9); // inside the ü
        let mut d = SseDecoder::new();
        assert!(d.push(a).is_empty());
        assert_eq!(d.push(b), vec!["Grüße".to_string()]);
    }

    #[test]
    fn multiline_data_and_comments() {
        let mut d = SseDecoder::new();
        let out = d.push(b": keep-alive\nevent: message\ndata: one\ndata: two\n\n");
        assert_eq!(out, vec!["one\ntwo".to_string()]);
    }

    #[tokio::test]
    async fn relay_stops_at_done_and_skips_empty() {
        let chunks = vec![
            Ok::<_, reqwest::Error>(b"data: a\n\ndata: \n\nda".to_vec()),
            Ok(b"ta: b\n\ndata: [DONE]\n\ndata: c\n\n".to_vec()),
        ];
        let out: Vec<String> = relay(stream::iter(chunks), |p| Ok(Some(p.to_string())))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(out, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn relay_ends_after_extract_error() {
        let chunks = vec![Ok::<_, reqwest::Error>(b"data: x\n\ndata: y\n\n".to_vec())];
        let items: Vec<_> = relay(stream::iter(chunks), |_| Err(ProviderError::EmptyResponse))
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    #[test]
    fn finish_flushes_unterminated_event() {
        let mut d = SseDecoder::new();
        assert!(d.push(b"data: tail").is_empty());
        assert_eq!(d.finish(), vec!["tail".to_string()]);
        assert!(d.finish().is_empty());
    }
}
