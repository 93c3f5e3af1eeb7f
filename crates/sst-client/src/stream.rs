use std::time::Duration;

use futures_util::{Stream, StreamExt};
use sst_core::proto::Event;
use tokio::time::Instant;
use tracing::debug;

use crate::{ClientError, DevServerClient};

pub const STREAM_PATH: &str = "/stream";

/// Reassembles newline-terminated lines from arbitrarily split byte chunks.
///
/// Lines are split on raw bytes before decoding, so a UTF-8 sequence cut in
/// half by a chunk boundary is decoded only once it is complete.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Returns every line completed by `chunk`, without terminators.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        complete[..last_newline]
            .split(|b| *b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// The unterminated fragment waiting for more input.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

#[derive(Debug)]
pub enum LineOutcome {
    Blank,
    Event(Event),
    Malformed(serde_json::Error),
}

pub fn decode_line(line: &str) -> LineOutcome {
    if line.trim().is_empty() {
        return LineOutcome::Blank;
    }
    match serde_json::from_str::<Event>(line) {
        Ok(event) => LineOutcome::Event(event),
        Err(err) => LineOutcome::Malformed(err),
    }
}

/// Collect events from a chunked byte stream until it ends or `deadline`
/// passes, whichever comes first.
///
/// Reaching the deadline is a normal outcome and yields the events gathered
/// so far. Malformed lines are dropped and collection carries on. An error
/// from the stream itself is returned as is. A trailing fragment without a
/// terminator is never parsed.
pub async fn collect_until<S, B, E>(stream: S, deadline: Instant) -> Result<Vec<Event>, E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    let mut stream = std::pin::pin!(stream);
    let expiry = tokio::time::sleep_until(deadline);
    tokio::pin!(expiry);

    let mut lines = LineBuffer::new();
    let mut events = Vec::new();
    let mut malformed = 0usize;

    loop {
        tokio::select! {
            biased;

            _ = &mut expiry => {
                debug!("collection window elapsed");
                break;
            }
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    for line in lines.push_chunk(bytes.as_ref()) {
                        match decode_line(&line) {
                            LineOutcome::Event(event) => events.push(event),
                            LineOutcome::Blank => {}
                            LineOutcome::Malformed(err) => {
                                malformed += 1;
                                debug!(%err, "dropping malformed stream line");
                            }
                        }
                    }
                }
                Some(Err(err)) => return Err(err),
                None => break,
            },
        }
    }

    if !lines.pending().is_empty() {
        debug!(
            bytes = lines.pending().len(),
            "discarding unterminated trailing fragment"
        );
    }
    debug!(events = events.len(), malformed, "stream collection finished");
    Ok(events)
}

impl DevServerClient {
    /// Listen on the event stream for at most `budget`.
    ///
    /// The budget covers connecting as well as reading: if the stream has not
    /// opened by the deadline the result is empty.
    pub async fn collect_events(&self, budget: Duration) -> Result<Vec<Event>, ClientError> {
        let deadline = Instant::now() + budget;
        let url = self.endpoint(STREAM_PATH);

        let response =
            match tokio::time::timeout_at(deadline, self.client.get(&url).send()).await {
                Ok(response) => response?,
                Err(_) => {
                    debug!(%url, "collection window elapsed before the stream opened");
                    return Ok(Vec::new());
                }
            };

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status { url, status });
        }

        Ok(collect_until(response.bytes_stream(), deadline).await?)
    }
}
