// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Newline-delimited framing that survives oversized lines.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// One decoded unit from the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    /// A line longer than the limit. Its bytes are discarded up to the next
    /// newline and decoding carries on after it.
    Oversized,
}

/// [`LinesCodec`] with a length limit that reports oversized lines as
/// [`Frame::Oversized`] items instead of errors.
///
/// `Framed` stops decoding buffered bytes after a decoder error, so a valid
/// line read together with an oversized one would otherwise wait for the
/// peer's next write.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    inner: LinesCodec,
}

impl FrameCodec {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_line_bytes),
        }
    }
}

fn lift(decoded: Result<Option<String>, LinesCodecError>) -> Result<Option<Frame>, LinesCodecError> {
    match decoded {
        Ok(line) => Ok(line.map(Frame::Line)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::Oversized)),
        Err(e) => Err(e),
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        lift(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        lift(self.inner.decode_eof(buf))
    }
}

impl Encoder<String> for FrameCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), LinesCodecError> {
        self.inner.encode(line, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use futures::StreamExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::UnixStream;
    use tokio_util::codec::FramedRead;

    #[test]
    fn oversized_line_becomes_an_item() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from("0123456789abcdef\nok\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Oversized));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Line("ok".into())));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[tokio::test]
    async fn line_after_oversized_one_in_same_write_is_delivered() {
        let (mut writer, reader) = UnixStream::pair().unwrap();
        let mut frames = FramedRead::new(reader, FrameCodec::new(256));

        let mut payload = "x".repeat(1024);
        payload.push_str("\nshort\n");
        writer.write_all(payload.as_bytes()).await.unwrap();

        let first = tokio::time::timeout(Duration::from_millis(500), frames.next())
            .await
            .unwrap();
        assert_eq!(first.unwrap().unwrap(), Frame::Oversized);
        let second = tokio::time::timeout(Duration::from_millis(500), frames.next())
            .await
            .unwrap();
        assert_eq!(second.unwrap().unwrap(), Frame::Line("short".into()));
    }
}
