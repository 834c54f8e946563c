use bytes::Buf;
use bytes::Bytes;
use bytes::BytesMut;
use memchr::memchr;
use memchr::memmem;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;

#[derive(Debug)]
pub struct ReplyReader<R> {
    inner: R,
    buf: BytesMut,
    max_reply_len: usize,
}

impl<R> ReplyReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(8 * 1024),
            max_reply_len: 1024 * 1024,
        }
    }

    /// Fail with `InvalidData` once more than `max` bytes are buffered.
    pub fn max_reply_len(mut self, max: usize) -> Self {
        self.max_reply_len = max.max(1);
        self
    }
}

impl<R: AsyncRead + Unpin> ReplyReader<R> {
    /// Consume input up to and including the first occurrence of `needle`.
    pub async fn read_past(&mut self, needle: &[u8]) -> std::io::Result<()> {
        loop {
            if let Some(i) = memmem::find(&self.buf, needle) {
                self.buf.advance(i + needle.len());
                return Ok(());
            }
            if self.fill().await? == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "eof while waiting for prompt",
                ));
            }
        }
    }

    /// Next raw byte, or `None` on clean EOF.
    pub async fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        if self.buf.is_empty() && self.fill().await? == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.get_u8()))
    }

    /// Read one reply.
    ///
    /// Leading whitespace is skipped. If the reply opens with `{` or `[` it is
    /// read until the JSON document is complete; otherwise it is read as one
    /// line with the trailing `\n` and optional `\r` stripped. Text that looks
    /// like JSON but fails to parse falls back to line mode so the caller still
    /// sees the raw bytes.
    ///
    /// Returns:
    /// - `Ok(Some(bytes))` for a reply,
    /// - `Ok(None)` on clean EOF with nothing buffered.
    pub async fn read_reply(&mut self) -> std::io::Result<Option<Bytes>> {
        loop {
            let ws = self
                .buf
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count();
            self.buf.advance(ws);
            if !self.buf.is_empty() {
                break;
            }
            if self.fill().await? == 0 {
                return Ok(None);
            }
        }

        if matches!(self.buf[0], b'{' | b'[') {
            loop {
                match json_end(&self.buf) {
                    JsonScan::Complete(end) => {
                        return Ok(Some(self.buf.split_to(end).freeze()));
                    }
                    JsonScan::Malformed => break,
                    JsonScan::Incomplete => {}
                }
                if self.fill().await? == 0 {
                    return Ok(Some(self.buf.split().freeze()));
                }
            }
        }

        self.read_line().await.map(Some)
    }

    async fn read_line(&mut self) -> std::io::Result<Bytes> {
        loop {
            if let Some(i) = memchr(b'\n', &self.buf) {
                let raw = self.buf.split_to(i + 1).freeze();
                return Ok(trim_crlf(raw));
            }
            if self.fill().await? == 0 {
                return Ok(trim_crlf(self.buf.split().freeze()));
            }
        }
    }

    async fn fill(&mut self) -> std::io::Result<usize> {
        if self.buf.len() > self.max_reply_len {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "reply too long",
            ));
        }
        self.inner.read_buf(&mut self.buf).await
    }
}

enum JsonScan {
    Complete(usize),
    Incomplete,
    Malformed,
}

fn json_end(b: &[u8]) -> JsonScan {
    let mut it = serde_json::Deserializer::from_slice(b).into_iter::<serde_json::Value>();
    match it.next() {
        Some(Ok(_)) => JsonScan::Complete(it.byte_offset()),
        Some(Err(e)) if e.is_eof() => JsonScan::Incomplete,
        Some(Err(_)) => JsonScan::Malformed,
        None => JsonScan::Incomplete,
    }
}

fn trim_crlf(mut b: Bytes) -> Bytes {
    let mut end = b.len();
    if end > 0 && b[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && b[end - 1] == b'\r' {
        end -= 1;
    }
    b.truncate(end);
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn reads_json_without_newline() {
        let (a, mut b) = tokio::io::duplex(256);
        b.write_all(br#"{"PlayerList":[{"Username":"alice"}]}"#)
            .await
            .unwrap();

        let mut rr = ReplyReader::new(a);
        let r = rr.read_reply().await.unwrap().unwrap();
        assert_eq!(&r[..], br#"{"PlayerList":[{"Username":"alice"}]}"#);
    }

    #[tokio::test]
    async fn waits_for_json_split_across_writes() {
        let (a, b) = tokio::io::duplex(256);
        tokio::spawn(async move {
            let mut b = b;
            b.write_all(br#"{"BanList":["a","#).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            b.write_all(br#""b"]}"#).await.unwrap();
        });

        let mut rr = ReplyReader::new(a);
        let r = rr.read_reply().await.unwrap().unwrap();
        assert_eq!(&r[..], br#"{"BanList":["a","b"]}"#);
    }

    #[tokio::test]
    async fn reads_text_line_and_skips_leading_ws() {
        let (a, b) = tokio::io::duplex(64);
        tokio::spawn(async move {
            let mut b = b;
            b.write_all(b" \r\nKick ok\r\nnext\n").await.unwrap();
        });

        let mut rr = ReplyReader::new(a);
        let r = rr.read_reply().await.unwrap().unwrap();
        assert_eq!(&r[..], b"Kick ok");
        let r = rr.read_reply().await.unwrap().unwrap();
        assert_eq!(&r[..], b"next");
    }

    #[tokio::test]
    async fn malformed_json_is_returned_raw() {
        let (a, b) = tokio::io::duplex(64);
        tokio::spawn(async move {
            let mut b = b;
            b.write_all(b"{not json}\n").await.unwrap();
        });

        let mut rr = ReplyReader::new(a);
        let r = rr.read_reply().await.unwrap().unwrap();
        assert_eq!(&r[..], b"{not json}");
    }

    #[tokio::test]
    async fn scans_prompt_then_reads_byte() {
        let (a, b) = tokio::io::duplex(64);
        tokio::spawn(async move {
            let mut b = b;
            b.write_all(b"Password: ").await.unwrap();
            b.write_all(b"Authenticated=1").await.unwrap();
        });

        let mut rr = ReplyReader::new(a);
        rr.read_past(b"Password:").await.unwrap();
        rr.read_past(b"Authenticated=").await.unwrap();
        assert_eq!(rr.read_byte().await.unwrap(), Some(b'1'));
        assert_eq!(rr.read_byte().await.unwrap(), None);
    }

    #[tokio::test]
    async fn oversized_reply_is_invalid_data() {
        let (a, mut b) = tokio::io::duplex(256);
        b.write_all(&[b'x'; 64]).await.unwrap();

        let mut rr = ReplyReader::new(a).max_reply_len(16);
        let e = rr.read_reply().await.unwrap_err();
        assert_eq!(e.kind(), std::io::ErrorKind::InvalidData);
        drop(b);
    }

    #[tokio::test]
    async fn clean_eof_is_none() {
        let (a, b) = tokio::io::duplex(64);
        drop(b);
        let mut rr = ReplyReader::new(a);
        assert!(rr.read_reply().await.unwrap().is_none());
    }
}
