//! Multipart-chunk delivery for discrete frames over a chunked HTTP stream.
//!
//! Each frame is delivered as three sequential chunked writes:
//!
//! ```text
//! --frame\r\nContent-Type: image/jpeg\r\nContent-Length: <N>\r\n\r\n
//! <N raw bytes>
//! \r\n
//! ```
//!
//! The stream is unterminated: it ends only when the connection drops.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::channel::DeliveryChannel;
use crate::{Chunk, SendError};

/// Default multipart boundary marker.
const DEFAULT_BOUNDARY: &str = "frame";

/// Default content type of each delivered part.
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// One chunked write on an HTTP response stream.
///
/// This is the transport seam of the multipart framing: the channel issues
/// exactly three `write_chunk` calls per delivered frame, and each call can
/// independently fail. Use [`IoChunkWriter`] for real sockets; the impl for
/// `Vec<Vec<u8>>` records writes for inspection in tests.
#[async_trait]
pub trait ChunkWriter: Send {
    /// Writes one chunk to the response stream.
    async fn write_chunk(&mut self, bytes: &[u8]) -> std::io::Result<()>;
}

/// [`ChunkWriter`] over any async byte stream.
pub struct IoChunkWriter<W> {
    inner: W,
}

impl<W> IoChunkWriter<W> {
    /// Wraps an async writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ChunkWriter for IoChunkWriter<W> {
    async fn write_chunk(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await
    }
}

/// Records each write separately; for tests.
#[async_trait]
impl ChunkWriter for Vec<Vec<u8>> {
    async fn write_chunk(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.push(bytes.to_vec());
        Ok(())
    }
}

/// Delivers variable-length frames with multipart boundary framing.
///
/// # Example
///
/// ```ignore
/// let mut channel = MultipartChannel::new(IoChunkWriter::new(response_stream));
/// http.set_response_content_type(&channel.response_content_type());
///
/// channel.send(&frame).await?;   // three chunked writes
/// ```
pub struct MultipartChannel<W> {
    name: String,
    boundary: String,
    content_type: String,
    writer: W,
}

impl<W: ChunkWriter> MultipartChannel<W> {
    /// Creates a multipart channel with the default `frame` boundary and
    /// `image/jpeg` content type.
    pub fn new(writer: W) -> Self {
        Self {
            name: "multipart".to_string(),
            boundary: DEFAULT_BOUNDARY.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            writer,
        }
    }

    /// Sets a custom boundary marker.
    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Sets a custom per-part content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// The value the embedding HTTP server should set as the response
    /// content type before the first frame is delivered.
    pub fn response_content_type(&self) -> String {
        format!("multipart/x-mixed-replace;boundary={}", self.boundary)
    }

    /// Returns the underlying writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn part_header(&self, len: usize) -> String {
        format!(
            "--{}\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
            self.boundary, self.content_type, len
        )
    }
}

#[async_trait]
impl<W: ChunkWriter> DeliveryChannel for MultipartChannel<W> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, chunk: &Chunk) -> Result<(), SendError> {
        // Three phases; a failure in any of them fails the whole send and
        // the frame is gone. No partial part is ever retried or resumed.
        let header = self.part_header(chunk.len());
        self.writer
            .write_chunk(header.as_bytes())
            .await
            .map_err(|e| SendError::transport(format!("part header: {e}")))?;
        self.writer
            .write_chunk(chunk.as_bytes())
            .await
            .map_err(|e| SendError::transport(format!("part body: {e}")))?;
        self.writer
            .write_chunk(b"\r\n")
            .await
            .map_err(|e| SendError::transport(format!("part delimiter: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_three_writes_per_frame() {
        let mut channel = MultipartChannel::new(Vec::new());
        let chunk = Chunk::new(vec![0xAB; 500], 0);

        channel.send(&chunk).await.unwrap();

        let writes = channel.into_writer();
        assert_eq!(writes.len(), 3);
        assert_eq!(
            writes[0],
            b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 500\r\n\r\n".to_vec()
        );
        assert_eq!(writes[1], vec![0xAB; 500]);
        assert_eq!(writes[2], b"\r\n".to_vec());
    }

    #[tokio::test]
    async fn test_framing_exactness() {
        // Concatenation of the three writes must be exactly:
        // header + N raw bytes + trailing CRLF
        let mut channel = MultipartChannel::new(Vec::new());
        let payload = vec![7u8; 12000];
        channel.send(&Chunk::new(payload.clone(), 0)).await.unwrap();

        let writes = channel.into_writer();
        let mut concat = Vec::new();
        for write in &writes {
            concat.extend_from_slice(write);
        }

        let mut expected =
            b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 12000\r\n\r\n".to_vec();
        expected.extend_from_slice(&payload);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(concat, expected);
    }

    #[tokio::test]
    async fn test_custom_boundary_and_content_type() {
        let channel = MultipartChannel::new(Vec::new())
            .with_boundary("still")
            .with_content_type("image/png");

        assert_eq!(
            channel.response_content_type(),
            "multipart/x-mixed-replace;boundary=still"
        );
        assert_eq!(
            channel.part_header(9),
            "--still\r\nContent-Type: image/png\r\nContent-Length: 9\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_io_chunk_writer() {
        let mut channel = MultipartChannel::new(IoChunkWriter::new(Vec::new()));
        channel.send(&Chunk::new(vec![1, 2, 3], 0)).await.unwrap();

        // Vec<u8> as AsyncWrite concatenates; framing should still hold
        let bytes = channel.into_writer().into_inner();
        let mut expected =
            b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 3\r\n\r\n".to_vec();
        expected.extend_from_slice(&[1, 2, 3]);
        expected.extend_from_slice(b"\r\n");
        assert_eq!(bytes, expected);
    }

    #[tokio::test]
    async fn test_failing_writer_fails_whole_send() {
        struct FailingWriter {
            fail_at: usize,
            calls: usize,
        }

        #[async_trait]
        impl ChunkWriter for FailingWriter {
            async fn write_chunk(&mut self, _bytes: &[u8]) -> std::io::Result<()> {
                self.calls += 1;
                if self.calls >= self.fail_at {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::BrokenPipe,
                        "peer gone",
                    ));
                }
                Ok(())
            }
        }

        // Fail on the body write (second phase)
        let mut channel = MultipartChannel::new(FailingWriter {
            fail_at: 2,
            calls: 0,
        });
        let err = channel.send(&Chunk::new(vec![0; 4], 0)).await.unwrap_err();
        assert!(matches!(err, SendError::TransportFailure { .. }));
        assert!(err.to_string().contains("part body"));
    }
}
