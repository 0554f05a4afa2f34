use std::io;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{MAX_FRAME_LEN, PAYLOAD_OFFSET, declared_len};

/// The receiving end handle of the communication.
pub struct FrameReceiver<R: AsyncRead + Unpin> {
    rx: R,
}

impl<R: AsyncRead + Unpin> FrameReceiver<R> {
    /// Creates a new `FrameReceiver` instance.
    ///
    /// # Arguments
    /// * `rx` - The underlying reader.
    pub(super) fn new(rx: R) -> Self {
        Self { rx }
    }

    /// Waits to receive the next frame from the inner reader.
    ///
    /// Every frame starts with a single read of at most `MAX_FRAME_LEN` bytes. When
    /// that read holds the beginning of a data frame whose declared length is
    /// larger than what arrived, reading continues until the whole frame is
    /// buffered. Bytes past the declared length are dropped.
    ///
    /// # Arguments
    /// * `buf` - The buffer the frame is read into, the returned slice borrows it.
    ///
    /// # Returns
    /// `Ok(None)` once the peer closed the connection, the frame bytes otherwise.
    ///
    /// # Errors
    /// Returns `io::Error` if reading from the inner reader fails, including the
    /// peer closing the connection halfway through a data frame.
    pub async fn recv_into<'buf>(
        &mut self,
        buf: &'buf mut Vec<u8>,
    ) -> io::Result<Option<&'buf [u8]>> {
        buf.resize(MAX_FRAME_LEN, 0);
        let read = self.rx.read(&mut buf[..]).await?;
        buf.truncate(read);

        if read == 0 {
            return Ok(None);
        }

        match declared_len(buf) {
            Some(declared) if declared > read && declared <= MAX_FRAME_LEN => {
                debug!("frame declares {declared} bytes, got {read}, reading the rest");
                buf.resize(declared, 0);
                self.rx.read_exact(&mut buf[read..]).await?;
            }
            Some(declared) if declared < read => {
                trace!("dropping {} bytes past the declared frame length", read - declared);
                buf.truncate(declared.max(PAYLOAD_OFFSET));
            }
            _ => {}
        }

        Ok(Some(buf.as_slice()))
    }
}
