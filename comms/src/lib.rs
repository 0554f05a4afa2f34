mod error;
pub mod msg;
mod receiver;
mod sender;
mod serialize;

use tokio::io::{AsyncRead, AsyncWrite};

pub use error::FrameErr;
pub use msg::{Command, DataFrame, Response, decode};
pub use receiver::FrameReceiver;
pub use sender::FrameSender;
pub use serialize::Serialize;

/// The biggest frame the controller will ever buffer.
pub const MAX_FRAME_LEN: usize = 10_000;

/// Width of the zero padded decimal length field that opens every data frame.
pub const LEN_FIELD_SIZE: usize = 4;

/// Offset of the payload inside a data frame, the length field plus one separator.
pub const PAYLOAD_OFFSET: usize = LEN_FIELD_SIZE + 1;

/// Creates both `FrameReceiver` and `FrameSender` network channel parts.
///
/// Given a reader and a writer creates and returns both ends of the communication.
///
/// # Arguments
/// * `rx` - An async readable.
/// * `tx` - An async writable.
///
/// # Returns
/// A communication stream in the form of a frame receiver and sender.
pub fn channel<R, W>(rx: R, tx: W) -> (FrameReceiver<R>, FrameSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (FrameReceiver::new(rx), FrameSender::new(tx))
}

/// Returns the declared total length of the data frame at the start of `buf`.
///
/// Only answers when `buf` opens with four ascii digits followed by the separator,
/// anything else is left for `decode` to classify.
pub(crate) fn declared_len(buf: &[u8]) -> Option<usize> {
    let field = buf.get(..LEN_FIELD_SIZE)?;
    if !field.iter().all(u8::is_ascii_digit) || buf.get(LEN_FIELD_SIZE) != Some(&b' ') {
        return None;
    }

    let len = field
        .iter()
        .fold(0, |acc, digit| acc * 10 + usize::from(digit - b'0'));

    Some(len)
}
