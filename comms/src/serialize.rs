use std::io;

/// Anything that knows how to write itself on the wire.
pub trait Serialize {
    /// Appends the wire representation of `self` into `buf`.
    ///
    /// # Errors
    /// Returns `io::ErrorKind::InvalidData` if `self` can't be represented on the wire.
    fn serialize(&self, buf: &mut Vec<u8>) -> io::Result<()>;
}
