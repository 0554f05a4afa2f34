use std::{error::Error, fmt};

/// Reasons a received frame could not be turned into a `Command`.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameErr {
    /// The frame matches none of the known command shapes.
    Unrecognized,
    /// The length field is not a four digit decimal number.
    BadLengthField(String),
    /// The declared length can't even hold the length field and separator.
    LengthTooShort { declared: usize },
    /// The declared length is bigger than what was actually received.
    LengthExceedsRead { declared: usize, read: usize },
    /// The length field is not followed by a single space.
    MissingSeparator,
    /// The payload is not valid utf-8 text.
    NotUtf8,
    /// The payload doesn't hold the label plus one token per feature.
    TokenCount { got: usize, expected: usize },
    /// The label is not one of -1, 0 or 1.
    BadLabel(String),
    /// A feature token is not `<index>:<value>` with a numeric value.
    BadFeature { position: usize, token: String },
    /// A frame to be sent doesn't fit in the four digit length field.
    TooLong { len: usize },
}

impl FrameErr {
    /// Returns `true` for every failure of a frame that looked like a data frame.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, FrameErr::Unrecognized)
    }
}

impl fmt::Display for FrameErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameErr::Unrecognized => write!(f, "unrecognized command"),
            FrameErr::BadLengthField(field) => write!(f, "invalid length field {field:?}"),
            FrameErr::LengthTooShort { declared } => {
                write!(f, "declared length {declared} is shorter than the frame header")
            }
            FrameErr::LengthExceedsRead { declared, read } => {
                write!(f, "declared length {declared} exceeds the {read} bytes received")
            }
            FrameErr::MissingSeparator => write!(f, "length field is not followed by a space"),
            FrameErr::NotUtf8 => write!(f, "payload is not valid utf-8"),
            FrameErr::TokenCount { got, expected } => {
                write!(f, "payload has {got} tokens, expected {expected}")
            }
            FrameErr::BadLabel(label) => write!(f, "invalid label {label:?}"),
            FrameErr::BadFeature { position, token } => {
                write!(f, "invalid feature {token:?} at position {position}")
            }
            FrameErr::TooLong { len } => {
                write!(f, "frame of {len} bytes doesn't fit the length field")
            }
        }
    }
}

impl Error for FrameErr {}
