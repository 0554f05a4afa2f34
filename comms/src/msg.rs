//! Frames of the controller's plaintext command protocol.
//!
//! A frame is either a bare control word (`reset`, `save`, `exit`) or a data frame
//! `"%04d <label> 1:<v1> ... N:<vN>"` whose leading field is the total frame length.

use std::{fmt::Write as _, io};

use crate::{FrameErr, LEN_FIELD_SIZE, PAYLOAD_OFFSET, Serialize, declared_len};

pub const RESET: &str = "reset";
pub const SAVE: &str = "save";
pub const EXIT: &str = "exit";

/// A decoded client request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reset,
    Save,
    Exit,
    Data(DataFrame),
}

/// A labelled feature vector as sent by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    label: i8,
    features: Vec<f64>,
    payload: String,
}

impl DataFrame {
    /// Builds a frame from a label and feature values, indexing features from 1.
    ///
    /// # Errors
    /// Returns `FrameErr::BadLabel` if `label` is not one of -1, 0 or 1 and
    /// `FrameErr::BadFeature` for infinite or NaN values.
    pub fn new(label: i8, features: Vec<f64>) -> Result<Self, FrameErr> {
        if !(-1..=1).contains(&label) {
            return Err(FrameErr::BadLabel(label.to_string()));
        }

        if let Some(position) = features.iter().position(|v| !v.is_finite()) {
            return Err(FrameErr::BadFeature {
                position,
                token: format!("{}:{}", position + 1, features[position]),
            });
        }

        let mut payload = label.to_string();
        for (i, value) in features.iter().enumerate() {
            // Writing into a `String` can't fail.
            let _ = write!(payload, " {}:{value}", i + 1);
        }

        Ok(Self {
            label,
            features,
            payload,
        })
    }

    /// The label exactly as received.
    pub fn label(&self) -> i8 {
        self.label
    }

    /// The label with the negative class normalized, 0 and -1 both become -1.
    pub fn target(&self) -> i8 {
        if self.label > 0 { 1 } else { -1 }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn dim(&self) -> usize {
        self.features.len()
    }

    /// The payload as received, without the length field.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The textual feature values in payload order, without their index prefix.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.payload
            .split_whitespace()
            .skip(1)
            .map(|token| token.split_once(':').map_or(token, |(_, value)| value))
    }

    /// Total length of the frame on the wire.
    pub fn frame_len(&self) -> usize {
        PAYLOAD_OFFSET + self.payload.len()
    }
}

/// Decodes one received frame.
///
/// Control words are matched as prefixes. Anything opening with an ascii digit is
/// parsed as a data frame holding exactly `dim` features; everything else is
/// unrecognized.
///
/// # Arguments
/// * `buf` - The bytes received for this frame.
/// * `dim` - The feature dimension every data frame must carry.
///
/// # Errors
/// Returns `FrameErr::Unrecognized` for unknown commands and any of the other
/// variants for malformed data frames.
pub fn decode(buf: &[u8], dim: usize) -> Result<Command, FrameErr> {
    if buf.starts_with(RESET.as_bytes()) {
        return Ok(Command::Reset);
    }

    if buf.starts_with(SAVE.as_bytes()) {
        return Ok(Command::Save);
    }

    if buf.starts_with(EXIT.as_bytes()) {
        return Ok(Command::Exit);
    }

    if !buf.first().is_some_and(u8::is_ascii_digit) {
        return Err(FrameErr::Unrecognized);
    }

    let declared = match declared_len(buf) {
        Some(declared) => declared,
        None => return Err(length_field_err(buf)),
    };

    if declared < PAYLOAD_OFFSET {
        return Err(FrameErr::LengthTooShort { declared });
    }

    if declared > buf.len() {
        return Err(FrameErr::LengthExceedsRead {
            declared,
            read: buf.len(),
        });
    }

    let payload =
        std::str::from_utf8(&buf[PAYLOAD_OFFSET..declared]).map_err(|_| FrameErr::NotUtf8)?;

    parse_payload(payload, dim).map(Command::Data)
}

fn length_field_err(buf: &[u8]) -> FrameErr {
    let field = &buf[..buf.len().min(LEN_FIELD_SIZE)];
    if field.len() == LEN_FIELD_SIZE && field.iter().all(u8::is_ascii_digit) {
        return FrameErr::MissingSeparator;
    }

    FrameErr::BadLengthField(String::from_utf8_lossy(field).into_owned())
}

fn parse_payload(payload: &str, dim: usize) -> Result<DataFrame, FrameErr> {
    let tokens: Vec<&str> = payload.split_whitespace().collect();
    if tokens.len() != dim + 1 {
        return Err(FrameErr::TokenCount {
            got: tokens.len(),
            expected: dim + 1,
        });
    }

    let label = match tokens[0].parse::<i8>() {
        Ok(label @ -1..=1) => label,
        _ => return Err(FrameErr::BadLabel(tokens[0].to_string())),
    };

    let features = tokens[1..]
        .iter()
        .enumerate()
        .map(|(position, token)| parse_feature(position, token))
        .collect::<Result<_, _>>()?;

    Ok(DataFrame {
        label,
        features,
        payload: payload.to_string(),
    })
}

// The index is informative only, position in the payload is what counts.
fn parse_feature(position: usize, token: &str) -> Result<f64, FrameErr> {
    let bad_feature = || FrameErr::BadFeature {
        position,
        token: token.to_string(),
    };

    let (_, value) = token.split_once(':').ok_or_else(bad_feature)?;
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(bad_feature)
}

/// The reply sent back to the client after every frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok,
    Bye,
    Error,
    Invalid,
    /// One predicted label per active model, in registry order.
    Predictions(Vec<i8>),
}

impl Serialize for Response {
    fn serialize(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        match self {
            Response::Ok => buf.extend_from_slice(b"OK\n"),
            Response::Bye => buf.extend_from_slice(b"BYE\n"),
            Response::Error => buf.extend_from_slice(b"ERROR\n"),
            Response::Invalid => buf.extend_from_slice(b"INVALID\n"),
            Response::Predictions(labels) => {
                let line = labels
                    .iter()
                    .map(i8::to_string)
                    .collect::<Vec<_>>()
                    .join(",");

                buf.extend_from_slice(line.as_bytes());
                buf.push(b'\n');
            }
        }

        Ok(())
    }
}

impl Serialize for DataFrame {
    fn serialize(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        let len = self.frame_len();
        if len >= 10usize.pow(LEN_FIELD_SIZE as u32) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                FrameErr::TooLong { len },
            ));
        }

        buf.extend_from_slice(format!("{len:04} {}", self.payload).as_bytes());
        Ok(())
    }
}

impl Serialize for Command {
    fn serialize(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        match self {
            Command::Reset => buf.extend_from_slice(RESET.as_bytes()),
            Command::Save => buf.extend_from_slice(SAVE.as_bytes()),
            Command::Exit => buf.extend_from_slice(EXIT.as_bytes()),
            Command::Data(frame) => frame.serialize(buf)?,
        }

        Ok(())
    }
}
