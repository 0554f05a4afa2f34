//! CSV audit trail of every trained and inferred sample.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use comms::DataFrame;
use log::trace;

use crate::error::{OrbitErr, Result};

/// Milliseconds since the unix epoch.
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

/// One trained sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord<'a> {
    pub timestamp_ms: u128,
    /// The normalized label, either 1 or -1.
    pub target: i8,
    /// Feature values as sent by the client, in input order.
    pub values: Vec<&'a str>,
}

impl<'a> TrainingRecord<'a> {
    /// A record of `frame` stamped with the current time.
    pub fn new(frame: &'a DataFrame) -> Self {
        Self {
            timestamp_ms: now_millis(),
            target: frame.target(),
            values: frame.values().collect(),
        }
    }

    fn row(&self) -> String {
        let mut row = format!("{},{}", self.timestamp_ms, self.target);
        for value in &self.values {
            row.push(',');
            row.push_str(value);
        }

        row
    }
}

/// One inferred sample with every model's prediction, in registry order.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRecord<'a> {
    pub sample: TrainingRecord<'a>,
    pub predictions: Vec<i8>,
}

impl<'a> InferenceRecord<'a> {
    pub fn new(frame: &'a DataFrame, predictions: Vec<i8>) -> Self {
        Self {
            sample: TrainingRecord::new(frame),
            predictions,
        }
    }

    fn row(&self) -> String {
        let mut row = self.sample.row();
        for label in &self.predictions {
            row.push(',');
            row.push_str(&label.to_string());
        }

        row
    }
}

/// Appends rows to the training and inference CSV logs.
///
/// Files are opened for every row and closed right after, so they may be removed
/// at any time. The header is written whenever a row lands in an empty file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    training: PathBuf,
    inference: PathBuf,
    training_header: String,
    inference_header: String,
}

impl AuditLog {
    /// Creates a new `AuditLog`.
    ///
    /// # Args
    /// * `training` - Path of the training CSV.
    /// * `inference` - Path of the inference CSV.
    /// * `inputs` - The ordered input names, one column each.
    /// * `models` - The model names in registry order, one inference column each.
    pub fn new<'a, 'b, I, M>(training: PathBuf, inference: PathBuf, inputs: I, models: M) -> Self
    where
        I: IntoIterator<Item = &'a str>,
        M: IntoIterator<Item = &'b str>,
    {
        let training_header = std::iter::once("timestamp")
            .chain(std::iter::once("target"))
            .chain(inputs)
            .collect::<Vec<_>>()
            .join(",");

        let mut inference_header = training_header.clone();
        for model in models {
            inference_header.push(',');
            inference_header.push_str(model);
        }

        Self {
            training,
            inference,
            training_header,
            inference_header,
        }
    }

    pub fn training_path(&self) -> &Path {
        &self.training
    }

    pub fn inference_path(&self) -> &Path {
        &self.inference
    }

    /// Appends one row to the training log.
    ///
    /// # Errors
    /// Returns `OrbitErr::Io` if the file can't be opened or written.
    pub fn append_training(&self, record: &TrainingRecord<'_>) -> Result<()> {
        append(&self.training, &self.training_header, &record.row())
    }

    /// Appends one row to the inference log.
    ///
    /// # Errors
    /// Returns `OrbitErr::Io` if the file can't be opened or written.
    pub fn append_inference(&self, record: &InferenceRecord<'_>) -> Result<()> {
        append(&self.inference, &self.inference_header, &record.row())
    }
}

fn append(path: &Path, header: &str, row: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| OrbitErr::io(path, e))?;

    let empty = file.metadata().map_err(|e| OrbitErr::io(path, e))?.len() == 0;

    let mut text = String::with_capacity(header.len() + row.len() + 2);
    if empty {
        trace!("writing header to {}", path.display());
        text.push_str(header);
        text.push('\n');
    }
    text.push_str(row);
    text.push('\n');

    file.write_all(text.as_bytes())
        .map_err(|e| OrbitErr::io(path, e))
}
