//! Process log setup, every record becomes one line of `logs/orbitai.log`.

use std::{
    fmt::Display,
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
};

use env_logger::{Builder, Env, Target};
use log::{
    Record,
    kv::{self, Key, Value, VisitSource},
};

const DEFAULT_FILTER: &str = "info";

/// Routes the `log` facade into the process log at `path`.
///
/// `RUST_LOG` overrides the default `info` filter.
///
/// # Errors
/// Returns `log::SetLoggerError` if a logger was already installed.
pub fn init(path: PathBuf) -> Result<(), log::SetLoggerError> {
    builder(path).try_init()
}

fn builder(path: PathBuf) -> Builder {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder
        .format(|buf, record| {
            let timestamp = buf.timestamp_millis();
            format_record(buf, timestamp, record)
        })
        .target(Target::Pipe(Box::new(AppendFile { path })));

    builder
}

/// Writes `[<timestamp>][<LEVEL>] <message>` and then every key value pair.
fn format_record<W: Write>(
    w: &mut W,
    timestamp: impl Display,
    record: &Record<'_>,
) -> io::Result<()> {
    write!(w, "[{timestamp}][{}] {}", record.level(), record.args())?;

    record
        .key_values()
        .visit(&mut PairWriter(&mut *w))
        .map_err(io::Error::other)?;

    writeln!(w)
}

struct PairWriter<'a, W: Write>(&'a mut W);

impl<'kvs, W: Write> VisitSource<'kvs> for PairWriter<'_, W> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        write!(self.0, " {key}={value}").map_err(|_| kv::Error::msg("failed to write pair"))
    }
}

/// A log sink that opens the file on every write, so it can be removed at any time.
struct AppendFile {
    path: PathBuf,
}

impl Write for AppendFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use log::{Level, Log};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn records_are_single_lines() {
        let mut out = Vec::new();
        format_record(
            &mut out,
            "2023-11-14T22:13:20.000Z",
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("serialized model missing"))
                .key_values(&("model", "AROW"))
                .build(),
        )
        .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[2023-11-14T22:13:20.000Z][WARN] serialized model missing model=AROW\n"
        );
    }

    #[test]
    fn lines_carry_a_readable_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orbitai.log");
        let logger = builder(path.clone()).build();

        logger.log(
            &Record::builder()
                .level(Level::Error)
                .args(format_args!("bind failed"))
                .build(),
        );
        logger.flush();

        let text = fs::read_to_string(&path).unwrap();
        let line = text.lines().next().unwrap();
        let (timestamp, rest) = line
            .strip_prefix('[')
            .and_then(|line| line.split_once(']'))
            .unwrap();

        // e.g. 2023-11-14T22:13:20.000Z
        assert_eq!(timestamp.len(), 24);
        assert_eq!(&timestamp[4..5], "-");
        assert_eq!(&timestamp[10..11], "T");
        assert_eq!(&timestamp[19..20], ".");
        assert!(timestamp.ends_with('Z'));
        assert_eq!(rest, "[ERROR] bind failed");
    }

    #[test]
    fn sink_survives_removal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orbitai.log");
        let mut sink = AppendFile { path: path.clone() };

        sink.write_all(b"first\n").unwrap();
        fs::remove_file(&path).unwrap();
        sink.write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
    }
}
