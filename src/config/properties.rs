use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;

use super::{ConfigErr, ConfigSource};

/// Only lines starting with this prefix are read, it is stripped from the keys.
pub const PROPS_PREFIX: &str = "esa.mo.nmf.apps.OrbitAI.";

/// A line oriented `key=value` properties file.
#[derive(Debug, Clone, Default)]
pub struct PropertiesFile {
    path: PathBuf,
    props: HashMap<String, String>,
}

impl PropertiesFile {
    /// Reads and parses the properties file at `path`.
    ///
    /// # Errors
    /// Returns `ConfigErr::FileMissing` if there's no file at `path` and
    /// `ConfigErr::Io` if it can't be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConfigErr> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigErr::FileMissing(path.clone()),
            _ => ConfigErr::Io {
                path: path.clone(),
                source,
            },
        })?;

        let props = Self::parse_text(&text);
        debug!("read {} properties from {}", props.len(), path.display());

        Ok(Self { path, props })
    }

    /// Parses properties from text, keeping only prefixed keys.
    ///
    /// The key is whatever precedes the first `=`, the value whatever follows it.
    /// Both are trimmed, lines without `=` are skipped.
    pub fn parse_text(text: &str) -> HashMap<String, String> {
        text.lines()
            .filter_map(|line| line.strip_prefix(PROPS_PREFIX))
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for PropertiesFile {
    fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn keeps_only_prefixed_keys() {
        let text = "\
# comment
esa.mo.nmf.apps.OrbitAI.port=9999
esa.mo.nmf.apps.OrbitAI.inputs=PD1, PD2,PD3
esa.mo.nmf.apps.Other.port=1
esa.mo.nmf.apps.OrbitAI.AROW.hparam.r = 0.8
esa.mo.nmf.apps.OrbitAI.broken
";
        let props = PropertiesFile::parse_text(text);

        assert_eq!(props.len(), 3);
        assert_eq!(props["port"], "9999");
        assert_eq!(props["inputs"], "PD1, PD2,PD3");
        assert_eq!(props["AROW.hparam.r"], "0.8");
    }

    #[test]
    fn value_keeps_everything_after_the_first_equal_sign() {
        let props = PropertiesFile::parse_text("esa.mo.nmf.apps.OrbitAI.expr=a=b");
        assert_eq!(props["expr"], "a=b");
    }

    #[test]
    fn reads_a_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "esa.mo.nmf.apps.OrbitAI.mode=2").unwrap();

        let props = PropertiesFile::open(file.path()).unwrap();
        assert_eq!(props.get("mode"), Some("2"));
        assert_eq!(props.path(), file.path());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = PropertiesFile::open(dir.path().join("orbitai.properties")).unwrap_err();
        assert!(matches!(err, ConfigErr::FileMissing(_)));
    }
}
