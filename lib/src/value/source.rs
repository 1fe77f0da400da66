use std::fs;
use std::path::Path;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{Result, Chainable, Kind};
use crate::value::Value;

pub trait Source: Debug {
    type Value: Into<Value> + 'static;

    fn read(self) -> Result<Self::Value>;

    fn try_read<T: TryFrom<Value> + 'static>(self) -> Result<T> where Self: Sized {
        let value: Value = self.read()?.into();
        let kind = value.kind();
        value.try_into()
            .map_err(|_| error! {
                "invalid input value type",
                "expected" => std::any::type_name::<T>(),
                "actual type" => kind,
            })
    }

    fn path(&self) -> Option<&Path> {
        None
    }
}

impl Source for Value {
    type Value = Self;

    fn read(self) -> Result<Self::Value> {
        Ok(self)
    }
}

impl Source for String {
    type Value = String;

    fn read(self) -> Result<Self> {
        Ok(self)
    }
}

impl Source for &str {
    type Value = Arc<str>;

    fn read(self) -> Result<Self::Value> {
        Ok(self.into())
    }
}

/// Reads the file's contents as text.
///
/// Failing to read the file is a [`Kind::DataSource`] error; contents that
/// aren't valid UTF-8 are a [`Kind::DataParse`] error.
impl Source for &Path {
    type Value = String;

    fn read(self) -> Result<Self::Value> {
        let bytes = fs::read(self)
            .chain(error! {
                "failed to open file for reading",
                "file path" => self.display()
            })
            .with_kind(Kind::DataSource)?;

        String::from_utf8(bytes)
            .chain(error! {
                "file is not valid UTF-8",
                "file path" => self.display()
            })
            .with_kind(Kind::DataParse)
    }

    fn path(&self) -> Option<&Path> {
        Some(self)
    }
}

impl Source for &std::path::PathBuf {
    type Value = String;

    fn read(self) -> Result<Self::Value> {
        self.as_path().read()
    }

    fn path(&self) -> Option<&Path> {
        Some(self.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_data_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let e = dir.path().join("nope.csv").as_path().read().unwrap_err();
        assert_eq!(e.kind(), Kind::DataSource);
    }

    #[test]
    fn invalid_utf8_is_a_data_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, [b'a', 0xff, 0xfe]).unwrap();
        let e = path.as_path().read().unwrap_err();
        assert_eq!(e.kind(), Kind::DataParse);
    }

    #[test]
    fn try_read_checks_type() {
        let text: Arc<str> = "hello".try_read().unwrap();
        assert_eq!(&*text, "hello");
        assert!(Value::from(true).try_read::<Arc<str>>().is_err());
    }
}
