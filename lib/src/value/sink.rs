use std::fs;
use std::path::{Path, PathBuf};
use std::fmt::{Debug, Write};

use parking_lot::Mutex;

use crate::error::{Result, Chainable};
use crate::value::Value;

pub trait Sink: Debug {
    fn write<V: Into<Value> + 'static>(&self, value: V) -> Result<()> {
        self.write_value(value.into())
    }

    fn write_value(&self, value: Value) -> Result<()>;
}

/// Flattens scalars and arrays of scalars into text.
fn write_text(to: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::Array(array) => array.iter().try_for_each(|v| write_text(to, v)),
        Value::Dict(_) => err!("file endpoint does not support dictionary writes"),
        scalar => {
            if let Some(text) = scalar.to_text() {
                let _ = to.write_str(&text);
            }

            Ok(())
        }
    }
}

/// Replaces the file's contents with the text form of the value.
impl Sink for &Path {
    fn write_value(&self, value: Value) -> Result<()> {
        let mut contents = String::new();
        write_text(&mut contents, &value)?;
        fs::write(self, contents).chain(error! {
            "failed to open/create file for writing",
            "file path" => self.display()
        })
    }
}

impl Sink for PathBuf {
    fn write_value(&self, value: Value) -> Result<()> {
        self.as_path().write_value(value)
    }
}

impl<T: Sink> Sink for &T {
    fn write_value(&self, value: Value) -> Result<()> {
        <T as Sink>::write_value(self, value)
    }
}

/// An in-memory sink holding the most recently written value.
#[derive(Debug, Default)]
pub struct Slot(Mutex<Option<Value>>);

impl Slot {
    pub fn new() -> Self {
        Slot::default()
    }

    pub fn take(&self) -> Option<Value> {
        self.0.lock().take()
    }
}

impl Sink for Slot {
    fn write_value(&self, value: Value) -> Result<()> {
        *self.0.lock() = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_sink_writes_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        path.write(vec!["<div>", "a", "</div>"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<div>a</div>");

        path.write("replaced").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "replaced");
    }

    #[test]
    fn path_sink_rejects_dicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        let dict: crate::value::Dict = Default::default();
        assert!(path.write(dict).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn slot_keeps_last_value() {
        let slot = Slot::new();
        slot.write("one").unwrap();
        (&slot).write("two").unwrap();
        assert_eq!(slot.take(), Some(Value::from("two")));
        assert_eq!(slot.take(), None);
    }
}
