use std::path::Path;

use crate::config::{Config, DataFormat};
use crate::deck::Record;
use crate::error::{Chainable, Kind, Result};
use crate::value::{Csv, Json, Mapper, Value};

/// Reads the deck's card data as configured.
pub fn load(config: &Config) -> Result<Vec<Record>> {
    load_records(&config.data_path(), config.format, config.delimiter)
}

/// Reads the records in the card data file at `path`.
///
/// An unreadable file is a [`Kind::DataSource`] error. Content that doesn't
/// parse as `format`, or JSON whose top level isn't an array of objects, is
/// a [`Kind::DataParse`] error.
pub fn load_records(path: &Path, format: DataFormat, delimiter: u8) -> Result<Vec<Record>> {
    let value = match format {
        DataFormat::Csv => Csv::new(delimiter).map(path)?,
        DataFormat::Json => Json.map(path)?,
    };

    into_records(value).chain_with(|| error! {
        "card data must be a list of records",
        "file path" => path.display(),
    })
}

fn into_records(value: Value) -> Result<Vec<Record>> {
    let kind = value.kind();
    let items = value.into_vec()
        .map_err(|_| error!("expected a top-level array", "found" => kind))
        .with_kind(Kind::DataParse)?;

    items.iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Dict(dict) => Ok(Record::from(dict.clone())),
            other => Err(error! {
                "expected every element to be an object",
                "element" => i,
                "found" => other.kind(),
            }.with_kind(Kind::DataParse)),
        })
        .collect()
}
