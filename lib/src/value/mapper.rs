use std::sync::Arc;

use crate::error::{ErrorDetail, Kind, Result, Chainable};
use crate::value::{Dict, Value, Source, Sink};
use crate::util::strip_bom;

pub trait Mapper {
    type Output: Into<Value> + 'static;

    fn map<I: Source>(&self, input: I) -> Result<Self::Output>;

    fn map_copy<I: Source, O: Sink>(&self, input: I, output: O) -> Result<()> {
        output.write(self.map(input)?)
    }

    fn try_map<T: TryInto<Value>>(&self, input: T) -> Result<Self::Output> {
        self.map(input.try_into().map_err(|_| "failed to map input to value")?)
    }

    fn try_map_copy<T: TryInto<Value>, O: Sink>(&self, input: T, output: O) -> Result<()> {
        output.write(self.try_map(input)?)
    }
}

pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// Parses `string` as the data format `Self` as a `T` or returns an error
    /// if the `string` is an invalid `T`.
    fn from_str<T: serde::de::DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    /// Reads `input` as text and parses it. A leading byte-order mark is
    /// ignored. Parse failures are [`Kind::DataParse`] errors.
    fn read<I: Source, T: serde::de::DeserializeOwned>(input: I) -> Result<T> {
        let path = input.path().map(|p| p.display().to_string());
        let input = input.try_read::<Arc<str>>()?;
        Self::from_str(strip_bom(&input))
            .chain_with(|| error! {
                "failed to parse data",
                "format" => std::any::type_name::<Self>().rsplit("::").next().unwrap_or("?"),
                "file path" => path.as_deref().unwrap_or("<memory>"),
            })
            .with_kind(Kind::DataParse)
    }
}

impl<F: Format> Mapper for F {
    type Output = Value;

    fn map<I: Source>(&self, input: I) -> Result<Self::Output> {
        Self::read(input)
    }
}

macro_rules! impl_format {
    ($name:ident : $func:expr, $E:ty) => (
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            fn from_str<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Toml: toml::from_str, toml::de::Error);
impl_format!(Json: serde_json::from_str, serde_json::error::Error);

/// Delimited text with a header row, mapped to an array of dictionaries.
///
/// The first row names the fields. Each following row becomes one dictionary
/// whose values are aligned to the header by column. Rows shorter than the
/// header leave the remaining fields out entirely; cells past the header's
/// width are dropped.
#[derive(Debug, Clone, Copy)]
pub struct Csv {
    delimiter: u8,
}

impl Csv {
    pub fn new(delimiter: u8) -> Self {
        Csv { delimiter }
    }
}

impl Default for Csv {
    fn default() -> Self {
        Csv::new(b',')
    }
}

impl Mapper for Csv {
    type Output = Value;

    fn map<I: Source>(&self, input: I) -> Result<Self::Output> {
        let path = input.path().map(|p| p.display().to_string());
        let path = path.as_deref().unwrap_or("<memory>");
        let input = input.try_read::<Arc<str>>()?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(strip_bom(&input).as_bytes());

        let headers = reader.headers()
            .chain_with(|| error!("failed to read csv header row", "file path" => path))
            .with_kind(Kind::DataParse)?
            .iter()
            .map(Arc::<str>::from)
            .collect::<Vec<_>>();

        let mut rows = vec![];
        for (i, row) in reader.records().enumerate() {
            let row = row
                .chain_with(|| error! {
                    "malformed csv row",
                    "file path" => path,
                    "line" => i + 2,
                })
                .with_kind(Kind::DataParse)?;

            if row.len() > headers.len() {
                tracing::debug!(line = i + 2, extra = row.len() - headers.len(),
                    "dropping csv cells past the header");
            }

            let dict = headers.iter()
                .zip(row.iter())
                .map(|(key, cell)| (key.clone(), Value::from(cell)))
                .collect::<Dict>();

            rows.push(Value::from(dict));
        }

        Ok(Value::Array(Arc::new(rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(value: &Value) -> Vec<Vec<(String, String)>> {
        value.as_slice().unwrap()
            .iter()
            .map(|row| row.as_dict().unwrap()
                .iter()
                .map(|(k, v)| (k.to_string(), v.as_str().unwrap().to_string()))
                .collect())
            .collect()
    }

    #[test]
    fn csv_aligns_by_header() {
        let value = Csv::default().map("name,cost\nFireball,3\nIce Shard,1\n").unwrap();
        assert_eq!(rows(&value), vec![
            vec![("name".into(), "Fireball".into()), ("cost".into(), "3".into())],
            vec![("name".into(), "Ice Shard".into()), ("cost".into(), "1".into())],
        ]);
    }

    #[test]
    fn csv_short_rows_leave_fields_absent() {
        let value = Csv::default().map("name,cost,text\nFireball\nIce Shard,\n").unwrap();
        let rows = value.as_slice().unwrap();
        let first = rows[0].as_dict().unwrap();
        assert_eq!(first.len(), 1);
        assert!(first.get("cost").is_none());

        let second = rows[1].as_dict().unwrap();
        assert_eq!(second.get("cost").and_then(|v| v.as_str()), Some(""));
        assert!(second.get("text").is_none());
    }

    #[test]
    fn csv_drops_extra_cells() {
        let value = Csv::default().map("name\nFireball,extra\n").unwrap();
        assert_eq!(rows(&value), vec![vec![("name".into(), "Fireball".into())]]);
    }

    #[test]
    fn csv_custom_delimiter() {
        let value = Csv::new(b';').map("name;text\nFireball;Deal 3, then draw\n").unwrap();
        assert_eq!(rows(&value)[0][1].1, "Deal 3, then draw");
    }

    #[test]
    fn csv_strips_byte_order_mark() {
        let value = Csv::default().map("\u{feff}name,cost\nFireball,3\n").unwrap();
        assert_eq!(rows(&value)[0][0].0, "name");
    }

    #[test]
    fn json_strips_byte_order_mark() {
        let value = Json.map("\u{feff}[{\"name\": \"Fireball\"}]").unwrap();
        assert_eq!(rows(&value)[0][0], ("name".into(), "Fireball".into()));
    }

    #[test]
    fn json_syntax_error_is_a_parse_error() {
        let e = Json.map("[{\"name\": ").unwrap_err();
        assert_eq!(e.kind(), Kind::DataParse);
    }
}
