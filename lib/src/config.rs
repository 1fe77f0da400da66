use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Chainable, Error, Kind, Result};
use crate::templating::EngineOptions;
use crate::value::{Format, Toml};

pub const PAGE_FILE: &str = "index.html";
pub const RULES_SOURCE_FILE: &str = "rules.md";
pub const RULES_FILE: &str = "rules.html";
pub const SETTINGS_FILE: &str = "cardpress.toml";

pub const DEFAULT_PREFIX: &str = "_card";
pub const DEFAULT_DELIMITER: u8 = b',';
pub const DEFAULT_PORT: u16 = 8800;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_SETTLE_MS: u64 = 100;

/// The declared format of a deck's card data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Delimited text with a header row.
    #[default]
    Csv,
    /// A JSON array of objects.
    Json,
}

impl DataFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.extension().fmt(f)
    }
}

impl FromStr for DataFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            _ => Err(error!("unknown card data format", "format" => s, "expected" => "csv or json")
                .with_kind(Kind::Config)),
        }
    }
}

/// Partial settings from one configuration layer.
///
/// Layers are combined with [`Settings::merge()`]; the settings file in the
/// asset directory sits below command-line flags.
#[derive(Default, Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub prefix: Option<String>,
    pub format: Option<DataFormat>,
    pub delimiter: Option<String>,
    pub port: Option<u16>,
    pub host: Option<String>,
    pub strict: Option<bool>,
    pub settle_ms: Option<u64>,
    /// Lays the page out in a fixed number of columns.
    pub columns: Option<usize>,
}

impl Settings {
    /// Reads [`SETTINGS_FILE`] from `assets` if it exists.
    pub fn discover<P: AsRef<Path>>(assets: P) -> Result<Self> {
        let path = assets.as_ref().join(SETTINGS_FILE);
        if !path.is_file() {
            return Ok(Settings::default());
        }

        Toml::read(path.as_path())
            .chain_with(|| error!("invalid settings file", "path" => path.display()))
            .with_kind(Kind::Config)
    }

    /// Combines two layers. Values present in `over` win.
    pub fn merge(self, over: Settings) -> Settings {
        Settings {
            prefix: over.prefix.or(self.prefix),
            format: over.format.or(self.format),
            delimiter: over.delimiter.or(self.delimiter),
            port: over.port.or(self.port),
            host: over.host.or(self.host),
            strict: over.strict.or(self.strict),
            settle_ms: over.settle_ms.or(self.settle_ms),
            columns: over.columns.or(self.columns),
        }
    }
}

/// Immutable configuration for one asset directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    assets: PathBuf,
    pub prefix: String,
    pub format: DataFormat,
    pub delimiter: u8,
    pub strict: bool,
    pub settle: Duration,
    /// Fixed page columns. `None` wraps cards to the page width.
    pub columns: Option<usize>,
}

impl Config {
    /// Resolves `settings` against the defaults for the asset directory at
    /// `assets`, which must exist.
    pub fn new<P: AsRef<Path>>(assets: P, settings: &Settings) -> Result<Self> {
        let assets = assets.as_ref();
        let assets = assets.canonicalize()
            .chain_with(|| error!("asset directory is not accessible", "path" => assets.display()))
            .with_kind(Kind::Config)?;

        if !assets.is_dir() {
            return Err(error!("asset path must be a directory", "path" => assets.display())
                .with_kind(Kind::Config));
        }

        let delimiter = match settings.delimiter.as_deref() {
            Some(delimiter) => parse_delimiter(delimiter)?,
            None => DEFAULT_DELIMITER,
        };

        if settings.columns == Some(0) {
            return Err(error!("columns must be at least 1").with_kind(Kind::Config));
        }

        Ok(Config {
            assets,
            prefix: settings.prefix.clone().unwrap_or_else(|| DEFAULT_PREFIX.into()),
            format: settings.format.unwrap_or_default(),
            delimiter,
            strict: settings.strict.unwrap_or(false),
            settle: Duration::from_millis(settings.settle_ms.unwrap_or(DEFAULT_SETTLE_MS)),
            columns: settings.columns,
        })
    }

    /// The canonical asset directory.
    pub fn assets(&self) -> &Path {
        &self.assets
    }

    fn asset(&self, name: &str) -> PathBuf {
        self.assets.join(name)
    }

    pub fn data_path(&self) -> PathBuf {
        self.asset(&format!("{}.{}", self.prefix, self.format.extension()))
    }

    pub fn card_template_path(&self) -> PathBuf {
        self.asset(&format!("{}.html.jinja2", self.prefix))
    }

    pub fn header_path(&self) -> PathBuf {
        self.asset(&format!("{}.html", self.prefix))
    }

    pub fn page_path(&self) -> PathBuf {
        self.asset(PAGE_FILE)
    }

    pub fn rules_source_path(&self) -> PathBuf {
        self.asset(RULES_SOURCE_FILE)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.asset(RULES_FILE)
    }

    /// Files the pipeline writes itself.
    pub fn outputs(&self) -> [PathBuf; 2] {
        [self.page_path(), self.rules_path()]
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions { strict: self.strict }
    }
}

/// Parses a field delimiter: a single ASCII character, or `tab`/`\t`.
pub fn parse_delimiter(input: &str) -> Result<u8> {
    match input {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        s => Err(error! {
            "delimiter must be a single ASCII character",
            "delimiter" => format!("{s:?}"),
        }.with_kind(Kind::Config)),
    }
}
