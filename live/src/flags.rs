use std::path::PathBuf;

use cardpress::config::{DataFormat, Settings};
use cardpress::error::Result;

xflags::xflags! {
    /// Renders a card deck on every change and serves it with live reload.
    cmd cardpress {
        /// Asset directory. Defaults to the current directory.
        optional -p, --path path: PathBuf
        /// Filename prefix of the deck's files, as in `_card.csv`.
        optional -x, --prefix prefix: String
        /// Card data format: `csv` or `json`.
        optional -f, --format format: String
        /// CSV field separator: one ASCII character, or `tab`.
        optional -d, --delimiter delimiter: String
        /// Port to serve on.
        optional --port port: u16
        /// Address to bind to.
        optional --host host: String
        /// Lay cards out in this many columns.
        optional -c, --columns columns: usize
        /// Fail on undefined template fields.
        optional --strict
        /// Render once and exit.
        optional --once
        /// Print the version and exit.
        optional -V, --version
    }
}

impl Cardpress {
    /// The settings layer given on the command line.
    pub fn settings(&self) -> Result<Settings> {
        let format = self.format.as_deref()
            .map(str::parse::<DataFormat>)
            .transpose()?;

        Ok(Settings {
            prefix: self.prefix.clone(),
            format,
            delimiter: self.delimiter.clone(),
            port: self.port,
            host: self.host.clone(),
            strict: self.strict.then_some(true),
            settle_ms: None,
            columns: self.columns,
        })
    }
}
