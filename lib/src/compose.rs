use std::path::Path;
use std::sync::Arc;

use crate::deck::Fragment;
use crate::error::{Chainable, Result};
use crate::templating::Engine;
use crate::value::{Sink, Source};

/// The card page: every fragment, in order, plus the optional header.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub cards: Vec<Fragment>,
    pub header: Option<Arc<str>>,
    pub prefix: Arc<str>,
    /// Cards per row for a fixed print grid.
    pub columns: Option<usize>,
}

impl Page {
    pub fn new<P: Into<Arc<str>>>(cards: Vec<Fragment>, header: Option<Arc<str>>, prefix: P) -> Self {
        Page { cards, header, prefix: prefix.into(), columns: None }
    }

    pub fn with_columns(mut self, columns: Option<usize>) -> Self {
        self.columns = columns;
        self
    }
}

/// Reads the custom header at `path`. A missing file means no header.
pub fn read_header(path: &Path) -> Result<Option<Arc<str>>> {
    if !path.exists() {
        return Ok(None);
    }

    let header: String = path.read()?;
    Ok(Some(header.into()))
}

/// Renders `page` through the engine's page template.
pub fn compose<E: Engine + ?Sized>(engine: &E, page: &Page) -> Result<String> {
    engine.render_page(page)
}

/// Replaces the contents of the file at `path` with `html`.
pub fn write_output(path: &Path, html: String) -> Result<()> {
    path.write(html)
        .chain_with(|| error!("failed to write output", "path" => path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn header_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_card.html");
        assert_eq!(read_header(&path).unwrap(), None);

        fs::write(&path, "<style>.card { width: 2.5in; }</style>").unwrap();
        assert_eq!(read_header(&path).unwrap().as_deref(), Some("<style>.card { width: 2.5in; }</style>"));
    }

    #[test]
    fn writes_replace_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        write_output(&path, "first".into()).unwrap();
        write_output(&path, "second".into()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("index.html");
        assert!(write_output(&path, "x".into()).is_err());
    }
}
