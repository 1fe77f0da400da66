use std::path::Path;
use std::sync::Arc;

use crate::error::{Chainable, Kind, Result};
use crate::markdown::{AutoHeading, FrontMatter, HeadingAnchor, Markdown, Renderer};
use crate::templating::Engine;
use crate::util::strip_bom;
use crate::value::{Dict, Slot, Source, Toml, Value};

/// The page title used when the front matter doesn't set one.
pub const DEFAULT_TITLE: &str = "Rules";

/// A rules document converted to HTML.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    /// The document body as HTML.
    pub content: Arc<str>,
    /// The front matter table, empty when there is none.
    pub meta: Arc<Dict>,
}

impl Rules {
    /// Converts Markdown with optional `+++` TOML front matter.
    pub fn from_markdown(input: &str) -> Result<Self> {
        let meta = Slot::new();
        let html = Slot::new();
        Markdown::from(strip_bom(input))
            .plugin(FrontMatter::new(Toml, &meta))
            .plugin(AutoHeading)
            .plugin(HeadingAnchor)
            .plugin(Renderer::new(&html))
            .run()?;

        let meta = match meta.take() {
            Some(Value::Dict(meta)) => meta,
            Some(_) => return err!("front matter must be a table").with_kind(Kind::DataParse),
            None => Arc::default(),
        };

        let content = html.take()
            .and_then(|v| v.into_str().ok())
            .unwrap_or_else(|| Arc::from(""));

        Ok(Rules { content, meta })
    }

    /// Reads and converts the rules document at `path`.
    ///
    /// A missing document is a [`Kind::MissingRules`] error.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return err!("no rules document", "path" => path.display())
                .with_kind(Kind::MissingRules);
        }

        let input: String = path.read()?;
        Rules::from_markdown(&input)
            .chain_with(|| error!("failed to convert rules", "path" => path.display()))
    }

    /// The front matter's `title`, or [`DEFAULT_TITLE`].
    pub fn title(&self) -> &str {
        self.meta.get("title")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_TITLE)
    }
}

/// Renders the rules document at `path` to a full HTML page.
pub fn render_rules<E: Engine + ?Sized>(engine: &E, path: &Path) -> Result<String> {
    let rules = Rules::read(path)?;
    engine.render_rules(&rules)
}
