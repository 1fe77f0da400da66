use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use crate::compose::{self, Page};
use crate::config::Config;
use crate::deck::{self, Stamp};
use crate::error::{Kind, Result};
use crate::rules;
use crate::templating::{EngineInit, Templates};
use crate::templating::minijinja::MiniJinjaEngine;

/// A file the pipeline wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub path: PathBuf,
    /// The number of card fragments on the page. Zero for rules.
    pub cards: usize,
}

/// The outcome of one render trigger. The card page and the rules document
/// succeed or fail independently.
#[derive(Debug)]
pub struct Report {
    pub cards: Result<Rendered>,
    pub rules: Result<Rendered>,
}

impl Report {
    /// Whether any output file was written.
    pub fn wrote_output(&self) -> bool {
        self.cards.is_ok() || self.rules.is_ok()
    }
}

/// One batch of changed paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Change {
    pub paths: Vec<PathBuf>,
}

impl Change {
    pub fn new<I: IntoIterator<Item = P>, P: Into<PathBuf>>(paths: I) -> Self {
        Change { paths: paths.into_iter().map(Into::into).collect() }
    }
}

/// A blocking stream of [`Change`]s.
pub trait ChangeSource {
    /// Waits for the next batch of changes. `None` ends the stream.
    fn next_change(&mut self) -> Option<Change>;
}

impl ChangeSource for mpsc::Receiver<Change> {
    fn next_change(&mut self) -> Option<Change> {
        self.recv().ok()
    }
}

/// Renders a deck's card page and rules document.
///
/// Every render starts from scratch: card data, templates, and the header
/// are re-read from the asset directory. Output is written only after it
/// has rendered completely, so a failure leaves the previous output intact.
#[derive(Debug)]
pub struct Pipeline<E = MiniJinjaEngine> {
    config: Arc<Config>,
    _engine: PhantomData<fn() -> E>,
}

impl<E> Clone for Pipeline<E> {
    fn clone(&self) -> Self {
        Pipeline { config: self.config.clone(), _engine: PhantomData }
    }
}

impl<E: EngineInit> Pipeline<E> {
    pub fn new<C: Into<Arc<Config>>>(config: C) -> Self {
        Pipeline { config: config.into(), _engine: PhantomData }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Loads the card data, renders every card, and writes the page.
    pub fn render_cards(&self, stamp: &Stamp) -> Result<Rendered> {
        let config = &*self.config;
        let records = deck::load(config)?;
        let templates = Templates::read_card(&config.card_template_path())?;
        let engine = E::init(templates, &config.engine_options());

        let cards = deck::render_cards(&engine, &records, stamp)?;
        let header = compose::read_header(&config.header_path())?;
        let page = Page::new(cards, header, config.prefix.as_str())
            .with_columns(config.columns);
        let html = compose::compose(&engine, &page)?;

        let path = config.page_path();
        compose::write_output(&path, html)?;
        Ok(Rendered { path, cards: page.cards.len() })
    }

    /// Converts `rules.md` and writes the rules page.
    pub fn render_rules(&self) -> Result<Rendered> {
        let config = &*self.config;
        let engine = E::init(Templates::default(), &config.engine_options());
        let html = rules::render_rules(&engine, &config.rules_source_path())?;

        let path = config.rules_path();
        compose::write_output(&path, html)?;
        Ok(Rendered { path, cards: 0 })
    }

    /// Renders both outputs and logs each outcome.
    pub fn render(&self) -> Report {
        let stamp = Stamp::now();
        let cards = self.render_cards(&stamp);
        match &cards {
            Ok(r) => tracing::info!(cards = r.cards, path = %r.path.display(), "rendered card page"),
            Err(e) => tracing::error!(kind = %e.kind(), "failed to render cards\n{e}"),
        }

        let rules = self.render_rules();
        match &rules {
            Ok(r) => tracing::info!(path = %r.path.display(), "rendered rules"),
            Err(e) if e.is(Kind::MissingRules) => tracing::debug!("no rules document; skipping"),
            Err(e) => tracing::error!(kind = %e.kind(), "failed to render rules\n{e}"),
        }

        Report { cards, rules }
    }

    /// Whether `path` is one of the files the pipeline writes.
    pub fn is_output(&self, path: &Path) -> bool {
        self.config.outputs().iter().any(|output| same_file(path, output))
    }

    /// Renders in response to `change` unless every changed path is one of
    /// the pipeline's own outputs. Waits the settle delay before rendering.
    pub fn on_change(&self, change: &Change) -> Option<Report> {
        let sources: Vec<_> = change.paths.iter()
            .filter(|path| !self.is_output(path))
            .collect();

        if sources.is_empty() {
            tracing::debug!(paths = ?change.paths, "ignoring change to rendered output");
            return None;
        }

        tracing::debug!(paths = ?sources, "sources changed");
        if !self.config.settle.is_zero() {
            std::thread::sleep(self.config.settle);
        }

        Some(self.render())
    }
}

/// Runs `pipeline` on every change from `source` until it ends, passing each
/// report to `on_render`.
pub fn watch<E, S, F>(pipeline: &Pipeline<E>, mut source: S, mut on_render: F)
    where E: EngineInit, S: ChangeSource, F: FnMut(&Report)
{
    while let Some(change) = source.next_change() {
        if let Some(report) = pipeline.on_change(&change) {
            on_render(&report);
        }
    }

    tracing::debug!("change source closed");
}

/// Compares paths, resolving the parent directory when they differ
/// textually. Event paths may name files that no longer exist.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }

    if a.file_name() != b.file_name() {
        return false;
    }

    match (a.parent().map(Path::canonicalize), b.parent().map(Path::canonicalize)) {
        (Some(Ok(a)), Some(Ok(b))) => a == b,
        _ => false,
    }
}
