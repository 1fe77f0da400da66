pub mod minijinja;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use crate::compose::Page;
use crate::deck::Card;
use crate::error::{Chainable, Result};
use crate::rules::Rules;
use crate::value::Source;

/// Name of the user's per-card template.
pub const CARD_TEMPLATE: &str = "card";
/// Name of the builtin page template.
pub const PAGE_TEMPLATE: &str = "page";
/// Name of the builtin rules template.
pub const RULES_TEMPLATE: &str = "rules";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Undefined lookups are errors instead of rendering as empty.
    pub strict: bool,
}

/// User-provided template sources.
#[derive(Debug, Default, Clone)]
pub struct Templates {
    pub card: Option<Arc<str>>,
}

impl Templates {
    pub fn with_card<S: Into<Arc<str>>>(card: S) -> Self {
        Templates { card: Some(card.into()) }
    }

    /// Reads the card template at `path`.
    pub fn read_card(path: &Path) -> Result<Self> {
        let card: String = path.read()
            .chain_with(|| error!("failed to read card template"))?;

        Ok(Templates::with_card(card))
    }
}

pub trait EngineInit {
    type Engine: Engine + 'static;

    fn init(templates: Templates, options: &EngineOptions) -> Self::Engine;
}

/// A compiled set of templates.
///
/// Every failure is a [`Kind::TemplateRender`](crate::error::Kind) error,
/// including failures to compile the templates in the first place, which
/// are reported on each render.
pub trait Engine: Send + Sync + Debug {
    fn render_card(&self, card: &Card) -> Result<String>;

    fn render_page(&self, page: &Page) -> Result<String>;

    fn render_rules(&self, rules: &Rules) -> Result<String>;
}
