use std::sync::Arc;

use pulldown_cmark::{Parser, Options};

use crate::markdown::{Events, Plugin};
use crate::error::{Chainable, Result};
use crate::value::Source;

pub struct Markdown<'p, I> {
    input: I,
    options: Options,
    plugins: Vec<Box<dyn Plugin + 'p>>,
}

impl<'p, I: Source> Markdown<'p, I> {
    pub fn from(input: I) -> Self {
        Self {
            input,
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_HEADING_ATTRIBUTES,
            plugins: vec![],
        }
    }

    pub fn plugin<T: Plugin + 'p>(mut self, plugin: T) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn run(mut self) -> Result<()> {
        let mut input = self.input.try_read::<Arc<str>>()?.to_string();
        for plugin in &self.plugins {
            input = plugin.preprocess(&input)?.into_owned();
        }

        let mut events: Events<'_> = Box::new(Parser::new_ext(&input, self.options));
        for plugin in self.plugins.iter_mut() {
            events = plugin.remap(events);
        }

        // Run the iterator.
        events.for_each(|_| {});

        for plugin in self.plugins.iter_mut() {
            plugin.finalize().chain(error!("markdown plugin failed"))?;
        }

        Ok(())
    }
}

impl<I: std::fmt::Debug> std::fmt::Debug for Markdown<'_, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Markdown")
            .field("input", &self.input)
            .field("options", &self.options)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
