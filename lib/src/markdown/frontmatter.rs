use std::borrow::Cow;

use crate::error::Result;
use crate::markdown::Plugin;
use crate::value::{Mapper, Sink};

/// Strips a front matter block delimited by `+++` lines from the top of the
/// input, mapping its contents with `M` into `O`.
///
/// Input that doesn't open with `+++`, or never closes it, passes through
/// untouched.
#[derive(Debug, Default, Clone)]
pub struct FrontMatter<M: Mapper, O: Sink> {
    mapper: M,
    output: O
}

impl<M: Mapper, O: Sink> FrontMatter<M, O> {
    pub fn new(mapper: M, output: O) -> Self { Self { mapper, output } }
}

fn split(input: &str) -> Option<(&str, &str)> {
    const DELIMITER: &str = "+++";

    let rest = input.strip_prefix(DELIMITER)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }

        offset += line.len();
    }

    None
}

impl<M: Mapper, O: Sink> Plugin for FrontMatter<M, O> {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        let Some((front_matter, content)) = split(input) else {
            return Ok(Cow::Borrowed(input));
        };

        self.mapper.try_map_copy(front_matter, &self.output)?;
        Ok(Cow::Borrowed(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{Markdown, Renderer};
    use crate::value::{Slot, Toml, Value};
    use crate::error::Kind;

    fn run(input: &str) -> Result<(Option<Value>, String)> {
        let meta = Slot::new();
        let html = Slot::new();
        Markdown::from(input)
            .plugin(FrontMatter::new(Toml, &meta))
            .plugin(Renderer::new(&html))
            .run()?;

        let html = html.take().and_then(|v| v.as_str().map(String::from)).unwrap_or_default();
        Ok((meta.take(), html))
    }

    #[test]
    fn splits_front_matter() {
        assert_eq!(split("+++\ntitle = \"x\"\n+++\nbody"), Some(("title = \"x\"\n", "body")));
        assert_eq!(split("+++\r\na = 1\r\n+++\r\nbody"), Some(("a = 1\r\n", "body")));
        assert_eq!(split("+++\na = 1\n+++"), Some(("a = 1\n", "")));
        assert_eq!(split("+++\n+++\nbody"), Some(("", "body")));
        assert_eq!(split("+++\nnever closed"), None);
        assert_eq!(split("body\n+++\n"), None);
    }

    #[test]
    fn front_matter_becomes_metadata() {
        let (meta, html) = run("+++\ntitle = \"Dungeon Rules\"\nplayers = 4\n+++\n# Setup\n").unwrap();
        let meta = meta.unwrap();
        let meta = meta.as_dict().unwrap();
        assert_eq!(meta["title"].as_str(), Some("Dungeon Rules"));
        assert_eq!(meta["players"], Value::from(4));
        assert!(html.contains("<h1>Setup</h1>"));
        assert!(!html.contains("players"));
    }

    #[test]
    fn no_front_matter() {
        let (meta, html) = run("Just text.").unwrap();
        assert!(meta.is_none());
        assert_eq!(html.trim(), "<p>Just text.</p>");
    }

    #[test]
    fn invalid_front_matter_is_a_parse_error() {
        let e = run("+++\ntitle = \n+++\nbody").unwrap_err();
        assert_eq!(e.kind(), Kind::DataParse);
    }
}
