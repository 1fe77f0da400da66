use std::collections::VecDeque;
use std::fmt::Write;

use pulldown_cmark::{Event, Tag, CowStr, TagEnd};
use rustc_hash::FxHashMap;

use crate::markdown::{Events, Plugin};

/// Gives every heading without an explicit id a slug of its text.
///
/// Repeated slugs get a `-N` suffix in order of appearance.
#[derive(Debug, Default)]
pub struct AutoHeading;

struct HeadingIterator<'a, I: Iterator<Item = Event<'a>>> {
    stack: VecDeque<Event<'a>>,
    seen: FxHashMap<String, usize>,
    inner: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for HeadingIterator<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.stack.pop_front() {
            return Some(event);
        }

        match self.inner.next()? {
            Event::Start(Tag::Heading { level, id: None, classes, attrs }) => {
                let mut text = String::new();
                loop {
                    let event = self.inner.next()?;
                    if let Event::Text(ref s) | Event::Code(ref s) = event {
                        text.push_str(s);
                    } else if let Event::End(TagEnd::Heading(..)) = event {
                        break;
                    }

                    self.stack.push_back(event);
                }

                let mut id = crate::util::slugify(&text);
                let seen = self.seen.entry(id.clone()).or_insert(0);
                if *seen > 0 {
                    let _ = write!(&mut id, "-{}", seen);
                }

                *seen += 1;
                let tag = Tag::Heading { level, id: Some(id.into()), classes, attrs };
                self.stack.push_back(Event::End(TagEnd::Heading(level)));
                Some(Event::Start(tag))
            },
            event => Some(event)
        }
    }
}

impl Plugin for AutoHeading {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        Box::new(HeadingIterator {
            seen: FxHashMap::default(),
            inner: events,
            stack: VecDeque::with_capacity(4),
        })
    }
}

/// Appends a `#` link to itself to the end of every heading with an id.
#[derive(Debug, Default)]
pub struct HeadingAnchor;

struct AnchorIterator<'a, I: Iterator<Item = Event<'a>>> {
    pending: Option<CowStr<'a>>,
    queued: Option<Event<'a>>,
    inner: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> Iterator for AnchorIterator<'a, I> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.queued.take() {
            return Some(event);
        }

        let event = self.inner.next()?;
        match event {
            Event::Start(Tag::Heading { id: Some(ref id), .. }) => {
                self.pending = Some(id.clone());
                Some(event)
            }
            Event::End(TagEnd::Heading(..)) => match self.pending.take() {
                Some(id) => {
                    let html = format!(r##"<a class="anchor" title="anchor" href="#{id}">#</a>"##);
                    self.queued = Some(event);
                    Some(Event::InlineHtml(html.into()))
                }
                None => Some(event),
            },
            event => Some(event),
        }
    }
}

impl Plugin for HeadingAnchor {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        Box::new(AnchorIterator {
            inner: events,
            pending: None,
            queued: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::markdown::*;
    use crate::value::Slot;

    fn render(input: &str, anchors: bool) -> String {
        let html = Slot::new();
        let mut markdown = Markdown::from(input).plugin(AutoHeading);
        if anchors {
            markdown = markdown.plugin(HeadingAnchor);
        }

        markdown.plugin(Renderer::new(&html)).run().unwrap();
        html.take().and_then(|v| v.as_str().map(String::from)).unwrap()
    }

    #[test]
    fn headings_get_slug_ids() {
        let html = render("# Turn Order & Setup\n\n## `draw` phase", false);
        assert!(html.contains(r#"<h1 id="turn-order-setup">Turn Order &amp; Setup</h1>"#));
        assert!(html.contains(r#"<h2 id="draw-phase"><code>draw</code> phase</h2>"#));
    }

    #[test]
    fn duplicate_slugs_are_numbered() {
        let html = render("# Setup\n\n# Setup\n\n# Setup", false);
        assert!(html.contains(r#"id="setup""#));
        assert!(html.contains(r#"id="setup-1""#));
        assert!(html.contains(r#"id="setup-2""#));
    }

    #[test]
    fn explicit_ids_are_kept() {
        let html = render("# Setup {#start}", false);
        assert!(html.contains(r#"<h1 id="start">Setup</h1>"#));
    }

    #[test]
    fn anchors_follow_heading_text() {
        let html = render("## Scoring", true);
        assert!(html.contains(r##"<h2 id="scoring">Scoring<a class="anchor" title="anchor" href="#scoring">#</a></h2>"##));
    }
}
