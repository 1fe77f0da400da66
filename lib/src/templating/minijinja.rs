use minijinja::{context, AutoEscape, Environment, UndefinedBehavior};
use minijinja::value::Value;

use crate::compose::Page;
use crate::deck::Card;
use crate::error::{Chainable, Kind, Result};
use crate::rules::Rules;
use crate::templating::{Engine, EngineInit, EngineOptions, Templates};
use crate::templating::{CARD_TEMPLATE, PAGE_TEMPLATE, RULES_TEMPLATE};

const PAGE_SOURCE: &str = include_str!("../../templates/page.html.jinja2");
const RULES_SOURCE: &str = include_str!("../../templates/rules.html.jinja2");

#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Result<Environment<'static>>,
}

fn try_init(templates: Templates, options: &EngineOptions) -> Result<Environment<'static>> {
    let mut env = Environment::new();

    // Card data may carry markup of its own.
    env.set_auto_escape_callback(|_| AutoEscape::None);
    if options.strict {
        env.set_undefined_behavior(UndefinedBehavior::Strict);
    }

    env.add_function("now", ext::now);
    env.add_filter("date", ext::date);
    env.add_filter("split", ext::split);
    env.add_filter("slugify", ext::slugify);

    env.add_template(PAGE_TEMPLATE, PAGE_SOURCE)?;
    env.add_template(RULES_TEMPLATE, RULES_SOURCE)?;
    if let Some(card) = templates.card {
        env.add_template_owned(CARD_TEMPLATE, card.to_string())
            .chain(error!("failed to compile card template"))?;
    }

    Ok(env)
}

impl MiniJinjaEngine {
    fn render<S: serde::Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        let env = self.env.as_ref().map_err(|e| e.clone())?;
        let template = env.get_template(name)?;
        Ok(template.render(ctx)?)
    }
}

impl EngineInit for MiniJinjaEngine {
    type Engine = Self;

    fn init(templates: Templates, options: &EngineOptions) -> Self::Engine {
        let env = try_init(templates, options).with_kind(Kind::TemplateRender);
        MiniJinjaEngine { env }
    }
}

impl Engine for MiniJinjaEngine {
    fn render_card(&self, card: &Card) -> Result<String> {
        let ctx = Value::from_object(objects::CardObject(card.clone()));
        self.render(CARD_TEMPLATE, ctx).with_kind(Kind::TemplateRender)
    }

    fn render_page(&self, page: &Page) -> Result<String> {
        let cards = page.cards.iter()
            .map(|card| Value::from_safe_string(card.to_string()))
            .collect::<Vec<_>>();

        let header = page.header.as_ref()
            .map(|header| Value::from_safe_string(header.to_string()));

        let ctx = context! {
            cards => cards,
            header => header,
            prefix => &*page.prefix,
            columns => page.columns,
        };

        self.render(PAGE_TEMPLATE, ctx)
            .chain(error!("failed to render page", "cards" => page.cards.len()))
            .with_kind(Kind::TemplateRender)
    }

    fn render_rules(&self, rules: &Rules) -> Result<String> {
        let ctx = context! {
            content => Value::from_safe_string(rules.content.to_string()),
            title => rules.title(),
            meta => Value::from(crate::value::Value::Dict(rules.meta.clone())),
        };

        self.render(RULES_TEMPLATE, ctx)
            .chain(error!("failed to render rules"))
            .with_kind(Kind::TemplateRender)
    }
}

mod ext {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use minijinja::{value::Value, Error, ErrorKind};

    pub fn now() -> i64 {
        Utc::now().timestamp()
    }

    pub fn date(value: Value, fmt: &str) -> Result<Value, Error> {
        if let Ok(ts) = i64::try_from(value.clone()) {
            let datetime = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| Error::new(
                    ErrorKind::InvalidOperation,
                    "invalid timestamp provided to `date`"
                ))?;

            return Ok(datetime.format(fmt).to_string().into());
        }

        let string = value.as_str()
            .ok_or_else(|| Error::new(
                ErrorKind::InvalidOperation,
                format!("`date` must be applied to a string or integer, found {}", value.kind())
            ))?;

        let datetime = string.parse::<NaiveDate>().map(|d| d.format(fmt))
            .or_else(|_| string.parse::<NaiveTime>().map(|t| t.format(fmt)))
            .or_else(|_| string.parse::<NaiveDateTime>().map(|dt| dt.format(fmt)))
            .or_else(|_| string.parse::<DateTime<Utc>>().map(|dt| dt.format(fmt)))
            .map_err(|e| Error::new(
                ErrorKind::InvalidOperation,
                format!("failed to parse {string}: {e}")
            ))?;

        Ok(datetime.to_string().into())
    }

    pub fn split(value: &str, pat: &str, n: Option<usize>) -> Value {
        match n {
            Some(n) => value.split(pat).nth(n).map(Value::from).unwrap_or(Value::UNDEFINED),
            None => value.split(pat).map(Value::from).collect(),
        }
    }

    pub fn slugify(value: &str) -> String {
        crate::util::slugify(value)
    }
}

mod objects {
    use std::sync::Arc;

    use minijinja::value::{Enumerator, Object, ObjectRepr, Value};

    use crate::deck::Card;
    use crate::value;

    #[derive(Debug)]
    pub struct CardObject(pub Card);

    #[derive(Debug)]
    pub struct DictObject(Arc<value::Dict>);

    #[derive(Debug)]
    pub struct ArrayObject(Arc<Vec<value::Value>>);

    impl Object for CardObject {
        fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
            self.0.lookup(key.as_str()?).map(Value::from)
        }

        fn enumerate(self: &Arc<Self>) -> Enumerator {
            Enumerator::Values(self.0.keys().map(Value::from).collect())
        }
    }

    impl Object for DictObject {
        fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
            self.0.get(key.as_str()?)
                .cloned()
                .map(Value::from)
        }

        fn enumerate(self: &Arc<Self>) -> Enumerator {
            Enumerator::Values(self.0.keys().cloned().map(Value::from).collect())
        }

        fn enumerator_len(self: &Arc<Self>) -> Option<usize> {
            Some(self.0.len())
        }
    }

    impl Object for ArrayObject {
        fn repr(self: &Arc<Self>) -> ObjectRepr {
            ObjectRepr::Seq
        }

        fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
            self.0.get(key.as_usize()?)
                .cloned()
                .map(Value::from)
        }

        fn enumerate(self: &Arc<Self>) -> Enumerator {
            Enumerator::Seq(self.0.len())
        }
    }

    impl From<value::Value> for Value {
        fn from(value: value::Value) -> Self {
            use crate::value::{Num, Value};

            match value {
                Value::Null => Self::UNDEFINED,
                Value::Bool(b) => Self::from(b),
                Value::Num(Num::Int(v)) => Self::from(v),
                Value::Num(Num::UInt(v)) => Self::from(v),
                Value::Num(Num::Float(v)) => Self::from(v),
                Value::String(s) => Self::from(s),
                Value::Array(a) => Self::from_object(ArrayObject(a)),
                Value::Dict(d) => Self::from_object(DictObject(d)),
            }
        }
    }
}

impl_error_detail_with_std_error!(minijinja::Error);
