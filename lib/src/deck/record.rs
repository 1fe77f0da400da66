use std::sync::Arc;

use derive_more::{Deref, From};

use crate::value::{Dict, Value};

/// Skips the record when its text is case-insensitively `true`.
pub const IGNORE: &str = "ignore";
/// The number of identical copies to emit.
pub const NUM_CARDS: &str = "num_cards";
/// One copy per suit, each with [`SUIT`] set.
pub const SUITS: &str = "suits";
/// The field injected into each suited copy.
pub const SUIT: &str = "suit";

/// Reserved name under which a card's original record is exposed.
pub const CARD_DATA: &str = "__card_data";
/// Reserved name under which the render [`Stamp`] is exposed.
pub const RENDER_TIME: &str = "__time";

/// The most copies a single record may request.
pub const MAX_COPIES: usize = 1000;

/// Separator for suits written as text, as in a CSV cell.
pub const SUIT_SEPARATOR: char = '|';

/// One card's data: field names to values, in source order.
#[derive(Debug, Clone, PartialEq, Default, Deref, From)]
#[deref(forward)]
pub struct Record(Arc<Dict>);

/// What a record expands to.
#[derive(Debug, Clone, PartialEq)]
pub enum FanOut {
    /// The record is ignored.
    Skip,
    /// One render per suit.
    Suits(Vec<Value>),
    /// One render, emitted this many times.
    Copies(usize),
}

impl Record {
    pub fn new(dict: Dict) -> Self {
        Record(Arc::new(dict))
    }

    /// A shallow copy of `self` with `key` set to `value`. An existing field
    /// keeps its position.
    pub fn with_field<K: Into<Arc<str>>, V: Into<Value>>(&self, key: K, value: V) -> Record {
        let mut dict: Dict = (*self.0).clone();
        dict.insert(key.into(), value.into());
        Record::new(dict)
    }

    pub fn is_ignored(&self) -> bool {
        self.get(IGNORE)
            .and_then(|v| v.to_text())
            .map_or(false, |text| text.eq_ignore_ascii_case("true"))
    }

    /// The number of copies requested by `num_cards`.
    ///
    /// Absent, empty, and non-integral values fall back to `1`. Zero and
    /// negative values are taken literally and yield no copies. The count is
    /// not bounded here; rendering rejects counts above [`MAX_COPIES`].
    pub fn num_cards(&self) -> usize {
        let requested = match self.get(NUM_CARDS) {
            None => return 1,
            Some(Value::Num(n)) => n.to_i64(),
            Some(value) => value.to_text().and_then(|t| t.trim().parse::<i64>().ok()),
        };

        match requested {
            Some(n) => usize::try_from(n).unwrap_or(0),
            None => {
                tracing::debug!(value = ?self.get(NUM_CARDS), "num_cards is not an integer; using 1");
                1
            }
        }
    }

    /// The suits listed in `suits`, in order. Empty when absent.
    ///
    /// Arrays are used as-is. Text is split on [`SUIT_SEPARATOR`] with each
    /// piece trimmed and empty pieces dropped.
    pub fn suits(&self) -> Vec<Value> {
        match self.get(SUITS) {
            Some(Value::Array(suits)) => suits.to_vec(),
            Some(Value::String(text)) => text.split(SUIT_SEPARATOR)
                .map(str::trim)
                .filter(|suit| !suit.is_empty())
                .map(Value::from)
                .collect(),
            Some(other) => other.to_text()
                .map(|text| vec![Value::from(text)])
                .unwrap_or_default(),
            None => vec![],
        }
    }

    /// Applies the fan-out rules: `ignore` first, then non-empty `suits`,
    /// then `num_cards`.
    pub fn fan_out(&self) -> FanOut {
        if self.is_ignored() {
            return FanOut::Skip;
        }

        let suits = self.suits();
        if !suits.is_empty() {
            return FanOut::Suits(suits);
        }

        FanOut::Copies(self.num_cards())
    }
}

impl From<Dict> for Record {
    fn from(dict: Dict) -> Self {
        Record::new(dict)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Dict(record.0)
    }
}

/// The render-time token exposed to templates as [`RENDER_TIME`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp(Arc<str>);

impl Stamp {
    /// Milliseconds since the Unix epoch.
    pub fn now() -> Self {
        Stamp(chrono::Utc::now().timestamp_millis().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Stamp {
    fn from(value: &str) -> Self {
        Stamp(value.into())
    }
}

/// The rendering context of one card instance.
///
/// Lookups see two tiers: the instance's own fields first, then the
/// reserved [`CARD_DATA`] and [`RENDER_TIME`] names. A user field that
/// shadows a reserved name wins.
#[derive(Debug, Clone)]
pub struct Card {
    pub fields: Record,
    pub source: Record,
    pub stamp: Stamp,
}

impl Card {
    pub fn new(fields: Record, source: Record, stamp: Stamp) -> Self {
        Card { fields, source, stamp }
    }

    pub fn lookup(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.fields.get(key) {
            return Some(value.clone());
        }

        match key {
            CARD_DATA => Some(self.source.clone().into()),
            RENDER_TIME => Some(Value::from(self.stamp.0.clone())),
            _ => None,
        }
    }

    /// Every name [`Card::lookup()`] resolves, user fields first.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        let reserved = [CARD_DATA, RENDER_TIME].into_iter()
            .filter(|k| !self.fields.contains_key(*k));

        self.fields.keys().map(|k| &**k).chain(reserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict;

    fn record(dict: Dict) -> Record {
        Record::new(dict)
    }

    #[test]
    fn ignore_is_case_insensitive() {
        assert!(record(dict! { "ignore" => "TRUE" }).is_ignored());
        assert!(record(dict! { "ignore" => "True" }).is_ignored());
        assert!(record(dict! { "ignore" => true }).is_ignored());
        assert!(!record(dict! { "ignore" => "yes" }).is_ignored());
        assert!(!record(dict! { "ignore" => " true" }).is_ignored());
        assert!(!record(dict! { "ignore" => false }).is_ignored());
        assert!(!record(dict! {}).is_ignored());
    }

    #[test]
    fn num_cards_fallbacks() {
        assert_eq!(record(dict! {}).num_cards(), 1);
        assert_eq!(record(dict! { "num_cards" => "" }).num_cards(), 1);
        assert_eq!(record(dict! { "num_cards" => "abc" }).num_cards(), 1);
        assert_eq!(record(dict! { "num_cards" => "2.5" }).num_cards(), 1);
        assert_eq!(record(dict! { "num_cards" => 2.5 }).num_cards(), 1);
        assert_eq!(record(dict! { "num_cards" => " 3 " }).num_cards(), 3);
        assert_eq!(record(dict! { "num_cards" => 4 }).num_cards(), 4);
        assert_eq!(record(dict! { "num_cards" => 2.0 }).num_cards(), 2);
    }

    #[test]
    fn num_cards_zero_and_negative_are_literal() {
        assert_eq!(record(dict! { "num_cards" => "0" }).num_cards(), 0);
        assert_eq!(record(dict! { "num_cards" => "-2" }).num_cards(), 0);
        assert_eq!(record(dict! { "num_cards" => -1 }).num_cards(), 0);
    }

    #[test]
    fn suits_from_text_and_arrays() {
        let text = record(dict! { "suits" => "hearts | spades||clubs " });
        assert_eq!(text.suits(), vec![Value::from("hearts"), Value::from("spades"), Value::from("clubs")]);

        let array = record(dict! { "suits" => vec!["x", "y"] });
        assert_eq!(array.suits(), vec![Value::from("x"), Value::from("y")]);

        assert!(record(dict! { "suits" => "" }).suits().is_empty());
        assert!(record(dict! { "suits" => Vec::<Value>::new() }).suits().is_empty());
    }

    #[test]
    fn fan_out_precedence() {
        let ignored = record(dict! { "ignore" => "true", "suits" => vec!["a", "b"], "num_cards" => 3 });
        assert_eq!(ignored.fan_out(), FanOut::Skip);

        let suited = record(dict! { "suits" => vec!["x", "y"], "num_cards" => 5 });
        assert_eq!(suited.fan_out(), FanOut::Suits(vec!["x".into(), "y".into()]));

        let empty_suits = record(dict! { "suits" => "", "num_cards" => "2" });
        assert_eq!(empty_suits.fan_out(), FanOut::Copies(2));
    }

    #[test]
    fn with_field_is_shallow_copy() {
        let original = record(dict! { "name" => "Ace", "suit" => "none", "cost" => 1 });
        let copy = original.with_field(SUIT, "hearts");
        assert_eq!(copy.get("suit"), Some(&Value::from("hearts")));
        assert_eq!(original.get("suit"), Some(&Value::from("none")));

        let keys: Vec<_> = copy.keys().map(|k| &**k).collect();
        assert_eq!(keys, ["name", "suit", "cost"]);
    }

    #[test]
    fn card_lookup_tiers() {
        let source = record(dict! { "name" => "Ace" });
        let card = Card::new(source.with_field(SUIT, "hearts"), source.clone(), Stamp::from("42"));
        assert_eq!(card.lookup("suit"), Some(Value::from("hearts")));
        assert_eq!(card.lookup(RENDER_TIME), Some(Value::from("42")));
        assert_eq!(card.lookup(CARD_DATA), Some(Value::from(source)));
        assert_eq!(card.lookup("missing"), None);

        let keys: Vec<_> = card.keys().collect();
        assert_eq!(keys, ["name", "suit", CARD_DATA, RENDER_TIME]);
    }

    #[test]
    fn user_fields_shadow_reserved_names() {
        let source = record(dict! { "__time" => "mine" });
        let card = Card::new(source.clone(), source, Stamp::from("42"));
        assert_eq!(card.lookup(RENDER_TIME), Some(Value::from("mine")));

        let keys: Vec<_> = card.keys().collect();
        assert_eq!(keys, [RENDER_TIME, CARD_DATA]);
    }
}
