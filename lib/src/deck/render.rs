use std::sync::Arc;

use rayon::prelude::*;

use crate::deck::{Card, FanOut, Record, Stamp, MAX_COPIES, NUM_CARDS, SUIT};
use crate::error::{Chainable, Kind, Result};
use crate::templating::Engine;

/// The rendered HTML of one card instance.
pub type Fragment = Arc<str>;

/// Renders `records` through the engine's card template.
///
/// Fragments come out in record order, with a record's copies contiguous at
/// its position. Ignored records contribute nothing; suited records render
/// once per suit; all others render once and repeat `num_cards` times.
/// Records are rendered in parallel.
pub fn render_cards<E>(engine: &E, records: &[Record], stamp: &Stamp) -> Result<Vec<Fragment>>
    where E: Engine + ?Sized
{
    let rendered = records.par_iter()
        .enumerate()
        .map(|(i, record)| render_record(engine, record, stamp).chain_with(|| error! {
            "failed to render card",
            "record" => i + 1,
        }))
        .collect::<Result<Vec<_>>>()?;

    Ok(rendered.into_iter().flatten().collect())
}

/// Renders the fragments for a single record.
pub fn render_record<E>(engine: &E, record: &Record, stamp: &Stamp) -> Result<Vec<Fragment>>
    where E: Engine + ?Sized
{
    match record.fan_out() {
        FanOut::Skip => {
            tracing::debug!(record = ?record.get("name"), "skipping ignored card");
            Ok(vec![])
        }
        FanOut::Suits(suits) => suits.into_iter()
            .map(|suit| {
                let card = Card::new(record.with_field(SUIT, suit), record.clone(), stamp.clone());
                engine.render_card(&card).map(Fragment::from)
            })
            .collect(),
        FanOut::Copies(n) if n > MAX_COPIES => {
            err!("too many copies requested", NUM_CARDS => n, "max" => MAX_COPIES)
                .with_kind(Kind::DataParse)
        }
        FanOut::Copies(n) => {
            let card = Card::new(record.clone(), record.clone(), stamp.clone());
            let fragment = Fragment::from(engine.render_card(&card)?);
            Ok(vec![fragment; n])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict;
    use crate::value::{Csv, Mapper, Value};
    use crate::templating::{EngineInit, EngineOptions, Templates};
    use crate::templating::minijinja::MiniJinjaEngine;

    fn engine(card: &str) -> MiniJinjaEngine {
        MiniJinjaEngine::init(Templates::with_card(card), &EngineOptions::default())
    }

    fn render(card: &str, records: &[Record]) -> Vec<String> {
        render_cards(&engine(card), records, &Stamp::from("1700000000000"))
            .unwrap()
            .iter()
            .map(|f| f.to_string())
            .collect()
    }

    fn csv(data: &str) -> Vec<Record> {
        let rows = Csv::default().map(data).unwrap();
        rows.as_slice().unwrap()
            .iter()
            .map(|row| Record::from(row.as_dict().unwrap().clone()))
            .collect()
    }

    #[test]
    fn num_cards_with_empty_fallback() {
        let records = csv("name,num_cards\nFireball,2\nIce Shard,\n");
        assert_eq!(render("<div>{{name}}</div>", &records), [
            "<div>Fireball</div>",
            "<div>Fireball</div>",
            "<div>Ice Shard</div>",
        ]);
    }

    #[test]
    fn one_fragment_per_suit() {
        let records = [Record::new(dict! { "suits" => vec!["hearts", "spades"] })];
        assert_eq!(render("<div>{{suit}}</div>", &records), ["<div>hearts</div>", "<div>spades</div>"]);
    }

    #[test]
    fn suits_from_csv_text() {
        let records = csv("name,suits\nAce,hearts|spades\n");
        assert_eq!(render("{{name}} of {{suit}}", &records), ["Ace of hearts", "Ace of spades"]);
    }

    #[test]
    fn suits_take_precedence_over_num_cards() {
        let records = [Record::new(dict! { "suits" => vec!["x", "y"], "num_cards" => 5 })];
        assert_eq!(render("{{suit}}", &records).len(), 2);
    }

    #[test]
    fn ignore_takes_precedence_over_everything() {
        let records = [
            Record::new(dict! { "ignore" => "true", "suits" => vec!["a", "b"] }),
            Record::new(dict! { "ignore" => "TRUE", "num_cards" => 3 }),
            Record::new(dict! { "ignore" => "false", "name" => "kept" }),
        ];

        assert_eq!(render("{{name}}", &records), ["kept"]);
    }

    #[test]
    fn excessive_num_cards_is_a_data_error() {
        let records = [
            Record::new(dict! { "name" => "a" }),
            Record::new(dict! { "name" => "b", "num_cards" => "99999999999999" }),
        ];

        let e = render_cards(&engine("{{name}}"), &records, &Stamp::from("0")).unwrap_err();
        assert_eq!(e.kind(), Kind::DataParse);
        assert!(e.to_string().contains("record: 2"));

        let records = [Record::new(dict! { "name" => "max", "num_cards" => MAX_COPIES as u64 })];
        assert_eq!(render("{{name}}", &records).len(), MAX_COPIES);
    }

    #[test]
    fn non_numeric_num_cards_yields_one() {
        let records = [Record::new(dict! { "name" => "a", "num_cards" => "abc" })];
        assert_eq!(render("{{name}}", &records), ["a"]);
    }

    #[test]
    fn zero_and_negative_num_cards_yield_nothing() {
        let records = csv("name,num_cards\nzero,0\nnegative,-2\none,1\n");
        assert_eq!(render("{{name}}", &records), ["one"]);
    }

    #[test]
    fn fragment_count_matches_fan_out() {
        let records = csv("name,num_cards,suits,ignore\n\
            a,3,,\n\
            b,,x|y|z,\n\
            c,4,,true\n\
            d,nope,,\n\
            e,2,p|q,false\n");

        let expected: usize = records.iter()
            .map(|r| match r.fan_out() {
                FanOut::Skip => 0,
                FanOut::Suits(s) => s.len(),
                FanOut::Copies(n) => n,
            })
            .sum();

        assert_eq!(expected, 3 + 3 + 0 + 1 + 2);
        assert_eq!(render("{{name}}{{suit}}", &records).len(), expected);
    }

    #[test]
    fn order_is_preserved() {
        let data = (0..200).fold(String::from("name,num_cards\n"), |mut s, i| {
            s.push_str(&format!("card{i},{}\n", i % 3));
            s
        });

        let records = csv(&data);
        let expected: Vec<String> = (0..200)
            .flat_map(|i| std::iter::repeat(format!("card{i}")).take(i % 3))
            .collect();

        assert_eq!(render("{{name}}", &records), expected);
    }

    #[test]
    fn rendering_is_idempotent() {
        let records = csv("name,num_cards,suits\nFireball,2,\nAce,,hearts|spades\n");
        let template = "<div class=\"{{suit}}\">{{name}} {{__time}}</div>";
        assert_eq!(render(template, &records), render(template, &records));
    }

    #[test]
    fn reserved_values_are_available() {
        let records = [Record::new(dict! { "name" => "Ace", "suits" => "hearts" })];
        let out = render("{{__card_data.name}}/{{__card_data.suit}}/{{suit}}/{{__time}}", &records);
        assert_eq!(out, ["Ace//hearts/1700000000000"]);
    }

    #[test]
    fn user_field_shadows_reserved_name() {
        let records = [Record::new(dict! { "__time" => "mine" })];
        assert_eq!(render("{{__time}}", &records), ["mine"]);
    }

    #[test]
    fn nested_json_values_render() {
        let value: Value = serde_json::from_str(r#"[{"name": "Ace", "stats": {"atk": 2}, "tags": ["a", "b"]}]"#).unwrap();
        let records: Vec<Record> = value.as_slice().unwrap()
            .iter()
            .map(|v| Record::from(v.as_dict().unwrap().clone()))
            .collect();

        let out = render("{{stats.atk}} {{tags|join(',')}} {% for k in stats %}{{k}}{% endfor %}", &records);
        assert_eq!(out, ["2 a,b atk"]);
    }

    #[test]
    fn render_errors_name_the_record() {
        let engine = MiniJinjaEngine::init(
            Templates::with_card("{{ name.missing.deeper }}"),
            &EngineOptions { strict: true },
        );

        let records = [Record::new(dict! { "name" => "ok" })];
        let e = render_cards(&engine, &records, &Stamp::from("0")).unwrap_err();
        assert_eq!(e.kind(), crate::error::Kind::TemplateRender);
        assert!(e.to_string().contains("record: 1"));
    }
}
