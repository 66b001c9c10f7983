//! Date and time chains. They share their DOM sources, but each field
//! falls through independently: a page may yield a date and no time.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use url::Url;

use super::{selector, ExtractionContext, Strategy};
use crate::pipeline::processing::datetime::{
    find_date_in_text, find_time_in_text, parse_date, parse_time, split_iso_datetime,
};
use crate::pipeline::processing::text::element_text;

const MAX_LABEL_CHARS: usize = 200;

static TIME_WITH_ATTR: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));
static TIME_ELEMENTS: Lazy<Selector> = Lazy::new(|| selector("time"));
static DATE_CLASS: Lazy<Selector> = Lazy::new(|| selector(r#"[class*="date"]"#));
/// Whole-word `time` or a start-time style class; `runtime` and `timeline` do not match
static TIME_CLASS: Lazy<Selector> = Lazy::new(|| {
    selector(
        r#"[class~="time"], [class*="showtime"], [class*="show-time"], [class*="start-time"], [class*="event-time"]"#,
    )
});

/// "08 Oct 2025 at 19:30"
static AT_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+at\s+").expect("valid separator regex"));

pub const DATE_CHAIN: &[Strategy<NaiveDate>] = &[
    Strategy {
        name: "structured_data",
        run: date_from_hint,
    },
    Strategy {
        name: "time_datetime_attr",
        run: date_from_time_attr,
    },
    Strategy {
        name: "time_text",
        run: date_from_time_text,
    },
    Strategy {
        name: "date_class",
        run: date_from_date_class,
    },
    Strategy {
        name: "page_text",
        run: date_from_page_text,
    },
    Strategy {
        name: "url_query",
        run: date_from_url_query,
    },
];

pub const TIME_CHAIN: &[Strategy<NaiveTime>] = &[
    Strategy {
        name: "structured_data",
        run: time_from_hint,
    },
    Strategy {
        name: "time_datetime_attr",
        run: time_from_time_attr,
    },
    Strategy {
        name: "time_text",
        run: time_from_time_text,
    },
    Strategy {
        name: "date_class",
        run: time_from_date_class,
    },
    Strategy {
        name: "time_class",
        run: time_from_time_class,
    },
    Strategy {
        name: "page_text",
        run: time_from_page_text,
    },
];

/// Split "date at time" text; the right side is absent when there is no " at "
fn split_at_marker(text: &str) -> (&str, Option<&str>) {
    match AT_SEPARATOR_RE.find(text) {
        Some(sep) => (&text[..sep.start()], Some(&text[sep.end()..])),
        None => (text, None),
    }
}

fn date_in_label(text: &str, formats: &[String]) -> Option<NaiveDate> {
    let (date_part, _) = split_at_marker(text);
    parse_date(date_part, formats).or_else(|| find_date_in_text(text, formats))
}

fn time_in_label(text: &str) -> Option<NaiveTime> {
    let (_, time_part) = split_at_marker(text);
    time_part.and_then(parse_time).or_else(|| parse_time(text))
}

/// Text of each element matching `selector`, skipping long blocks
fn label_texts(ctx: &ExtractionContext<'_>, selector: &Selector) -> Vec<String> {
    ctx.elements(selector)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty() && text.chars().count() <= MAX_LABEL_CHARS)
        .collect()
}

fn datetime_attrs(ctx: &ExtractionContext<'_>) -> Vec<String> {
    ctx.elements(&TIME_WITH_ATTR)
        .filter_map(|el| el.value().attr("datetime"))
        .map(str::to_string)
        .collect()
}

fn date_from_hint(ctx: &ExtractionContext<'_>) -> Option<NaiveDate> {
    ctx.hint?.date
}

fn date_from_time_attr(ctx: &ExtractionContext<'_>) -> Option<NaiveDate> {
    datetime_attrs(ctx).iter().find_map(|value| {
        split_iso_datetime(value)
            .map(|(date, _)| date)
            .or_else(|| parse_date(value, &ctx.settings.date_formats))
    })
}

fn date_from_time_text(ctx: &ExtractionContext<'_>) -> Option<NaiveDate> {
    label_texts(ctx, &TIME_ELEMENTS)
        .iter()
        .find_map(|text| date_in_label(text, &ctx.settings.date_formats))
}

fn date_from_date_class(ctx: &ExtractionContext<'_>) -> Option<NaiveDate> {
    label_texts(ctx, &DATE_CLASS)
        .iter()
        .find_map(|text| date_in_label(text, &ctx.settings.date_formats))
}

fn date_from_page_text(ctx: &ExtractionContext<'_>) -> Option<NaiveDate> {
    find_date_in_text(&ctx.page_text, &ctx.settings.date_formats)
}

/// Calendar links carry the performance date as `?date=dd-mm-yyyy`
fn date_from_url_query(ctx: &ExtractionContext<'_>) -> Option<NaiveDate> {
    let url = Url::parse(ctx.page.url.trim()).ok()?;
    let (_, value) = url.query_pairs().find(|(key, _)| key == "date")?;
    parse_date(&value, &ctx.settings.date_formats)
}

fn time_from_hint(ctx: &ExtractionContext<'_>) -> Option<NaiveTime> {
    ctx.hint?.time
}

fn time_from_time_attr(ctx: &ExtractionContext<'_>) -> Option<NaiveTime> {
    datetime_attrs(ctx).iter().find_map(|value| match split_iso_datetime(value) {
        Some((_, time)) => time,
        // time-only values such as datetime="20:15"
        None => parse_time(value),
    })
}

fn time_from_time_text(ctx: &ExtractionContext<'_>) -> Option<NaiveTime> {
    label_texts(ctx, &TIME_ELEMENTS)
        .iter()
        .find_map(|text| time_in_label(text))
}

fn time_from_date_class(ctx: &ExtractionContext<'_>) -> Option<NaiveTime> {
    label_texts(ctx, &DATE_CLASS)
        .iter()
        .find_map(|text| time_in_label(text))
}

fn time_from_time_class(ctx: &ExtractionContext<'_>) -> Option<NaiveTime> {
    label_texts(ctx, &TIME_CLASS)
        .iter()
        .find_map(|text| parse_time(text))
}

fn time_from_page_text(ctx: &ExtractionContext<'_>) -> Option<NaiveTime> {
    find_time_in_text(&ctx.page_text, ctx.settings.time_keyword_window)
}
