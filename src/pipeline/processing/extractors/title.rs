use once_cell::sync::Lazy;
use scraper::Selector;

use super::{selector, ExtractionContext, Strategy};
use crate::pipeline::processing::text::clean_opt;

static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));

/// Title sources in priority order. A page whose chain comes up empty is rejected.
pub const CHAIN: &[Strategy<String>] = &[
    Strategy {
        name: "structured_data",
        run: from_hint,
    },
    Strategy {
        name: "h1",
        run: first_h1,
    },
    Strategy {
        name: "og_title",
        run: og_title,
    },
    Strategy {
        name: "title_tag",
        run: title_tag,
    },
];

fn from_hint(ctx: &ExtractionContext<'_>) -> Option<String> {
    clean_opt(ctx.hint?.title.as_deref())
}

fn first_h1(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.first_text(&H1)
}

fn og_title(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.meta_content(&OG_TITLE)
}

fn title_tag(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.first_text(&TITLE)
}
