use once_cell::sync::Lazy;
use scraper::Selector;

use super::{selector, ExtractionContext, Strategy};

static DESCRIPTION_CLASS: Lazy<Selector> =
    Lazy::new(|| selector(r#"[class*="description"], .desc, .summary"#));
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(r#"meta[name="description"]"#));
static OG_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| selector(r#"meta[property="og:description"]"#));

/// Never derived from the title; a page without either source has no description.
pub const CHAIN: &[Strategy<String>] = &[
    Strategy {
        name: "description_class",
        run: description_class,
    },
    Strategy {
        name: "meta_description",
        run: meta_description,
    },
    Strategy {
        name: "og_description",
        run: og_description,
    },
];

fn description_class(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.first_text(&DESCRIPTION_CLASS)
}

fn meta_description(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.meta_content(&META_DESCRIPTION)
}

fn og_description(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.meta_content(&OG_DESCRIPTION)
}
