use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

use super::{selector, ExtractionContext, Strategy};
use crate::pipeline::processing::text::{clean_opt, element_text};

/// Price-labelled elements longer than this are searched with [`PRICE_RE`] instead of taken whole
const MAX_PRICE_LABEL_CHARS: usize = 80;

static PRICE_CLASS: Lazy<Selector> = Lazy::new(|| selector(r#"[class*="price"]"#));

/// An amount; thousands-grouped forms ("1,200", "1.200,00") are tried before plain ones
const AMOUNT: &str = r"(?:\d{1,3}(?:[.,\s]\d{3})+(?:[.,]\d{1,2})?\b|\d+(?:[.,]\d{1,2})?)";

/// A currency symbol or ISO code next to an amount, with an optional lead-in like "from"
pub static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i)(?:\b(?:starting from|prices? from|tickets? from|from|only)\s+)?(?:[€£$₹]\s?{amount}|\b(?:EUR|GBP|USD|INR)\s?{amount}|\b{amount}\s?(?:[€£₹]|(?:EUR|GBP|USD|INR)\b))",
        amount = AMOUNT
    );
    Regex::new(&pattern).expect("valid price regex")
});

pub const CHAIN: &[Strategy<String>] = &[
    Strategy {
        name: "structured_data",
        run: from_hint,
    },
    Strategy {
        name: "price_class",
        run: price_class,
    },
    Strategy {
        name: "page_text",
        run: page_text,
    },
];

/// The first price-looking token in `text`, returned exactly as written
pub fn find_price(text: &str) -> Option<String> {
    PRICE_RE.find(text).map(|m| m.as_str().trim().to_string())
}

fn from_hint(ctx: &ExtractionContext<'_>) -> Option<String> {
    clean_opt(ctx.hint?.price.as_deref())
}

fn price_class(ctx: &ExtractionContext<'_>) -> Option<String> {
    ctx.elements(&PRICE_CLASS).find_map(|el| {
        let text = element_text(&el);
        if text.chars().count() > MAX_PRICE_LABEL_CHARS {
            find_price(&text)
        } else {
            clean_opt(Some(&text))
        }
    })
}

fn page_text(ctx: &ExtractionContext<'_>) -> Option<String> {
    find_price(&ctx.page_text)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::run_chain;
    use super::*;

    #[test]
    fn test_symbol_is_kept_verbatim() {
        assert_eq!(find_price("Tickets from €45 per person").as_deref(), Some("Tickets from €45"));
        assert_eq!(find_price("Book now, from €45").as_deref(), Some("from €45"));
        assert_eq!(find_price("Only £12.50!").as_deref(), Some("Only £12.50"));
        assert_eq!(find_price("Entry ₹ 499 onwards").as_deref(), Some("₹ 499"));
        assert_eq!(find_price("Seats 30 EUR").as_deref(), Some("30 EUR"));
        assert_eq!(find_price("USD 25").as_deref(), Some("USD 25"));
        assert_eq!(find_price("Row 12, seat 4"), None);
    }

    #[test]
    fn test_price_class_before_page_text() {
        let settings = settings();
        let page = page(r#"<p>Was $80</p><div class="ticket-price">$60</div>"#);
        let ctx = ExtractionContext::new(&page, None, &settings);
        let hit = run_chain("price", CHAIN, &ctx).unwrap();
        assert_eq!(hit.value, "$60");
        assert_eq!(hit.strategy, "price_class");
    }

    #[test]
    fn test_page_text_fallback_and_absence() {
        let settings = settings();
        let standing = page("<p>Standing tickets from €20 at the door</p>");
        let ctx = ExtractionContext::new(&standing, None, &settings);
        assert_eq!(run_chain("price", CHAIN, &ctx).unwrap().value, "tickets from €20");

        let free = page("<p>Free entry</p>");
        let ctx = ExtractionContext::new(&free, None, &settings);
        assert!(run_chain("price", CHAIN, &ctx).is_none());
    }

    #[test]
    fn test_thousands_separators_kept_whole() {
        assert_eq!(
            find_price("Premium seats from €1,200 per box").as_deref(),
            Some("from €1,200")
        );
        assert_eq!(find_price("Box £1,250.00").as_deref(), Some("£1,250.00"));
        assert_eq!(find_price("Loge 1.200,00 € pro Abend").as_deref(), Some("1.200,00 €"));
        // a year after the amount is not a thousands group
        assert_eq!(find_price("Stalls €20 2025 season").as_deref(), Some("€20"));

        let settings = settings();
        let gala = page("<h1>Gala</h1><p>Boxes from €1,200</p>");
        let ctx = ExtractionContext::new(&gala, None, &settings);
        assert_eq!(run_chain("price", CHAIN, &ctx).unwrap().value, "from €1,200");
    }
}
