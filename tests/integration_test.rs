use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use voyager_scraper::config::{Config, ExtractionConfig};
use voyager_scraper::domain::{CanonicalEvent, RawPage, Source};
use voyager_scraper::pipeline::processing::datetime::parse_date;
use voyager_scraper::pipeline::processing::dedup::{Admission, MatchRule};
use voyager_scraper::pipeline::storage::{DedupScope, EventStore, InMemoryStorage};
use voyager_scraper::pipeline::{
    persist_batch, DedupGate, DedupPolicy, ExtractionPipeline, RecordOrigin, Rejection,
};

fn pipeline() -> Result<ExtractionPipeline> {
    Ok(ExtractionPipeline::new(&ExtractionConfig::default())?)
}

fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const BARBICAN_PAGE: &str = r#"<html><head>
<title>Messiah | Barbican</title>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Event",
  "name": "Handel: Messiah",
  "startDate": "2025-11-01T19:30:00+01:00",
  "location": {
    "@type": "Place",
    "name": "Barbican Centre",
    "address": {"@type": "PostalAddress", "addressLocality": "London"}
  }
}
</script>
</head><body>
<h1>Messiah</h1>
<p>Doors open 18:45. Venue: Some Other Hall, Paris</p>
</body></html>"#;

#[test]
fn test_structured_data_scenario() -> Result<()> {
    let pipeline = pipeline()?;
    let page = RawPage::parse(BARBICAN_PAGE, "https://www.barbican.org.uk/whats-on/2025/event/messiah");
    let event = pipeline
        .extract_page(&page, &RecordOrigin::new(Source::Web, "barbican", 0))
        .map_err(|r| anyhow::anyhow!("rejected: {}", r))?;

    assert_eq!(event.title, "Handel: Messiah");
    assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 11, 1));
    assert_eq!(event.time, NaiveTime::from_hms_opt(19, 30, 0));
    assert_eq!(event.venue.as_deref(), Some("Barbican Centre"));
    assert_eq!(event.city.as_deref(), Some("London"));
    assert_eq!(event.price, None);
    Ok(())
}

#[test]
fn test_structured_time_ignores_offset_for_any_zone() -> Result<()> {
    let pipeline = pipeline()?;
    for (start, date, time) in [
        ("2025-11-01T19:30:00+01:00", (2025, 11, 1), (19, 30)),
        ("2025-11-01T23:59:00-08:00", (2025, 11, 1), (23, 59)),
        ("2025-12-31T00:05:00Z", (2025, 12, 31), (0, 5)),
    ] {
        let html = format!(
            r#"<script type="application/ld+json">{{"@type":"Event","name":"X","startDate":"{}"}}</script>"#,
            start
        );
        let event = pipeline
            .extract_page(&RawPage::parse(&html, ""), &RecordOrigin::new(Source::Web, "t", 0))
            .map_err(|r| anyhow::anyhow!("rejected: {}", r))?;
        assert_eq!(event.date, NaiveDate::from_ymd_opt(date.0, date.1, date.2));
        assert_eq!(event.time, NaiveTime::from_hms_opt(time.0, time.1, 0));
    }
    Ok(())
}

#[test]
fn test_untitled_page_drops_exactly_one_record() -> Result<()> {
    let pipeline = pipeline()?;
    let pages = vec![
        RawPage::parse("<h1>Aida</h1><p>08 Oct 2025</p>", "https://x/aida"),
        RawPage::parse("<div>Venue: Arena di Verona</div><p>€95</p>", "https://x/blank"),
        RawPage::parse(BARBICAN_PAGE, "https://x/messiah"),
    ];
    let input_count = pages.len();

    let (events, stats) = pipeline.run_pages(pages, Source::EuropaTicket, "europaticket").collect_with_stats();
    assert_eq!(events.len(), input_count - 1);
    assert_eq!(stats.rejected_for(Rejection::MissingTitle), 1);
    Ok(())
}

#[test]
fn test_currency_symbol_preserved() -> Result<()> {
    let pipeline = pipeline()?;
    for (body, symbol) in [
        ("<h1>A</h1><p>Tickets: £25.00 each</p>", "£"),
        ("<h1>B</h1><p>Entry €45</p>", "€"),
        ("<h1>C</h1><p>Passes from ₹499</p>", "₹"),
        ("<h1>D</h1><span class=\"price\">$30</span>", "$"),
    ] {
        let event = pipeline
            .extract_page(&RawPage::parse(body, ""), &RecordOrigin::new(Source::Web, "t", 0))
            .map_err(|r| anyhow::anyhow!("rejected: {}", r))?;
        let price = event.price.unwrap_or_default();
        assert!(price.contains(symbol), "{price:?} lost {symbol}");
    }
    Ok(())
}

#[test]
fn test_pipeline_is_idempotent() -> Result<()> {
    let pipeline = pipeline()?;
    let batch = || {
        vec![
            RawPage::parse(BARBICAN_PAGE, "https://x/messiah"),
            RawPage::parse(
                r#"<h1>Carmen</h1><div class="date">Fri, 10th Oct 2025</div><p>From €39</p>"#,
                "https://x/carmen",
            ),
            RawPage::parse("<p>untitled</p>", "https://x/none"),
        ]
    };

    let first: Vec<CanonicalEvent> = pipeline.run_pages(batch(), Source::Web, "batch").collect();
    let second: Vec<CanonicalEvent> = pipeline.run_pages(batch(), Source::Web, "batch").collect();
    assert_eq!(serde_json::to_string(&first)?, serde_json::to_string(&second)?);
    Ok(())
}

#[test]
fn test_date_formats_agree() {
    let formats = ExtractionConfig::default().date_formats;
    for text in ["08 Oct 2025", "08/10/2025", "2025-10-08", "08-10-2025"] {
        assert_eq!(parse_date(text, &formats), NaiveDate::from_ymd_opt(2025, 10, 8));
    }
}

#[test]
fn test_csv_jazz_night_scenario() -> Result<()> {
    let pipeline = pipeline()?;
    let rows = vec![row(&[
        ("title", "Jazz Night"),
        ("venue", "Blue Note"),
        ("date", "08 Oct 2025"),
        ("price", "€20"),
        ("url", ""),
    ])];
    let events: Vec<_> = pipeline.run_rows(rows, "events.csv").collect();
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event.title, "Jazz Night");
    assert_eq!(event.venue.as_deref(), Some("Blue Note"));
    assert_eq!(event.date, NaiveDate::from_ymd_opt(2025, 10, 8));
    assert_eq!(event.time, NaiveTime::from_hms_opt(19, 0, 0));
    assert_eq!(event.price.as_deref(), Some("€20"));
    assert_eq!(event.url, None);
    assert_eq!(event.source, Source::Csv);
    Ok(())
}

#[test]
fn test_configured_default_time_is_used() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "[extraction]\ndefault_time = \"20:00\"")?;
    let config = Config::load_from(file.path())?;
    let pipeline = ExtractionPipeline::new(&config.extraction)?;

    let events: Vec<_> = pipeline
        .run_rows(vec![row(&[("title", "Late"), ("date", "2025-10-08")])], "x.csv")
        .collect();
    assert_eq!(events[0].time, NaiveTime::from_hms_opt(20, 0, 0));
    Ok(())
}

fn stored(title: &str, url: Option<&str>, source: Source) -> CanonicalEvent {
    CanonicalEvent {
        id: format!("{}_seed_0", source),
        title: title.to_string(),
        url: url.map(str::to_string),
        date: NaiveDate::from_ymd_opt(2025, 10, 8),
        time: NaiveTime::from_hms_opt(19, 0, 0),
        venue: None,
        city: None,
        price: None,
        description: None,
        source,
    }
}

#[tokio::test]
async fn test_dedup_rules() -> Result<()> {
    let store = InMemoryStorage::new();
    let scope = DedupScope::Global;
    store.insert(&scope, &stored("Tosca", Some("https://x/e1"), Source::Web)).await?;
    store.insert(&scope, &stored("Jazz Night", None, Source::Csv)).await?;
    let gate = DedupGate::new(Arc::new(store.clone()), DedupPolicy::default());

    // same url, everything else different
    let mut same_url = stored("Completely different", Some("https://x/e1"), Source::Web);
    same_url.date = NaiveDate::from_ymd_opt(2030, 1, 1);
    assert_eq!(gate.admit(&scope, &same_url).await?, Admission::Duplicate(MatchRule::Url));

    // new url, same title/date/source as a url-less record
    let same_title_date = stored("Jazz Night", Some("https://x/e2"), Source::Csv);
    assert_eq!(
        gate.admit(&scope, &same_title_date).await?,
        Admission::Duplicate(MatchRule::TitleDate)
    );

    // matches neither rule
    let fresh = stored("Jazz Night II", Some("https://x/e3"), Source::Csv);
    assert!(matches!(gate.admit(&scope, &fresh).await?, Admission::Inserted(_)));

    assert_eq!(store.len()?, 3);
    Ok(())
}

#[tokio::test]
async fn test_batch_persistence_skips_duplicates_without_failing() -> Result<()> {
    let pipeline = pipeline()?;
    let rows = vec![
        row(&[("title", "Jazz Night"), ("date", "08 Oct 2025")]),
        row(&[("title", "Jazz Night"), ("date", "08/10/2025")]),
        row(&[("title", "Blues Night"), ("date", "09 Oct 2025")]),
        row(&[("venue", "No title here")]),
    ];
    let (events, stats) = pipeline.run_rows(rows, "events.csv").collect_with_stats();
    assert_eq!(stats.emitted, 3);
    assert_eq!(stats.rejected_total(), 1);

    let store = InMemoryStorage::new();
    let gate = DedupGate::new(Arc::new(store.clone()), DedupPolicy::default());
    let report = persist_batch(events, &gate, &DedupScope::User("ana".to_string())).await;

    assert_eq!(report.inserted, 2);
    assert_eq!(report.duplicates_for(MatchRule::TitleDate), 1);
    assert!(report.errors.is_empty());
    assert!(store.list(&DedupScope::Global).await?.is_empty());
    Ok(())
}
