//! Filters over normalized events.

use chrono::NaiveDate;

use crate::domain::CanonicalEvent;

/// Events dated within `from..=to`. Undated events never pass a date filter.
pub fn filter_by_date_range<'e, I>(events: I, from: NaiveDate, to: NaiveDate) -> Vec<&'e CanonicalEvent>
where
    I: IntoIterator<Item = &'e CanonicalEvent>,
{
    events
        .into_iter()
        .filter(|event| event.date.map_or(false, |date| date >= from && date <= to))
        .collect()
}

/// Case-insensitive substring match on the city
pub fn filter_by_city<'e, I>(events: I, city: &str) -> Vec<&'e CanonicalEvent>
where
    I: IntoIterator<Item = &'e CanonicalEvent>,
{
    let needle = city.trim().to_lowercase();
    events
        .into_iter()
        .filter(|event| {
            event
                .city
                .as_deref()
                .map_or(false, |c| c.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Case-insensitive substring match on title or description
pub fn search<'e, I>(events: I, query: &str) -> Vec<&'e CanonicalEvent>
where
    I: IntoIterator<Item = &'e CanonicalEvent>,
{
    let needle = query.trim().to_lowercase();
    events
        .into_iter()
        .filter(|event| {
            event.title.to_lowercase().contains(&needle)
                || event
                    .description
                    .as_deref()
                    .map_or(false, |d| d.to_lowercase().contains(&needle))
        })
        .collect()
}
