/// Source tags as they appear on the CLI and in serialized records
pub const TICKETMASTER_SOURCE: &str = "ticketmaster";
pub const EVENTBRITE_SOURCE: &str = "eventbrite";
pub const BOOKMYSHOW_SOURCE: &str = "bookmyshow";
pub const EUROPATICKET_SOURCE: &str = "europaticket";
pub const ENTS24_SOURCE: &str = "ents24";
pub const SKYSCANNER_SOURCE: &str = "skyscanner";
pub const GOIBIBO_SOURCE: &str = "goibibo";
pub const CSV_SOURCE: &str = "csv";
pub const WEB_SOURCE: &str = "web";

/// Placeholder start time for records that carry a date but no time
pub const DEFAULT_START_TIME: &str = "19:00";

/// Characters on either side of a time token searched for a start keyword
pub const TIME_KEYWORD_WINDOW: usize = 40;

/// Date formats tried in order by the date parser
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%d %b %Y", // 08 Oct 2025
    "%d %B %Y", // 08 October 2025
    "%d/%m/%Y", // 08/10/2025
    "%Y-%m-%d", // 2025-10-08
    "%d-%m-%Y", // 08-10-2025
    "%d.%m.%Y", // 08.10.2025
];

/// Cities a record may be assigned outside of structured data
pub const DEFAULT_KNOWN_CITIES: &[&str] = &[
    "Berlin",
    "Vienna",
    "Budapest",
    "Barcelona",
    "Madrid",
    "Rome",
    "Florence",
    "Naples",
    "Hamburg",
    "Munich",
    "Prague",
    "Bratislava",
    "Seville",
    "Milan",
    "Paris",
    "London",
    "Amsterdam",
    "Brussels",
    "Salzburg",
    "Venice",
    "Verona",
    "Dresden",
    "Mumbai",
    "Delhi",
    "Bengaluru",
    "Toronto",
    "New York",
];

/// Venue names matched inside descriptions when nothing better is on the page
pub const DEFAULT_KNOWN_VENUES: &[&str] = &[
    "Royal Opera House",
    "Royal Albert Hall",
    "Barbican Centre",
    "Southbank Centre",
    "Royal Festival Hall",
    "Wembley Stadium",
    "Olympia London",
    "Globe Theatre",
    "Old Vic",
    "National Theatre",
    "Lyceum Theatre",
    "London Palladium",
    "Her Majesty's Theatre",
    "Prince of Wales Theatre",
    "Adelphi Theatre",
    "Apollo Theatre",
    "Cambridge Theatre",
    "Dominion Theatre",
    "Theatre Royal Drury Lane",
    "Sadler's Wells",
    "Vienna State Opera",
    "Musikverein",
    "Konzerthaus",
    "Berliner Philharmonie",
    "Staatsoper Unter den Linden",
    "Hungarian State Opera",
    "Palau de la Música Catalana",
    "Gran Teatre del Liceu",
    "Teatro alla Scala",
    "Teatro La Fenice",
    "Arena di Verona",
    "Opéra Garnier",
    "Concertgebouw",
    "Semperoper",
];
