//! Caption composition.

use chrono::{DateTime, TimeZone};

/// Prefix of the wake-up time line
pub const WAKE_UP_LABEL: &str = "今日起床时间:";

/// Prefix of the quote line
pub const QUOTE_LABEL: &str = "今日诗词:";

const SEPARATOR: &str = "\n\n";

/// Format a wake-up time as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Compose the morning caption.
///
/// `weather` is the already formatted weather line. Segments are joined in
/// a fixed order whatever they contain.
pub fn compose_caption(timestamp: &str, weather: &str, quote: &str) -> String {
    let mut caption = String::with_capacity(
        WAKE_UP_LABEL.len() + timestamp.len() + weather.len() + QUOTE_LABEL.len() + quote.len() + 4,
    );
    caption.push_str(WAKE_UP_LABEL);
    caption.push_str(timestamp);
    caption.push_str(SEPARATOR);
    caption.push_str(weather);
    caption.push_str(SEPARATOR);
    caption.push_str(QUOTE_LABEL);
    caption.push_str(quote);
    caption
}
