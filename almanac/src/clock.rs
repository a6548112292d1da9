use chrono::{DateTime, TimeZone};

pub const TICK_MS: u64 = 100;

/// "Tue 14 Jan, 9:05:03": the hour is left unpadded.
pub fn format_clock<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    t.format("%a %-d %b, %-H:%M:%S").to_string()
}
