//! Display helpers shared by detail responses

use chrono::{Datelike, NaiveDate};

/// Format a duration in seconds as `m:ss`
///
/// # Examples
/// ```
/// use musiclib_common::format::format_seconds;
///
/// assert_eq!(format_seconds(180), "3:00");
/// assert_eq!(format_seconds(3665), "61:05");
/// ```
pub fn format_seconds(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Short name of a person: stage name, otherwise "first last"
pub fn contributor_name(first_name: &str, last_name: &str, stage_name: Option<&str>) -> String {
    match stage_name.filter(|s| !s.is_empty()) {
        Some(stage) => stage.to_string(),
        None => format!("{} {}", first_name, last_name),
    }
}

/// Long name of a person with life years, e.g. "Karel Gott (1939–2019)"
pub fn contributor_display_more(
    first_name: &str,
    middle_name: Option<&str>,
    last_name: &str,
    stage_name: Option<&str>,
    date_of_birth: Option<NaiveDate>,
    date_of_death: Option<NaiveDate>,
) -> String {
    let mut name = match stage_name.filter(|s| !s.is_empty()) {
        Some(stage) => stage.to_string(),
        None => match middle_name.filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", first_name, middle, last_name),
            None => format!("{} {}", first_name, last_name),
        },
    };

    let years = match (date_of_birth, date_of_death) {
        (Some(birth), Some(death)) => Some(format!("{}–{}", birth.year(), death.year())),
        (Some(birth), None) => Some(birth.year().to_string()),
        (None, Some(death)) => Some(death.year().to_string()),
        (None, None) => None,
    };
    if let Some(years) = years {
        name.push_str(&format!(" ({})", years));
    }
    name
}

/// Membership period such as `[1968-01-01–1970-12-31]`; empty when unknown
pub fn active_period(from_date: Option<NaiveDate>, to_date: Option<NaiveDate>) -> String {
    match (from_date, to_date) {
        (Some(from), Some(to)) => format!("[{}–{}]", from, to),
        (Some(from), None) => format!("[{}–]", from),
        (None, Some(to)) => format!("[–{}]", to),
        (None, None) => String::new(),
    }
}

/// Credit line for an album: "Artist A, Artist B / Group"
pub fn display_creator(artist_names: &[String], group_names: &[String]) -> String {
    let artists = artist_names.join(", ");
    let groups = group_names.join(", ");
    match (artists.is_empty(), groups.is_empty()) {
        (false, false) => format!("{} / {}", artists, groups),
        (false, true) => artists,
        (true, false) => groups,
        (true, true) => "Unknown".to_string(),
    }
}

/// "Genre" for exactly one item, "Genres" otherwise
pub fn count_label(singular: &str, count: usize) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        format!("{}s", singular)
    }
}
