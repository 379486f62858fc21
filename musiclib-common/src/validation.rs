//! Field-level validation primitives
//!
//! Every create/update request is cleaned into normalized values before it
//! touches the database. Problems are collected per field so a client can show
//! all of them next to the offending inputs at once; form-level problems go
//! under [`ValidationErrors::NON_FIELD`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Field name → messages, in insertion order per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    /// Key used for errors that don't belong to a single field
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    /// Build from form-level messages only
    pub fn from_form_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut errors = Self::new();
        for message in messages {
            errors.add_form(message);
        }
        errors
    }

    /// Record a message for `field`, skipping exact duplicates
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        let messages = self.0.entry(field.to_string()).or_default();
        if !messages.contains(&message) {
            messages.push(message);
        }
    }

    pub fn add_form(&mut self, message: impl Into<String>) {
        self.add(Self::NON_FIELD, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for `field` (empty slice when none)
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn form_messages(&self) -> &[String] {
        self.field(Self::NON_FIELD)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                first = false;
                write!(f, "{}: {}", field, message)?;
            }
        }
        Ok(())
    }
}

/// Trim a required text field and enforce its maximum length
///
/// Returns the trimmed value; on failure records the message and returns an
/// empty string so cleaning can continue and collect further errors.
pub fn required_text(errors: &mut ValidationErrors, field: &str, value: &str, max_len: usize) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, REQUIRED);
        return String::new();
    }
    check_length(errors, field, trimmed, max_len);
    trimmed.to_string()
}

/// Trim an optional text field; blank input becomes `None`
pub fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
    max_len: Option<usize>,
) -> Option<String> {
    let trimmed = value.map(str::trim).filter(|v| !v.is_empty())?;
    if let Some(max_len) = max_len {
        check_length(errors, field, trimmed, max_len);
    }
    Some(trimmed.to_string())
}

fn check_length(errors: &mut ValidationErrors, field: &str, value: &str, max_len: usize) {
    let len = value.chars().count();
    if len > max_len {
        errors.add(
            field,
            format!("Ensure this value has at most {} characters (it has {}).", max_len, len),
        );
    }
}

/// Normalize a lookup name: surrounding whitespace removed, first character
/// upper-cased, the rest lower-cased ("hIP hOP" becomes "Hip hop")
pub fn normalize_lookup_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// Case-insensitive name comparison used for uniqueness checks
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Birth/death dates of a person
pub fn validate_life_dates(
    errors: &mut ValidationErrors,
    date_of_birth: Option<NaiveDate>,
    date_of_death: Option<NaiveDate>,
    today: NaiveDate,
) {
    if let Some(birth) = date_of_birth {
        if birth > today {
            errors.add("date_of_birth", "Date of birth cannot be in the future.");
        }
    }
    if let Some(death) = date_of_death {
        if death > today {
            errors.add("date_of_death", "Date of death cannot be in the future.");
        }
    }
    if let (Some(birth), Some(death)) = (date_of_birth, date_of_death) {
        if birth > death {
            errors.add_form("Date of birth cannot be after date of death.");
        }
    }
}

/// A start/end pair where both ends are optional
pub fn validate_period(
    errors: &mut ValidationErrors,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    message: &str,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.add_form(message);
        }
    }
}

/// Which side of a song performance is credited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformerIds {
    Contributor { contributor_id: i64, role_id: i64 },
    MusicGroup { music_group_id: i64, role_id: i64 },
}

impl PerformerIds {
    /// Column values in table order: contributor, contributor role, group, group role
    pub fn columns(&self) -> (Option<i64>, Option<i64>, Option<i64>, Option<i64>) {
        match *self {
            PerformerIds::Contributor { contributor_id, role_id } => {
                (Some(contributor_id), Some(role_id), None, None)
            }
            PerformerIds::MusicGroup { music_group_id, role_id } => {
                (None, None, Some(music_group_id), Some(role_id))
            }
        }
    }
}

/// Enforce "contributor XOR music group, each with its role"
pub fn resolve_performer(
    contributor_id: Option<i64>,
    contributor_role_id: Option<i64>,
    music_group_id: Option<i64>,
    music_group_role_id: Option<i64>,
) -> Result<PerformerIds, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    match (contributor_id, music_group_id) {
        (Some(_), Some(_)) => {
            errors.add_form("Only one of contributor or music group can be set.");
        }
        (None, None) => {
            errors.add_form("Either contributor or music group must be set.");
        }
        _ => {}
    }
    if contributor_id.is_some() && contributor_role_id.is_none() {
        errors.add_form("If a contributor is set, contributor role must also be set.");
    }
    if music_group_id.is_some() && music_group_role_id.is_none() {
        errors.add_form("If a music group is set, music group role must also be set.");
    }
    // A dangling role with no entity would still break the table constraint
    if contributor_id.is_none() && contributor_role_id.is_some() {
        errors.add("contributor_role_id", "Contributor role requires a contributor.");
    }
    if music_group_id.is_none() && music_group_role_id.is_some() {
        errors.add("music_group_role_id", "Music group role requires a music group.");
    }

    errors.into_result()?;

    match (contributor_id, contributor_role_id, music_group_id, music_group_role_id) {
        (Some(contributor_id), Some(role_id), None, None) => {
            Ok(PerformerIds::Contributor { contributor_id, role_id })
        }
        (None, None, Some(music_group_id), Some(role_id)) => {
            Ok(PerformerIds::MusicGroup { music_group_id, role_id })
        }
        _ => Err(ValidationErrors::from_form_messages([
            "Either contributor or music group must be set.",
        ])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_normalize_lookup_name() {
        assert_eq!(normalize_lookup_name("  blues  "), "Blues");
        assert_eq!(normalize_lookup_name("jazz"), "Jazz");
        assert_eq!(normalize_lookup_name("united Kingdom"), "United kingdom");
        assert_eq!(normalize_lookup_name("hIP hOP"), "Hip hop");
        assert_eq!(normalize_lookup_name("čEŠTINA"), "Čeština");
        assert_eq!(normalize_lookup_name("   "), "");
    }

    #[test]
    fn test_same_name_ignores_case() {
        assert!(same_name("Pop", "pop"));
        assert!(same_name("ČESKO", "česko"));
        assert!(!same_name("Pop", "Rock"));
    }

    #[test]
    fn test_required_text() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required_text(&mut errors, "name", "  Rock ", 64), "Rock");
        assert!(errors.is_empty());

        required_text(&mut errors, "name", "   ", 64);
        assert_eq!(errors.field("name"), [REQUIRED.to_string()]);

        let mut errors = ValidationErrors::new();
        required_text(&mut errors, "title", &"x".repeat(130), 128);
        assert_eq!(
            errors.field("title"),
            ["Ensure this value has at most 128 characters (it has 130).".to_string()]
        );
    }

    #[test]
    fn test_optional_text_blank_is_none() {
        let mut errors = ValidationErrors::new();
        assert_eq!(optional_text(&mut errors, "bio", Some("  "), None), None);
        assert_eq!(optional_text(&mut errors, "bio", None, None), None);
        assert_eq!(
            optional_text(&mut errors, "stage_name", Some(" Ziggy "), Some(64)),
            Some("Ziggy".to_string())
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_life_dates() {
        let today = date(2024, 6, 1);

        let mut errors = ValidationErrors::new();
        validate_life_dates(&mut errors, Some(date(2000, 1, 1)), Some(date(1999, 12, 31)), today);
        assert_eq!(
            errors.form_messages(),
            ["Date of birth cannot be after date of death.".to_string()]
        );

        let mut errors = ValidationErrors::new();
        validate_life_dates(&mut errors, Some(date(2025, 1, 1)), None, today);
        assert_eq!(
            errors.field("date_of_birth"),
            ["Date of birth cannot be in the future.".to_string()]
        );

        let mut errors = ValidationErrors::new();
        validate_life_dates(&mut errors, Some(date(1939, 7, 14)), Some(date(2019, 10, 1)), today);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_resolve_performer_contributor() {
        let performer = resolve_performer(Some(1), Some(2), None, None).unwrap();
        assert_eq!(performer, PerformerIds::Contributor { contributor_id: 1, role_id: 2 });
        assert_eq!(performer.columns(), (Some(1), Some(2), None, None));
    }

    #[test]
    fn test_resolve_performer_group() {
        let performer = resolve_performer(None, None, Some(3), Some(4)).unwrap();
        assert_eq!(performer.columns(), (None, None, Some(3), Some(4)));
    }

    #[test]
    fn test_resolve_performer_both_set() {
        let errors = resolve_performer(Some(1), Some(2), Some(3), Some(4)).unwrap_err();
        assert!(errors
            .form_messages()
            .contains(&"Only one of contributor or music group can be set.".to_string()));
    }

    #[test]
    fn test_resolve_performer_neither_set() {
        let errors = resolve_performer(None, None, None, None).unwrap_err();
        assert_eq!(
            errors.form_messages(),
            ["Either contributor or music group must be set.".to_string()]
        );
    }

    #[test]
    fn test_resolve_performer_missing_role() {
        let errors = resolve_performer(Some(1), None, None, None).unwrap_err();
        assert_eq!(
            errors.form_messages(),
            ["If a contributor is set, contributor role must also be set.".to_string()]
        );

        let errors = resolve_performer(None, None, Some(1), None).unwrap_err();
        assert_eq!(
            errors.form_messages(),
            ["If a music group is set, music group role must also be set.".to_string()]
        );
    }

    #[test]
    fn test_resolve_performer_dangling_role() {
        let errors = resolve_performer(Some(1), Some(2), None, Some(9)).unwrap_err();
        assert!(errors.has("music_group_role_id"));
    }

    #[test]
    fn test_duplicate_messages_collapse() {
        let mut errors = ValidationErrors::new();
        errors.add_form("same");
        errors.add_form("same");
        assert_eq!(errors.form_messages().len(), 1);
        assert_eq!(errors.to_string(), "__all__: same");
    }
}
