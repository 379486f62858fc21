//! Create/update payloads and their cleaning rules
//!
//! `clean()` trims and normalizes a payload and applies every rule that does
//! not need the database. Rules that do (uniqueness, referenced rows) run in
//! the matching `db` module before the write.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::db::models::RoleCategory;
use crate::validation::{
    self, optional_text, required_text, resolve_performer, PerformerIds, ValidationErrors,
};

const NAME_MAX: usize = 64;
const TITLE_MAX: usize = 128;

/// Genre, country or language
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupForm {
    #[serde(default)]
    pub name: String,
}

impl LookupForm {
    /// Normalized name ("  jazz " → "Jazz")
    pub fn clean(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", &self.name, NAME_MAX);
        errors.into_result()?;
        Ok(validation::normalize_lookup_name(&name))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContributorRoleForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: RoleCategory,
}

impl ContributorRoleForm {
    pub fn clean(&self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", &self.name, NAME_MAX);
        errors.into_result()?;
        Ok(Self {
            name,
            category: self.category,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicGroupRoleForm {
    #[serde(default)]
    pub name: String,
}

impl MusicGroupRoleForm {
    pub fn clean(&self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required_text(&mut errors, "name", &self.name, NAME_MAX);
        errors.into_result()?;
        Ok(Self { name })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContributorForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub stage_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
    #[serde(default)]
    pub country_id: Option<i64>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl ContributorForm {
    pub fn clean(&self, today: NaiveDate) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let cleaned = Self {
            first_name: required_text(&mut errors, "first_name", &self.first_name, NAME_MAX),
            middle_name: optional_text(&mut errors, "middle_name", self.middle_name.as_deref(), Some(NAME_MAX)),
            last_name: required_text(&mut errors, "last_name", &self.last_name, NAME_MAX),
            stage_name: optional_text(&mut errors, "stage_name", self.stage_name.as_deref(), Some(NAME_MAX)),
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
            country_id: self.country_id,
            bio: optional_text(&mut errors, "bio", self.bio.as_deref(), None),
        };
        validation::validate_life_dates(&mut errors, self.date_of_birth, self.date_of_death, today);
        errors.into_result()?;
        Ok(cleaned)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviousNameForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
}

impl PreviousNameForm {
    pub fn clean(&self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let cleaned = Self {
            first_name: required_text(&mut errors, "first_name", &self.first_name, NAME_MAX),
            middle_name: optional_text(&mut errors, "middle_name", self.middle_name.as_deref(), Some(NAME_MAX)),
            last_name: required_text(&mut errors, "last_name", &self.last_name, NAME_MAX),
        };
        errors.into_result()?;
        Ok(cleaned)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicGroupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub founded: Option<NaiveDate>,
    #[serde(default)]
    pub disbanded: Option<NaiveDate>,
    #[serde(default)]
    pub country_id: Option<i64>,
}

impl MusicGroupForm {
    pub fn clean(&self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let cleaned = Self {
            name: required_text(&mut errors, "name", &self.name, NAME_MAX),
            bio: optional_text(&mut errors, "bio", self.bio.as_deref(), None),
            founded: self.founded,
            disbanded: self.disbanded,
            country_id: self.country_id,
        };
        validation::validate_period(
            &mut errors,
            self.founded,
            self.disbanded,
            "Founded date cannot be after disbanded date.",
        );
        errors.into_result()?;
        Ok(cleaned)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembershipForm {
    pub member_id: i64,
    pub music_group_id: i64,
    #[serde(default)]
    pub role_ids: Vec<i64>,
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
}

impl MembershipForm {
    pub fn clean(&self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validation::validate_period(
            &mut errors,
            self.from_date,
            self.to_date,
            "Start date cannot be after end date.",
        );
        errors.into_result()?;

        let mut cleaned = self.clone();
        dedup_ids(&mut cleaned.role_ids);
        Ok(cleaned)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist_ids: Vec<i64>,
    #[serde(default)]
    pub music_group_ids: Vec<i64>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub released: Option<NaiveDate>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub language_id: Option<i64>,
}

impl SongForm {
    pub fn clean(&self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if matches!(self.duration, Some(d) if d < 0) {
            errors.add("duration", "Ensure this value is greater than or equal to 0.");
        }

        let mut cleaned = Self {
            title: required_text(&mut errors, "title", &self.title, TITLE_MAX),
            artist_ids: self.artist_ids.clone(),
            music_group_ids: self.music_group_ids.clone(),
            genre_ids: self.genre_ids.clone(),
            duration: self.duration,
            released: self.released,
            summary: optional_text(&mut errors, "summary", self.summary.as_deref(), None),
            lyrics: optional_text(&mut errors, "lyrics", self.lyrics.as_deref(), None),
            language_id: self.language_id,
        };
        errors.into_result()?;

        dedup_ids(&mut cleaned.artist_ids);
        dedup_ids(&mut cleaned.music_group_ids);
        dedup_ids(&mut cleaned.genre_ids);
        Ok(cleaned)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceForm {
    pub song_id: i64,
    #[serde(default)]
    pub contributor_id: Option<i64>,
    #[serde(default)]
    pub contributor_role_id: Option<i64>,
    #[serde(default)]
    pub music_group_id: Option<i64>,
    #[serde(default)]
    pub music_group_role_id: Option<i64>,
}

impl PerformanceForm {
    pub fn clean(&self) -> Result<PerformerIds, ValidationErrors> {
        resolve_performer(
            self.contributor_id,
            self.contributor_role_id,
            self.music_group_id,
            self.music_group_role_id,
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist_ids: Vec<i64>,
    #[serde(default)]
    pub music_group_ids: Vec<i64>,
    #[serde(default)]
    pub released: Option<NaiveDate>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl AlbumForm {
    pub fn clean(&self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut cleaned = Self {
            title: required_text(&mut errors, "title", &self.title, TITLE_MAX),
            artist_ids: self.artist_ids.clone(),
            music_group_ids: self.music_group_ids.clone(),
            released: self.released,
            summary: optional_text(&mut errors, "summary", self.summary.as_deref(), None),
        };
        errors.into_result()?;

        dedup_ids(&mut cleaned.artist_ids);
        dedup_ids(&mut cleaned.music_group_ids);
        Ok(cleaned)
    }
}

/// Add a song to an album
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumTrackForm {
    pub song_id: i64,
}

/// Sort and drop repeated ids in a many-to-many selection
fn dedup_ids(ids: &mut Vec<i64>) {
    ids.sort_unstable();
    ids.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_lookup_form_normalizes() {
        let form = LookupForm {
            name: "  blues  ".to_string(),
        };
        assert_eq!(form.clean().unwrap(), "Blues");
    }

    #[test]
    fn test_lookup_form_blank() {
        let errors = LookupForm::default().clean().unwrap_err();
        assert_eq!(errors.field("name"), [validation::REQUIRED.to_string()]);
    }

    #[test]
    fn test_contributor_form_requires_names() {
        let errors = ContributorForm::default().clean(today()).unwrap_err();
        assert!(errors.has("first_name"));
        assert!(errors.has("last_name"));
    }

    #[test]
    fn test_contributor_form_birth_after_death() {
        let form = ContributorForm {
            first_name: "Xena".to_string(),
            last_name: "Warrior".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1),
            date_of_death: NaiveDate::from_ymd_opt(1999, 12, 31),
            ..Default::default()
        };
        let errors = form.clean(today()).unwrap_err();
        assert!(errors
            .form_messages()
            .contains(&"Date of birth cannot be after date of death.".to_string()));
    }

    #[test]
    fn test_contributor_form_blank_optionals() {
        let form = ContributorForm {
            first_name: " John ".to_string(),
            last_name: "Lennon".to_string(),
            middle_name: Some("".to_string()),
            stage_name: Some("  ".to_string()),
            ..Default::default()
        };
        let cleaned = form.clean(today()).unwrap();
        assert_eq!(cleaned.first_name, "John");
        assert_eq!(cleaned.middle_name, None);
        assert_eq!(cleaned.stage_name, None);
    }

    #[test]
    fn test_music_group_dates() {
        let form = MusicGroupForm {
            name: "Golden Kids".to_string(),
            founded: NaiveDate::from_ymd_opt(1971, 1, 1),
            disbanded: NaiveDate::from_ymd_opt(1970, 1, 1),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(
            errors.form_messages(),
            ["Founded date cannot be after disbanded date.".to_string()]
        );
    }

    #[test]
    fn test_song_form_negative_duration() {
        let form = SongForm {
            title: "Imagine".to_string(),
            duration: Some(-1),
            ..Default::default()
        };
        assert!(form.clean().unwrap_err().has("duration"));
    }

    #[test]
    fn test_song_form_dedups_links() {
        let form = SongForm {
            title: "Imagine".to_string(),
            genre_ids: vec![3, 1, 3],
            ..Default::default()
        };
        assert_eq!(form.clean().unwrap().genre_ids, vec![1, 3]);
    }

    #[test]
    fn test_membership_period() {
        let form = MembershipForm {
            member_id: 1,
            music_group_id: 1,
            from_date: NaiveDate::from_ymd_opt(1970, 1, 1),
            to_date: NaiveDate::from_ymd_opt(1968, 1, 1),
            ..Default::default()
        };
        assert!(form.clean().is_err());
    }

    #[test]
    fn test_performance_form_from_json() {
        let form: PerformanceForm =
            serde_json::from_str(r#"{"song_id": 1, "music_group_id": 2, "music_group_role_id": 3}"#).unwrap();
        assert_eq!(
            form.clean().unwrap(),
            PerformerIds::MusicGroup {
                music_group_id: 2,
                role_id: 3
            }
        );
    }
}
