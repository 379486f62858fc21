//! Database models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::format;
use crate::{Error, Result};

/// Genre, country or language: a named row in a lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lookup {
    pub id: i64,
    pub name: String,
}

/// Grouping bucket of a contributor role
///
/// Declaration order is the display order of credit sections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RoleCategory {
    Writer,
    Performer,
    Producer,
    Publisher,
    #[default]
    Other,
}

impl RoleCategory {
    pub const ALL: [RoleCategory; 5] = [
        RoleCategory::Writer,
        RoleCategory::Performer,
        RoleCategory::Producer,
        RoleCategory::Publisher,
        RoleCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCategory::Writer => "writer",
            RoleCategory::Performer => "performer",
            RoleCategory::Producer => "producer",
            RoleCategory::Publisher => "publisher",
            RoleCategory::Other => "other",
        }
    }

    /// Human-readable heading
    pub fn label(&self) -> &'static str {
        match self {
            RoleCategory::Writer => "Writer",
            RoleCategory::Performer => "Performer",
            RoleCategory::Producer => "Producer",
            RoleCategory::Publisher => "Publisher",
            RoleCategory::Other => "Other",
        }
    }
}

impl fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RoleCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown role category: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContributorRole {
    pub id: i64,
    pub name: String,
    pub category: RoleCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MusicGroupRole {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contributor {
    pub id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub stage_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub country_id: Option<i64>,
    pub bio: Option<String>,
}

impl Contributor {
    pub fn display_name(&self) -> String {
        format::contributor_name(&self.first_name, &self.last_name, self.stage_name.as_deref())
    }

    pub fn display_more(&self) -> String {
        format::contributor_display_more(
            &self.first_name,
            self.middle_name.as_deref(),
            &self.last_name,
            self.stage_name.as_deref(),
            self.date_of_birth,
            self.date_of_death,
        )
    }

    pub fn to_ref(&self) -> ContributorRef {
        ContributorRef {
            id: self.id,
            name: self.display_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContributorPreviousName {
    pub id: i64,
    pub contributor_id: i64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MusicGroup {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub founded: Option<NaiveDate>,
    pub disbanded: Option<NaiveDate>,
    pub country_id: Option<i64>,
}

impl MusicGroup {
    pub fn to_ref(&self) -> MusicGroupRef {
        MusicGroupRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Contributor ↔ music group link with its active period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: i64,
    pub member: ContributorRef,
    pub music_group: MusicGroupRef,
    pub roles: Vec<ContributorRole>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub active_period: String,
}

impl Membership {
    /// Role names joined with ", "
    pub fn display_roles(&self) -> String {
        self.roles
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Song {
    pub id: i64,
    pub title: String,
    /// Duration in seconds
    pub duration: Option<i64>,
    pub released: Option<NaiveDate>,
    pub summary: Option<String>,
    pub lyrics: Option<String>,
    pub language_id: Option<i64>,
}

impl Song {
    pub fn duration_formatted(&self) -> Option<String> {
        self.duration.map(format::format_seconds)
    }

    pub fn to_ref(&self) -> SongRef {
        SongRef {
            id: self.id,
            title: self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub released: Option<NaiveDate>,
    pub summary: Option<String>,
    /// Path relative to the media root, e.g. `album_covers/<uuid>.jpg`
    pub cover_image: Option<String>,
}

impl Album {
    pub fn to_ref(&self) -> AlbumRef {
        AlbumRef {
            id: self.id,
            title: self.title.clone(),
        }
    }
}

/// One row of an album's track list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlbumTrack {
    pub album_song_id: i64,
    pub track_order: Option<i64>,
    pub song_id: i64,
    pub title: String,
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContributorRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct MusicGroupRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct SongRef {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlbumRef {
    pub id: i64,
    pub title: String,
}

/// Who is credited on a performance
///
/// Exactly one side is present, each with its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Performer {
    Contributor {
        contributor: ContributorRef,
        role: ContributorRole,
    },
    MusicGroup {
        music_group: MusicGroupRef,
        role: MusicGroupRole,
    },
}

impl Performer {
    pub fn name(&self) -> &str {
        match self {
            Performer::Contributor { contributor, .. } => &contributor.name,
            Performer::MusicGroup { music_group, .. } => &music_group.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongPerformance {
    pub id: i64,
    pub song: SongRef,
    pub performer: Performer,
}

impl fmt::Display for SongPerformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.performer.name(), self.song.title)
    }
}

/// Flat join row behind [`SongPerformance`]
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PerformanceRow {
    pub id: i64,
    pub song_id: i64,
    pub song_title: String,
    pub contributor_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub stage_name: Option<String>,
    pub contributor_role_id: Option<i64>,
    pub contributor_role_name: Option<String>,
    pub contributor_role_category: Option<RoleCategory>,
    pub music_group_id: Option<i64>,
    pub music_group_name: Option<String>,
    pub music_group_role_id: Option<i64>,
    pub music_group_role_name: Option<String>,
}

impl TryFrom<PerformanceRow> for SongPerformance {
    type Error = Error;

    fn try_from(row: PerformanceRow) -> Result<Self> {
        let song = SongRef {
            id: row.song_id,
            title: row.song_title,
        };

        let performer = match (
            row.contributor_id,
            row.contributor_role_id,
            row.music_group_id,
            row.music_group_role_id,
        ) {
            (Some(contributor_id), Some(role_id), None, None) => Performer::Contributor {
                contributor: ContributorRef {
                    id: contributor_id,
                    name: format::contributor_name(
                        row.first_name.as_deref().unwrap_or_default(),
                        row.last_name.as_deref().unwrap_or_default(),
                        row.stage_name.as_deref(),
                    ),
                },
                role: ContributorRole {
                    id: role_id,
                    name: row.contributor_role_name.unwrap_or_default(),
                    category: row.contributor_role_category.unwrap_or_default(),
                },
            },
            (None, None, Some(music_group_id), Some(role_id)) => Performer::MusicGroup {
                music_group: MusicGroupRef {
                    id: music_group_id,
                    name: row.music_group_name.unwrap_or_default(),
                },
                role: MusicGroupRole {
                    id: role_id,
                    name: row.music_group_role_name.unwrap_or_default(),
                },
            },
            _ => {
                return Err(Error::Internal(format!(
                    "Song performance {} has an inconsistent performer",
                    row.id
                )))
            }
        };

        Ok(SongPerformance {
            id: row.id,
            song,
            performer,
        })
    }
}
