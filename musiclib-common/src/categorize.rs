//! Credit grouping for song, album and contributor pages
//!
//! All functions take performances that were already loaded and do a single
//! pass with map accumulation. Nothing here touches the database.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::db::models::{ContributorRef, MusicGroupRef, Performer, RoleCategory, SongPerformance, SongRef};

/// How roles of one contributor are merged inside a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleMerge {
    /// Keep the order roles were first seen in (song pages)
    FirstSeen,
    /// Sort role names alphabetically (album pages)
    Sorted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorCredit {
    pub contributor: ContributorRef,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCredits {
    pub category: RoleCategory,
    pub label: &'static str,
    pub contributors: Vec<ContributorCredit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleGroups {
    pub role: String,
    pub music_groups: Vec<MusicGroupRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongCredit {
    pub song: SongRef,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySongs {
    pub category: RoleCategory,
    pub label: &'static str,
    pub songs: Vec<SongCredit>,
}

/// Person credits grouped by role category
///
/// Each contributor appears once per category with every role they hold in it.
/// Categories follow [`RoleCategory`] order; contributors keep first-seen order.
pub fn contributors_by_category(performances: &[SongPerformance], merge: RoleMerge) -> Vec<CategoryCredits> {
    let mut by_category: BTreeMap<RoleCategory, Vec<ContributorCredit>> = BTreeMap::new();

    for performance in performances {
        let Performer::Contributor { contributor, role } = &performance.performer else {
            continue;
        };

        let credits = by_category.entry(role.category).or_default();
        match credits.iter_mut().find(|c| c.contributor.id == contributor.id) {
            Some(credit) => {
                if !credit.roles.contains(&role.name) {
                    credit.roles.push(role.name.clone());
                }
            }
            None => credits.push(ContributorCredit {
                contributor: contributor.clone(),
                roles: vec![role.name.clone()],
            }),
        }
    }

    by_category
        .into_iter()
        .map(|(category, mut contributors)| {
            if merge == RoleMerge::Sorted {
                for credit in &mut contributors {
                    credit.roles.sort();
                }
            }
            CategoryCredits {
                category,
                label: category.label(),
                contributors,
            }
        })
        .collect()
}

/// Group credits keyed by music group role name, groups de-duplicated per role
pub fn groups_by_role(performances: &[SongPerformance]) -> Vec<RoleGroups> {
    let mut roles: Vec<RoleGroups> = Vec::new();

    for performance in performances {
        let Performer::MusicGroup { music_group, role } = &performance.performer else {
            continue;
        };

        let index = match roles.iter().position(|r| r.role == role.name) {
            Some(index) => index,
            None => {
                roles.push(RoleGroups {
                    role: role.name.clone(),
                    music_groups: Vec::new(),
                });
                roles.len() - 1
            }
        };

        let groups = &mut roles[index].music_groups;
        if !groups.iter().any(|g| g.id == music_group.id) {
            groups.push(music_group.clone());
        }
    }

    roles
}

/// Distinct music groups credited anywhere, in first-seen order
pub fn involved_music_groups(performances: &[SongPerformance]) -> Vec<MusicGroupRef> {
    let mut seen = HashSet::new();
    performances
        .iter()
        .filter_map(|p| match &p.performer {
            Performer::MusicGroup { music_group, .. } => Some(music_group),
            Performer::Contributor { .. } => None,
        })
        .filter(|g| seen.insert(g.id))
        .cloned()
        .collect()
}

/// A contributor's songs bucketed by the category of the role they held
pub fn songs_grouped_by_category(performances: &[SongPerformance]) -> Vec<CategorySongs> {
    let mut by_category: BTreeMap<RoleCategory, Vec<SongCredit>> = BTreeMap::new();

    for performance in performances {
        if let Performer::Contributor { role, .. } = &performance.performer {
            by_category.entry(role.category).or_default().push(SongCredit {
                song: performance.song.clone(),
                role: role.name.clone(),
            });
        }
    }

    by_category
        .into_iter()
        .map(|(category, songs)| CategorySongs {
            category,
            label: category.label(),
            songs,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ContributorRole, MusicGroupRole};

    fn song(id: i64) -> SongRef {
        SongRef {
            id,
            title: format!("Song {}", id),
        }
    }

    fn person(id: i64, song_id: i64, name: &str, role: &str, category: RoleCategory) -> SongPerformance {
        SongPerformance {
            id: id * 100 + song_id,
            song: song(song_id),
            performer: Performer::Contributor {
                contributor: ContributorRef {
                    id,
                    name: name.to_string(),
                },
                role: ContributorRole {
                    id: role.len() as i64,
                    name: role.to_string(),
                    category,
                },
            },
        }
    }

    fn group(id: i64, song_id: i64, name: &str, role: &str) -> SongPerformance {
        SongPerformance {
            id: 10_000 + id * 100 + song_id,
            song: song(song_id),
            performer: Performer::MusicGroup {
                music_group: MusicGroupRef {
                    id,
                    name: name.to_string(),
                },
                role: MusicGroupRole {
                    id: role.len() as i64,
                    name: role.to_string(),
                },
            },
        }
    }

    #[test]
    fn test_same_category_roles_are_merged() {
        let performances = vec![
            person(1, 1, "Karel Gott", "Singer", RoleCategory::Performer),
            person(1, 1, "Karel Gott", "Guitar", RoleCategory::Performer),
        ];

        let categories = contributors_by_category(&performances, RoleMerge::FirstSeen);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category, RoleCategory::Performer);
        assert_eq!(categories[0].contributors.len(), 1);
        assert_eq!(categories[0].contributors[0].roles, vec!["Singer", "Guitar"]);
    }

    #[test]
    fn test_repeated_role_not_duplicated() {
        let performances = vec![
            person(1, 1, "A", "Singer", RoleCategory::Performer),
            person(1, 2, "A", "Singer", RoleCategory::Performer),
        ];
        let categories = contributors_by_category(&performances, RoleMerge::FirstSeen);
        assert_eq!(categories[0].contributors[0].roles, vec!["Singer"]);
    }

    #[test]
    fn test_contributor_listed_in_each_category() {
        let performances = vec![
            person(1, 1, "A", "Singer", RoleCategory::Performer),
            person(1, 1, "A", "Lyricist", RoleCategory::Writer),
            person(2, 1, "B", "Mixing", RoleCategory::Producer),
        ];
        let categories = contributors_by_category(&performances, RoleMerge::FirstSeen);
        let order: Vec<_> = categories.iter().map(|c| c.category).collect();
        assert_eq!(
            order,
            vec![RoleCategory::Writer, RoleCategory::Performer, RoleCategory::Producer]
        );
        assert_eq!(categories[0].label, "Writer");
    }

    #[test]
    fn test_album_merge_sorts_roles() {
        let performances = vec![
            person(1, 1, "A", "Vocals", RoleCategory::Performer),
            person(1, 2, "A", "Bass", RoleCategory::Performer),
        ];
        let categories = contributors_by_category(&performances, RoleMerge::Sorted);
        assert_eq!(categories[0].contributors[0].roles, vec!["Bass", "Vocals"]);
    }

    #[test]
    fn test_group_credits_ignored_by_contributor_grouping() {
        let performances = vec![group(1, 1, "Golden Kids", "Band")];
        assert!(contributors_by_category(&performances, RoleMerge::FirstSeen).is_empty());
        assert!(songs_grouped_by_category(&performances).is_empty());
    }

    #[test]
    fn test_groups_by_role_dedupes_within_role() {
        let performances = vec![
            group(1, 1, "Golden Kids", "Band"),
            group(1, 2, "Golden Kids", "Band"),
            group(2, 1, "Olympic", "Band"),
            group(1, 3, "Golden Kids", "Backing"),
        ];

        let roles = groups_by_role(&performances);
        assert_eq!(roles.len(), 2);
        assert_eq!(roles[0].role, "Band");
        let names: Vec<_> = roles[0].music_groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Golden Kids", "Olympic"]);
        assert_eq!(roles[1].role, "Backing");
        assert_eq!(roles[1].music_groups.len(), 1);
    }

    #[test]
    fn test_involved_music_groups_distinct() {
        let performances = vec![
            group(2, 1, "Olympic", "Band"),
            person(1, 1, "A", "Singer", RoleCategory::Performer),
            group(1, 1, "Golden Kids", "Band"),
            group(2, 2, "Olympic", "Backing"),
        ];
        let ids: Vec<_> = involved_music_groups(&performances).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_songs_grouped_by_category() {
        let performances = vec![
            person(1, 1, "A", "Singer", RoleCategory::Performer),
            person(1, 2, "A", "Composer", RoleCategory::Writer),
            person(1, 3, "A", "Singer", RoleCategory::Performer),
        ];
        let categories = songs_grouped_by_category(&performances);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, RoleCategory::Writer);
        assert_eq!(categories[1].songs.len(), 2);
        assert_eq!(categories[1].songs[1].song.id, 3);
    }
}
