//! Album track-order validation
//!
//! A reorder submission carries one value per track, keyed by the album-song
//! id (`order_<album_song_id>` form fields). The whole submission is accepted
//! or rejected; the database write lives in [`crate::db::albums`].

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::db::models::AlbumTrack;

/// Form field prefix for per-track order values
pub const ORDER_FIELD_PREFIX: &str = "order_";

pub const DUPLICATE_ORDER: &str = "Duplicate order numbers are not allowed";

/// Pick `order_<id>` fields out of a submitted form
///
/// Other fields are ignored. Keys with a non-numeric id are ignored too;
/// they cannot name a track.
pub fn parse_order_fields(fields: &HashMap<String, String>) -> BTreeMap<i64, String> {
    fields
        .iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix(ORDER_FIELD_PREFIX)?.parse::<i64>().ok()?;
            Some((id, value.clone()))
        })
        .collect()
}

/// Check a submission against the album's current tracks
///
/// Returns `(album_song_id, order)` pairs when every track has a distinct
/// value in `1..=N`; otherwise the distinct violation messages in the order
/// they were found.
pub fn validate_track_order(
    tracks: &[AlbumTrack],
    submitted: &BTreeMap<i64, String>,
) -> Result<Vec<(i64, i64)>, Vec<String>> {
    let total = tracks.len() as i64;
    let mut messages: Vec<String> = Vec::new();
    let mut push = |message: String| {
        if !messages.contains(&message) {
            messages.push(message);
        }
    };

    let mut seen = HashSet::new();
    let mut assignments = Vec::with_capacity(tracks.len());

    for track in tracks {
        let raw = match submitted.get(&track.album_song_id).map(|v| v.trim()) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                push(format!("Missing order for '{}'.", track.title));
                continue;
            }
        };

        let order = match raw.parse::<i64>() {
            Ok(order) => order,
            Err(_) => {
                push(format!("Invalid order value for '{}'.", track.title));
                continue;
            }
        };

        if !(1..=total).contains(&order) {
            push(format!(
                "Order for '{}' must be between 1 and {}.",
                track.title, total
            ));
            continue;
        }

        if !seen.insert(order) {
            push(DUPLICATE_ORDER.to_string());
            continue;
        }

        assignments.push((track.album_song_id, order));
    }

    let known: HashSet<i64> = tracks.iter().map(|t| t.album_song_id).collect();
    for id in submitted.keys().filter(|id| !known.contains(id)) {
        push(format!("Unknown track id {}.", id));
    }

    if messages.is_empty() {
        Ok(assignments)
    } else {
        Err(messages)
    }
}
