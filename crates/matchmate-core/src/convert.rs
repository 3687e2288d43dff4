//! Mapping between store rows and domain models.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use matchmate_db::models::{HistoryRow, ProfileRow};
use matchmate_types::models::{HistoryProfile, InteractionStatus, Profile};

pub fn profile_to_row(profile: &Profile) -> ProfileRow {
    ProfileRow {
        uid: profile.uid.clone(),
        gender: profile.gender.clone(),
        first_name: profile.first_name.clone(),
        last_name: profile.last_name.clone(),
        city: profile.city.clone(),
        state: profile.state.clone(),
        phone: profile.phone.clone(),
        cell: profile.cell.clone(),
        picture_large: profile.picture_large.clone(),
        picture_medium: profile.picture_medium.clone(),
        picture_thumbnail: profile.picture_thumbnail.clone(),
        interaction_status: profile.interaction_status.as_str().to_string(),
    }
}

pub fn row_to_profile(row: ProfileRow) -> Profile {
    let interaction_status = row.interaction_status.parse().unwrap_or_else(|e| {
        warn!("Corrupt status on profile '{}': {}", row.uid, e);
        InteractionStatus::Unseen
    });

    Profile {
        uid: row.uid,
        gender: row.gender,
        first_name: row.first_name,
        last_name: row.last_name,
        city: row.city,
        state: row.state,
        phone: row.phone,
        cell: row.cell,
        picture_large: row.picture_large,
        picture_medium: row.picture_medium,
        picture_thumbnail: row.picture_thumbnail,
        interaction_status,
    }
}

pub fn row_to_history(row: HistoryRow) -> HistoryProfile {
    let decided_at = parse_sqlite_timestamp(&row.decided_at).unwrap_or_else(|| {
        warn!("Corrupt decided_at '{}' on history '{}'", row.decided_at, row.profile.uid);
        DateTime::default()
    });

    HistoryProfile {
        profile: row_to_profile(row.profile),
        decided_at,
    }
}

/// SQLite's `datetime('now')` has no timezone; treat it as UTC.
fn parse_sqlite_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}
