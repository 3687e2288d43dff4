/// Database row types. These map directly to SQLite rows and are kept
/// separate from matchmate-types so the DB layer stays independent.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRow {
    pub uid: String,
    pub gender: String,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub cell: String,
    pub picture_large: String,
    pub picture_medium: String,
    pub picture_thumbnail: String,
    pub interaction_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub profile: ProfileRow,
    pub decided_at: String,
}
