use serde::{Deserialize, Serialize};

use crate::models::{InteractionStatus, Profile};

// -- randomuser.me response --

/// Top-level body of `GET /api/?results=N`. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub results: Vec<UserProfileResponse>,
    #[serde(default)]
    pub info: Option<ResponseInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseInfo {
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub results: Option<u32>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub email: String,
    pub gender: String,
    pub name: Name,
    pub location: Location,
    pub id: Id,
    pub phone: String,
    pub cell: String,
    pub picture: Picture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Name {
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
}

/// National id. Both halves are null for some nationalities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Picture {
    pub large: String,
    pub medium: String,
    pub thumbnail: String,
}

impl UserProfileResponse {
    /// The API id when it has one, otherwise the email.
    pub fn unique_id(&self) -> String {
        self.id
            .value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.email)
            .to_string()
    }

    pub fn into_profile(self) -> Profile {
        Profile {
            uid: self.unique_id(),
            gender: self.gender,
            first_name: self.name.first,
            last_name: self.name.last,
            city: self.location.city,
            state: self.location.state,
            phone: self.phone,
            cell: self.cell,
            picture_large: self.picture.large,
            picture_medium: self.picture.medium,
            picture_thumbnail: self.picture.thumbnail,
            interaction_status: InteractionStatus::Unseen,
        }
    }
}
