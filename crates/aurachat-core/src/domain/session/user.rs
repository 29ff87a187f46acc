//! User entity and related types

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// A user record as held by the client
///
/// Server-backed users come off the wire with a numeric id; demo users carry
/// a locally synthesized `demo_<millis>` id. Both are held as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    #[serde(default)]
    pub posts: u32,
    #[serde(default, skip_serializing_if = "is_false", rename = "isDemo")]
    pub is_demo: bool,
}

impl User {
    /// Synthesize a local-only demo user
    ///
    /// The id is derived from the current time so repeated demo logins get
    /// distinct identities. No network is involved.
    pub fn demo(display_name: Option<&str>) -> Self {
        let name = display_name
            .map(str::trim)
            .filter(|s| !s.is_empty());
        Self {
            id: format!("demo_{}", Utc::now().timestamp_millis()),
            username: name.unwrap_or("DemoUser").to_string(),
            email: format!("{}@demo.local", name.unwrap_or("demo")),
            full_name: None,
            bio: Some("This is a demo account".to_string()),
            profile_picture: Some("default.jpg".to_string()),
            created_at: None,
            last_seen: None,
            followers: 0,
            following: 0,
            posts: 0,
            is_demo: true,
        }
    }

    /// Shallow-merge a patch into this record
    ///
    /// Only the fields present in the patch change; id is never touched.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(full_name) = patch.full_name {
            self.full_name = Some(full_name);
        }
        if let Some(bio) = patch.bio {
            self.bio = Some(bio);
        }
        if let Some(profile_picture) = patch.profile_picture {
            self.profile_picture = Some(profile_picture);
        }
    }
}

/// Partial user update applied by [`super::SessionManager::update_user`]
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Accept a user id serialized as either a number or a string
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Num(i64),
        Text(String),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Num(n) => n.to_string(),
        IdRepr::Text(s) => s,
    })
}
