use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use tracing::warn;
use uuid::Uuid;

/// Raw profile row as stored. Education and experience are JSONB arrays so
/// that half-filled records written by the (out-of-scope) profile CRUD never
/// break a fetch; decoding into typed entries happens per element and is
/// lenient.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub subject_id: Uuid,
    pub skills: Vec<String>,
    pub education: Value,
    pub experience: Value,
    pub bio: Option<String>,
    pub resume_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub position: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub start_year: Option<f64>,
    /// None means the position is still held.
    pub end_year: Option<f64>,
}

/// Typed profile handed to the feature builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub subject_id: Uuid,
    pub skills: Vec<String>,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub bio: Option<String>,
    pub resume_text: Option<String>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        let education = parse_entries(&row.education, "education", row.subject_id);
        let experience = parse_entries(&row.experience, "experience", row.subject_id);
        Profile {
            subject_id: row.subject_id,
            skills: row.skills,
            education,
            experience,
            bio: row.bio,
            resume_text: row.resume_text,
        }
    }
}

/// Decodes a JSONB array element-by-element, skipping entries that do not
/// decode rather than failing the whole profile.
fn parse_entries<T: serde::de::DeserializeOwned>(
    value: &Value,
    what: &str,
    subject_id: Uuid,
) -> Vec<T> {
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            warn!("Profile {subject_id}: {what} is not a JSON array, treating as empty");
        }
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Profile {subject_id}: skipping malformed {what} entry: {e}");
                None
            }
        })
        .collect()
}
