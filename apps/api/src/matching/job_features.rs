//! Derives a scoreable feature record from a job posting.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::normalizer::{normalize, stem_word};
use crate::models::job::JobRow;

/// Fixed education-term vocabulary scanned for in posting descriptions.
/// Compared in stemmed space so "degrees required" and "degree" land on the
/// same marker.
pub const EDUCATION_VOCAB: [&str; 6] = [
    "bachelor",
    "master",
    "phd",
    "degree",
    "diploma",
    "certificate",
];

/// Fixed experience-level label mapping. Unrecognized labels require nothing.
pub fn required_years_for_label(label: Option<&str>) -> f64 {
    match label.map(|l| l.trim().to_lowercase()).as_deref() {
        Some("entry-level") => 0.0,
        Some("mid-level") => 3.0,
        Some("senior") => 5.0,
        _ => 0.0,
    }
}

/// Normalized, derived view of a posting. Cached wholesale under one key and
/// replaced on the explicit job-edit invalidation hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFeatures {
    pub job_id: Uuid,
    /// Normalized posted skills. Kept on the record for explainability; the
    /// score intentionally compares applicant skills against the full
    /// keyword set instead (see the score calculator).
    pub required_skills: BTreeSet<String>,
    /// Space-separated stemmed education markers found in the description,
    /// in vocabulary order. Empty when the description names none.
    pub required_education_markers: String,
    pub required_experience_years: f64,
    /// normalized(title) ∪ normalized(description).
    pub keyword_set: BTreeSet<String>,
}

/// Builds the feature record. Pure given the posting row.
pub fn build_job_features(job: &JobRow) -> JobFeatures {
    let mut required_skills = BTreeSet::new();
    for skill in &job.skills {
        required_skills.extend(normalize(skill));
    }

    let description_tokens = normalize(&job.description);

    let markers: Vec<String> = EDUCATION_VOCAB
        .iter()
        .map(|term| stem_word(term))
        .filter(|stem| description_tokens.contains(stem))
        .collect();

    let mut keyword_set = normalize(&job.title);
    keyword_set.extend(description_tokens);

    JobFeatures {
        job_id: job.id,
        required_skills,
        required_education_markers: markers.join(" "),
        required_experience_years: required_years_for_label(job.experience_level.as_deref()),
        keyword_set,
    }
}
