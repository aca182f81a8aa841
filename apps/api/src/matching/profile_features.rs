//! Derives a scoreable feature record from a job seeker's profile.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::matching::normalizer::normalize;
use crate::models::profile::{EducationEntry, ExperienceEntry, Profile};

/// Recognized education tiers. `rank` is the fixed order used to pick the
/// highest tier across a profile's degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    Certificate,
    Diploma,
    Bachelor,
    Master,
    Phd,
}

impl EducationLevel {
    pub fn rank(self) -> u8 {
        match self {
            EducationLevel::Certificate => 0,
            EducationLevel::Diploma => 1,
            EducationLevel::Bachelor => 2,
            EducationLevel::Master => 3,
            EducationLevel::Phd => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EducationLevel::Certificate => "certificate",
            EducationLevel::Diploma => "diploma",
            EducationLevel::Bachelor => "bachelor",
            EducationLevel::Master => "master",
            EducationLevel::Phd => "phd",
        }
    }

    /// Detects the tier named in a degree string, highest tier first.
    /// Plain keyword containment, case-insensitive; "Master of Science"
    /// matches, an unexpanded "MSc" does not.
    fn from_degree(degree: &str) -> Option<Self> {
        let degree = degree.to_lowercase();
        [
            EducationLevel::Phd,
            EducationLevel::Master,
            EducationLevel::Bachelor,
            EducationLevel::Diploma,
            EducationLevel::Certificate,
        ]
        .into_iter()
        .find(|level| degree.contains(level.as_str()))
    }
}

/// Normalized, derived view of a profile. Recomputed whenever the source
/// profile or resume text changes; cached wholesale under one key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFeatures {
    pub subject_id: Uuid,
    /// Normalized skill keywords only (not the full keyword set).
    pub skills: BTreeSet<String>,
    pub education_records: Vec<EducationEntry>,
    pub experience_records: Vec<ExperienceEntry>,
    pub highest_education_level: Option<EducationLevel>,
    pub total_experience_years: f64,
    /// Union of every normalized text field on the profile.
    pub keyword_set: BTreeSet<String>,
}

/// Builds the feature record. Pure given the profile and the current year
/// (open-ended experience counts up to `current_year`).
pub fn build_profile_features(profile: &Profile, current_year: i32) -> ProfileFeatures {
    let mut skills = BTreeSet::new();
    for skill in &profile.skills {
        skills.extend(normalize(skill));
    }

    let mut keyword_set = skills.clone();
    for entry in &profile.education {
        if let Some(degree) = &entry.degree {
            keyword_set.extend(normalize(degree));
        }
        if let Some(institution) = &entry.institution {
            keyword_set.extend(normalize(institution));
        }
    }
    for entry in &profile.experience {
        if let Some(position) = &entry.position {
            keyword_set.extend(normalize(position));
        }
        if let Some(company) = &entry.company {
            keyword_set.extend(normalize(company));
        }
        if let Some(description) = &entry.description {
            keyword_set.extend(normalize(description));
        }
    }
    if let Some(bio) = &profile.bio {
        keyword_set.extend(normalize(bio));
    }
    if let Some(resume_text) = &profile.resume_text {
        keyword_set.extend(normalize(resume_text));
    }

    ProfileFeatures {
        subject_id: profile.subject_id,
        skills,
        highest_education_level: highest_education_level(&profile.education),
        total_experience_years: total_experience_years(&profile.experience, current_year),
        education_records: profile.education.clone(),
        experience_records: profile.experience.clone(),
        keyword_set,
    }
}

fn highest_education_level(education: &[EducationEntry]) -> Option<EducationLevel> {
    education
        .iter()
        .filter_map(|entry| entry.degree.as_deref())
        .filter_map(EducationLevel::from_degree)
        .max_by_key(|level| level.rank())
}

/// Sums experience spans. An open-ended position counts up to the current
/// year; entries with a missing start year or a negative span contribute 0,
/// never an error.
fn total_experience_years(experience: &[ExperienceEntry], current_year: i32) -> f64 {
    experience
        .iter()
        .map(|entry| {
            let Some(start) = entry.start_year else {
                return 0.0;
            };
            let end = entry.end_year.unwrap_or(current_year as f64);
            (end - start).max(0.0)
        })
        .sum()
}
