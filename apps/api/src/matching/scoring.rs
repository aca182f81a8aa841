//! Weighted fit scoring between a profile feature record and a job feature
//! record. Pure and deterministic; everything the admission decision uses is
//! in the returned breakdown.

use serde::{Deserialize, Serialize};

use crate::matching::job_features::JobFeatures;
use crate::matching::profile_features::{EducationLevel, ProfileFeatures};
use std::collections::BTreeSet;

// ────────────────────────────────────────────────────────────────────────────
// Weights and threshold
// ────────────────────────────────────────────────────────────────────────────

pub const QUALIFY_THRESHOLD: i32 = 40;

const KEYWORD_WEIGHT: f64 = 0.4;
const SKILLS_WEIGHT: f64 = 0.3;
const EDUCATION_WEIGHT: f64 = 0.15;
const EXPERIENCE_WEIGHT: f64 = 0.15;

// ────────────────────────────────────────────────────────────────────────────
// Result types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub keyword_match: f64,
    pub skills_match: f64,
    pub education_match: f64,
    pub experience_match: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Rounded weighted total, 0..=100.
    pub score: i32,
    pub breakdown: ScoreBreakdown,
    /// score >= QUALIFY_THRESHOLD.
    pub qualified: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Combines the four sub-scores into a MatchResult. Safe to cache keyed by
/// (subject, job): same inputs always produce the same output.
pub fn compute_match(profile: &ProfileFeatures, job: &JobFeatures) -> MatchResult {
    let keyword_match = overlap_score(&profile.keyword_set, &job.keyword_set);
    // Applicant skills are held against the job's full keyword set, not its
    // posted skill subset.
    let skills_match = overlap_score(&profile.skills, &job.keyword_set);
    let education_match = education_score(
        profile.highest_education_level,
        &job.required_education_markers,
    );
    let experience_match = experience_score(
        profile.total_experience_years,
        job.required_experience_years,
    );

    let weighted = KEYWORD_WEIGHT * keyword_match
        + SKILLS_WEIGHT * skills_match
        + EDUCATION_WEIGHT * education_match
        + EXPERIENCE_WEIGHT * experience_match;
    let score = weighted.round() as i32;

    MatchResult {
        score,
        qualified: score >= QUALIFY_THRESHOLD,
        breakdown: ScoreBreakdown {
            keyword_match,
            skills_match,
            education_match,
            experience_match,
        },
    }
}

/// `100 * |have ∩ want| / |want|`; 0 when the job side is empty.
fn overlap_score(have: &BTreeSet<String>, want: &BTreeSet<String>) -> f64 {
    if want.is_empty() {
        return 0.0;
    }
    let hits = want.iter().filter(|token| have.contains(*token)).count();
    100.0 * hits as f64 / want.len() as f64
}

/// Binary: 100 when the held level's name contains the marker string. Both
/// sides are lowercase already. An empty marker string matches any profile,
/// including one with no recognized degree.
fn education_score(level: Option<EducationLevel>, markers: &str) -> f64 {
    let held = level.map(EducationLevel::as_str).unwrap_or("");
    if held.contains(markers) {
        100.0
    } else {
        0.0
    }
}

/// 100 once the requirement is met, otherwise proportional credit. The zero
/// guard is unreachable while requirements are non-negative (0 required is
/// always met) but kept so a bad label mapping can never divide by zero.
fn experience_score(profile_years: f64, required_years: f64) -> f64 {
    if profile_years >= required_years {
        100.0
    } else if required_years > 0.0 {
        100.0 * profile_years / required_years
    } else {
        0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
