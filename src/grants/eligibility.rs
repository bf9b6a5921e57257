//! Deterministic eligibility scoring.
//!
//! Each grant stores a JSON object of eligibility rules. The scorer awards a
//! fixed weight per satisfied rule and marks the grant eligible at a total of
//! 50 or more. No model calls, no randomness — the same inputs always produce
//! the same report.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const WEIGHT_BUSINESS_TYPE: f64 = 30.0;
const WEIGHT_CATEGORY: f64 = 25.0;
const WEIGHT_SECTOR: f64 = 20.0;
const WEIGHT_REGISTRATION: f64 = 25.0;
const ELIGIBLE_THRESHOLD: f64 = 50.0;

/// Applicant answers for the eligibility check.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EligibilityRequest {
    pub business_type: Option<String>,
    pub category: Option<String>,
    pub sector: Option<String>,
    pub turnover: Option<f64>,
    pub registration: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EligibilityReport {
    pub eligible: bool,
    /// 0–100.
    pub score: f64,
    pub matching_criteria: Vec<String>,
    pub missing_criteria: Vec<String>,
    pub recommendation: String,
}

fn required_types(criteria: &Value) -> Vec<String> {
    criteria
        .get("business_type")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Score one applicant against one grant's criteria object.
pub fn evaluate(criteria: &Value, request: &EligibilityRequest) -> EligibilityReport {
    let mut score = 0.0;
    let mut matching = Vec::new();
    let mut missing = Vec::new();

    if criteria.get("business_type").is_some() {
        let required = required_types(criteria);
        match &request.business_type {
            Some(bt) if required.iter().any(|r| r == bt) => {
                matching.push(format!("Business type: {bt}"));
                score += WEIGHT_BUSINESS_TYPE;
            }
            _ => missing.push(format!(
                "Business type must be one of: {}",
                required.join(", ")
            )),
        }
    }

    if criteria.get("category").is_some() || criteria.get("owner").is_some() {
        match &request.category {
            Some(category) => {
                matching.push(format!("Category: {category}"));
                score += WEIGHT_CATEGORY;
            }
            None => missing.push("Category/ownership requirement not met".to_string()),
        }
    }

    if let Some(sector) = criteria.get("sector") {
        match &request.sector {
            Some(value) => {
                matching.push(format!("Sector: {value}"));
                score += WEIGHT_SECTOR;
            }
            None => missing.push(format!(
                "Sector requirement: {}",
                sector.as_str().unwrap_or_default()
            )),
        }
    }

    if let Some(registration) = criteria.get("registration") {
        match &request.registration {
            Some(value) => {
                matching.push(format!("Registration: {value}"));
                score += WEIGHT_REGISTRATION;
            }
            None => missing.push(format!(
                "Registration required: {}",
                registration.as_str().unwrap_or_default()
            )),
        }
    }

    let eligible = score >= ELIGIBLE_THRESHOLD;
    let recommendation = if eligible {
        format!(
            "You are eligible for this grant with a {score:.0}% match. {} criteria met.",
            matching.len()
        )
    } else {
        format!(
            "You may not be eligible. Only {score:.0}% match. Please ensure you meet: {}",
            missing
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )
    };

    EligibilityReport {
        eligible,
        score,
        matching_criteria: matching,
        missing_criteria: missing,
        recommendation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn startup_criteria() -> Value {
        json!({
            "business_type": ["startup"],
            "registration": "DPIIT Recognized Startup",
            "sector": "Technology, Innovation"
        })
    }

    #[test]
    fn full_match_scores_all_weights() {
        let request = EligibilityRequest {
            business_type: Some("startup".to_string()),
            sector: Some("Technology".to_string()),
            registration: Some("DPIIT".to_string()),
            ..Default::default()
        };
        let report = evaluate(&startup_criteria(), &request);
        assert!(report.eligible);
        assert_eq!(report.score, 75.0);
        assert_eq!(report.matching_criteria.len(), 3);
        assert!(report.missing_criteria.is_empty());
    }

    #[test]
    fn wrong_business_type_misses_its_weight() {
        let request = EligibilityRequest {
            business_type: Some("msme".to_string()),
            sector: Some("Technology".to_string()),
            registration: Some("Udyam".to_string()),
            ..Default::default()
        };
        let report = evaluate(&startup_criteria(), &request);
        assert_eq!(report.score, 45.0);
        assert!(!report.eligible);
        assert!(report.missing_criteria[0].contains("startup"));
    }

    #[test]
    fn empty_answers_score_zero_with_recommendation() {
        let report = evaluate(&startup_criteria(), &EligibilityRequest::default());
        assert_eq!(report.score, 0.0);
        assert!(!report.eligible);
        assert!(report.recommendation.starts_with("You may not be eligible"));
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let request = EligibilityRequest {
            business_type: Some("startup".to_string()),
            ..Default::default()
        };
        let a = evaluate(&startup_criteria(), &request);
        let b = evaluate(&startup_criteria(), &request);
        assert_eq!(a.score, b.score);
        assert_eq!(a.matching_criteria, b.matching_criteria);
    }
}
