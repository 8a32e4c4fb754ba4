//! Validation rules for driver responses and generated messages
//!
//! All checks are exact: no case folding, trimming or tokenization.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Causes a driver may report for a deviation
pub const ALLOWED_CAUSES: &[&str] = &["traffic", "accident", "mechanical issue", "weather", "other"];

/// Substrings that block a generated customer message
pub const BANNED_TERMS: &[&str] = &["Nazi", "Hitler", "terrorist", "bomb", "racist"];

/// Reported cause of a route anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CauseKind {
    Traffic,
    Accident,
    MechanicalIssue,
    Weather,
    Other,
}

impl CauseKind {
    pub const ALL: [CauseKind; 5] = [
        CauseKind::Traffic,
        CauseKind::Accident,
        CauseKind::MechanicalIssue,
        CauseKind::Weather,
        CauseKind::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CauseKind::Traffic => "traffic",
            CauseKind::Accident => "accident",
            CauseKind::MechanicalIssue => "mechanical issue",
            CauseKind::Weather => "weather",
            CauseKind::Other => "other",
        }
    }
}

impl fmt::Display for CauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid cause {0:?}: expected one of traffic, accident, mechanical issue, weather, other")]
pub struct InvalidCause(pub String);

impl FromStr for CauseKind {
    type Err = InvalidCause;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_cause(s) {
            return Err(InvalidCause(s.to_string()));
        }
        Ok(match s {
            "traffic" => CauseKind::Traffic,
            "accident" => CauseKind::Accident,
            "mechanical issue" => CauseKind::MechanicalIssue,
            "weather" => CauseKind::Weather,
            _ => CauseKind::Other,
        })
    }
}

impl TryFrom<String> for CauseKind {
    type Error = InvalidCause;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CauseKind> for String {
    fn from(cause: CauseKind) -> Self {
        cause.as_str().to_string()
    }
}

/// True iff `cause` is exactly one of [`ALLOWED_CAUSES`]
pub fn is_valid_cause(cause: &str) -> bool {
    ALLOWED_CAUSES.contains(&cause)
}

/// True iff `eta` is strictly later than the local clock right now
pub fn validate_eta(eta: NaiveDateTime) -> bool {
    validate_eta_at(eta, Local::now().naive_local())
}

/// True iff `eta` is strictly later than `now`
pub fn validate_eta_at(eta: NaiveDateTime, now: NaiveDateTime) -> bool {
    eta > now
}

/// True iff `text` contains any of [`BANNED_TERMS`] verbatim
pub fn contains_banned_content(text: &str) -> bool {
    BANNED_TERMS.iter().any(|term| text.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    #[test]
    fn test_allowed_causes_are_valid() {
        for cause in ALLOWED_CAUSES {
            assert!(is_valid_cause(cause), "{cause} should be valid");
        }
    }

    #[test]
    fn test_cause_matching_is_exact() {
        assert!(!is_valid_cause("Traffic"));
        assert!(!is_valid_cause(" weather"));
        assert!(!is_valid_cause("mechanical_issue"));
        assert!(!is_valid_cause(""));
    }

    #[test]
    fn test_cause_kind_round_trips_through_str() {
        for cause in CauseKind::ALL {
            assert!(is_valid_cause(cause.as_str()));
            assert_eq!(cause.as_str().parse::<CauseKind>(), Ok(cause));
        }
        assert_eq!(
            "flood".parse::<CauseKind>(),
            Err(InvalidCause("flood".to_string()))
        );
    }

    #[test]
    fn test_cause_kind_serde_uses_allow_list_strings() {
        let json = serde_json::to_string(&CauseKind::MechanicalIssue).unwrap();
        assert_eq!(json, "\"mechanical issue\"");
        assert!(serde_json::from_str::<CauseKind>("\"Weather\"").is_err());
    }

    #[test]
    fn test_validate_eta_boundary() {
        let now = Local::now().naive_local();
        assert!(!validate_eta_at(now, now));
        assert!(validate_eta_at(now + Duration::seconds(1), now));
        assert!(!validate_eta_at(now - Duration::minutes(1), now));
    }

    #[test]
    fn test_validate_eta_against_clock() {
        let now = Local::now().naive_local();
        assert!(validate_eta(now + Duration::minutes(10)));
        assert!(!validate_eta(now - Duration::minutes(1)));
    }

    #[test]
    fn test_banned_content_is_case_sensitive() {
        assert!(contains_banned_content("The Nazi regime"));
        assert!(contains_banned_content("abombination"));
        assert!(!contains_banned_content("the nazi regime"));
        assert!(!contains_banned_content("Your shipment arrives at 14:30."));
    }

    fn arb_clean_text() -> impl Strategy<Value = String> {
        "[a-z0-9 .,:]{0,80}".prop_filter("no banned terms", |s| !contains_banned_content(s))
    }

    proptest! {
        #[test]
        fn prop_unlisted_causes_rejected(cause in "[a-zA-Z ]{0,20}") {
            prop_assume!(!ALLOWED_CAUSES.contains(&cause.as_str()));
            prop_assert!(!is_valid_cause(&cause));
        }

        #[test]
        fn prop_eta_future_iff_after_now(offset in -100_000i64..100_000) {
            let now = Local::now().naive_local();
            let eta = now + Duration::seconds(offset);
            prop_assert_eq!(validate_eta_at(eta, now), offset > 0);
        }

        #[test]
        fn prop_embedded_banned_term_detected(
            prefix in arb_clean_text(),
            suffix in arb_clean_text(),
            idx in 0..BANNED_TERMS.len(),
        ) {
            let text = format!("{prefix}{}{suffix}", BANNED_TERMS[idx]);
            prop_assert!(contains_banned_content(&text));
        }

        #[test]
        fn prop_clean_text_passes(text in arb_clean_text()) {
            prop_assert!(!contains_banned_content(&text));
        }
    }
}
