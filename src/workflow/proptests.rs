//! Property-based tests for the workflow
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::ETA_ADJUSTMENT_MINUTES;
use super::*;
use crate::audit::DRIVER_RESPONSE;
use crate::signals::{TRAFFIC_DELAY_MINUTES, WEATHER_DELAY_MINUTES};
use crate::validation::CauseKind;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap()
}

fn arb_stage() -> impl Strategy<Value = WorkflowStage> {
    prop_oneof![
        Just(WorkflowStage::Idle),
        Just(WorkflowStage::DriverChat),
        Just(WorkflowStage::CustomerChat),
    ]
}

fn arb_cause() -> impl Strategy<Value = CauseKind> {
    prop::sample::select(CauseKind::ALL.to_vec())
}

fn arb_support() -> impl Strategy<Value = SupportNeeded> {
    prop_oneof![Just(SupportNeeded::None), Just(SupportNeeded::TruckReplacement)]
}

fn arb_report() -> impl Strategy<Value = AnomalyReport> {
    ("[A-Z][a-z]{2,10}", "[A-Z][a-z]{2,10}").prop_map(|(origin, destination)| AnomalyReport {
        origin,
        destination,
        anomaly_timestamp: "2026-10-19T08:00:00".to_string(),
    })
}

/// Driver response whose base ETA is `offset` minutes from [`fixed_now`]
fn arb_response(offset: std::ops::Range<i64>) -> impl Strategy<Value = DriverResponse> {
    (arb_cause(), "Route [A-Z]", offset, arb_support()).prop_map(
        |(cause, new_route, minutes, support_needed)| DriverResponse {
            cause,
            new_route,
            base_eta: fixed_now() + Duration::minutes(minutes),
            support_needed,
        },
    )
}

fn arb_submission(offset: std::ops::Range<i64>) -> impl Strategy<Value = Event> {
    (arb_response(offset), TRAFFIC_DELAY_MINUTES, WEATHER_DELAY_MINUTES).prop_map(
        |(response, traffic_delay_minutes, weather_delay_minutes)| {
            Event::DriverResponseSubmitted {
                response,
                now: fixed_now(),
                traffic_delay_minutes,
                weather_delay_minutes,
            }
        },
    )
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_report().prop_map(|report| Event::StartDriverChat { report }),
        arb_submission(-120..120),
        Just(Event::CustomerMessageRequested),
        "[a-zA-Z ]{0,40}".prop_map(|text| Event::CustomerMessageGenerated { text }),
    ]
}

fn stage_rank(stage: WorkflowStage) -> u8 {
    match stage {
        WorkflowStage::Idle => 0,
        WorkflowStage::DriverChat => 1,
        WorkflowStage::CustomerChat => 2,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Stages never move backward, whatever the event
    #[test]
    fn prop_stage_never_regresses(stage in arb_stage(), event in arb_event()) {
        if let Ok(result) = transition(stage, &WorkflowContext::default(), event) {
            prop_assert!(stage_rank(result.new_stage) >= stage_rank(stage));
        }
    }

    /// Accepted submissions land inside the delay envelope and audit exactly once
    #[test]
    fn prop_accepted_eta_within_envelope(event in arb_submission(1..600)) {
        let Event::DriverResponseSubmitted { response, .. } = &event else {
            unreachable!()
        };
        let base = response.base_eta;

        let result = transition(WorkflowStage::DriverChat, &WorkflowContext::default(), event)
            .expect("future ETA must be accepted");

        prop_assert_eq!(result.new_stage, WorkflowStage::CustomerChat);
        let audits = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::LogAudit { event_type: DRIVER_RESPONSE, .. }))
            .count();
        prop_assert_eq!(audits, 1);

        let outcome = result.effects.iter().find_map(|e| match e {
            Effect::RecordOutcome { outcome } => Some(outcome),
            _ => None,
        });
        let outcome = outcome.expect("outcome recorded");
        let earliest = base + Duration::minutes(ETA_ADJUSTMENT_MINUTES + 5);
        let latest = base + Duration::minutes(ETA_ADJUSTMENT_MINUTES + 20 + 15);
        prop_assert!(outcome.validated_eta >= earliest);
        prop_assert!(outcome.validated_eta <= latest);
    }

    /// ETAs at or before now are refused
    #[test]
    fn prop_past_eta_rejected(event in arb_submission(-600..1)) {
        let result = transition(WorkflowStage::DriverChat, &WorkflowContext::default(), event);
        let is_eta_error = matches!(result, Err(TransitionError::EtaNotInFuture { .. }));
        prop_assert!(is_eta_error);
    }

    /// Banned text never produces a display effect
    #[test]
    fn prop_banned_text_never_displayed(
        prefix in "[a-z ]{0,20}",
        idx in 0..crate::validation::BANNED_TERMS.len(),
    ) {
        let text = format!("{prefix}{}", crate::validation::BANNED_TERMS[idx]);
        let result = transition(
            WorkflowStage::CustomerChat,
            &WorkflowContext::default(),
            Event::CustomerMessageGenerated { text },
        );
        prop_assert_eq!(result.unwrap_err(), TransitionError::BannedContent);
    }
}
