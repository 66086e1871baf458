//! Risk scoring.
//!
//! The score is a weighted sum of two factors, each in `[0, 100]`:
//!
//! - **user behavior**: unknown principal, identity store failure, or the
//!   anomaly score of a known principal
//! - **time based**: a table over the local hour-of-day
//!
//! The weighted sum is clamped into `[0, 100]` because the weights are not
//! required to be normalized.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::clock::{Clock, ClockError};
use crate::config::RiskPolicy;
use crate::context::AccessContext;
use crate::lookup::IdentityLookup;

/// Policy outcome for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Allowed silently.
    Low,
    /// Allowed, logged as a warning.
    Medium,
    /// Denied.
    High,
}

/// Computes risk scores for access contexts.
#[derive(Clone)]
pub struct RiskEngine {
    policy: RiskPolicy,
    lookup: Arc<dyn IdentityLookup>,
    clock: Arc<dyn Clock>,
    lookup_timeout: Duration,
}

impl RiskEngine {
    pub fn new(
        policy: RiskPolicy,
        lookup: Arc<dyn IdentityLookup>,
        clock: Arc<dyn Clock>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            policy,
            lookup,
            clock,
            lookup_timeout,
        }
    }

    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Time-of-day score for `hour`. First matching band wins.
    #[must_use]
    pub fn time_based_risk(&self, hour: u32) -> f64 {
        self.policy
            .time_bands
            .iter()
            .find(|band| band.hours.contains(&hour))
            .map_or(self.policy.off_hours_score, |band| band.score)
    }

    /// Time-of-day score for the current local hour.
    pub fn assess_time_based_risk(&self) -> Result<f64, ClockError> {
        Ok(self.time_based_risk(self.clock.local_hour()?))
    }

    /// Behavior score for `identity_id` at the current local hour.
    ///
    /// Identity store failures never propagate; they degrade to the policy's
    /// lookup-failure score.
    pub async fn analyze_user_behavior(
        &self,
        identity_id: &str,
        context: &AccessContext,
    ) -> Result<f64, ClockError> {
        let hour = self.clock.local_hour()?;
        Ok(self.behavior_risk(hour, identity_id, context).await)
    }

    /// Weighted, clamped risk score for `context`.
    ///
    /// The clock is read once so both factors see the same hour.
    pub async fn assess_risk(&self, context: &AccessContext) -> Result<f64, ClockError> {
        let hour = self.clock.local_hour()?;

        let behavior_risk = self
            .behavior_risk(hour, &context.identity_id, context)
            .await;
        let time_risk = self.time_based_risk(hour);

        let score = (self.policy.user_behavior.apply(behavior_risk)
            + self.policy.time_based.apply(time_risk))
        .clamp(0.0, 100.0);

        tracing::info!(
            identity_id = %context.identity_id,
            risk_score = score,
            behavior_risk,
            time_risk,
            "risk assessed"
        );

        Ok(score)
    }

    /// Map a score to its policy outcome.
    #[must_use]
    pub fn classify(&self, score: f64) -> RiskLevel {
        if score > self.policy.deny_above {
            RiskLevel::High
        } else if score > self.policy.warn_above {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    async fn behavior_risk(&self, hour: u32, identity_id: &str, context: &AccessContext) -> f64 {
        match self.find_profile(identity_id).await {
            ProfileLookup::Found => self.anomaly_score(hour, context),
            ProfileLookup::NotFound => self.policy.unknown_identity_score,
            ProfileLookup::Failed => self.policy.lookup_failure_score,
        }
    }

    fn anomaly_score(&self, hour: u32, _context: &AccessContext) -> f64 {
        let mut anomaly = 0.0;
        if self.policy.late_night_hours.contains(&hour) {
            anomaly += self.policy.late_night_anomaly_score;
        }
        f64::min(anomaly, 100.0)
    }

    async fn find_profile(&self, identity_id: &str) -> ProfileLookup {
        match tokio::time::timeout(self.lookup_timeout, self.lookup.find_identity(identity_id))
            .await
        {
            Ok(Ok(Some(_))) => ProfileLookup::Found,
            Ok(Ok(None)) => ProfileLookup::NotFound,
            Ok(Err(e)) => {
                tracing::error!(identity_id = %identity_id, error = %e, "identity lookup failed");
                ProfileLookup::Failed
            }
            Err(_) => {
                tracing::error!(
                    identity_id = %identity_id,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "identity lookup timed out"
                );
                ProfileLookup::Failed
            }
        }
    }
}

enum ProfileLookup {
    Found,
    NotFound,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::context::{Identity, RequestMetadata};
    use crate::lookup::{IdentityProfile, InMemoryIdentityLookup, LookupError};
    use async_trait::async_trait;
    use mietrecht_auth::AccessClaims;

    struct FailingLookup;

    #[async_trait]
    impl IdentityLookup for FailingLookup {
        async fn find_identity(&self, _: &str) -> Result<Option<IdentityProfile>, LookupError> {
            Err(LookupError::Unavailable("connection refused".into()))
        }
    }

    struct HangingLookup;

    #[async_trait]
    impl IdentityLookup for HangingLookup {
        async fn find_identity(&self, _: &str) -> Result<Option<IdentityProfile>, LookupError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    struct BrokenClock;

    impl Clock for BrokenClock {
        fn local_hour(&self) -> Result<u32, ClockError> {
            Err(ClockError("no time source".into()))
        }
    }

    fn known_lookup() -> Arc<dyn IdentityLookup> {
        Arc::new(InMemoryIdentityLookup::from_profiles(vec![IdentityProfile {
            id: "user-1".into(),
            email: None,
            user_type: None,
        }]))
    }

    fn engine(lookup: Arc<dyn IdentityLookup>, hour: u32) -> RiskEngine {
        RiskEngine::new(
            RiskPolicy::default(),
            lookup,
            Arc::new(FixedClock::at_hour(hour).unwrap()),
            Duration::from_millis(300),
        )
    }

    fn context(identity_id: &str) -> AccessContext {
        let identity: Identity = AccessClaims::builder().subject(identity_id).build().into();
        AccessContext::new(
            &identity,
            RequestMetadata {
                network_address: "192.0.2.1".into(),
                client_descriptor: "test".into(),
                device_id: Some("d".into()),
                location: Some("Hamburg".into()),
            },
        )
    }

    #[test]
    fn test_time_based_risk_table() {
        let engine = engine(known_lookup(), 12);
        let cases = [
            (0, 25.0),
            (1, 25.0),
            (2, 40.0),
            (3, 40.0),
            (5, 40.0),
            (6, 20.0),
            (7, 20.0),
            (8, 20.0),
            (9, 10.0),
            (12, 10.0),
            (17, 10.0),
            (18, 25.0),
            (20, 25.0),
            (23, 25.0),
        ];
        for (hour, expected) in cases {
            assert_eq!(engine.time_based_risk(hour), expected, "hour {hour}");
        }
    }

    #[test]
    fn test_assess_time_based_risk_uses_clock() {
        let engine = engine(known_lookup(), 7);
        assert_eq!(engine.assess_time_based_risk(), Ok(20.0));
        assert_eq!(engine.assess_time_based_risk(), engine.assess_time_based_risk());
    }

    #[tokio::test]
    async fn test_behavior_unknown_identity() {
        for hour in [3, 12, 20] {
            let engine = engine(known_lookup(), hour);
            let score = engine
                .analyze_user_behavior("ghost", &context("ghost"))
                .await
                .unwrap();
            assert_eq!(score, 90.0);
        }
    }

    #[tokio::test]
    async fn test_behavior_lookup_failure() {
        let engine = engine(Arc::new(FailingLookup), 12);
        let score = engine
            .analyze_user_behavior("user-1", &context("user-1"))
            .await
            .unwrap();
        assert_eq!(score, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_behavior_lookup_timeout() {
        let engine = engine(Arc::new(HangingLookup), 12);
        let score = engine
            .analyze_user_behavior("user-1", &context("user-1"))
            .await
            .unwrap();
        assert_eq!(score, 50.0);
    }

    #[tokio::test]
    async fn test_behavior_known_identity() {
        let engine_day = engine(known_lookup(), 12);
        let engine_night = engine(known_lookup(), 3);

        assert_eq!(
            engine_day
                .analyze_user_behavior("user-1", &context("user-1"))
                .await
                .unwrap(),
            0.0
        );
        assert_eq!(
            engine_night
                .analyze_user_behavior("user-1", &context("user-1"))
                .await
                .unwrap(),
            20.0
        );
    }

    #[tokio::test]
    async fn test_assess_risk_scenarios() {
        assert_eq!(
            engine(known_lookup(), 12)
                .assess_risk(&context("user-1"))
                .await
                .unwrap(),
            5.0
        );
        assert_eq!(
            engine(known_lookup(), 3)
                .assess_risk(&context("user-1"))
                .await
                .unwrap(),
            30.0
        );
        assert_eq!(
            engine(known_lookup(), 3)
                .assess_risk(&context("ghost"))
                .await
                .unwrap(),
            65.0
        );
    }

    #[tokio::test]
    async fn test_assess_risk_with_failing_lookup() {
        // 50 * 0.5 + 10 * 0.5
        let score = engine(Arc::new(FailingLookup), 12)
            .assess_risk(&context("user-1"))
            .await
            .unwrap();
        assert_eq!(score, 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_assess_risk_with_hanging_lookup() {
        let score = engine(Arc::new(HangingLookup), 3)
            .assess_risk(&context("user-1"))
            .await
            .unwrap();
        assert_eq!(score, 45.0);
    }

    #[tokio::test]
    async fn test_behavior_matches_weighted_assessment() {
        for hour in 0..24 {
            for id in ["user-1", "ghost"] {
                let engine = engine(known_lookup(), hour);
                let behavior = engine
                    .analyze_user_behavior(id, &context(id))
                    .await
                    .unwrap();
                let expected =
                    (behavior * 0.5 + engine.time_based_risk(hour) * 0.5).clamp(0.0, 100.0);
                assert_eq!(engine.assess_risk(&context(id)).await.unwrap(), expected);
            }
        }
    }

    #[tokio::test]
    async fn test_assess_risk_clamps_unnormalized_weights() {
        let mut policy = RiskPolicy::default();
        policy.user_behavior.weight = 1.0;
        policy.time_based.weight = 1.0;
        let engine = RiskEngine::new(
            policy,
            known_lookup(),
            Arc::new(FixedClock::at_hour(3).unwrap()),
            Duration::from_millis(300),
        );

        // 90 + 40 before clamping
        let score = engine.assess_risk(&context("ghost")).await.unwrap();
        assert_eq!(score, 100.0);

        for hour in 0..24 {
            let engine = RiskEngine::new(
                engine.policy().clone(),
                known_lookup(),
                Arc::new(FixedClock::at_hour(hour).unwrap()),
                Duration::from_millis(300),
            );
            for id in ["user-1", "ghost"] {
                let score = engine.assess_risk(&context(id)).await.unwrap();
                assert!((0.0..=100.0).contains(&score));
            }
        }
    }

    #[tokio::test]
    async fn test_assess_risk_clock_failure() {
        let engine = RiskEngine::new(
            RiskPolicy::default(),
            known_lookup(),
            Arc::new(BrokenClock),
            Duration::from_millis(300),
        );
        assert!(engine.assess_risk(&context("user-1")).await.is_err());
    }

    #[test]
    fn test_classify_thresholds() {
        let engine = engine(known_lookup(), 12);
        assert_eq!(engine.classify(0.0), RiskLevel::Low);
        assert_eq!(engine.classify(50.0), RiskLevel::Low);
        assert_eq!(engine.classify(50.5), RiskLevel::Medium);
        assert_eq!(engine.classify(80.0), RiskLevel::Medium);
        assert_eq!(engine.classify(80.5), RiskLevel::High);
        assert_eq!(engine.classify(100.0), RiskLevel::High);
    }
}
