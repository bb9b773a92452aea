use std::sync::Arc;

use chrono::NaiveTime;
use tracing::debug;
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::scheduling::{AvailabilityRule, DayOfWeek};

use crate::models::{AvailabilityError, RuleConflict, RuleDraft};

/// Half-open interval intersection: `[s1, e1)` and `[s2, e2)` share at least one instant.
pub fn windows_overlap(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

/// Existing rules a draft would collide with.
///
/// A draft pinned to a pharmacist is only compared with that pharmacist's rules. An
/// unassigned draft is compared with every rule, since any pharmacist may take it.
pub fn find_conflicts(
    days: &[DayOfWeek],
    start_time: NaiveTime,
    end_time: NaiveTime,
    staff_id: Option<Uuid>,
    existing: &[AvailabilityRule],
) -> Vec<RuleConflict> {
    existing
        .iter()
        .filter(|rule| rule.active())
        .filter(|rule| days.contains(&rule.day_of_week))
        .filter(|rule| staff_id.is_none() || rule.staff_id == staff_id)
        .filter(|rule| windows_overlap(start_time, end_time, rule.start_time, rule.end_time))
        .map(RuleConflict::from_rule)
        .collect()
}

/// Checks a draft against the service's stored rules. Pure over (draft, rules).
pub fn validate_draft(draft: &RuleDraft, existing: &[AvailabilityRule]) -> Result<Vec<DayOfWeek>, AvailabilityError> {
    let days = draft.validate()?;
    let conflicts = find_conflicts(&days, draft.start_time, draft.end_time, draft.staff_id, existing);
    if !conflicts.is_empty() {
        return Err(AvailabilityError::RuleConflicts(conflicts));
    }
    Ok(days)
}

pub struct OverlapDetector {
    store: Arc<dyn SchedulingStore>,
}

impl OverlapDetector {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Fetches the current active rules and runs `validate_draft` against them.
    pub async fn check(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        draft: &RuleDraft,
    ) -> Result<Vec<DayOfWeek>, AvailabilityError> {
        let existing = self.store.list_active_rules(pharmacy_id, service_id, None).await?;
        debug!("Checking draft against {} active rules of service {}", existing.len(), service_id);
        validate_draft(draft, &existing)
    }

    /// Checks a stored rule against the service's other active rules, e.g. before it is
    /// switched back on.
    pub async fn check_rule(&self, pharmacy_id: Uuid, rule: &AvailabilityRule) -> Result<(), AvailabilityError> {
        let others: Vec<AvailabilityRule> = self
            .store
            .list_active_rules(pharmacy_id, rule.service_id, Some(rule.day_of_week))
            .await?
            .into_iter()
            .filter(|other| other.id != rule.id)
            .collect();

        let conflicts = find_conflicts(&[rule.day_of_week], rule.start_time, rule.end_time, rule.staff_id, &others);
        if !conflicts.is_empty() {
            return Err(AvailabilityError::RuleConflicts(conflicts));
        }
        Ok(())
    }
}
