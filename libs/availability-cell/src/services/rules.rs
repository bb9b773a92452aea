use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_database::{DatabaseError, SchedulingStore};
use shared_models::error::FieldError;
use shared_models::scheduling::AvailabilityRule;

use crate::models::{AvailabilityError, DraftValidation, RuleDraft};
use crate::services::overlap::OverlapDetector;

/// Portal-side rule administration. Every call is scoped to `pharmacy_id`.
pub struct AvailabilityRuleService {
    store: Arc<dyn SchedulingStore>,
}

impl AvailabilityRuleService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn list_rules(&self, pharmacy_id: Uuid, service_id: Uuid) -> Result<Vec<AvailabilityRule>, AvailabilityError> {
        self.store.get_service_for_tenant(pharmacy_id, service_id).await?;
        Ok(self.store.list_rules(pharmacy_id, service_id).await?)
    }

    /// Advisory overlap check for a draft still being edited.
    pub async fn validate_draft(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        draft: &RuleDraft,
    ) -> Result<DraftValidation, AvailabilityError> {
        self.store.get_service_for_tenant(pharmacy_id, service_id).await?;

        match OverlapDetector::new(self.store.clone()).check(pharmacy_id, service_id, draft).await {
            Ok(_) => Ok(DraftValidation { valid: true, conflicts: vec![] }),
            Err(AvailabilityError::RuleConflicts(conflicts)) => Ok(DraftValidation { valid: false, conflicts }),
            Err(e) => Err(e),
        }
    }

    /// Creates one rule per draft day after re-running the overlap check on fresh data.
    #[instrument(skip(self, draft))]
    pub async fn create_rules(
        &self,
        pharmacy_id: Uuid,
        service_id: Uuid,
        draft: RuleDraft,
    ) -> Result<Vec<AvailabilityRule>, AvailabilityError> {
        draft.validate()?;
        self.store.get_service_for_tenant(pharmacy_id, service_id).await?;

        if let Some(staff_id) = draft.staff_id {
            self.store
                .get_pharmacist(pharmacy_id, staff_id)
                .await
                .map_err(|e| match e {
                    DatabaseError::NotFound(_) => AvailabilityError::Validation(vec![FieldError::new(
                        "staff_id",
                        "Pharmacist does not belong to this pharmacy",
                    )]),
                    other => AvailabilityError::from(other),
                })?;
        }

        let days = OverlapDetector::new(self.store.clone())
            .check(pharmacy_id, service_id, &draft)
            .await?;

        let new_rules = draft.into_new_rules(service_id, &days);
        let created = self.store.insert_rules(pharmacy_id, new_rules).await?;

        info!("Created {} availability rules for service {}", created.len(), service_id);
        Ok(created)
    }

    /// Switching a rule back on fails with `RuleConflicts` if it now overlaps another active rule.
    pub async fn set_active(&self, pharmacy_id: Uuid, rule_id: Uuid, is_active: bool) -> Result<AvailabilityRule, AvailabilityError> {
        if is_active {
            let current = self.store.get_rule(pharmacy_id, rule_id).await?;
            if !current.active() {
                OverlapDetector::new(self.store.clone()).check_rule(pharmacy_id, &current).await?;
            }
        }

        let rule = self.store.set_rule_active(pharmacy_id, rule_id, is_active).await?;
        debug!("Rule {} is now {}", rule_id, if is_active { "active" } else { "inactive" });
        Ok(rule)
    }

    pub async fn delete_rule(&self, pharmacy_id: Uuid, rule_id: Uuid) -> Result<(), AvailabilityError> {
        self.store.delete_rule(pharmacy_id, rule_id).await?;
        info!("Deleted availability rule {}", rule_id);
        Ok(())
    }
}
