use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::error::FieldError;
use shared_models::scheduling::{AvailabilityRule, DayOfWeek};

use crate::models::{AvailabilityError, AvailableDates, MAX_HORIZON_DAYS};

/// Dates in `[from, from + horizon_days)` whose weekday has at least one rule.
///
/// Capacity is not considered; this only drives which dates can be picked.
pub fn eligible_dates(rules: &[AvailabilityRule], from: NaiveDate, horizon_days: u32) -> Vec<NaiveDate> {
    let open_days: HashSet<DayOfWeek> = rules
        .iter()
        .filter(|r| r.active())
        .map(|r| r.day_of_week)
        .collect();

    if open_days.is_empty() {
        return vec![];
    }

    (0..horizon_days as i64)
        .map(|offset| from + Duration::days(offset))
        .filter(|date| open_days.contains(&DayOfWeek::of(*date)))
        .collect()
}

pub struct AvailabilityCalendar {
    store: Arc<dyn SchedulingStore>,
}

impl AvailabilityCalendar {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    /// Bookable dates of a public service, starting at `today`.
    ///
    /// A failed rule fetch is reported as `TransientFetch`, never as an empty calendar.
    pub async fn available_dates(
        &self,
        service_id: Uuid,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<AvailableDates, AvailabilityError> {
        if horizon_days == 0 || horizon_days > MAX_HORIZON_DAYS {
            return Err(AvailabilityError::Validation(vec![FieldError::new(
                "horizon_days",
                format!("Horizon must be between 1 and {} days", MAX_HORIZON_DAYS),
            )]));
        }

        let service = self.store.get_service(service_id).await?;
        if !service.active() {
            return Err(AvailabilityError::NotFound("Service not found".to_string()));
        }

        let rules = self
            .store
            .list_active_rules(service.pharmacy_id, service_id, None)
            .await
            .map_err(|e| {
                warn!("Failed to load rules for service {}: {}", service_id, e);
                AvailabilityError::TransientFetch(e.to_string())
            })?;

        let dates = eligible_dates(&rules, today, horizon_days);
        debug!("Service {} has {} eligible dates in the next {} days", service_id, dates.len(), horizon_days);

        Ok(AvailableDates {
            service_id,
            from: today,
            horizon_days,
            dates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn rule_on(day: DayOfWeek, active: bool) -> AvailabilityRule {
        AvailabilityRule {
            id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            day_of_week: day,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            slot_length_minutes: 30,
            max_bookings_per_slot: None,
            staff_id: None,
            is_active: Some(active),
            staff: None,
            created_at: None,
        }
    }

    #[test]
    fn horizon_includes_today() {
        // 2024-06-10 is a Monday
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let dates = eligible_dates(&[rule_on(DayOfWeek::MONDAY, true)], today, 14);

        assert_eq!(dates, vec![today, NaiveDate::from_ymd_opt(2024, 6, 17).unwrap()]);
    }

    #[test]
    fn default_horizon_covers_sixty_days() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let every_day: Vec<AvailabilityRule> = (0..7)
            .filter_map(DayOfWeek::new)
            .map(|d| rule_on(d, true))
            .collect();

        let dates = eligible_dates(&every_day, today, 60);
        assert_eq!(dates.len(), 60);
        assert_eq!(*dates.last().unwrap(), today + Duration::days(59));
    }

    #[test]
    fn inactive_rules_open_nothing() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert!(eligible_dates(&[rule_on(DayOfWeek::TUESDAY, false)], today, 60).is_empty());
        assert!(eligible_dates(&[], today, 60).is_empty());
    }
}
