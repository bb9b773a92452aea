use chrono::{DateTime, Duration, NaiveDate, Utc};

use shared_models::scheduling::{AvailabilityRule, Slot};

// Wall-clock times carry no zone; they are tagged UTC so the instant round-trips
// unchanged through booking rows.
fn at(date: NaiveDate, time: chrono::NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

/// Slots of a single rule on `date`, contiguous from the window start.
///
/// A trailing remainder shorter than the slot length is dropped.
pub fn rule_slots(rule: &AvailabilityRule, date: NaiveDate) -> Vec<Slot> {
    if rule.slot_length_minutes == 0 || rule.end_time <= rule.start_time {
        return vec![];
    }

    let length = Duration::minutes(rule.slot_length_minutes as i64);
    let window_end = at(date, rule.end_time);
    let mut cursor = at(date, rule.start_time);
    let mut slots = Vec::new();

    while cursor + length <= window_end {
        slots.push(Slot {
            start: cursor,
            end: cursor + length,
            rule_id: rule.id,
            staff_id: rule.staff_id,
        });
        cursor += length;
    }

    slots
}

/// Generates every slot on `date` for the given rules.
///
/// Rules are expected to be the active rules of one service for `date`'s weekday.
/// Overlapping windows produce overlapping slots; output is ordered by start time,
/// ties keeping input rule order.
pub fn generate_slots(rules: &[AvailabilityRule], date: NaiveDate) -> Vec<Slot> {
    let mut slots: Vec<Slot> = rules.iter().flat_map(|rule| rule_slots(rule, date)).collect();
    slots.sort_by_key(|slot| slot.start);
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Timelike};
    use shared_models::scheduling::DayOfWeek;
    use uuid::Uuid;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn rule(start: (u32, u32), end: (u32, u32), length: u32) -> AvailabilityRule {
        AvailabilityRule {
            id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            day_of_week: DayOfWeek::MONDAY,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            slot_length_minutes: length,
            max_bookings_per_slot: Some(1),
            staff_id: None,
            is_active: Some(true),
            staff: None,
            created_at: None,
        }
    }

    fn hm(slot: &Slot) -> (u32, u32) {
        (slot.start.hour(), slot.start.minute())
    }

    #[test]
    fn morning_window_tiles_into_six_half_hours() {
        let slots = generate_slots(&[rule((9, 0), (12, 0), 30)], monday());

        let starts: Vec<(u32, u32)> = slots.iter().map(hm).collect();
        assert_eq!(starts, vec![(9, 0), (9, 30), (10, 0), (10, 30), (11, 0), (11, 30)]);
        assert_eq!(slots.last().unwrap().end, at(monday(), NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
    }

    #[test]
    fn trailing_remainder_is_dropped() {
        let slots = generate_slots(&[rule((9, 0), (10, 5), 30)], monday());

        let starts: Vec<(u32, u32)> = slots.iter().map(hm).collect();
        assert_eq!(starts, vec![(9, 0), (9, 30)]);
    }

    #[test]
    fn slots_are_contiguous_and_contained() {
        let r = rule((8, 15), (17, 40), 25);
        let slots = rule_slots(&r, monday());
        let window = 9 * 60 + 25;

        assert_eq!(slots.len(), window / 25);
        for pair in slots.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        let last_end = slots.last().unwrap().end;
        assert!(last_end <= at(monday(), r.end_time));
        assert!(last_end + Duration::minutes(25) > at(monday(), r.end_time));
    }

    #[test]
    fn overlapping_rules_are_merged_by_start_keeping_rule_order() {
        let first = rule((9, 0), (10, 0), 30);
        let second = rule((9, 0), (10, 0), 60);
        let slots = generate_slots(&[first.clone(), second.clone()], monday());

        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].rule_id, first.id);
        assert_eq!(slots[1].rule_id, second.id);
        assert_eq!(hm(&slots[2]), (9, 30));
    }

    #[test]
    fn no_rules_or_degenerate_rules_yield_nothing() {
        assert!(generate_slots(&[], monday()).is_empty());
        assert!(generate_slots(&[rule((9, 0), (9, 0), 30)], monday()).is_empty());
        assert!(generate_slots(&[rule((9, 0), (9, 20), 30)], monday()).is_empty());
    }
}
