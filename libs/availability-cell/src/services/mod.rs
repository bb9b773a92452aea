pub mod calendar;
pub mod overlap;
pub mod rules;
pub mod slots;

pub use calendar::AvailabilityCalendar;
pub use overlap::OverlapDetector;
pub use rules::AvailabilityRuleService;
pub use slots::generate_slots;
