pub mod committer;
pub mod flow;
pub mod lifecycle;
pub mod resolver;

pub use committer::BookingCommitter;
pub use flow::{BookingFlow, FlowError};
pub use lifecycle::BookingLifecycleService;
pub use resolver::SlotAvailabilityResolver;
