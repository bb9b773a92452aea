pub mod extractor;
pub mod jwt;
pub mod notify;
pub mod state;
pub mod test_utils;

pub use extractor::{auth_middleware, PortalTenant};
pub use notify::{BookingNotifier, HttpNotifier, NoopNotifier, NotifyError};
pub use state::AppState;
