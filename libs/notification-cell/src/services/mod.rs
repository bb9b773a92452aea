pub mod dispatcher;
pub mod mailer;
pub mod templates;

pub use dispatcher::NotificationDispatcher;
pub use mailer::{Mailer, ResendMailer};
