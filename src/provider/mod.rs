mod database;
mod email;

pub use database::DatabasePool;
pub use email::Mailer;
