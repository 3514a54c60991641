pub mod accounting;
pub mod admin;
pub mod auth;
pub mod margin;
pub mod payments;
pub mod positions;
pub mod version;
