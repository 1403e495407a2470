pub mod events;
pub mod leave;
pub mod schedule;
pub mod swap;
pub mod user;
