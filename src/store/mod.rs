pub mod directory;
pub mod events;
pub mod leave;
pub mod schedule;
pub mod swap;

#[cfg(test)]
pub(crate) mod testutil;
