pub mod cycle;
pub mod error;
pub mod fanout;
pub mod runner;
pub mod scheduler;
pub mod upsert;

#[cfg(test)]
pub(crate) mod testutil;
