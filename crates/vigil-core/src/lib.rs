pub mod alert;
pub mod error;
pub mod events;
pub mod ids;
pub mod integration;
