//! Record types exchanged with the clinic API.

mod appointment;
mod invoice;
mod patient;
mod prescription;
mod statistics;
mod user;
pub mod wire;

pub use appointment::*;
pub use invoice::*;
pub use patient::*;
pub use prescription::*;
pub use statistics::*;
pub use user::*;
