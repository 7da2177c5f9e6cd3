//! Reducers for the check-in service.

pub mod checkin;

pub use checkin::{CheckInAction, CheckInEnvironment, CheckInReducer, CheckInState};
