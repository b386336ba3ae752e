pub mod commands;
pub mod controller;
pub mod state;

pub use controller::{CoordinatorConfig, CoordinatorSnapshot, SessionPointsCoordinator};
pub use state::{CoordinatorError, CoordinatorState, Registration, SessionState};
