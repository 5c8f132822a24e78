//! Mortgage financing simulation.
//!
//! Pipeline: birth date → [`age`] → [`term`] → [`solver`] (calling
//! [`insurance`] every round) → [`rounding`] → [`simulate`]. Everything is a
//! pure function of the request and a reference date.

pub mod age;
pub mod format;
pub mod insurance;
pub mod params;
pub mod rounding;
pub mod simulate;
pub mod solver;
pub mod term;

pub use params::{AmortizationRegime, EngineParameters, RegimeParameters};
pub use simulate::{respond, simulate, simulate_as_of, SimulationRequest, SimulationResponse, SimulationResult};
