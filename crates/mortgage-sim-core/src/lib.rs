pub mod currency;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "simulation")]
pub mod simulation;

#[cfg(feature = "pro_soluto")]
pub mod pro_soluto;

#[cfg(feature = "payment_plan")]
pub mod payment_plan;

pub use error::MortgageSimError;
pub use types::*;

/// Standard result type for all mortgage-sim operations
pub type MortgageSimResult<T> = Result<T, MortgageSimError>;
