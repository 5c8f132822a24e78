pub mod payment_plan;
pub mod pro_soluto;
pub mod simulation;
