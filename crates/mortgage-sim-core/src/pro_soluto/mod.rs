//! Deferred-balance ("pro-soluto") plans: a residual owed to the developer,
//! repaid in level installments across a pre-delivery and a post-delivery
//! interest regime.

pub mod planner;

pub use planner::{
    months_until_delivery, plan_pro_soluto, DeliveryRegime, ProSolutoInput, ProSolutoRates,
    ProSolutoSchedule, ScheduleRow,
};
