//! Payment-flow quotes: the entries a buyer commits to, the deferred balance
//! left over, and the client-profile limits the resulting plan is held to.

pub mod flow;
pub mod profiles;

pub use flow::{plan_payment, BalanceStatus, FlowEntry, FlowEntryKind, PaymentPlan, PaymentPlanInput};
pub use profiles::{ClientProfile, LimitCheck, ProfileLimits};
