//! Economic governor for metered external calls.
//!
//! A circuit breaker that meters cost and request rate over a sliding hour
//! and blocks callers once the configured budget is spent.

mod circuit;
mod pricing;

pub use circuit::{
    Admission, CircuitState, EconomicGovernor, GovernorStatistics, ManualClock, RequestRecord,
    WindowUsage, WINDOW,
};
pub use pricing::{Price, PricingTable};
