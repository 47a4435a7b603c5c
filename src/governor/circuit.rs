//! Economic circuit breaker.
//!
//! Meters the cost and count of metered external calls (AI completions,
//! paid APIs) over a sliding one-hour window and blocks callers once a
//! configured budget is reached. After a cooldown the circuit goes
//! half-open and closes again once usage drops below the warning threshold.
//!
//! Call [`EconomicGovernor::admit`] before a metered call and
//! [`EconomicGovernor::record`] after it with the actual consumption.

use crate::config::GovernorConfig;
use crate::error::{Error, Result};
use crate::governor::pricing::PricingTable;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Length of the sliding accounting window.
pub const WINDOW: Duration = Duration::from_secs(60 * 60);

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Calls flow normally.
    Closed,
    /// Calls are blocked until the cooldown elapses.
    Open,
    /// Cooldown elapsed; calls are allowed on probation.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// One metered call in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub timestamp: DateTime<Utc>,
    pub cost: f64,
    pub service: String,
    /// Input plus output units.
    pub units: u64,
}

/// Outcome of a successful [`EconomicGovernor::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Admission {
    Allowed,
    /// Allowed, but usage is at or above the warning threshold.
    Warning { cost_ratio: f64, request_ratio: f64 },
}

impl Admission {
    pub fn is_warning(&self) -> bool {
        matches!(self, Admission::Warning { .. })
    }
}

/// Consumption within the current window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowUsage {
    pub request_count: usize,
    pub total_cost: f64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorStatistics {
    pub usage: WindowUsage,
    pub state: CircuitState,
    pub cost_utilization: f64,
    pub request_utilization: f64,
    /// Milliseconds until the open circuit's cooldown ends (0 if not open).
    pub time_until_reset_ms: u64,
}

/// Mutable governor state; only ever touched under the governor's lock.
#[derive(Debug)]
struct Ledger {
    state: CircuitState,
    records: VecDeque<RequestRecord>,
    opened_at: Option<DateTime<Utc>>,
}

impl Ledger {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            records: VecDeque::new(),
            opened_at: None,
        }
    }

    fn prune(&mut self, window_start: DateTime<Utc>) {
        while self
            .records
            .front()
            .is_some_and(|record| record.timestamp < window_start)
        {
            self.records.pop_front();
        }
    }

    fn usage(&self, now: DateTime<Utc>) -> WindowUsage {
        let window_start = window_start(now);
        let (request_count, total_cost) = self
            .records
            .iter()
            .filter(|record| record.timestamp >= window_start)
            .fold((0, 0.0), |(count, cost), record| (count + 1, cost + record.cost));

        WindowUsage {
            request_count,
            total_cost,
            window_start,
            window_end: now,
        }
    }
}

fn utilisation(used: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        used / limit
    } else {
        1.0
    }
}

fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - TimeDelta::seconds(WINDOW.as_secs() as i64)
}

/// Cost and rate circuit breaker for metered external calls.
///
/// One instance per cost boundary (process or tenant). All state lives
/// behind a single lock so `admit` and `record` may be called concurrently
/// from any thread through a shared reference.
pub struct EconomicGovernor<C: Clock = DefaultClock> {
    config: GovernorConfig,
    pricing: PricingTable,
    clock: C,
    ledger: Mutex<Ledger>,
}

impl EconomicGovernor<DefaultClock> {
    /// Create a governor with the built-in price table and the system clock.
    pub fn new(config: GovernorConfig) -> Self {
        Self::with_clock(config, PricingTable::default(), DefaultClock)
    }
}

impl<C: Clock> EconomicGovernor<C> {
    pub fn with_clock(config: GovernorConfig, pricing: PricingTable, clock: C) -> Self {
        Self {
            config,
            pricing,
            clock,
            ledger: Mutex::new(Ledger::new()),
        }
    }

    /// Replace the price table.
    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn config(&self) -> GovernorConfig {
        self.config
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    fn cooldown(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.cooldown_minutes) * 60)
    }

    /// Utilisation of the cost and request budgets. A zero (or invalid)
    /// budget counts as fully used.
    fn ratios(&self, usage: &WindowUsage) -> (f64, f64) {
        (
            utilisation(usage.total_cost, self.config.max_cost_per_hour),
            utilisation(
                usage.request_count as f64,
                f64::from(self.config.max_requests_per_hour),
            ),
        )
    }

    fn cost_limit_reached(&self, usage: &WindowUsage) -> bool {
        !matches!(
            usage.total_cost.partial_cmp(&self.config.max_cost_per_hour),
            Some(Ordering::Less)
        )
    }

    fn request_limit_reached(&self, usage: &WindowUsage) -> bool {
        usage.request_count >= self.config.max_requests_per_hour as usize
    }

    fn remaining_cooldown(&self, ledger: &Ledger, now: DateTime<Utc>) -> Duration {
        match ledger.opened_at {
            Some(opened_at) => {
                let elapsed = (now - opened_at).to_std().unwrap_or_default();
                self.cooldown().saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        }
    }

    /// Advance the state machine: OPEN becomes HALF_OPEN once the cooldown
    /// has elapsed, and HALF_OPEN becomes CLOSED while usage is below the
    /// warning threshold.
    fn refresh(&self, ledger: &mut Ledger, now: DateTime<Utc>) {
        if ledger.state == CircuitState::Open
            && self.remaining_cooldown(ledger, now) == Duration::ZERO
        {
            tracing::info!("circuit breaker transitioning to HALF_OPEN");
            ledger.state = CircuitState::HalfOpen;
        }

        if ledger.state == CircuitState::HalfOpen {
            let (cost_ratio, request_ratio) = self.ratios(&ledger.usage(now));
            if cost_ratio < self.config.warning_threshold
                && request_ratio < self.config.warning_threshold
            {
                tracing::info!("circuit breaker transitioning to CLOSED");
                ledger.state = CircuitState::Closed;
                ledger.opened_at = None;
            }
        }
    }

    fn open(&self, ledger: &mut Ledger, now: DateTime<Utc>) {
        tracing::error!("circuit breaker OPEN, metered calls blocked");
        ledger.state = CircuitState::Open;
        ledger.opened_at = Some(now);
    }

    /// Gate a metered call.
    ///
    /// Fails with `CircuitOpen` while the cooldown runs, and with
    /// `CostLimitExceeded` / `RateLimitExceeded` (opening the circuit) when
    /// the window's usage has reached a limit. The returned errors carry the
    /// duration to back off for; no retry happens here.
    pub fn admit(&self) -> Result<Admission> {
        let now = self.clock.utc();
        let mut ledger = self.ledger.lock();
        ledger.prune(window_start(now));
        self.refresh(&mut ledger, now);

        if ledger.state == CircuitState::Open {
            return Err(Error::CircuitOpen {
                retry_after: self.remaining_cooldown(&ledger, now),
            });
        }

        let usage = ledger.usage(now);
        let (cost_ratio, request_ratio) = self.ratios(&usage);

        if self.cost_limit_reached(&usage) {
            self.open(&mut ledger, now);
            return Err(Error::CostLimitExceeded {
                cost: usage.total_cost,
                limit: self.config.max_cost_per_hour,
                retry_after: self.cooldown(),
            });
        }

        if self.request_limit_reached(&usage) {
            self.open(&mut ledger, now);
            return Err(Error::RateLimitExceeded {
                count: usage.request_count,
                limit: self.config.max_requests_per_hour,
                retry_after: self.cooldown(),
            });
        }

        if cost_ratio >= self.config.warning_threshold
            || request_ratio >= self.config.warning_threshold
        {
            tracing::warn!(
                cost = %format!("{:.1}%", cost_ratio * 100.0),
                requests = %format!("{:.1}%", request_ratio * 100.0),
                "approaching metered-call limits"
            );
            return Ok(Admission::Warning {
                cost_ratio,
                request_ratio,
            });
        }

        Ok(Admission::Allowed)
    }

    /// Record the actual consumption of a completed metered call.
    ///
    /// Unknown services are priced with the table's default service.
    pub fn record(&self, service: &str, units_in: u64, units_out: u64) -> RequestRecord {
        let cost = self.pricing.cost(service, units_in, units_out);
        let now = self.clock.utc();
        let record = RequestRecord {
            timestamp: now,
            cost,
            service: service.to_string(),
            units: units_in.saturating_add(units_out),
        };

        let mut ledger = self.ledger.lock();
        ledger.records.push_back(record.clone());
        ledger.prune(window_start(now));
        drop(ledger);

        tracing::info!(
            service,
            units = record.units,
            cost = %format!("{:.4}", cost),
            "metered call recorded"
        );
        record
    }

    /// Current state, after applying any due transitions.
    pub fn state(&self) -> CircuitState {
        let now = self.clock.utc();
        let mut ledger = self.ledger.lock();
        self.refresh(&mut ledger, now);
        ledger.state
    }

    /// Usage within the last hour.
    pub fn current_usage(&self) -> WindowUsage {
        let now = self.clock.utc();
        self.ledger.lock().usage(now)
    }

    pub fn statistics(&self) -> GovernorStatistics {
        let now = self.clock.utc();
        let mut ledger = self.ledger.lock();
        self.refresh(&mut ledger, now);
        let usage = ledger.usage(now);
        let (cost_utilization, request_utilization) = self.ratios(&usage);
        let time_until_reset_ms = self.remaining_cooldown(&ledger, now).as_millis() as u64;

        GovernorStatistics {
            usage,
            state: ledger.state,
            cost_utilization,
            request_utilization,
            time_until_reset_ms,
        }
    }

    /// Return to CLOSED and clear the ledger.
    pub fn reset(&self) {
        let mut ledger = self.ledger.lock();
        *ledger = Ledger::new();
        tracing::info!("circuit breaker reset");
    }
}

impl<C: Clock> std::fmt::Debug for EconomicGovernor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ledger = self.ledger.lock();
        f.debug_struct("EconomicGovernor")
            .field("config", &self.config)
            .field("state", &ledger.state)
            .field("records", &ledger.records.len())
            .finish()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the governor.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
        let mut now = self.now.lock();
        *now = now.checked_add_signed(delta).unwrap_or(*now);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
