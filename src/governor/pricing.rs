//! Per-service pricing for metered calls.
//!
//! Prices are expressed per 1,000,000 units (tokens, requests, ...) for the
//! input and output side of a call.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const UNITS_PER_PRICE: f64 = 1_000_000.0;

/// Cost per 1,000,000 input and output units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Price {
    pub input: f64,
    pub output: f64,
}

impl Price {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    /// `units_in * input + units_out * output`, normalised per million units.
    pub fn cost(&self, units_in: u64, units_out: u64) -> f64 {
        (units_in as f64 / UNITS_PER_PRICE) * self.input
            + (units_out as f64 / UNITS_PER_PRICE) * self.output
    }
}

/// Price lookup by service tag with a designated fallback service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    /// Service whose price applies to unknown service tags.
    pub default_service: String,
    pub services: BTreeMap<String, Price>,
}

impl PricingTable {
    /// A table with a single service, which is also the fallback.
    pub fn new(default_service: &str, price: Price) -> Self {
        let mut services = BTreeMap::new();
        services.insert(default_service.to_string(), price);
        Self {
            default_service: default_service.to_string(),
            services,
        }
    }

    pub fn with_price(mut self, service: &str, price: Price) -> Self {
        self.services.insert(service.to_string(), price);
        self
    }

    /// Published per-million-token prices of the Anthropic models used by
    /// the delivery agents.
    pub fn anthropic() -> Self {
        Self::new("claude-sonnet-4-20250514", Price::new(3.0, 15.0))
            .with_price("claude-3-5-sonnet-20241022", Price::new(3.0, 15.0))
            .with_price("claude-3-opus-20240229", Price::new(15.0, 75.0))
    }

    pub fn get(&self, service: &str) -> Option<&Price> {
        self.services.get(service)
    }

    pub fn is_known(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    /// Price for a service, falling back to the default service's price.
    pub fn resolve(&self, service: &str) -> Price {
        if let Some(price) = self.services.get(service) {
            return *price;
        }
        tracing::warn!(
            service,
            fallback = %self.default_service,
            "unknown service, using default pricing"
        );
        match self.services.get(&self.default_service) {
            Some(price) => *price,
            None => {
                tracing::error!(
                    fallback = %self.default_service,
                    "default pricing service missing from table, charging zero"
                );
                Price::default()
            }
        }
    }

    /// Cost of a call to `service`.
    pub fn cost(&self, service: &str, units_in: u64, units_out: u64) -> f64 {
        self.resolve(service).cost(units_in, units_out)
    }

    /// The fallback service must have a price and no price may be negative.
    pub fn validate(&self) -> Result<()> {
        if !self.services.contains_key(&self.default_service) {
            return Err(Error::InvalidConfig(format!(
                "default pricing service '{}' has no price",
                self.default_service
            )));
        }
        if let Some((service, _)) = self
            .services
            .iter()
            .find(|(_, price)| price.input < 0.0 || price.output < 0.0)
        {
            return Err(Error::InvalidConfig(format!(
                "negative price for service '{}'",
                service
            )));
        }
        Ok(())
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::anthropic()
    }
}
