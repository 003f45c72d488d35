//! Configuration and CLI argument handling

use std::time::Duration;
use anyhow::bail;
use clap::Parser;

use crate::{services::DEFAULT_USD_TO_INR, timer::CountdownState};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "timebound")]
#[command(about = "Demo backend for time-limited virtual cards paid over UPI")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Lifetime of an issued virtual card in minutes
    #[arg(short, long, default_value = "10")]
    pub card_minutes: u64,

    /// Fixed USD to INR conversion rate
    #[arg(long, default_value_t = DEFAULT_USD_TO_INR)]
    pub fx_rate: f64,

    /// Simulated UPI confirmation delay in milliseconds
    #[arg(long, default_value = "2000")]
    pub upi_processing_ms: u64,

    /// Delay between UPI success and card activation in milliseconds
    #[arg(long, default_value = "1500")]
    pub card_handoff_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Card budget in seconds
    pub fn card_seconds(&self) -> i64 {
        i64::try_from(self.card_minutes.saturating_mul(60)).unwrap_or(i64::MAX)
    }

    /// Reject settings that would make every card issue or quote fail
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Err(e) = CountdownState::new(self.card_seconds()) {
            bail!("--card-minutes {} is not a usable card lifetime: {}", self.card_minutes, e);
        }
        if !self.fx_rate.is_finite() || self.fx_rate <= 0.0 {
            bail!("--fx-rate must be a positive number, got {}", self.fx_rate);
        }
        Ok(())
    }

    /// Timings and rates of the simulated payment flow
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            card_seconds: self.card_seconds(),
            tick_period: Duration::from_secs(1),
            upi_processing: Duration::from_millis(self.upi_processing_ms),
            card_handoff: Duration::from_millis(self.card_handoff_ms),
            usd_to_inr: self.fx_rate,
        }
    }
}

/// Knobs of the payment flow, separate from server binding
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSettings {
    pub card_seconds: i64,
    pub tick_period: Duration,
    pub upi_processing: Duration,
    pub card_handoff: Duration,
    pub usd_to_inr: f64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            card_seconds: 600,
            tick_period: Duration::from_secs(1),
            upi_processing: Duration::from_millis(2000),
            card_handoff: Duration::from_millis(1500),
            usd_to_inr: DEFAULT_USD_TO_INR,
        }
    }
}
