//! Server configuration

use crate::{
    logging::LogFormat,
    orders::models::TransitionPolicy,
    pricing::{
        Amount, Coupon, CouponBook, DeliveryRates, DiscountPolicy, PricingError, PricingPolicy,
    },
};
use clap::Parser;
use rust_decimal::Decimal;
use std::time::Duration;
use url::Url;

/// Storefront cart and checkout service configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "storefront-cart", about = "Storefront cart and checkout service", long_about = None)]
pub struct ServerConfig {
    /// Server host address
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "SERVER_PORT", default_value = "8000")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// VAT rate applied to the subtotal
    #[arg(long, env = "TAX_RATE", default_value = "0.19")]
    pub tax_rate: Decimal,

    /// Standard delivery fee
    #[arg(long, env = "DELIVERY_STANDARD", default_value = "500")]
    pub delivery_standard: Amount,

    /// Express delivery fee
    #[arg(long, env = "DELIVERY_EXPRESS", default_value = "1200")]
    pub delivery_express: Amount,

    /// In-store pickup fee
    #[arg(long, env = "DELIVERY_PICKUP", default_value = "0")]
    pub delivery_pickup: Amount,

    /// Whether the cart discount is subtracted from the checkout total
    #[arg(long, env = "DISCOUNT_POLICY", value_enum, default_value_t = DiscountPolicy::Ignore)]
    pub discount_policy: DiscountPolicy,

    /// Redeemable coupons as CODE=AMOUNT; repeat the flag or comma-separate
    #[arg(long = "coupon", env = "COUPONS", value_delimiter = ',')]
    pub coupons: Vec<Coupon>,

    /// How order status updates are checked
    #[arg(long, env = "ORDER_TRANSITION_POLICY", value_enum, default_value_t = TransitionPolicy::Unconstrained)]
    pub transition_policy: TransitionPolicy,

    /// Messaging number used for chat payments (international format, digits only)
    #[arg(long, env = "CHAT_PHONE", default_value = "213550000000")]
    pub chat_phone: String,

    /// Sessions untouched for this many seconds are dropped
    #[arg(long, env = "SESSION_IDLE_SECS", default_value = "3600")]
    pub session_idle_secs: u64,

    /// How often idle sessions are swept, in seconds
    #[arg(long, env = "SESSION_SWEEP_SECS", default_value = "60")]
    pub session_sweep_secs: u64,

    /// Hosted store base URL; in-memory store when absent
    #[arg(long, env = "STORE_URL")]
    pub store_url: Option<Url>,

    /// Hosted store API key
    #[arg(long, env = "STORE_API_KEY", hide_env_values = true)]
    pub store_api_key: Option<String>,

    /// Email API endpoint; emails are only logged when absent
    #[arg(long, env = "EMAIL_API_URL")]
    pub email_api_url: Option<Url>,

    /// Email API key
    #[arg(long, env = "EMAIL_API_KEY", hide_env_values = true)]
    pub email_api_key: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // A missing .env file is fine
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn delivery_rates(&self) -> DeliveryRates {
        DeliveryRates {
            standard: self.delivery_standard,
            express: self.delivery_express,
            pickup: self.delivery_pickup,
        }
    }

    /// # Errors
    ///
    /// Returns an error when the tax rate is outside `0..=1`
    pub fn pricing_policy(&self) -> Result<PricingPolicy, PricingError> {
        Ok(
            PricingPolicy::new(self.tax_rate, self.delivery_rates(), self.discount_policy)?
                .with_coupons(CouponBook::new(self.coupons.iter().cloned())),
        )
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn session_sweep_period(&self) -> Duration {
        Duration::from_secs(self.session_sweep_secs.max(1))
    }
}
