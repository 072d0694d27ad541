pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{LeadboardError, LeadboardResult};
pub use types::{Channel, Dataset, InvestmentRecord, Lead, LeadStatus, Period};
