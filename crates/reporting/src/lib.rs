//! Lead reporting: channel attribution, filter selection, KPI aggregation,
//! funnels and grouped breakdowns for the dashboard views.

pub mod attribution;
pub mod breakdown;
pub mod dashboard;
pub mod funnel;
pub mod metrics;
pub mod selection;

pub use attribution::{ChannelClassifier, ClassifiedLead};
pub use breakdown::Breakdowns;
pub use dashboard::{DashboardView, LeadDashboard};
pub use funnel::FunnelResult;
pub use metrics::{Metrics, SpendFocus};
pub use selection::{FilterSelection, PeriodRange};
