//! Funnel analysis — progression through lead → trial → won.

use crate::metrics::{ratio, Metrics};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Lead,
    Trial,
    Won,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStepResult {
    pub stage: FunnelStage,
    pub count: u64,
    /// Percentage of the previous stage that reached this one.
    pub step_rate: f64,
    /// Percentage of all leads that reached this stage.
    pub overall_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelResult {
    pub steps: Vec<FunnelStepResult>,
    pub overall_conversion_rate: f64,
}

impl FunnelResult {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let stages = [
            (FunnelStage::Lead, metrics.leads),
            (FunnelStage::Trial, metrics.trials),
            (FunnelStage::Won, metrics.won),
        ];
        let top = metrics.leads as f64;

        let mut steps = Vec::with_capacity(stages.len());
        let mut previous = top;
        for (stage, count) in stages {
            let count_f = count as f64;
            steps.push(FunnelStepResult {
                stage,
                count,
                step_rate: ratio(count_f, previous) * 100.0,
                overall_rate: ratio(count_f, top) * 100.0,
            });
            previous = count_f;
        }

        Self {
            steps,
            overall_conversion_rate: metrics.conversion_rate,
        }
    }
}
