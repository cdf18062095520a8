use std::collections::BTreeMap;
use std::sync::Arc;
use serde::Serialize;
use super::StageMetrics;

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub stage: String,
    pub batches_processed: u64,
    pub events_seen: u64,
    pub empty_results: u64,
    pub avg_latency_us: u64,
}

/// Registry of per-stage metrics, cheap to clone
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: BTreeMap<String, Arc<StageMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector with one entry per name in `stages`
    pub fn with_stages(stages: &[&str]) -> Self {
        let mut collector = Self::new();
        for stage in stages {
            collector.register(*stage, Arc::new(StageMetrics::new(*stage)));
        }
        collector
    }

    pub fn register(&mut self, stage: impl Into<String>, metrics: Arc<StageMetrics>) {
        self.metrics.insert(stage.into(), metrics);
    }

    pub fn snapshot(&self) -> BTreeMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(id, metrics)| {
                (
                    id.clone(),
                    MetricsSnapshot {
                        stage: metrics.stage().to_string(),
                        batches_processed: metrics.batches_processed(),
                        events_seen: metrics.events_seen(),
                        empty_results: metrics.empty_results(),
                        avg_latency_us: metrics.avg_latency_us(),
                    },
                )
            })
            .collect()
    }

    pub fn get_stage_metrics(&self, stage: &str) -> Option<Arc<StageMetrics>> {
        self.metrics.get(stage).cloned()
    }
}
