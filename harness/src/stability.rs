use std::{collections::BTreeMap, time::Duration};

/// One entry per logical call attempt sequence.
#[derive(Debug, Clone)]
pub struct StabilityRecord {
    pub endpoint: String,
    pub success: bool,
    pub attempts: u32,
    pub total_latency: Duration,
}

/// Run-scoped accumulator of call outcomes. Created at run start, passed
/// `&mut` into client calls, read at run end; never shared between runs.
#[derive(Debug, Default)]
pub struct StabilityTracker {
    records: Vec<StabilityRecord>,
}

impl StabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<S: Into<String>>(
        &mut self,
        endpoint: S,
        success: bool,
        attempts: u32,
        total_latency: Duration,
    ) {
        debug_assert!(attempts >= 1, "a recorded call has at least one attempt");
        self.records.push(StabilityRecord {
            endpoint: endpoint.into(),
            success,
            attempts,
            total_latency,
        });
    }

    pub fn records(&self) -> &[StabilityRecord] {
        &self.records
    }

    pub fn last_record(&self) -> Option<&StabilityRecord> {
        self.records.last()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }

    pub fn summarize(&self) -> StabilitySummary {
        let mut endpoints: BTreeMap<String, EndpointStats> = BTreeMap::new();

        for record in &self.records {
            let stats = endpoints
                .entry(record.endpoint.clone())
                .or_insert_with(EndpointStats::default);
            stats.calls += 1;
            if record.success {
                stats.successes += 1;
            }
            stats.total_attempts += u64::from(record.attempts);
            stats.total_latency += record.total_latency;
        }

        StabilitySummary { endpoints }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EndpointStats {
    pub calls: usize,
    pub successes: usize,
    total_attempts: u64,
    total_latency: Duration,
}

impl EndpointStats {
    /// Successful calls over total calls, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.successes as f64 / self.calls as f64 * 100.0
    }

    pub fn avg_attempts(&self) -> f64 {
        if self.calls == 0 {
            return 0.0;
        }
        self.total_attempts as f64 / self.calls as f64
    }

    pub fn avg_latency(&self) -> Duration {
        if self.calls == 0 {
            return Duration::from_secs(0);
        }
        self.total_latency / self.calls as u32
    }
}

#[derive(Debug, Clone, Default)]
pub struct StabilitySummary {
    endpoints: BTreeMap<String, EndpointStats>,
}

impl StabilitySummary {
    pub fn endpoint(&self, endpoint: &str) -> Option<&EndpointStats> {
        self.endpoints.get(endpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EndpointStats)> {
        self.endpoints.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn total_calls(&self) -> usize {
        self.endpoints.values().map(|stats| stats.calls).sum()
    }

    pub fn total_successes(&self) -> usize {
        self.endpoints.values().map(|stats| stats.successes).sum()
    }

    pub fn overall_success_rate(&self) -> f64 {
        let calls = self.total_calls();
        if calls == 0 {
            return 0.0;
        }
        self.total_successes() as f64 / calls as f64 * 100.0
    }

    pub fn is_stable(&self, threshold: f64) -> bool {
        !self.is_empty() && self.overall_success_rate() >= threshold
    }
}
