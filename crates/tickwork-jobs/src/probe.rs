//! `api-health-check`: simulated probes of external endpoints.

use async_trait::async_trait;
use tickwork_scheduler::{JobContext, JobHandler};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Up,
    Down,
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProbeStatus::Up => "UP",
            ProbeStatus::Down => "DOWN",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub endpoint: String,
    pub status: ProbeStatus,
    pub response_ms: u64,
}

pub struct HealthProber {
    endpoints: Vec<String>,
}

impl HealthProber {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }

    /// No network traffic: every well-formed http(s) endpoint reports up.
    pub fn probe(&self, endpoint: &str) -> ProbeResult {
        let reachable = endpoint.starts_with("https://") || endpoint.starts_with("http://");
        ProbeResult {
            endpoint: endpoint.to_string(),
            status: if reachable { ProbeStatus::Up } else { ProbeStatus::Down },
            response_ms: if reachable { 45 } else { 0 },
        }
    }

    pub fn probe_all(&self) -> Vec<ProbeResult> {
        self.endpoints.iter().map(|e| self.probe(e)).collect()
    }
}

#[async_trait]
impl JobHandler for HealthProber {
    async fn run(&self, _ctx: &JobContext) -> anyhow::Result<()> {
        if self.endpoints.is_empty() {
            warn!("no probe endpoints configured");
            return Ok(());
        }
        for result in self.probe_all() {
            match result.status {
                ProbeStatus::Up => info!(
                    endpoint = %result.endpoint,
                    status = %result.status,
                    response_ms = result.response_ms,
                    "endpoint probed"
                ),
                ProbeStatus::Down => warn!(endpoint = %result.endpoint, status = %result.status, "endpoint probed"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_endpoints() {
        let prober = HealthProber::new(vec![
            "https://api.service1.com/health".to_string(),
            "not a url".to_string(),
        ]);
        let results = prober.probe_all();
        assert_eq!(results[0].status, ProbeStatus::Up);
        assert_eq!(results[0].response_ms, 45);
        assert_eq!(results[1].status, ProbeStatus::Down);
    }
}
