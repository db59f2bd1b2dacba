//! Dependency health report

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the embedding provider check
pub const EMBEDDING_SERVICE: &str = "embedding";
/// Name of the vector store check
pub const VECTOR_STORE_SERVICE: &str = "vector_store";

/// Overall status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of every external dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub services: BTreeMap<String, bool>,
    pub timestamp: String,
}

impl HealthReport {
    /// Build a report from per-service results
    ///
    /// Healthy iff every service is up.
    pub fn from_services(services: BTreeMap<String, bool>) -> Self {
        let status = if services.values().all(|up| *up) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            services,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn services(embedding: bool, vector_store: bool) -> BTreeMap<String, bool> {
        BTreeMap::from([
            (EMBEDDING_SERVICE.to_string(), embedding),
            (VECTOR_STORE_SERVICE.to_string(), vector_store),
        ])
    }

    #[test]
    fn test_all_up_is_healthy() {
        let report = HealthReport::from_services(services(true, true));
        assert!(report.is_healthy());
        assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_any_down_is_degraded() {
        assert_eq!(
            HealthReport::from_services(services(true, false)).status,
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthReport::from_services(services(false, true)).status,
            HealthStatus::Degraded
        );
    }

    #[test]
    fn test_report_serialization() {
        let report = HealthReport::from_services(services(true, false));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["services"]["embedding"], true);
        assert_eq!(json["services"]["vector_store"], false);
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
    }
}
