use serde_json::{json, Value};

use crate::error::{ProtegoError, Result};
use crate::rest::ApiClient;
use crate::types::*;

impl ApiClient {
    // --- Threats ---

    /// GET /api/threats - Current threat feed. A `null` body is empty.
    pub async fn threats(&self) -> Result<Vec<Threat>> {
        let threats: Option<Vec<Threat>> = self.get("/api/threats", &[]).await?;
        Ok(threats.unwrap_or_default())
    }

    /// POST /api/analyze-contract - Security analysis of one contract.
    pub async fn analyze_contract(&self, contract_address: &str) -> Result<Value> {
        let contract_address = contract_address.trim();
        if contract_address.is_empty() {
            return Err(ProtegoError::Validation(
                "contract address is required".into(),
            ));
        }
        self.post_json(
            "/api/analyze-contract",
            &json!({ "contractAddress": contract_address }),
        )
        .await
    }

    // --- Social ---

    /// GET /api/social-alerts - Alerts from monitored channels. A `null`
    /// body is empty.
    pub async fn social_alerts(&self) -> Result<Vec<SocialAlert>> {
        let alerts: Option<Vec<SocialAlert>> = self.get("/api/social-alerts", &[]).await?;
        Ok(alerts.unwrap_or_default())
    }

    /// POST /api/social-monitor - Start monitoring platforms for keywords.
    pub async fn social_monitor(&self, request: &MonitorRequest) -> Result<Value> {
        self.post_json("/api/social-monitor", request).await
    }
}
