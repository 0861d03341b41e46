//! Implements InputPort for non-interactive use.
//!
//! Reads one JSON `ValuationRequest` from stdin and writes the JSON response
//! (or `{"error": ...}`) to stdout.

use crate::domain::DomainError;
use crate::ports::InputPort;
use crate::usecases::{ValuationRequest, ValuationService};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::warn;

pub struct BatchInputPort {
    service: Arc<ValuationService>,
}

impl BatchInputPort {
    pub fn new(service: Arc<ValuationService>) -> Self {
        Self { service }
    }

    /// Turn a request body into a response body. Never fails; errors are encoded in JSON.
    pub async fn respond(&self, body: &str) -> String {
        let outcome = match serde_json::from_str::<ValuationRequest>(body) {
            Ok(request) => self.service.handle(request).await,
            Err(e) => Err(DomainError::Input(format!("invalid request: {}", e))),
        };
        let value = match outcome {
            Ok(response) => serde_json::to_value(&response),
            Err(e) => {
                warn!(error = %e, "request failed");
                serde_json::to_value(&e).map(|err| serde_json::json!({ "error": err }))
            }
        };
        match value.and_then(|v| serde_json::to_string_pretty(&v)) {
            Ok(s) => s,
            Err(e) => format!(
                r#"{{"error":{{"kind":"input","detail":"response encoding failed: {}"}}}}"#,
                e.to_string().replace('"', "'")
            ),
        }
    }
}

#[async_trait]
impl InputPort for BatchInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let mut body = String::new();
        tokio::io::stdin()
            .read_to_string(&mut body)
            .await
            .map_err(|e| DomainError::Input(format!("read stdin: {}", e)))?;

        let mut response = self.respond(&body).await;
        response.push('\n');

        let mut out = tokio::io::stdout();
        out.write_all(response.as_bytes())
            .await
            .map_err(|e| DomainError::Input(format!("write stdout: {}", e)))?;
        out.flush()
            .await
            .map_err(|e| DomainError::Input(format!("flush stdout: {}", e)))?;
        Ok(())
    }
}
