use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use peers::{PeerTransport, ToolSpec};
use serde_json::Value;

use crate::tool::{Tool, ToolError};

/// Invocation handle for one tool advertised by a peer. Delegates to the
/// peer's transport under a bounded timeout.
pub struct PeerTool {
    peer_name: String,
    spec: ToolSpec,
    transport: Arc<dyn PeerTransport>,
    timeout: Duration,
}

impl PeerTool {
    pub fn new(
        peer_name: impl Into<String>,
        spec: ToolSpec,
        transport: Arc<dyn PeerTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            peer_name: peer_name.into(),
            spec,
            transport,
            timeout,
        }
    }

    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }
}

#[async_trait]
impl Tool for PeerTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn parameters(&self) -> Value {
        self.spec.input_schema.clone()
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        match tokio::time::timeout(self.timeout, self.transport.call_tool(&self.spec.name, args))
            .await
        {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => Err(ToolError::invocation(
                &self.spec.name,
                format!("peer '{}': {}", self.peer_name, e),
            )),
            Err(_) => Err(ToolError::invocation(
                &self.spec.name,
                format!("peer '{}' did not answer in time", self.peer_name),
            )),
        }
    }
}
