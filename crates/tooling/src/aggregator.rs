use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use peers::Peer;
use serde_json::Value;

use crate::peer_tool::PeerTool;
use crate::tool::{Tool, ToolError};

/// Metadata for one aggregated tool. `peer` is a lookup reference to the
/// owning peer, or `None` for locally defined tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    pub peer: Option<String>,
}

pub struct ToolCallback {
    descriptor: ToolDescriptor,
    handle: Arc<dyn Tool>,
}

impl ToolCallback {
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn handle(&self) -> Arc<dyn Tool> {
        Arc::clone(&self.handle)
    }
}

/// Name-keyed set of invocable tool handles for one request.
///
/// When two peers advertise the same tool name the peer registered last
/// wins: peers are folded in registration order and later entries overwrite
/// earlier ones. Silent shadowing is a correctness hazard, so every
/// overwrite is logged.
pub struct CallbackSet {
    order: Vec<String>,
    entries: HashMap<String, ToolCallback>,
}

impl CallbackSet {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Folds the advertised tools of `peers` (registration order) into one
    /// callback set. Disconnected peers are skipped.
    pub fn build(peers: &[Arc<Peer>], tool_timeout: Duration) -> Self {
        let mut set = Self::new();

        for peer in peers {
            if !peer.is_connected() {
                debug!("skipping disconnected peer '{}'", peer.name());
                continue;
            }
            for spec in peer.tools() {
                let descriptor = ToolDescriptor {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    parameters: spec.input_schema.clone(),
                    peer: Some(peer.name().to_string()),
                };
                let handle = Arc::new(PeerTool::new(
                    peer.name(),
                    spec.clone(),
                    peer.transport(),
                    tool_timeout,
                ));
                set.upsert(ToolCallback { descriptor, handle });
            }
        }

        set
    }

    /// Adds a locally defined tool under the same overwrite policy.
    pub fn insert_local(&mut self, tool: Arc<dyn Tool>) {
        let descriptor = ToolDescriptor {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters(),
            peer: None,
        };
        self.upsert(ToolCallback {
            descriptor,
            handle: tool,
        });
    }

    fn upsert(&mut self, callback: ToolCallback) {
        let name = callback.descriptor.name.clone();
        if let Some(previous) = self.entries.insert(name.clone(), callback) {
            warn!(
                "tool '{}' from {} shadowed by a later registration",
                name,
                previous
                    .descriptor
                    .peer
                    .as_deref()
                    .unwrap_or("local registration"),
            );
        } else {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolCallback> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptors in first-registration order, for the model layer's
    /// tool-calling configuration.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(ToolCallback::descriptor)
            .collect()
    }

    /// Invokes one tool by name. Lookup and invocation failures are both
    /// surfaced; the caller decides whether to retry or report.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let callback = self
            .entries
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        callback.handle.execute(args).await
    }
}

impl Default for CallbackSet {
    fn default() -> Self {
        Self::new()
    }
}
