//! MCP server over stdio
//!
//! Newline-delimited JSON-RPC 2.0: one request per line in, one response per
//! line out. Notifications (requests without an `id`) get no response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::error::{ToolError, INVALID_PARAMS, METHOD_NOT_FOUND};
use crate::handlers::Gateway;
use crate::tools::MongoTools;

/// MCP protocol revision spoken by this server
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;

/// MCP JSON-RPC request
#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    /// `None` only when the field is absent; an explicit `null` is a request
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize)]
pub struct McpResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

/// MCP error
#[derive(Debug, Serialize)]
pub struct McpError {
    code: i32,
    message: String,
}

impl McpError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl McpResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// MCP server bound to one gateway
pub struct McpServer {
    gateway: Gateway,
}

impl McpServer {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Serve stdin/stdout until stdin closes
    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.run(reader, writer).await
    }

    /// Serve any line-oriented reader/writer pair until the reader ends
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };

            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle one raw line; `None` for notifications
    pub async fn handle_line(&self, line: &str) -> Option<McpResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(e) => {
                return Some(McpResponse::failure(
                    Value::Null,
                    McpError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        let raw_id = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: McpRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                return Some(McpResponse::failure(
                    raw_id,
                    McpError::new(INVALID_REQUEST, format!("Invalid request: {}", e)),
                ));
            }
        };

        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "notification");
            return None;
        };

        Some(match self.handle_method(&request).await {
            Ok(result) => McpResponse::success(id, result),
            Err(error) => McpResponse::failure(id, error),
        })
    }

    async fn handle_method(&self, request: &McpRequest) -> Result<Value, McpError> {
        match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": MongoTools::list() })),
            "tools/call" => self.handle_tools_call(request.params.as_ref()).await,
            _ => Err(McpError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "mongo-mcp",
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": if self.gateway.policy().dangerous_mode() {
                "Dangerous mode: write tools are enabled."
            } else {
                "Safe mode: read-only tools; write tools will be rejected."
            }
        })
    }

    async fn handle_tools_call(&self, params: Option<&Value>) -> Result<Value, McpError> {
        let params = params.ok_or_else(|| McpError::new(INVALID_PARAMS, "Missing params"))?;

        let name = params
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| McpError::new(INVALID_PARAMS, "Missing tool name"))?;

        let arguments = params.get("arguments").cloned();

        match self.gateway.call(name, arguments).await {
            Ok(result) => Ok(tool_result(&result, false)),
            Err(err) => {
                if let Some(code) = err.rpc_code() {
                    return Err(McpError::new(code, err.to_string()));
                }
                match &err {
                    ToolError::Rejected(violations) => {
                        warn!(tool = name, violations = violations.len(), "tool call rejected");
                    }
                    ToolError::Database(e) => {
                        error!(tool = name, category = e.category(), error = %e, "database error");
                    }
                    _ => {}
                }
                Ok(tool_result(&err.to_payload(), true))
            }
        }
    }
}

/// Wrap a JSON payload as MCP text content
fn tool_result(payload: &Value, is_error: bool) -> Value {
    let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}
