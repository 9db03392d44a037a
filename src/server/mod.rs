//! Line-delimited JSON-RPC 2.0 tool server.
//!
//! Exposes one tool, `get_python_code`, which returns a [`CodeBundle`] for a
//! target file. Requests arrive one per line on the input stream and each
//! response is written as a single line.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::path::Path;

use crate::bundle::{build_bundle, CodeBundle};
use crate::config::GrapherConfig;

pub const TOOL_NAME: &str = "get_python_code";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

pub struct ToolServer {
    config: GrapherConfig,
}

impl ToolServer {
    pub fn new(config: GrapherConfig) -> Self {
        Self { config }
    }

    /// Answer one decoded request. Returns `None` for notifications.
    pub fn handle_request(&self, request: &Value) -> Option<Value> {
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let id = request.get("id").cloned().unwrap_or(Value::Null);

        if request.get("id").is_none() && method.starts_with("notifications/") {
            log::debug!("Ignoring notification {}", method);
            return None;
        }

        let response = match method {
            "initialize" => success(
                id,
                json!({ "capabilities": { "tools": { "listChanged": false } } }),
            ),
            "tools/list" => success(id, json!({ "tools": [tool_descriptor()] })),
            "tools/call" => {
                let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
                self.call_tool(id, &params)
            }
            other => error(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        };
        Some(response)
    }

    /// Answer one raw input line.
    pub fn handle_line(&self, line: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(line) {
            Ok(request) => self.handle_request(&request),
            Err(e) => Some(error(Value::Null, PARSE_ERROR, format!("Parse error: {e}"))),
        }
    }

    pub fn serve<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<()> {
        log::info!("Serving {} over stdio", TOOL_NAME);
        for line in input.lines() {
            let line = line.context("Failed to read request")?;
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line) {
                serde_json::to_writer(&mut output, &response)
                    .context("Failed to encode response")?;
                writeln!(output).context("Failed to write response")?;
                output.flush().context("Failed to flush response")?;
            }
        }
        log::info!("Input closed, shutting down");
        Ok(())
    }

    fn call_tool(&self, id: Value, params: &Value) -> Value {
        let tool = params.get("name").and_then(Value::as_str).unwrap_or("");
        if tool != TOOL_NAME {
            return error(id, METHOD_NOT_FOUND, format!("Unknown tool: {tool}"));
        }

        let arguments = params.get("arguments");
        let argument = |name: &str| {
            arguments
                .and_then(|args| args.get(name))
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        };

        let Some(target_file) = argument("target_file") else {
            return error(
                id,
                INVALID_PARAMS,
                "Missing required argument: target_file".to_string(),
            );
        };
        let root = argument("root_repo_path").map(Path::new);

        match self.run_tool(Path::new(target_file), root) {
            Ok(data) => success(
                id,
                json!({
                    "content": [
                        { "type": "text", "text": format!("Python code analysis for {target_file}") },
                        {
                            "type": "resource",
                            "resource": {
                                "uri": resource_uri(target_file),
                                "mimeType": "application/json",
                                "data": data,
                            }
                        }
                    ],
                    "isError": false,
                }),
            ),
            Err(e) => {
                log::warn!("{} failed: {:#}", TOOL_NAME, e);
                success(
                    id,
                    json!({
                        "content": [
                            { "type": "text", "text": format!("Error processing Python code: {e:#}") }
                        ],
                        "isError": true,
                    }),
                )
            }
        }
    }

    fn run_tool(&self, target: &Path, root: Option<&Path>) -> Result<Value> {
        let bundle: CodeBundle = build_bundle(target, root, &self.config)?;
        serde_json::to_value(bundle).context("Failed to encode bundle")
    }
}

pub fn tool_descriptor() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": "Return the code of a target Python file and related files based on import/export proximity.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "target_file": {
                    "type": "string",
                    "description": "Path to the Python file to analyze."
                },
                "root_repo_path": {
                    "type": "string",
                    "description": "Root directory of the repository. If not provided, the directory of the target file will be used."
                }
            },
            "required": ["target_file"]
        }
    })
}

fn resource_uri(target_file: &str) -> String {
    let base = Path::new(target_file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("resource://python-code/{base}")
}

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error(id: Value, code: i64, message: String) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn server() -> ToolServer {
        ToolServer::new(GrapherConfig::default())
    }

    #[test]
    fn initialize_reports_static_tools() {
        let response = server()
            .handle_request(&json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}))
            .unwrap();
        assert_eq!(
            response,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "capabilities": { "tools": { "listChanged": false } } }
            })
        );
    }

    #[test]
    fn tools_list_has_one_tool() {
        let response = server()
            .handle_request(&json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}))
            .unwrap();
        let tools = response["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], TOOL_NAME);
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["target_file"]));
    }

    #[test]
    fn error_codes() {
        let server = server();
        let missing = server
            .handle_request(&json!({
                "id": 2, "method": "tools/call",
                "params": {"name": TOOL_NAME, "arguments": {}}
            }))
            .unwrap();
        assert_eq!(missing["error"]["code"], INVALID_PARAMS);

        let unknown_tool = server
            .handle_request(&json!({
                "id": 3, "method": "tools/call", "params": {"name": "other"}
            }))
            .unwrap();
        assert_eq!(unknown_tool["error"]["code"], METHOD_NOT_FOUND);

        let unknown_method = server
            .handle_request(&json!({"id": 4, "method": "resources/list"}))
            .unwrap();
        assert_eq!(unknown_method["error"]["code"], METHOD_NOT_FOUND);

        let garbage = server.handle_line("{not json").unwrap();
        assert_eq!(garbage["error"]["code"], PARSE_ERROR);
        assert_eq!(garbage["id"], Value::Null);
    }

    #[test]
    fn tool_failures_are_results_not_errors() {
        let response = server()
            .handle_request(&json!({
                "id": 5, "method": "tools/call",
                "params": {"name": TOOL_NAME, "arguments": {"target_file": "/nowhere/x.py"}}
            }))
            .unwrap();
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error processing Python code:"));
    }

    #[test]
    fn notifications_get_no_response() {
        assert!(server()
            .handle_request(&json!({"method": "notifications/initialized"}))
            .is_none());
    }

    #[test]
    fn resource_uri_uses_base_name() {
        assert_eq!(resource_uri("src/app/main.py"), "resource://python-code/main.py");
    }
}
