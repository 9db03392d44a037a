mod common;

use codegrapher::server::{ToolServer, INVALID_PARAMS, PARSE_ERROR, TOOL_NAME};
use codegrapher::GrapherConfig;
use common::ProjectFixture;
use serde_json::{json, Value};
use std::io::Cursor;

fn run_session(requests: &[String]) -> Vec<Value> {
    let input = requests.join("\n");
    let mut output = Vec::new();
    ToolServer::new(GrapherConfig::default())
        .serve(Cursor::new(input), &mut output)
        .unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn stdio_session_answers_each_request_on_its_own_line() {
    let project = ProjectFixture::new()
        .with_file("util.py", "def helper():\n    return 1\n")
        .with_file("README.md", "Docs\n");
    let target = project.write("main.py", "from util import helper\n\nprint(helper())\n");

    let requests = vec![
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}).to_string(),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        String::new(),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}).to_string(),
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {
                "name": TOOL_NAME,
                "arguments": {
                    "target_file": target.to_string_lossy(),
                    "root_repo_path": project.root().to_string_lossy(),
                }
            }
        })
        .to_string(),
        "not json".to_string(),
    ];

    let responses = run_session(&requests);
    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["id"], 2);

    let call = &responses[2]["result"];
    assert_eq!(call["isError"], false);
    assert_eq!(call["content"][0]["type"], "text");
    let resource = &call["content"][1]["resource"];
    assert_eq!(resource["uri"], "resource://python-code/main.py");
    assert_eq!(resource["mimeType"], "application/json");
    assert_eq!(resource["data"]["target_file"]["file_path"], "main.py");
    assert_eq!(
        resource["data"]["referenced_files"][0]["object_name"],
        "helper"
    );
    assert_eq!(resource["data"]["additional_files"][0]["type"], "readme");

    assert_eq!(responses[3]["error"]["code"], PARSE_ERROR);
}

#[test]
fn empty_target_argument_is_invalid_params() {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 9,
        "method": "tools/call",
        "params": {"name": TOOL_NAME, "arguments": {"target_file": ""}}
    });

    let responses = run_session(&[request.to_string()]);
    assert_eq!(responses[0]["error"]["code"], INVALID_PARAMS);
    assert_eq!(responses[0]["id"], 9);
}

#[test]
fn non_python_target_is_a_tool_error() {
    let project = ProjectFixture::new();
    let notes = project.write("notes.txt", "hello");
    let request = json!({
        "jsonrpc": "2.0",
        "id": 4,
        "method": "tools/call",
        "params": {"name": TOOL_NAME, "arguments": {"target_file": notes.to_string_lossy()}}
    });

    let responses = run_session(&[request.to_string()]);
    let result = &responses[0]["result"];
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("must be a Python file"));
}
