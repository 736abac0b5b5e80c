// Locks down what MCP clients see: tool names, schemas, the protocol
// revision, the report grammar, and the published key/URL shapes.
// Changing any assertion here breaks deployed clients.

use chrono::{Local, TimeZone};
use kabu::mcp::{ToolHandler, MCP_PROTOCOL_VERSION, SERVICE_NAME};
use kabu::models::{PublishedArtifact, RunReport};
use kabu::storage::{derive_object_key, object_url};
use std::path::PathBuf;

#[test]
fn test_protocol_version_is_pinned() {
    assert_eq!(MCP_PROTOCOL_VERSION, "2024-11-05");
    assert_eq!(SERVICE_NAME, "kabu-mcp-server");
}

#[test]
fn test_tool_names_are_stable() {
    let handlers = ToolHandler::all();
    let names: Vec<&str> = handlers.iter().map(|h| h.name()).collect();
    assert_eq!(names, vec!["analyze_stock", "save_code", "execute_code"]);
}

#[test]
fn test_tool_schemas_declare_required_arguments() {
    for handler in ToolHandler::all() {
        let schema = handler.argument_schema();
        assert_eq!(schema["type"], "object");

        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();

        match handler.name() {
            "analyze_stock" => assert_eq!(required, vec!["query"]),
            "save_code" => assert_eq!(required, vec!["code"]),
            "execute_code" => assert!(required.is_empty()),
            other => panic!("unexpected tool: {}", other),
        }

        // Every required argument is described in properties
        for name in required {
            assert!(schema["properties"][name].is_object());
        }
    }
}

#[test]
fn test_tool_descriptions_are_not_empty() {
    for handler in ToolHandler::all() {
        assert!(!handler.description().trim().is_empty());
    }
}

#[test]
fn test_object_key_contract() {
    let now = Local.with_ymd_and_hms(2024, 1, 15, 14, 30, 52).unwrap();
    let key = derive_object_key(now, &PathBuf::from("/work/chart1.png"));

    assert_eq!(key, "plots/20240115_143052_chart1.png");
}

#[test]
fn test_published_url_contract() {
    let now = Local.with_ymd_and_hms(2024, 1, 15, 14, 30, 52).unwrap();
    let key = derive_object_key(now, &PathBuf::from("chart1.png"));
    let url = object_url("mybucket", "ap-northeast-1", &key);

    assert_eq!(
        url,
        "https://mybucket.s3.ap-northeast-1.amazonaws.com/plots/20240115_143052_chart1.png"
    );
}

#[test]
fn test_report_grammar() {
    // Plain success
    assert_eq!(RunReport::success(Vec::new()).render(), "executed successfully");

    // Success with published artifacts
    let report = RunReport::success(vec![PublishedArtifact::new(
        PathBuf::from("chart1.png"),
        "https://mybucket.s3.us-east-1.amazonaws.com/plots/20240115_143052_chart1.png".to_string(),
    )]);
    assert_eq!(
        report.render(),
        "executed successfully\n- chart1.png: https://mybucket.s3.us-east-1.amazonaws.com/plots/20240115_143052_chart1.png"
    );

    // Execution failure
    assert_eq!(
        RunReport::execution_error("NameError: name 'pd' is not defined".to_string()).render(),
        "Error: NameError: name 'pd' is not defined"
    );

    // Publish failure after a successful run
    assert_eq!(
        RunReport::publish_error("Missing AWS credentials".to_string()).render(),
        "execution succeeded, but publishing failed: Missing AWS credentials"
    );
}
