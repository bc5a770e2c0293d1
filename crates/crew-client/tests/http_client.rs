// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! End-to-end tests of `WorkflowClient` against a local mock backend.

use crew_client::{
    AgentId, ClientError, FileKind, StreamEvent, StreamTransport, TodoStatus, WorkflowApi,
    WorkflowClient,
};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> WorkflowClient {
    WorkflowClient::new(&server.uri()).unwrap()
}

#[tokio::test]
async fn initialize_sends_auto_start_and_decodes_stream_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/initialize_workflow"))
        .and(body_json(json!({ "auto_start": true, "user_request": "write a novel" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response_id": "r-1",
            "current_agent": "ceo"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let init = client(&server).initialize(true, Some("write a novel")).await.unwrap();
    assert_eq!(init.response_id.as_deref(), Some("r-1"));
    assert_eq!(init.current_agent, Some(AgentId::Ceo));
}

#[tokio::test]
async fn switch_agent_posts_wire_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/switch_agent"))
        .and(body_json(json!({ "agent_id": "web_searcher" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "agent_name": "Web Searcher"
        })))
        .mount(&server)
        .await;

    let r = client(&server).switch_agent(&AgentId::WebSearcher).await.unwrap();
    assert_eq!(r.agent_name.as_deref(), Some("Web Searcher"));
}

#[tokio::test]
async fn error_envelope_without_message_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/switch_agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "error" })))
        .mount(&server)
        .await;

    let err = client(&server).switch_agent(&AgentId::Writer).await.unwrap_err();
    assert_eq!(err.user_message(), "Failed to switch agent");
}

#[tokio::test]
async fn error_envelope_on_500_keeps_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stream_agent_response"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "error",
            "message": "workflow not initialized"
        })))
        .mount(&server)
        .await;

    let err = client(&server).submit_turn("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { ref message } if message == "workflow not initialized"));
}

#[tokio::test]
async fn non_envelope_error_body_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_todo_list"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client(&server).todo_list().await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 502, .. }));
    assert_eq!(err.user_message(), "Network error, please retry");
}

#[tokio::test]
async fn todo_list_accepts_localized_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_todo_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "todo_items": [
                { "agent": "writer", "description": "Outline", "status": "已完成" },
                { "agent": "reviewer", "description": "Review", "status": "pending" }
            ]
        })))
        .mount(&server)
        .await;

    let items = client(&server).todo_list().await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].status, TodoStatus::Completed);
    assert_eq!(items[1].agent, AgentId::Reviewer);
}

#[tokio::test]
async fn complete_task_sends_one_based_number() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/complete_task"))
        .and(body_json(json!({ "task_id": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Task 2 marked complete"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client(&server).complete_task(2).await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("Task 2 marked complete"));
}

#[tokio::test]
async fn browse_files_encodes_path_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse_files"))
        .and(query_param("path", "/tmp/my docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "files": [
                { "name": "notes", "type": "directory", "path": "/tmp/my docs/notes" },
                { "name": "a.py", "type": "file", "path": "/tmp/my docs/a.py" }
            ]
        })))
        .mount(&server)
        .await;

    let files = client(&server).browse_files(Some("/tmp/my docs")).await.unwrap();
    assert_eq!(files[0].kind, FileKind::Directory);
    assert_eq!(files[1].name, "a.py");
}

#[tokio::test]
async fn read_file_and_execute_command_return_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/read_file"))
        .and(query_param("path", "main.py"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "content": "print('hi')\n"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/execute_command"))
        .and(body_json(json!({ "command": "ls" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "output": "main.py\n"
        })))
        .mount(&server)
        .await;

    let c = client(&server);
    assert_eq!(c.read_file("main.py").await.unwrap(), "print('hi')\n");
    assert_eq!(c.execute_command("ls").await.unwrap(), "main.py\n");
}

#[tokio::test]
async fn system_info_is_unwrapped_from_nested_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_system_info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "system_info": {
                "system": "Linux", "release": "6.1", "hostname": "box",
                "processor": "x86_64", "cpu_count": 4,
                "memory_available": 2048, "memory_total": 8192,
                "network_interfaces": ["eth0"]
            }
        })))
        .mount(&server)
        .await;

    let info = client(&server).system_info().await.unwrap();
    assert_eq!(info.hostname, "box");
    assert_eq!(info.memory_total, 8192);
}

#[tokio::test]
async fn cleanup_posts_to_cleanup_route() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cleanup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "resources released"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client(&server).cleanup().await.unwrap();
    assert_eq!(ack.message.as_deref(), Some("resources released"));
}

#[tokio::test]
async fn event_stream_yields_fragments_and_completion() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"text\": \"A\"}\n\n",
        "data: {\"text\": \"B\"}\n\n",
        "data: {\"complete\": true, \"next_agent\": \"ceo\", \"next_agent_name\": \"CEO\",",
        " \"todo_items\": [{\"agent\": \"ceo\", \"description\": \"Plan\", \"status\": \"pending\"}]}\n\n",
    );
    Mock::given(method("GET"))
        .and(path("/stream_response/r-7"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let stream = client(&server).open("r-7").await.unwrap();
    let items: Vec<_> = stream.collect().await;
    let mut text = String::new();
    let mut completion = None;
    for item in items {
        match item.unwrap() {
            StreamEvent::Fragment(t) => text.push_str(&t),
            StreamEvent::Completed(c) => completion = Some(c),
        }
    }
    assert_eq!(text, "AB");
    let c = completion.unwrap();
    assert_eq!(c.next_agent, Some(AgentId::Ceo));
    assert_eq!(c.todo_items.map(|t| t.len()), Some(1));
}

#[tokio::test]
async fn event_stream_closed_early_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream_response/r-8"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: {\"text\": \"half\"}\n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let items: Vec<_> = client(&server).open("r-8").await.unwrap().collect().await;
    assert!(matches!(items.last(), Some(Err(ClientError::StreamClosed))));
}

#[tokio::test]
async fn unknown_stream_id_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stream_response/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let result = client(&server).open("missing").await;
    assert!(matches!(result, Err(ClientError::Status { status: 404, .. })));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    // Port 9 (discard) is closed on test hosts.
    let c = WorkflowClient::new("http://127.0.0.1:9").unwrap();
    let err = c.todo_list().await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
    assert_eq!(err.user_message(), "Network error, please retry");
}
