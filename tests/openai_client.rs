use axum::{
    body::Bytes,
    extract::{ Path, Query },
    http::{ HeaderMap, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ delete, get, post },
    Json,
    Router,
};
use serde_json::{ json, Value };
use std::collections::HashMap;
use std::sync::Arc;

use docs_assistant::engine::{ ConversationEngine, PollPolicy };
use docs_assistant::error::AppError;
use docs_assistant::models::chat::{ Role, RunStatus };
use docs_assistant::provider::openai::OpenAIAssistantClient;
use docs_assistant::provider::AssistantApi;

const KEY: &str = "sk-test";
const VS: &str = "vs_docs";

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" } })),
    ).into_response()
}

async fn create_thread(headers: HeaderMap) -> Response {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
    let beta = headers.get("openai-beta").and_then(|v| v.to_str().ok());
    if auth != Some("Bearer sk-test") || beta != Some("assistants=v2") {
        return unauthorized();
    }
    Json(json!({ "id": "thread_abc", "object": "thread", "created_at": 1 })).into_response()
}

async fn add_message(Path(thread): Path<String>, Json(body): Json<Value>) -> Response {
    assert_eq!(body["role"], "user");
    Json(
        json!({
            "id": "msg_u1",
            "object": "thread.message",
            "thread_id": thread,
            "role": "user",
            "created_at": 2,
            "content": [{ "type": "text", "text": { "value": body["content"], "annotations": [] } }]
        })
    ).into_response()
}

async fn create_run(Path(thread): Path<String>, Json(body): Json<Value>) -> Response {
    Json(
        json!({
            "id": "run_1",
            "object": "thread.run",
            "thread_id": thread,
            "assistant_id": body["assistant_id"],
            "status": "queued"
        })
    ).into_response()
}

async fn get_run(Path((thread, run)): Path<(String, String)>) -> Response {
    let (status, last_error) = if run == "run_bad" {
        ("failed", json!({ "code": "server_error", "message": "boom" }))
    } else {
        ("requires_action", Value::Null)
    };
    Json(
        json!({
            "id": run,
            "thread_id": thread,
            "assistant_id": "asst_1",
            "status": status,
            "last_error": last_error
        })
    ).into_response()
}

async fn list_messages(
    Path(thread): Path<String>,
    Query(query): Query<HashMap<String, String>>
) -> Response {
    if thread == "thread_missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "message": "No thread found with id 'thread_missing'." } })),
        ).into_response();
    }
    assert_eq!(query.get("order").map(String::as_str), Some("desc"));
    if thread == "thread_sys" {
        return Json(
            json!({
                "object": "list",
                "data": [
                    { "id": "msg_s1", "role": "system", "created_at": 5, "content": [] },
                    {
                        "id": "msg_a1",
                        "role": "assistant",
                        "created_at": 4,
                        "content": [{ "type": "text", "text": { "value": "Respuesta", "annotations": [] } }]
                    }
                ]
            })
        ).into_response();
    }
    Json(
        json!({
            "object": "list",
            "data": [
                {
                    "id": "msg_a1",
                    "role": "assistant",
                    "created_at": 4,
                    "content": [
                        { "type": "text", "text": { "value": "Respuesta", "annotations": [] } },
                        { "type": "image_file", "image_file": { "file_id": "file_img" } }
                    ]
                },
                {
                    "id": "msg_u1",
                    "role": "user",
                    "created_at": 3,
                    "content": [{ "type": "text", "text": { "value": "Pregunta", "annotations": [] } }]
                }
            ],
            "has_more": false
        })
    ).into_response()
}

async fn list_vs_files(Path(vs): Path<String>) -> Response {
    assert_eq!(vs, VS);
    Json(
        json!({
            "object": "list",
            "data": [
                { "id": "file-aaaa1111", "object": "vector_store.file", "created_at": 5 },
                { "id": "file-broken999", "object": "vector_store.file", "created_at": 6 }
            ]
        })
    ).into_response()
}

async fn file_details(Path(id): Path<String>) -> Response {
    if id == "file-aaaa1111" {
        Json(json!({ "id": id, "filename": "informe.pdf", "bytes": 1234, "created_at": 5 })).into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response()
    }
}

async fn upload_file(body: Bytes) -> Response {
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("name=\"purpose\""));
    assert!(text.contains("assistants"));
    assert!(text.contains("filename=\"notas.txt\""));
    Json(json!({ "id": "file-new1", "filename": "notas.txt", "bytes": 5, "created_at": 8 })).into_response()
}

async fn attach_file(Path(vs): Path<String>, Json(body): Json<Value>) -> Response {
    assert_eq!(vs, VS);
    Json(json!({ "id": body["file_id"], "object": "vector_store.file", "created_at": 9 })).into_response()
}

async fn detach_file(Path((vs, id)): Path<(String, String)>) -> Response {
    if id == "file-gone" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "message": "No file found with id 'file-gone'." } })),
        ).into_response();
    }
    assert_eq!(vs, VS);
    Json(json!({ "id": id, "deleted": true })).into_response()
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/v1/threads", post(create_thread))
        .route("/v1/threads/{thread}/messages", post(add_message).get(list_messages))
        .route("/v1/threads/{thread}/runs", post(create_run))
        .route("/v1/threads/{thread}/runs/{run}", get(get_run))
        .route("/v1/vector_stores/{vs}/files", get(list_vs_files).post(attach_file))
        .route("/v1/vector_stores/{vs}/files/{id}", delete(detach_file))
        .route("/v1/files", post(upload_file))
        .route("/v1/files/{id}", get(file_details));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

async fn client() -> OpenAIAssistantClient {
    let base = spawn_stub().await;
    OpenAIAssistantClient::new(KEY.into(), Some(base), VS.into()).unwrap()
}

#[tokio::test]
async fn thread_message_and_run_lifecycle() {
    let client = client().await;

    let thread = client.create_thread().await.unwrap();
    assert_eq!(thread.id, "thread_abc");

    let msg = client.add_message(&thread.id, "hola").await.unwrap();
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.text(), "hola");

    let run = client.create_run(&thread.id, "asst_1").await.unwrap();
    assert_eq!(run.id, "run_1");
    assert_eq!(run.assistant_id, "asst_1");
    assert_eq!(run.status, RunStatus::Queued);

    let polled = client.get_run(&thread.id, "run_1").await.unwrap();
    assert_eq!(polled.status, RunStatus::Other("requires_action".into()));
    assert!(!polled.status.is_terminal());

    let failed = client.get_run(&thread.id, "run_bad").await.unwrap();
    assert_eq!(failed.status, RunStatus::Failed);
    assert_eq!(failed.last_error.unwrap().message, "boom");
}

#[tokio::test]
async fn messages_are_listed_newest_first_with_text_only() {
    let client = client().await;
    let messages = client.list_messages("thread_abc").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::Assistant);
    assert_eq!(messages[0].text(), "Respuesta");
    assert_eq!(messages[1].text(), "Pregunta");
}

#[tokio::test]
async fn reply_skips_messages_from_other_roles() {
    let client = client().await;
    let messages = client.list_messages("thread_sys").await.unwrap();
    assert_eq!(messages[0].role, Role::Other);

    let engine = ConversationEngine::new(Arc::new(client), "asst_1", PollPolicy::immediate(1));
    assert_eq!(engine.extract_reply("thread_sys").await.unwrap(), "Respuesta");
}

#[tokio::test]
async fn provider_error_message_is_kept() {
    let client = client().await;
    let err = client.list_messages("thread_missing").await.unwrap_err();
    match err {
        AppError::Status { status, message } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message, "No thread found with id 'thread_missing'.");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn wrong_key_is_an_auth_error() {
    let base = spawn_stub().await;
    let client = OpenAIAssistantClient::new("sk-wrong".into(), Some(base), VS.into()).unwrap();
    let err = client.create_thread().await.unwrap_err();
    assert!(matches!(err, AppError::Auth(_)), "{err:?}");
    assert!(err.to_string().contains("Incorrect API key provided"));
}

#[tokio::test]
async fn listing_falls_back_per_file() {
    let client = client().await;
    let files = client.list_files().await.unwrap();
    assert_eq!(files.len(), 2);

    assert_eq!(files[0].id, "file-aaaa1111");
    assert_eq!(files[0].name, "informe.pdf");
    assert_eq!(files[0].size, 1234);

    assert_eq!(files[1].id, "file-broken999");
    assert_eq!(files[1].name, "File-file-bro");
    assert_eq!(files[1].size, 0);
    assert_eq!(files[1].created_at, 6);
}

#[tokio::test]
async fn upload_then_attach_to_vector_store() {
    let client = client().await;
    let file = client.create_file("notas.txt", b"hola\n".to_vec()).await.unwrap();
    assert_eq!(file.id, "file-new1");
    assert_eq!(file.name, "notas.txt");
    assert_eq!(file.size, 5);
    assert_eq!(file.created_at, 9);
}

#[tokio::test]
async fn delete_detaches_from_vector_store() {
    let client = client().await;
    client.delete_file("file-aaaa1111").await.unwrap();

    let err = client.delete_file("file-gone").await.unwrap_err();
    assert!(
        matches!(err, AppError::Status { status, .. } if status == StatusCode::NOT_FOUND),
        "{err:?}"
    );
}
