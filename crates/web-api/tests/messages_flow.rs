mod support;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use support::TestServer;

async fn join(client: &Client, server: &TestServer, name: &str) {
    let response = client
        .post(server.url("/participants"))
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("join");
    assert_eq!(response.status(), StatusCode::CREATED);
}

async fn post(client: &Client, server: &TestServer, from: &str, body: Value) -> reqwest::Response {
    client
        .post(server.url("/messages"))
        .header("user", from)
        .json(&body)
        .send()
        .await
        .expect("post message")
}

async fn list(client: &Client, server: &TestServer, viewer: &str, query: &str) -> reqwest::Response {
    client
        .get(server.url(&format!("/messages{query}")))
        .header("user", viewer)
        .send()
        .await
        .expect("list messages")
}

fn texts(messages: &Value) -> Vec<String> {
    messages
        .as_array()
        .expect("array")
        .iter()
        .map(|m| m["text"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn post_and_list_with_private_visibility() {
    let server = TestServer::start().await;
    let client = Client::new();
    for name in ["alice", "bob", "carol"] {
        join(&client, &server, name).await;
    }

    let created = post(
        &client,
        &server,
        "alice",
        json!({ "to": "Todos", "text": "hello all", "type": "message" }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let message = created.json::<Value>().await.expect("message json");
    assert_eq!(message["from"], "alice");
    assert_eq!(message["to"], "Todos");
    assert_eq!(message["type"], "message");
    assert!(message["id"].is_string());
    assert!(message["time"].is_string());

    let private = post(
        &client,
        &server,
        "alice",
        json!({ "to": "bob", "text": "just for bob", "type": "private_message" }),
    )
    .await;
    assert_eq!(private.status(), StatusCode::CREATED);

    let bob_view = list(&client, &server, "bob", "").await;
    assert_eq!(bob_view.status(), StatusCode::OK);
    let bob_texts = texts(&bob_view.json::<Value>().await.expect("bob json"));
    assert_eq!(bob_texts[0], "just for bob");
    assert_eq!(bob_texts[1], "hello all");

    let carol_view = list(&client, &server, "carol", "")
        .await
        .json::<Value>()
        .await
        .expect("carol json");
    let carol_texts = texts(&carol_view);
    assert!(!carol_texts.contains(&"just for bob".to_owned()));
    assert!(carol_texts.contains(&"hello all".to_owned()));
    assert!(carol_texts.contains(&"carol entrou na sala...".to_owned()));
}

#[tokio::test]
async fn post_rejects_invalid_payload_and_unknown_sender() {
    let server = TestServer::start().await;
    let client = Client::new();
    join(&client, &server, "alice").await;

    for body in [
        json!({ "to": "Todos", "text": "", "type": "message" }),
        json!({ "to": "Todos", "text": "hi", "type": "status" }),
        json!({ "to": "Todos", "text": "hi", "type": "shout" }),
        json!({ "to": "Todos", "text": "hi" }),
        json!({ "to": 1, "text": "hi", "type": "message" }),
    ] {
        let response = post(&client, &server, "alice", body.clone()).await;
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "body {body} should be rejected"
        );
    }

    let unknown = post(
        &client,
        &server,
        "mallory",
        json!({ "to": "Todos", "text": "hi", "type": "message" }),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error = unknown.json::<Value>().await.expect("error json");
    assert_eq!(error["code"], "SENDER_NOT_REGISTERED");
}

#[tokio::test]
async fn list_limit_and_viewer_checks() {
    let server = TestServer::start().await;
    let client = Client::new();
    join(&client, &server, "alice").await;
    for text in ["one", "two", "three"] {
        post(
            &client,
            &server,
            "alice",
            json!({ "to": "Todos", "text": text, "type": "message" }),
        )
        .await;
    }

    let limited = list(&client, &server, "alice", "?limit=2").await;
    assert_eq!(limited.status(), StatusCode::OK);
    assert_eq!(
        texts(&limited.json::<Value>().await.expect("limited json")),
        vec!["three", "two"]
    );

    for bad in ["?limit=0", "?limit=-3", "?limit=abc", "?limit="] {
        let response = list(&client, &server, "alice", bad).await;
        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "query {bad} should be rejected"
        );
    }

    // limit 的校验先于查看者
    let bad_limit_unknown_viewer = list(&client, &server, "nobody", "?limit=0").await;
    assert_eq!(
        bad_limit_unknown_viewer.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let unknown_viewer = list(&client, &server, "nobody", "").await;
    assert_eq!(unknown_viewer.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_author_can_edit_or_delete() {
    let server = TestServer::start().await;
    let client = Client::new();
    join(&client, &server, "alice").await;
    join(&client, &server, "bob").await;

    let created = post(
        &client,
        &server,
        "alice",
        json!({ "to": "Todos", "text": "original", "type": "message" }),
    )
    .await
    .json::<Value>()
    .await
    .expect("message json");
    let id = created["id"].as_str().expect("id").to_owned();

    let hijack = client
        .put(server.url(&format!("/messages/{id}")))
        .header("user", "bob")
        .json(&json!({ "to": "Todos", "text": "hijacked", "type": "message" }))
        .send()
        .await
        .expect("edit as bob");
    assert_eq!(hijack.status(), StatusCode::UNAUTHORIZED);

    let delete_as_bob = client
        .delete(server.url(&format!("/messages/{id}")))
        .header("user", "bob")
        .send()
        .await
        .expect("delete as bob");
    assert_eq!(delete_as_bob.status(), StatusCode::UNAUTHORIZED);

    let stored = server.store.all_messages().await;
    assert!(stored.iter().any(|m| m.text.as_str() == "original"));

    let edited = client
        .put(server.url(&format!("/messages/{id}")))
        .header("user", "alice")
        .json(&json!({ "to": "bob", "text": "edited", "type": "private_message" }))
        .send()
        .await
        .expect("edit as alice");
    assert_eq!(edited.status(), StatusCode::OK);
    let edited = edited.json::<Value>().await.expect("edited json");
    assert_eq!(edited["id"], created["id"]);
    assert_eq!(edited["text"], "edited");
    assert_eq!(edited["type"], "private_message");
    assert_eq!(edited["time"], created["time"]);

    let deleted = client
        .delete(server.url(&format!("/messages/{id}")))
        .header("user", "alice")
        .send()
        .await
        .expect("delete as alice");
    assert_eq!(deleted.status(), StatusCode::OK);

    let again = client
        .delete(server.url(&format!("/messages/{id}")))
        .header("user", "alice")
        .send()
        .await
        .expect("delete again");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_checks_payload_then_author_then_message() {
    let server = TestServer::start().await;
    let client = Client::new();
    join(&client, &server, "alice").await;
    let missing = "00000000-0000-4000-8000-000000000000";

    let bad_payload = client
        .put(server.url(&format!("/messages/{missing}")))
        .header("user", "alice")
        .json(&json!({ "to": "Todos", "text": "", "type": "message" }))
        .send()
        .await
        .expect("edit with bad payload");
    assert_eq!(bad_payload.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let unknown_author = client
        .put(server.url(&format!("/messages/{missing}")))
        .header("user", "ghost")
        .json(&json!({ "to": "Todos", "text": "x", "type": "message" }))
        .send()
        .await
        .expect("edit as ghost");
    assert_eq!(unknown_author.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let not_found = client
        .put(server.url(&format!("/messages/{missing}")))
        .header("user", "alice")
        .json(&json!({ "to": "Todos", "text": "x", "type": "message" }))
        .send()
        .await
        .expect("edit missing");
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn join_notice_is_immutable_over_http() {
    let server = TestServer::start().await;
    let client = Client::new();
    join(&client, &server, "alice").await;

    let notices = list(&client, &server, "alice", "")
        .await
        .json::<Value>()
        .await
        .expect("list json");
    let notice_id = notices[0]["id"].as_str().expect("id").to_owned();
    assert_eq!(notices[0]["type"], "status");

    let edit = client
        .put(server.url(&format!("/messages/{notice_id}")))
        .header("user", "alice")
        .json(&json!({ "to": "Todos", "text": "rewritten", "type": "message" }))
        .send()
        .await
        .expect("edit notice");
    assert_eq!(edit.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        edit.json::<Value>().await.expect("error json")["code"],
        "NOTICE_IMMUTABLE"
    );

    let delete = client
        .delete(server.url(&format!("/messages/{notice_id}")))
        .header("user", "alice")
        .send()
        .await
        .expect("delete notice");
    assert_eq!(delete.status(), StatusCode::UNAUTHORIZED);

    let stored = server.store.all_messages().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text.as_str(), "alice entrou na sala...");
}
