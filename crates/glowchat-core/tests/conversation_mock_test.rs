//! End-to-end conversation scenarios against a mock endpoint

use std::time::Duration;

use glowchat_core::truncation::CAVEAT;
use glowchat_core::{
    ChatClient, ChatRole, ChatView, Conversation, EntryKind, Submission, Turn, APOLOGY,
};
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const SYSTEM: &str = "You are a helpful beauty assistant.";

fn completion(content: &str) -> serde_json::Value {
    json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]})
}

fn conversation(server: &MockServer) -> Conversation<ChatView> {
    Conversation::new(ChatClient::new(&server.uri()), SYSTEM, ChatView::new())
        .with_truncation_hint(true)
}

fn kinds(convo: &Conversation<ChatView>) -> Vec<EntryKind> {
    convo.surface().entries().iter().map(|e| e.kind).collect()
}

#[tokio::test]
async fn test_successful_exchange() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Use a gentle cleanser.")))
        .mount(&mock_server)
        .await;

    let mut convo = conversation(&mock_server);
    let mut input = "Tips for oily skin?".to_string();
    let turn = convo.exchange(&mut input).await;

    assert_eq!(
        turn,
        Some(Turn::Replied {
            reply: "Use a gentle cleanser.".to_string(),
            displayed: "Use a gentle cleanser.".to_string(),
        })
    );
    assert!(input.is_empty());
    assert_eq!(kinds(&convo), vec![EntryKind::User, EntryKind::Assistant]);

    let roles: Vec<ChatRole> = convo.transcript().messages().iter().map(|m| m.role()).collect();
    assert_eq!(roles, vec![ChatRole::System, ChatRole::User, ChatRole::Assistant]);
    assert_eq!(convo.transcript().system_prompt(), SYSTEM);
}

#[tokio::test]
async fn test_truncated_reply_is_annotated_on_screen_only() {
    let reply = format!(
        "{}Apply 2-3 drops and massage in circles for best results, then wait 5",
        "Start with clean, dry skin and a pea-sized amount of product. ".repeat(3)
    );
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&reply)))
        .mount(&mock_server)
        .await;

    let mut convo = conversation(&mock_server);
    let mut input = "How do I use the serum?".to_string();
    convo.exchange(&mut input).await;

    let shown = &convo.surface().entries()[1];
    assert_eq!(shown.kind, EntryKind::Assistant);
    assert_eq!(shown.text, format!("{reply}{CAVEAT}"));
    assert_eq!(convo.transcript().last().unwrap().content(), reply);
}

#[tokio::test]
async fn test_server_error_shows_apology() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mut convo = conversation(&mock_server);
    let mut input = "Hello?".to_string();
    let turn = convo.exchange(&mut input).await;

    assert_eq!(turn, Some(Turn::Failed));
    assert_eq!(kinds(&convo), vec![EntryKind::User, EntryKind::Assistant]);
    assert_eq!(convo.surface().entries()[1].text, APOLOGY);
    assert_eq!(convo.surface().pending_count(), 0);
    assert_eq!(convo.transcript().len(), 2);
    assert_eq!(convo.transcript().last().unwrap().role(), ChatRole::User);
    assert_eq!(convo.transcript().last().unwrap().content(), "Hello?");
}

#[tokio::test]
async fn test_malformed_body_matches_server_error_outcome() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "hi"})))
        .mount(&mock_server)
        .await;

    let mut convo = conversation(&mock_server);
    let mut input = "Hello?".to_string();
    let turn = convo.exchange(&mut input).await;

    assert_eq!(turn, Some(Turn::Failed));
    assert_eq!(convo.surface().entries()[1].text, APOLOGY);
    assert_eq!(convo.surface().pending_count(), 0);
    assert_eq!(convo.transcript().len(), 2);
}

#[tokio::test]
async fn test_failed_turn_stays_in_next_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Sure thing.")))
        .mount(&mock_server)
        .await;

    let mut convo = conversation(&mock_server);
    let mut first = "Recommend a shampoo".to_string();
    assert_eq!(convo.exchange(&mut first).await, Some(Turn::Failed));

    let mut second = "Recommend a shampoo please".to_string();
    let Submission::Dispatched(pending) = convo.submit(&mut second) else {
        panic!("expected a dispatched request");
    };
    let contents: Vec<&str> = pending.messages().iter().map(|m| m.content()).collect();
    assert_eq!(contents, vec![SYSTEM, "Recommend a shampoo", "Recommend a shampoo please"]);

    let outcome = pending.resolve().await;
    convo.settle(outcome);
    assert_eq!(
        kinds(&convo),
        vec![EntryKind::User, EntryKind::Assistant, EntryKind::User, EntryKind::Assistant]
    );
    assert_eq!(convo.transcript().len(), 4);
}

#[tokio::test]
async fn test_rapid_second_submission_is_refused() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("First answer."))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut convo = conversation(&mock_server);
    let mut first = "first question".to_string();
    let Submission::Dispatched(pending) = convo.submit(&mut first) else {
        panic!("expected a dispatched request");
    };
    let in_flight = tokio::spawn(pending.resolve());

    let mut second = "second question".to_string();
    assert!(matches!(convo.submit(&mut second), Submission::Busy));
    assert_eq!(second, "second question");
    assert_eq!(kinds(&convo), vec![EntryKind::User, EntryKind::Pending]);

    let outcome = in_flight.await.unwrap();
    let turn = convo.settle(outcome);

    assert!(matches!(turn, Turn::Replied { .. }));
    assert_eq!(kinds(&convo), vec![EntryKind::User, EntryKind::Assistant]);
    assert_eq!(convo.transcript().len(), 3);
}

#[tokio::test]
async fn test_blank_input_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut convo = conversation(&mock_server);
    let mut input = "   ".to_string();
    assert_eq!(convo.exchange(&mut input).await, None);
    assert_eq!(input, "   ");
    assert!(convo.surface().is_empty());
    assert_eq!(convo.transcript().len(), 1);
}
