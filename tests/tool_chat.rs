//! Tool-chat integration tests
//!
//! Drives a full chat REPL over an in-memory script with a mock LLM client.

use std::sync::Arc;

use toolchat::conversation::Conversation;
use toolchat::llm::{MockLlmClient, Role};
use toolchat::session::{ChatSession, Console};
use toolchat::tools::{ArgumentSchema, FieldType, Tool, ToolRegistry, ValidatedArgs};

struct AddTool;

impl Tool for AddTool {
    fn name(&self) -> &'static str {
        "add"
    }

    fn description(&self) -> &'static str {
        "Add two integers"
    }

    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new()
            .required("a", FieldType::Integer, "First operand")
            .required("b", FieldType::Integer, "Second operand")
    }

    fn execute(&self, args: &ValidatedArgs) -> eyre::Result<String> {
        let a = args.get_i64("a").unwrap_or_default();
        let b = args.get_i64("b").unwrap_or_default();
        Ok((a + b).to_string())
    }
}

async fn run_script(mock: &Arc<MockLlmClient>, registry: ToolRegistry, script: &str) -> (ChatSession, String) {
    let mut session = ChatSession::new(mock.clone(), registry);
    let mut console = Console::new(script.as_bytes(), Vec::new());
    session.run(&mut console).await.unwrap();
    let printed = String::from_utf8_lossy(console.output()).to_string();
    (session, printed)
}

#[tokio::test]
async fn test_weather_then_email_session() {
    let mock = Arc::new(MockLlmClient::with_texts(&[
        r#"{"tool_name": "get_weather", "tool_input": {"city": "London"}}"#,
        "It's sunny in London.",
        r#"{"tool_name": "send_email", "tool_input": {"recipient": "alice@example.com", "subject": "Meeting", "body": "Hello"}}"#,
        "Done, the email is on its way.",
    ]));

    let script = "What's the weather in London?\nEmail alice about the meeting\nbye\n";
    let (session, out) = run_script(&mock, ToolRegistry::standard(), script).await;

    assert_eq!(mock.requests().len(), 4);
    let conversation = session.conversation();
    assert_eq!(conversation.count_role(Role::Tool), 2);
    assert_eq!(conversation.count_role(Role::Assistant), 2);
    assert_eq!(conversation.count_role(Role::User), 2);

    let tool_turns: Vec<&str> = conversation
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(tool_turns[0], "The weather in London is sunny with a chance of clouds.");
    assert_eq!(
        tool_turns[1],
        "Successfully sent email to 'alice@example.com' with subject 'Meeting'."
    );

    assert!(out.contains("Calling 'get_weather'"));
    assert!(out.contains("Done, the email is on its way."));
}

#[tokio::test]
async fn test_validation_failure_lets_model_recover() {
    let mock = Arc::new(MockLlmClient::with_texts(&[
        r#"{"tool_name": "send_email", "tool_input": {"recipient": "bob@example.com"}}"#,
        "Which subject and body should I use?",
    ]));

    let (session, out) = run_script(&mock, ToolRegistry::standard(), "email bob\nwhat now?\nexit\n").await;

    assert!(out.contains("Validation failed for function 'send_email'"));
    assert!(out.contains("subject (missing)"));
    assert!(out.contains("body (missing)"));

    // The failure message is visible to the model on the next pass
    let second = &mock.requests()[1];
    assert!(
        second
            .messages
            .iter()
            .any(|m| m.role == Role::Assistant && m.content.contains("Validation failed"))
    );
    assert_eq!(session.conversation().count_role(Role::Tool), 0);
}

#[tokio::test]
async fn test_custom_tool_strict_types() {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(AddTool)).unwrap();

    let mock = Arc::new(MockLlmClient::with_texts(&[
        r#"{"tool_name": "add", "tool_input": {"a": "2", "b": 3}}"#,
        r#"{"tool_name": "add", "tool_input": {"a": 2, "b": 3}}"#,
        "The sum is 5.",
    ]));

    let (session, out) = run_script(&mock, registry, "add 2 and 3\ntry again\n").await;

    assert!(out.contains("a (expected integer, got string)"));
    let tool_turn = session
        .conversation()
        .messages()
        .iter()
        .find(|m| m.role == Role::Tool)
        .unwrap();
    assert_eq!(tool_turn.content, "5");
    assert_eq!(tool_turn.name.as_deref(), Some("add"));
    assert!(out.contains("The sum is 5."));
}

#[tokio::test]
async fn test_reset_clears_history_and_wire_round_trip() {
    let mock = Arc::new(MockLlmClient::with_texts(&["Hello!", "Hi again."]));

    let (session, out) = run_script(&mock, ToolRegistry::standard(), "hello\nreset\nhi\n").await;

    assert!(out.contains("Chat history has been reset."));
    // Only the turns after the reset remain
    assert_eq!(session.conversation().len(), 2);
    assert_eq!(mock.requests()[1].messages.len(), 2);

    let wire = session.conversation().to_wire().unwrap();
    let restored = Conversation::from_wire(&wire).unwrap();
    assert_eq!(restored.messages(), session.conversation().messages());
}
