//! Tool-call mediation
//!
//! Decides whether a model reply is a tool call, validates it against the
//! registry, runs the handler and records the result in the conversation.
//! Every path returns an outcome; nothing here aborts the caller's loop.
//!
//! Conversation effects:
//! - `NaturalLanguage`, `UnknownTool`, `HandlerFailed`: none
//! - `ValidationFailed`: one assistant turn describing the bad fields
//! - `Dispatched`: one tool turn holding the handler's result

use log::{debug, info, warn};
use serde_json::Value;

use crate::conversation::Conversation;
use crate::llm::Message;
use crate::tools::{FieldError, ToolCallRequest, ToolRegistry};

/// What happened to one model reply
#[derive(Debug, Clone, PartialEq)]
pub enum MediationOutcome {
    /// Not a tool call; the text is the reply
    NaturalLanguage(String),
    UnknownTool(String),
    ValidationFailed { tool_name: String, errors: Vec<FieldError> },
    Dispatched { tool_name: String, result: String },
    HandlerFailed { tool_name: String, message: String },
}

/// Mediate one raw model reply.
pub fn mediate(raw: &str, registry: &ToolRegistry, conversation: &mut Conversation) -> MediationOutcome {
    let Some(request) = parse_tool_call(raw) else {
        return MediationOutcome::NaturalLanguage(raw.to_string());
    };
    debug!("Tool call: {} {}", request.tool_name, request.tool_input);

    let Some(tool) = registry.get(&request.tool_name) else {
        warn!("Model asked for unknown tool '{}'", request.tool_name);
        return MediationOutcome::UnknownTool(request.tool_name);
    };

    let args = match tool.schema().validate(&request.tool_input) {
        Ok(args) => args,
        Err(errors) => {
            warn!("Validation failed for '{}': {} field error(s)", request.tool_name, errors.len());
            conversation.push(Message::assistant(validation_message(&request.tool_name, &errors)));
            return MediationOutcome::ValidationFailed {
                tool_name: request.tool_name,
                errors,
            };
        }
    };

    match tool.execute(&args) {
        Ok(result) => {
            info!("Dispatched '{}'", request.tool_name);
            conversation.push(Message::tool(&request.tool_name, &result));
            MediationOutcome::Dispatched {
                tool_name: request.tool_name,
                result,
            }
        }
        Err(e) => {
            warn!("Tool '{}' failed: {:#}", request.tool_name, e);
            MediationOutcome::HandlerFailed {
                tool_name: request.tool_name,
                message: e.to_string(),
            }
        }
    }
}

/// Strictly parse the whole reply as one JSON object and classify it
fn parse_tool_call(raw: &str) -> Option<ToolCallRequest> {
    let value: Value = serde_json::from_str(raw.trim()).ok()?;
    ToolCallRequest::from_object(value.as_object()?)
}

/// Assistant-turn text asking the user for missing or invalid arguments
pub fn validation_message(tool_name: &str, errors: &[FieldError]) -> String {
    let fields: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    format!(
        "Validation failed for function '{}': The following arguments are missing or invalid: {}. Please provide the required information.",
        tool_name,
        fields.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::tools::{ArgumentSchema, FieldErrorKind, FieldType, Tool, ValidatedArgs};

    struct FailingTool;

    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn description(&self) -> &'static str {
            "Always fails"
        }

        fn schema(&self) -> ArgumentSchema {
            ArgumentSchema::new().optional("x", FieldType::Integer, "")
        }

        fn execute(&self, _args: &ValidatedArgs) -> eyre::Result<String> {
            Err(eyre::eyre!("backend offline"))
        }
    }

    fn seeded() -> Conversation {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("hello"));
        conversation
    }

    #[test]
    fn test_plain_text_is_natural_language() {
        let registry = ToolRegistry::standard();
        let mut conversation = seeded();
        let outcome = mediate("The sky is blue.", &registry, &mut conversation);
        assert_eq!(outcome, MediationOutcome::NaturalLanguage("The sky is blue.".to_string()));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_json_in_prose_is_natural_language() {
        let registry = ToolRegistry::standard();
        let mut conversation = seeded();
        let raw = r#"Sure: {"tool_name": "get_weather", "tool_input": {"city": "Paris"}}"#;
        let outcome = mediate(raw, &registry, &mut conversation);
        assert_eq!(outcome, MediationOutcome::NaturalLanguage(raw.to_string()));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_json_without_call_fields_is_natural_language() {
        let registry = ToolRegistry::standard();
        let mut conversation = seeded();
        let raw = r#"{"response": "Hi! How can I help?"}"#;
        assert_eq!(
            mediate(raw, &registry, &mut conversation),
            MediationOutcome::NaturalLanguage(raw.to_string())
        );
        assert_eq!(
            mediate("[1, 2, 3]", &registry, &mut conversation),
            MediationOutcome::NaturalLanguage("[1, 2, 3]".to_string())
        );
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_unknown_tool() {
        let registry = ToolRegistry::standard();
        let mut conversation = seeded();
        let raw = r#"{"tool_name": "book_flight", "tool_input": {"to": "Oslo"}}"#;
        let outcome = mediate(raw, &registry, &mut conversation);
        assert_eq!(outcome, MediationOutcome::UnknownTool("book_flight".to_string()));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_missing_required_field() {
        let registry = ToolRegistry::standard();
        let mut conversation = seeded();
        let outcome = mediate(
            r#"{"tool_name": "get_weather", "tool_input": {}}"#,
            &registry,
            &mut conversation,
        );

        assert_eq!(
            outcome,
            MediationOutcome::ValidationFailed {
                tool_name: "get_weather".to_string(),
                errors: vec![FieldError::new("city", FieldErrorKind::Missing)],
            }
        );
        assert_eq!(conversation.len(), 2);
        let turn = conversation.last().unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert!(turn.content.contains("get_weather"));
        assert!(turn.content.contains("city (missing)"));
    }

    #[test]
    fn test_wrong_type_field() {
        let registry = ToolRegistry::standard();
        let mut conversation = Conversation::new();
        let outcome = mediate(
            r#"{"tool_name": "get_weather", "tool_input": {"city": 12}}"#,
            &registry,
            &mut conversation,
        );
        let MediationOutcome::ValidationFailed { errors, .. } = outcome else {
            panic!("expected validation failure");
        };
        assert_eq!(errors[0].to_string(), "city (expected string, got integer)");
        assert_eq!(conversation.count_role(Role::Assistant), 1);
    }

    #[test]
    fn test_tool_name_without_input_reports_missing_fields() {
        let registry = ToolRegistry::standard();
        let mut conversation = Conversation::new();
        let outcome = mediate(r#"{"tool_name": "send_email"}"#, &registry, &mut conversation);
        let MediationOutcome::ValidationFailed { errors, .. } = outcome else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 3);
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_dispatch() {
        let registry = ToolRegistry::standard();
        let mut conversation = seeded();
        let outcome = mediate(
            r#"{"tool_name":"get_weather","tool_input":{"city":"London"}}"#,
            &registry,
            &mut conversation,
        );

        let expected = "The weather in London is sunny with a chance of clouds.";
        assert_eq!(
            outcome,
            MediationOutcome::Dispatched {
                tool_name: "get_weather".to_string(),
                result: expected.to_string(),
            }
        );
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last().unwrap(), &Message::tool("get_weather", expected));
    }

    #[test]
    fn test_dispatch_tolerates_whitespace_and_extra_fields() {
        let registry = ToolRegistry::standard();
        let mut conversation = Conversation::new();
        let raw = "\n  {\"tool_name\": \"get_weather\", \"tool_input\": {\"city\": \"Oslo\", \"units\": \"C\"}}\n";
        let outcome = mediate(raw, &registry, &mut conversation);
        assert!(matches!(outcome, MediationOutcome::Dispatched { .. }));
    }

    #[test]
    fn test_handler_failure_leaves_conversation() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FailingTool)).unwrap();
        let mut conversation = seeded();

        let outcome = mediate(r#"{"tool_name": "flaky", "tool_input": {}}"#, &registry, &mut conversation);
        assert_eq!(
            outcome,
            MediationOutcome::HandlerFailed {
                tool_name: "flaky".to_string(),
                message: "backend offline".to_string(),
            }
        );
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_non_mutating_paths_are_idempotent() {
        let registry = ToolRegistry::standard();
        let mut conversation = seeded();

        for raw in ["just text", r#"{"tool_name": "nope", "tool_input": {}}"#] {
            let first = mediate(raw, &registry, &mut conversation);
            let snapshot = conversation.clone();
            let second = mediate(raw, &registry, &mut conversation);
            assert_eq!(first, second);
            assert_eq!(conversation, snapshot);
            assert_eq!(conversation.len(), 1);
        }
    }

    #[test]
    fn test_validation_message() {
        let message = validation_message(
            "send_email",
            &[
                FieldError::new("subject", FieldErrorKind::Missing),
                FieldError::new("body", FieldErrorKind::Missing),
            ],
        );
        assert_eq!(
            message,
            "Validation failed for function 'send_email': The following arguments are missing or invalid: subject (missing), body (missing). Please provide the required information."
        );
    }
}
