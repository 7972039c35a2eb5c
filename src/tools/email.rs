//! send_email tool - mock mail delivery

use super::{ArgumentSchema, FieldType, Tool, ValidatedArgs};

pub struct SendEmailTool;

impl Tool for SendEmailTool {
    fn name(&self) -> &'static str {
        "send_email"
    }

    fn description(&self) -> &'static str {
        "Send an email to a recipient with a specified subject and body."
    }

    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new()
            .required("recipient", FieldType::String, "Email address of the recipient")
            .required("subject", FieldType::String, "Subject line")
            .required("body", FieldType::String, "Message body")
    }

    fn execute(&self, args: &ValidatedArgs) -> eyre::Result<String> {
        let recipient = args.require_str("recipient")?;
        let subject = args.require_str("subject")?;
        args.require_str("body")?;

        Ok(format!(
            "Successfully sent email to '{}' with subject '{}'.",
            recipient, subject
        ))
    }
}
