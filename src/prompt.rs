//! Prompt builders for each chat mode

use crate::tools::{SqlCatalog, ToolRegistry};

/// System prompt describing the call format and every registered tool
pub fn tool_system_prompt(registry: &ToolRegistry) -> String {
    let mut prompt = String::from(
        "You are a helpful assistant with access to the following tools.\n\
         Use the tools only when a user's request requires it.\n\n\
         When you need to use a tool, respond with a JSON object in the following format:\n\
         {\n  \"tool_name\": \"name_of_the_tool\",\n  \"tool_input\": { \"arg1\": \"value1\", \"arg2\": \"value2\" }\n}\n\n\
         If the user asks for something you cannot do with the available tools, or if a tool call is not necessary, respond naturally.\n\n\
         Available tools and their schemas:\n",
    );

    for spec in registry.specs() {
        let schema = serde_json::to_string_pretty(&spec.to_prompt_schema()).unwrap_or_default();
        prompt.push_str(&format!("- {}: {}\n", spec.name, schema));
    }

    prompt
}

/// Single-shot prompt asking the model to pick a SQL operation
pub fn sql_prompt(catalog: &SqlCatalog, user_query: &str) -> String {
    let tool_descriptions: Vec<String> = catalog
        .operations()
        .iter()
        .map(|op| {
            format!(
                "Tool Name: {}\nDescription: {}\nParameters: {}",
                op.name,
                op.description,
                op.schema.to_json_schema()
            )
        })
        .collect();

    format!(
        "You are an AI assistant that can call a set of tools to interact with a SQL database.\n\
         Based on the user's request, identify the appropriate tool to call and the parameters for that tool.\n\
         Respond with a JSON object of the form {{\"tool_name\": ..., \"parameters\": {{...}}}}. Do not generate any other text.\n\
         Available Tools:\n{}\n\nUser Request: {}\n",
        tool_descriptions.join("\n"),
        user_query
    )
}

/// Question-answering prompt over extracted page text
pub fn page_prompt(page_text: &str, question: &str) -> String {
    format!(
        "Based on the following text, please answer the question.\n\n--- TEXT ---\n{}\n\n--- QUESTION ---\n{}",
        page_text, question
    )
}
