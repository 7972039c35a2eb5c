//! Chat-to-SQL translation
//!
//! The model picks one of a fixed set of parameterised statements and
//! supplies its arguments. Translation yields the statement text and the
//! bound values in placeholder order. Statements are never executed.

use std::fmt;

use log::{debug, warn};

use super::{ArgValue, ArgumentSchema, FieldError, FieldType, ToolCallRequest};
use crate::extract::extract_json_object;

/// One parameterised statement the model may choose
#[derive(Debug, Clone)]
pub struct SqlOperation {
    pub name: &'static str,
    pub description: &'static str,
    pub statement: &'static str,
    pub schema: ArgumentSchema,
    /// Argument names in `?` placeholder order
    pub bind_order: &'static [&'static str],
}

/// A derived statement ready for a database driver
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql_query: String,
    pub param_values: Vec<ArgValue>,
}

impl fmt::Display for SqlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.param_values.iter().map(|v| v.to_string()).collect();
        write!(f, "{} [{}]", self.sql_query, params.join(", "))
    }
}

/// Result of translating one model reply
#[derive(Debug, Clone, PartialEq)]
pub enum SqlOutcome {
    Statement(SqlStatement),
    /// No tool call could be read from the reply
    Unparseable(String),
    Unsupported(String),
    Invalid { tool_name: String, errors: Vec<FieldError> },
}

/// The fixed set of customer-table operations
pub struct SqlCatalog {
    operations: Vec<SqlOperation>,
}

impl SqlCatalog {
    pub fn standard() -> Self {
        let operations = vec![
            SqlOperation {
                name: "get_customer_by_id",
                description: "Retrieves a customer's information from the database using their ID.",
                statement: "SELECT * FROM Customers WHERE CustomerID = ?",
                schema: ArgumentSchema::new().required(
                    "customer_id",
                    FieldType::Integer,
                    "The unique ID of the customer.",
                ),
                bind_order: &["customer_id"],
            },
            SqlOperation {
                name: "add_new_customer",
                description: "Adds a new customer to the database.",
                statement: "INSERT INTO Customers (FirstName, LastName, City) VALUES (?, ?, ?)",
                schema: ArgumentSchema::new()
                    .required("first_name", FieldType::String, "The first name of the customer.")
                    .required("last_name", FieldType::String, "The last name of the customer.")
                    .required("city", FieldType::String, "The city of the customer."),
                bind_order: &["first_name", "last_name", "city"],
            },
            SqlOperation {
                name: "update_customer_city",
                description: "Updates the city of an existing customer.",
                statement: "UPDATE Customers SET City = ? WHERE CustomerID = ?",
                schema: ArgumentSchema::new()
                    .required("customer_id", FieldType::Integer, "The ID of the customer.")
                    .required("new_city", FieldType::String, "The new city for the customer."),
                bind_order: &["new_city", "customer_id"],
            },
            SqlOperation {
                name: "delete_customer",
                description: "Deletes a customer from the database using their ID.",
                statement: "DELETE FROM Customers WHERE CustomerID = ?",
                schema: ArgumentSchema::new().required(
                    "customer_id",
                    FieldType::Integer,
                    "The unique ID of the customer.",
                ),
                bind_order: &["customer_id"],
            },
        ];

        Self { operations }
    }

    pub fn operations(&self) -> &[SqlOperation] {
        &self.operations
    }

    pub fn get(&self, name: &str) -> Option<&SqlOperation> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Turn a raw model reply into a statement. Prose around the JSON is tolerated.
    pub fn translate(&self, raw: &str) -> SqlOutcome {
        let Some(value) = extract_json_object(raw) else {
            return SqlOutcome::Unparseable(raw.to_string());
        };
        debug!("Extracted SQL tool call: {}", value);

        let Some(request) = value.as_object().and_then(ToolCallRequest::from_object) else {
            return SqlOutcome::Unparseable(raw.to_string());
        };

        let Some(operation) = self.get(&request.tool_name) else {
            warn!("Model requested unsupported SQL tool '{}'", request.tool_name);
            return SqlOutcome::Unsupported(request.tool_name);
        };

        let args = match operation.schema.validate(&request.tool_input) {
            Ok(args) => args,
            Err(errors) => {
                return SqlOutcome::Invalid {
                    tool_name: request.tool_name,
                    errors,
                };
            }
        };

        let param_values = operation
            .bind_order
            .iter()
            .filter_map(|name| args.get(name).cloned())
            .collect();

        SqlOutcome::Statement(SqlStatement {
            sql_query: operation.statement.to_string(),
            param_values,
        })
    }
}

impl Default for SqlCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_operations() {
        let catalog = SqlCatalog::standard();
        assert_eq!(catalog.operations().len(), 4);
        for op in catalog.operations() {
            let placeholders = op.statement.matches('?').count();
            assert_eq!(placeholders, op.bind_order.len(), "{}", op.name);
            for name in op.bind_order {
                assert!(op.schema.get(name).is_some(), "{} binds unknown {}", op.name, name);
            }
        }
    }

    #[test]
    fn test_translate_select() {
        let outcome = SqlCatalog::standard()
            .translate(r#"{"tool_name": "get_customer_by_id", "parameters": {"customer_id": 42}}"#);
        assert_eq!(
            outcome,
            SqlOutcome::Statement(SqlStatement {
                sql_query: "SELECT * FROM Customers WHERE CustomerID = ?".to_string(),
                param_values: vec![ArgValue::Integer(42)],
            })
        );
    }

    #[test]
    fn test_translate_binds_in_placeholder_order() {
        let raw = r#"Here you go:
```json
{"tool_name": "update_customer_city", "parameters": {"customer_id": 3, "new_city": "Berlin"}}
```"#;
        let SqlOutcome::Statement(statement) = SqlCatalog::standard().translate(raw) else {
            panic!("expected statement");
        };
        assert_eq!(statement.sql_query, "UPDATE Customers SET City = ? WHERE CustomerID = ?");
        assert_eq!(
            statement.param_values,
            vec![ArgValue::String("Berlin".to_string()), ArgValue::Integer(3)]
        );
        assert_eq!(
            statement.to_string(),
            "UPDATE Customers SET City = ? WHERE CustomerID = ? ['Berlin', 3]"
        );
    }

    #[test]
    fn test_translate_insert_accepts_tool_input_key() {
        let outcome = SqlCatalog::standard().translate(
            r#"{"tool_name": "add_new_customer", "tool_input": {"city": "Leeds", "last_name": "Lovelace", "first_name": "Ada"}}"#,
        );
        let SqlOutcome::Statement(statement) = outcome else {
            panic!("expected statement");
        };
        assert_eq!(
            statement.param_values,
            vec![
                ArgValue::String("Ada".to_string()),
                ArgValue::String("Lovelace".to_string()),
                ArgValue::String("Leeds".to_string()),
            ]
        );
    }

    #[test]
    fn test_translate_unparseable() {
        let outcome = SqlCatalog::standard().translate("I cannot help with that.");
        assert_eq!(outcome, SqlOutcome::Unparseable("I cannot help with that.".to_string()));
    }

    #[test]
    fn test_translate_unsupported() {
        let outcome = SqlCatalog::standard().translate(r#"{"tool_name": "drop_table", "parameters": {}}"#);
        assert_eq!(outcome, SqlOutcome::Unsupported("drop_table".to_string()));
    }

    #[test]
    fn test_translate_invalid_arguments() {
        let outcome = SqlCatalog::standard()
            .translate(r#"{"tool_name": "delete_customer", "parameters": {"customer_id": "abc"}}"#);
        let SqlOutcome::Invalid { tool_name, errors } = outcome else {
            panic!("expected invalid");
        };
        assert_eq!(tool_name, "delete_customer");
        assert_eq!(errors[0].field, "customer_id");
    }
}
