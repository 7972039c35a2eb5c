//! get_weather tool - mock weather lookup

use super::{ArgumentSchema, FieldType, Tool, ValidatedArgs};

pub struct GetWeatherTool;

impl Tool for GetWeatherTool {
    fn name(&self) -> &'static str {
        "get_weather"
    }

    fn description(&self) -> &'static str {
        "Get the current weather for a specific city."
    }

    fn schema(&self) -> ArgumentSchema {
        ArgumentSchema::new().required("city", FieldType::String, "Name of the city")
    }

    fn execute(&self, args: &ValidatedArgs) -> eyre::Result<String> {
        let city = args.require_str("city")?;

        // Canned answer; no weather service is contacted
        Ok(format!("The weather in {} is sunny with a chance of clouds.", city))
    }
}
