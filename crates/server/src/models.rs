use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherQuery {
    #[serde(rename = "cityName")]
    pub city_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginQuery {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatQuery {
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub generation: String,
}

/// Flattens a JSON object of user fields into template arguments. Strings
/// keep their raw value; other JSON values use their compact rendering.
pub fn user_args(fields: &Map<String, Value>) -> HashMap<String, String> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), stringify(value)))
        .collect()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_deserialize_weather_query_with_camel_case_key() {
        let query: WeatherQuery = serde_json::from_value(json!({"cityName": "北京"})).unwrap();
        assert_eq!(query.city_name, "北京");
    }

    #[test]
    fn should_deserialize_chat_query_without_message() {
        let query: ChatQuery = serde_json::from_value(json!({})).unwrap();
        assert!(query.message.is_none());
    }

    #[test]
    fn should_serialize_generation_response() {
        let response = GenerationResponse {
            generation: "a joke".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"generation":"a joke"}"#);
    }

    #[test]
    fn should_flatten_user_fields_to_template_arguments() {
        let body = json!({
            "login": "louis",
            "password": "s3cret",
            "firstName": "Louis",
            "lastName": "Wang",
            "email": "louis@example.com",
            "age": 30
        });

        let args = user_args(body.as_object().unwrap());

        assert_eq!(args["login"], "louis");
        assert_eq!(args["age"], "30");
        assert_eq!(args.len(), 6);
    }

    #[test]
    fn should_render_nested_values_compactly() {
        let body = json!({"profile": {"city": "武汉"}});
        let args = user_args(body.as_object().unwrap());
        assert_eq!(args["profile"], r#"{"city":"武汉"}"#);
    }
}
