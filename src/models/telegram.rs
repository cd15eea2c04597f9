//! Inbound Telegram update shapes.
//!
//! Only the fields the relay reads are modelled, and every one of them is
//! optional: a field that is missing or of the wrong type reads as absent,
//! so a structurally odd update still deserializes and is later ignored by
//! the handler. Only invalid JSON fails to parse.

use serde::{ de::DeserializeOwned, Deserialize, Deserializer, Serialize };
use serde_json::Value;

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where D: Deserializer<'de>, T: DeserializeOwned
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Update {
    #[serde(default, deserialize_with = "lenient")]
    pub update_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<Message>,
}

impl Update {
    /// Fails only when the body is not JSON at all.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_slice(body)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Message {
    #[serde(default, deserialize_with = "lenient")]
    pub message_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub chat: Option<Chat>,
    #[serde(default, deserialize_with = "lenient")]
    pub from: Option<User>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Chat {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct User {
    #[serde(default, deserialize_with = "lenient")]
    pub first_name: Option<String>,
}
