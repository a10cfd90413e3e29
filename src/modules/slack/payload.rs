use serde::{Deserialize, Serialize};

pub const RESPONSE_TYPE: &str = "in_channel";
pub const COLOR: &str = "#3AA3E3";
pub const IMAGE_URL: &str = "https://datadoghq.com/snapshot/path/to/snapshot.png";

/// Slash command response posted visibly in the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub response_type: String,
    pub text: String,
    pub color: String,
    pub image_url: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub text: String,
}

impl ChatPayload {
    pub fn in_channel(headline: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            response_type: RESPONSE_TYPE.to_string(),
            text: headline.into(),
            color: COLOR.to_string(),
            image_url: IMAGE_URL.to_string(),
            attachments: vec![Attachment { text: body.into() }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_documented_shape() {
        let payload = ChatPayload::in_channel("Command syntax:", "body");
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "response_type": "in_channel",
                "text": "Command syntax:",
                "color": "#3AA3E3",
                "image_url": IMAGE_URL,
                "attachments": [{"text": "body"}]
            })
        );
    }
}
