use serde::Deserialize;

/// One webhook delivery. Only message updates are interesting here; every
/// other update kind deserializes with `message: None` and is ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<Sender>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Sender {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The routable core of an update: who wrote what, and where to reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: i64,
    pub chat_id: i64,
    pub text: String,
}

impl Update {
    /// Extracts the routable parts. Updates without a sender or without text
    /// (stickers, joins, edits of other kinds) yield `None`.
    pub fn into_inbound(self) -> Option<Inbound> {
        let message = self.message?;
        let user_id = message.from?.id;
        let text = message.text?;
        Some(Inbound { user_id, chat_id: message.chat.id, text })
    }
}

#[cfg(test)]
mod tests {
    use super::{Inbound, Update};

    #[test]
    fn text_update_extracts_inbound() {
        let raw = r#"{
            "update_id": 1001,
            "message": {
                "message_id": 7,
                "from": {"id": 42, "is_bot": false, "first_name": "Dana"},
                "chat": {"id": 42, "type": "private"},
                "text": "a black hoodie"
            }
        }"#;

        let update: Update = serde_json::from_str(raw).expect("parse update");
        assert_eq!(
            update.into_inbound(),
            Some(Inbound { user_id: 42, chat_id: 42, text: "a black hoodie".to_string() })
        );
    }

    #[test]
    fn non_text_update_is_ignored() {
        let raw = r#"{
            "update_id": 1002,
            "message": {
                "message_id": 8,
                "from": {"id": 42},
                "chat": {"id": 42},
                "sticker": {"file_id": "abc"}
            }
        }"#;

        let update: Update = serde_json::from_str(raw).expect("parse update");
        assert!(update.into_inbound().is_none());
    }

    #[test]
    fn update_without_message_is_ignored() {
        let update: Update =
            serde_json::from_str(r#"{"update_id": 1003}"#).expect("parse update");
        assert!(update.into_inbound().is_none());
    }
}
