pub const DEFAULT_BASE_URL: &str = "http://localhost:9090";

/// Endpoint configuration for the chat backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP base of the backend, e.g. `http://localhost:9090`.
    pub base_url: String,
    /// Chat endpoint base override for split deployments; derived from
    /// `base_url` when unset.
    pub chat_base_url: Option<String>,
    /// Sticker choices offered by the picker.
    pub default_stickers: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_base_url: None,
            default_stickers: vec![
                "/stickers/sticker1.png".to_string(),
                "/stickers/sticker2.png".to_string(),
                "/stickers/sticker3.png".to_string(),
            ],
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: String) -> Self {
        ClientConfig {
            base_url,
            ..ClientConfig::default()
        }
    }

    /// Identity endpoint queried once per connect.
    pub fn profile_url(&self) -> String {
        format!("{}/v1/users/profile", self.base_url)
    }

    /// WebSocket endpoint for the chat session, derived from the HTTP base.
    pub fn chat_url(&self) -> String {
        let base = self.chat_base_url.as_ref().unwrap_or(&self.base_url);
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.clone()
        };
        format!("{}/chat", ws_base)
    }
}
