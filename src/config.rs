use std::{path::PathBuf, time::Duration};

use crate::{
    constants::{DEFAULT_API_URL, PUSH_CHANNEL_PATH},
    live_updates::ReconnectPolicy,
};

/// Everything the client needs to reach the backend. Built once by the binary
/// and handed to the constructors; nothing here is global.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub push_url: String,
    pub token_file: Option<PathBuf>,
    pub request_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Config {
    pub fn new(api_url: &str) -> Self {
        let api_url = api_url.trim_end_matches('/').to_string();
        Config {
            push_url: format!("{}{}", api_url, PUSH_CHANNEL_PATH),
            api_url,
            token_file: None,
            request_timeout: Duration::from_secs(15),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_push_url(mut self, push_url: Option<String>) -> Self {
        if let Some(url) = push_url {
            self.push_url = url;
        }
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_url_derives_from_api_url() {
        let cfg = Config::new("http://bar.local:3000/");
        assert_eq!(cfg.api_url, "http://bar.local:3000");
        assert_eq!(cfg.push_url, "http://bar.local:3000/ws");
        assert_eq!(cfg.endpoint("/api/drinks"), "http://bar.local:3000/api/drinks");
    }

    #[test]
    fn explicit_push_url_wins() {
        let cfg = Config::default().with_push_url(Some("ws://push.local/ws".to_string()));
        assert_eq!(cfg.push_url, "ws://push.local/ws");
    }
}
