/*
 * Copyright 2025 PenTutor Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Client configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use crate::peer::{PeerConfig, DEFAULT_ICE_SERVERS};

/// Configuration shared by the join flow, the session controller and the
/// dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Meetings REST API base URL (e.g. "http://localhost:8000").
    pub api_url: String,
    /// Signaling WebSocket base URL (e.g. "ws://localhost:8000").
    pub ws_url: String,
    /// Deadline for a single join request (default: 15 seconds).
    pub join_timeout: Duration,
    /// User-triggered join retries allowed after the first attempt.
    pub join_max_retries: u32,
    /// STUN/TURN URLs handed to the peer connection.
    pub ice_servers: Vec<String>,
}

const DEFAULT_API_URL: &str = "http://localhost:8000";

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: ws_from_http(DEFAULT_API_URL),
            join_timeout: Duration::from_secs(15),
            join_max_retries: 3,
            ice_servers: DEFAULT_ICE_SERVERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Optional
    /// - `PENTUTOR_API_URL` (default: `"http://localhost:8000"`)
    /// - `PENTUTOR_WS_URL` (default: the API URL with a `ws`/`wss` scheme)
    /// - `PENTUTOR_JOIN_TIMEOUT_SECS` (default: `"15"`)
    /// - `PENTUTOR_JOIN_MAX_RETRIES` (default: `"3"`)
    /// - `PENTUTOR_ICE_SERVERS` (comma separated; default: two public STUN servers)
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = var("PENTUTOR_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let ws_url = var("PENTUTOR_WS_URL").unwrap_or_else(|| ws_from_http(&api_url));
        let join_timeout_secs = var("PENTUTOR_JOIN_TIMEOUT_SECS")
            .unwrap_or_else(|| "15".to_string())
            .parse::<u64>()
            .map_err(|_| "PENTUTOR_JOIN_TIMEOUT_SECS must be a valid integer")?;
        if join_timeout_secs == 0 {
            return Err("PENTUTOR_JOIN_TIMEOUT_SECS must be greater than zero".to_string());
        }
        let join_max_retries = var("PENTUTOR_JOIN_MAX_RETRIES")
            .unwrap_or_else(|| "3".to_string())
            .parse::<u32>()
            .map_err(|_| "PENTUTOR_JOIN_MAX_RETRIES must be a valid integer")?;
        let ice_servers = match var("PENTUTOR_ICE_SERVERS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ICE_SERVERS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            api_url,
            ws_url,
            join_timeout: Duration::from_secs(join_timeout_secs),
            join_max_retries,
            ice_servers,
        })
    }

    pub fn peer_config(&self) -> PeerConfig {
        PeerConfig {
            ice_servers: self.ice_servers.clone(),
        }
    }
}

fn ws_from_http(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.ws_url, "ws://localhost:8000");
        assert_eq!(config.ice_servers.len(), 2);
    }

    #[test]
    fn ws_url_follows_https_api_url() {
        let config =
            ClientConfig::from_lookup(lookup(&[("PENTUTOR_API_URL", "https://api.example/")]))
                .unwrap();
        assert_eq!(config.api_url, "https://api.example");
        assert_eq!(config.ws_url, "wss://api.example");
    }

    #[test]
    fn explicit_values_win() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("PENTUTOR_WS_URL", "ws://signal:9000"),
            ("PENTUTOR_JOIN_TIMEOUT_SECS", "5"),
            ("PENTUTOR_JOIN_MAX_RETRIES", "1"),
            ("PENTUTOR_ICE_SERVERS", "stun:a:1, ,turn:b:2"),
        ]))
        .unwrap();
        assert_eq!(config.ws_url, "ws://signal:9000");
        assert_eq!(config.join_timeout, Duration::from_secs(5));
        assert_eq!(config.join_max_retries, 1);
        assert_eq!(config.peer_config().ice_servers, vec!["stun:a:1", "turn:b:2"]);
    }

    #[test]
    fn invalid_numbers_are_errors() {
        assert!(ClientConfig::from_lookup(lookup(&[("PENTUTOR_JOIN_TIMEOUT_SECS", "soon")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("PENTUTOR_JOIN_TIMEOUT_SECS", "0")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[("PENTUTOR_JOIN_MAX_RETRIES", "-1")])).is_err());
    }

    #[test]
    #[serial_test::serial]
    fn reads_process_environment() {
        env::set_var("PENTUTOR_JOIN_MAX_RETRIES", "7");
        let config = ClientConfig::from_env();
        env::remove_var("PENTUTOR_JOIN_MAX_RETRIES");
        assert_eq!(config.unwrap().join_max_retries, 7);
    }
}
