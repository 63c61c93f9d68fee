//! List store reached through a Webdis HTTP endpoint.
//!
//! Webdis maps `GET /<COMMAND>/<arg>/...` to a Redis command and replies with
//! `{"<COMMAND>": <value>}`. Redis errors come back as `[false, "<message>"]`.
use crate::{config::WebdisConfig, store::ListStore};
use anyhow::Result as AnyResult;
use log::{info, trace};
use reqwest::{blocking::Client, Url};
use serde_json::Value;
use std::time::Duration;
use trajectory_core::{MemoryError, Result};

/// A [`ListStore`] backed by Redis behind Webdis.
pub struct WebdisListStore {
    client: Client,
    base_url: Url,
}

impl WebdisListStore {
    /// Creates a client for the endpoint in `config`.
    ///
    /// No request is sent; an unreachable server is reported by the first command.
    pub fn build(config: &WebdisConfig) -> AnyResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid Webdis base URL: {}", config.base_url);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        info!("Webdis list store at {}", base_url);
        Ok(Self { client, base_url })
    }

    fn url(&self, args: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                MemoryError::RemoteUnavailable(format!("Invalid base URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(args);
        Ok(url)
    }

    /// Sends a command and returns the value under its name in the reply.
    fn command(&self, command: &str, args: &[&str]) -> Result<Value> {
        let mut segments = vec![command];
        segments.extend_from_slice(args);
        let url = self.url(&segments)?;
        trace!("GET {}", url);

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| MemoryError::RemoteUnavailable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(MemoryError::RemoteUnavailable(format!(
                "{} replied with status {}",
                command, status
            )));
        }
        let body = resp
            .text()
            .map_err(|e| MemoryError::RemoteUnavailable(e.to_string()))?;

        let mut reply: Value =
            serde_json::from_str(&body).map_err(|e| MemoryError::Decode(e.to_string()))?;
        match reply.get_mut(command).map(Value::take) {
            Some(Value::Array(ref err)) if err.first() == Some(&Value::Bool(false)) => {
                Err(MemoryError::Decode(format!("{} failed: {}", command, body)))
            }
            Some(value) => Ok(value),
            None => Err(MemoryError::Decode(format!(
                "Unexpected reply to {}: {}",
                command, body
            ))),
        }
    }

    fn integer_reply(command: &str, value: Value) -> Result<usize> {
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| {
                MemoryError::Decode(format!("{} expects an integer: {}", command, value))
            })
    }
}

impl ListStore for WebdisListStore {
    fn rpush(&self, key: &str, values: &[String]) -> Result<usize> {
        let mut args = vec![key];
        args.extend(values.iter().map(String::as_str));
        let value = self.command("RPUSH", &args)?;
        Self::integer_reply("RPUSH", value)
    }

    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let (start, stop) = (start.to_string(), stop.to_string());
        match self.command("LRANGE", &[key, &start, &stop])? {
            Value::Array(values) => values
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s),
                    v => Err(MemoryError::Decode(format!("LRANGE expects strings: {}", v))),
                })
                .collect(),
            v => Err(MemoryError::Decode(format!("LRANGE expects an array: {}", v))),
        }
    }

    fn llen(&self, key: &str) -> Result<usize> {
        let value = self.command("LLEN", &[key])?;
        Self::integer_reply("LLEN", value)
    }

    fn lindex(&self, key: &str, index: i64) -> Result<Option<String>> {
        match self.command("LINDEX", &[key, &index.to_string()])? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            v => Err(MemoryError::Decode(format!("LINDEX expects a string: {}", v))),
        }
    }

    fn del(&self, key: &str) -> Result<()> {
        let value = self.command("DEL", &[key])?;
        Self::integer_reply("DEL", value).map(|_| ())
    }
}
