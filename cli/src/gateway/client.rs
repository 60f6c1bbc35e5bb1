// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for a running gateway

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use scatter_gather_core::domain::chat::ChatSummary;

/// What `/chat/summary` answered.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Ok(ChatSummary),
    Degraded(ChatSummary),
    Failed(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn for_address(host: &str, port: u16) -> Result<Self> {
        Self::new(format!("http://{}:{}", host, port))
    }

    pub async fn health(&self) -> Result<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Failed to reach gateway")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Health check failed: {}", error_text);
        }

        response.json().await.context("Failed to parse health response")
    }

    /// `overrides` are passed through as extra query parameters.
    pub async fn chat_summary(
        &self,
        user_id: &str,
        chat_id: &str,
        overrides: &[(String, String)],
    ) -> Result<SummaryOutcome> {
        let mut query: Vec<(&str, &str)> = vec![("user_id", user_id), ("chat_id", chat_id)];
        query.extend(overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let response = self
            .client
            .get(format!("{}/chat/summary", self.base_url))
            .query(&query)
            .send()
            .await
            .context("Failed to request chat summary")?;

        match response.status() {
            StatusCode::OK => {
                let summary: ChatSummary = response
                    .json()
                    .await
                    .context("Failed to parse chat summary")?;
                if summary.degraded {
                    Ok(SummaryOutcome::Degraded(summary))
                } else {
                    Ok(SummaryOutcome::Ok(summary))
                }
            }
            StatusCode::INTERNAL_SERVER_ERROR => {
                let body: ErrorBody = response
                    .json()
                    .await
                    .context("Failed to parse error response")?;
                Ok(SummaryOutcome::Failed(body.error))
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Chat summary rejected ({}): {}", status, error_text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_degraded_summary() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/chat/summary")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("user_id".into(), "1".into()),
                Matcher::UrlEncoded("chat_id".into(), "42".into()),
                Matcher::UrlEncoded("vm_delay".into(), "3s".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"user":{"id":"1","name":"Ivan"},"permissions":{"chat_id":"42","user_id":"1","allowed":true},"degraded":true}"#,
            )
            .create_async()
            .await;

        let client = GatewayClient::new(server.url()).unwrap();
        let outcome = client
            .chat_summary("1", "42", &[("vm_delay".to_string(), "3s".to_string())])
            .await
            .unwrap();

        mock.assert_async().await;
        match outcome {
            SummaryOutcome::Degraded(summary) => {
                assert!(summary.context.is_none());
                assert_eq!(summary.user.map(|u| u.name).as_deref(), Some("Ivan"));
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_summary_carries_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/chat/summary")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body(r#"{"error":"critical dependency failed: user"}"#)
            .create_async()
            .await;

        let client = GatewayClient::new(server.url()).unwrap();
        let outcome = client.chat_summary("1", "42", &[]).await.unwrap();

        assert_eq!(
            outcome,
            SummaryOutcome::Failed("critical dependency failed: user".to_string())
        );
    }

    #[tokio::test]
    async fn test_bad_request_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/chat/summary")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"missing required parameter: user_id"}"#)
            .create_async()
            .await;

        let client = GatewayClient::new(server.url()).unwrap();
        let err = client.chat_summary("", "42", &[]).await.unwrap_err();

        assert!(err.to_string().contains("missing required parameter"));
    }
}
