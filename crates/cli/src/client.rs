// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin REST client over the daemon's façade (§4.11, §6): every method maps
//! to one route in `dispatchd_daemon::rest::router`.

use crate::exit_error::ExitError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
pub struct CreateJobRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_acceptance_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExecuteJobRequest {
    agent_id: String,
}

#[derive(Debug, Serialize)]
struct ReprioritizeRequest {
    position: i64,
}

#[derive(Debug, Default, Serialize)]
struct ReconnectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    ping_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueueStatus {
    pub is_paused: bool,
}

impl RestClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string(), api_key }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> anyhow::Result<Value> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();
        if status.is_success() {
            if status == reqwest::StatusCode::NO_CONTENT {
                return Ok(Value::Null);
            }
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body).map(|e| e.error).unwrap_or(body);
            Err(ExitError::new(1, format!("{status}: {message}")).into())
        }
    }

    pub async fn list_jobs(&self) -> anyhow::Result<Value> {
        self.send(self.http.get(self.url("/jobs"))).await
    }

    pub async fn get_job(&self, id: &str, version: Option<u32>) -> anyhow::Result<Value> {
        let mut request = self.http.get(self.url(&format!("/jobs/{id}")));
        if let Some(version) = version {
            request = request.query(&[("version", version)]);
        }
        self.send(request).await
    }

    pub async fn create_job(&self, body: CreateJobRequest) -> anyhow::Result<Value> {
        self.send(self.http.post(self.url("/jobs")).json(&body)).await
    }

    pub async fn update_job(&self, id: &str, patch: JobPatch) -> anyhow::Result<Value> {
        self.send(self.http.put(self.url(&format!("/jobs/{id}"))).json(&patch)).await
    }

    pub async fn archive_job(&self, id: &str) -> anyhow::Result<Value> {
        self.send(self.http.delete(self.url(&format!("/jobs/{id}")))).await
    }

    pub async fn execute_job(&self, id: &str, agent_id: &str) -> anyhow::Result<Value> {
        self.send(self.http.post(self.url(&format!("/jobs/{id}/execute"))).json(&ExecuteJobRequest { agent_id: agent_id.to_string() })).await
    }

    pub async fn reprioritize_job(&self, id: &str, position: i64) -> anyhow::Result<Value> {
        self.send(self.http.post(self.url(&format!("/jobs/{id}/reprioritize"))).json(&ReprioritizeRequest { position })).await
    }

    pub async fn list_agents(&self) -> anyhow::Result<Value> {
        self.send(self.http.get(self.url("/agents"))).await
    }

    pub async fn get_agent(&self, id: &str) -> anyhow::Result<Value> {
        self.send(self.http.get(self.url(&format!("/agents/{id}")))).await
    }

    pub async fn remove_agent(&self, id: &str) -> anyhow::Result<()> {
        self.send(self.http.delete(self.url(&format!("/agents/{id}")))).await?;
        Ok(())
    }

    pub async fn reconnect_agent(&self, id: &str, ping_timeout_secs: Option<u64>) -> anyhow::Result<Value> {
        self.send(self.http.post(self.url(&format!("/agents/{id}/reconnect"))).json(&ReconnectRequest { ping_timeout_secs })).await
    }

    pub async fn pause_queue(&self, queue_type: &str) -> anyhow::Result<()> {
        self.send(self.http.post(self.url(&format!("/queues/{queue_type}/pause")))).await?;
        Ok(())
    }

    pub async fn resume_queue(&self, queue_type: &str) -> anyhow::Result<()> {
        self.send(self.http.post(self.url(&format!("/queues/{queue_type}/resume")))).await?;
        Ok(())
    }

    pub async fn queue_status(&self, queue_type: &str) -> anyhow::Result<QueueStatus> {
        let value = self.send(self.http.get(self.url(&format!("/queues/{queue_type}/status")))).await?;
        Ok(serde_json::from_value(value)?)
    }
}
