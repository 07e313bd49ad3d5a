//! REST client for the taskboard API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use taskboard_common::{
    AnswerResponse, AskRequest, MessageResponse, Project, ProjectInput, StatusUpdate,
    SummaryResponse, Task, TaskInput, TaskStatus,
};

use crate::config::ClientSettings;
use crate::errors::ClientError;

/// The backend operations the board store depends on.
/// Real implementation: `HttpApi`.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, ClientError>;
    async fn create_project(&self, input: &ProjectInput) -> Result<Project, ClientError>;
    async fn update_project(&self, id: &str, input: &ProjectInput) -> Result<Project, ClientError>;
    async fn delete_project(&self, id: &str) -> Result<(), ClientError>;
    async fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>, ClientError>;
    async fn create_task(&self, input: &TaskInput) -> Result<Task, ClientError>;
    async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, ClientError>;
    async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: &str) -> Result<(), ClientError>;
    async fn project_summary(&self, project_id: &str) -> Result<String, ClientError>;
    async fn ask(&self, request: &AskRequest) -> Result<String, ClientError>;
}

pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        Self::new(
            &settings.api_url,
            Duration::from_secs(settings.connect_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let resp = request
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = resp.status();
        if status.is_server_error() {
            return Err(ClientError::Transport(format!("server returned {}", status)));
        }
        if status.is_client_error() {
            return Err(rejection(status, resp).await);
        }
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

async fn rejection(status: StatusCode, resp: reqwest::Response) -> ClientError {
    let message = match resp.json::<MessageResponse>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };
    ClientError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        self.send(self.http.get(self.url("/projects"))).await
    }

    async fn create_project(&self, input: &ProjectInput) -> Result<Project, ClientError> {
        self.send(self.http.post(self.url("/projects")).json(input))
            .await
    }

    async fn update_project(&self, id: &str, input: &ProjectInput) -> Result<Project, ClientError> {
        self.send(
            self.http
                .put(self.url(&format!("/projects/{}", id)))
                .json(input),
        )
        .await
    }

    async fn delete_project(&self, id: &str) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .send(self.http.delete(self.url(&format!("/projects/{}", id))))
            .await?;
        Ok(())
    }

    async fn list_tasks(&self, project_id: &str) -> Result<Vec<Task>, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("/tasks/project/{}", project_id))),
        )
        .await
    }

    async fn create_task(&self, input: &TaskInput) -> Result<Task, ClientError> {
        self.send(self.http.post(self.url("/tasks")).json(input)).await
    }

    async fn update_task(&self, id: &str, input: &TaskInput) -> Result<Task, ClientError> {
        self.send(
            self.http
                .put(self.url(&format!("/tasks/{}", id)))
                .json(input),
        )
        .await
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Task, ClientError> {
        self.send(
            self.http
                .put(self.url(&format!("/tasks/{}/status", id)))
                .json(&StatusUpdate { status }),
        )
        .await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ClientError> {
        let _: MessageResponse = self
            .send(self.http.delete(self.url(&format!("/tasks/{}", id))))
            .await?;
        Ok(())
    }

    async fn project_summary(&self, project_id: &str) -> Result<String, ClientError> {
        let resp: SummaryResponse = self
            .send(
                self.http
                    .get(self.url(&format!("/projects/{}/summary", project_id))),
            )
            .await?;
        Ok(resp.summary)
    }

    async fn ask(&self, request: &AskRequest) -> Result<String, ClientError> {
        let resp: AnswerResponse = self
            .send(self.http.post(self.url("/tasks/ask")).json(request))
            .await?;
        Ok(resp.answer)
    }
}
