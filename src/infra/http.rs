//! reqwest adapter for the external blog API.

use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::application::remote::{
    ApiError, BlogApi, CreatedPostRecord, RemoteCommentRecord, RemotePhotoRecord,
    RemotePostRecord, RemoteTodoRecord, RemoteUserRecord, RemoteWriteParams,
};
use crate::config::ApiSettings;
use crate::infra::error::InfraError;

pub struct HttpBlogApi {
    client: Client,
    base: Url,
    posts_limit: u32,
    photos_limit: u32,
}

impl HttpBlogApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build http client: {err}"))
            })?;

        let base = settings.base_url.join("/").map_err(|err| {
            InfraError::configuration(format!("invalid api base url: {err}"))
        })?;

        Ok(Self {
            client,
            base,
            posts_limit: settings.posts_limit,
            photos_limit: settings.photos_limit,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("inklet/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::Transport(err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        let resp = self.client.get(url).send().await.map_err(transport)?;
        Self::decode(resp).await
    }

    async fn send_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), ApiError> {
        let url = self.url(path)?;
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                code: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(transport)?;
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

#[async_trait]
impl BlogApi for HttpBlogApi {
    async fn list_posts(&self) -> Result<Vec<RemotePostRecord>, ApiError> {
        self.get_json("posts", &[("_limit", self.posts_limit.to_string())])
            .await
    }

    async fn list_users(&self) -> Result<Vec<RemoteUserRecord>, ApiError> {
        self.get_json("users", &[]).await
    }

    async fn list_photos(&self) -> Result<Vec<RemotePhotoRecord>, ApiError> {
        self.get_json("photos", &[("_limit", self.photos_limit.to_string())])
            .await
    }

    async fn list_comments(&self) -> Result<Vec<RemoteCommentRecord>, ApiError> {
        self.get_json("comments", &[]).await
    }

    async fn list_todos(&self) -> Result<Vec<RemoteTodoRecord>, ApiError> {
        self.get_json("todos", &[]).await
    }

    async fn create_post(
        &self,
        params: RemoteWriteParams,
    ) -> Result<CreatedPostRecord, ApiError> {
        let url = self.url("posts")?;
        let resp = self
            .client
            .post(url)
            .json(&json!({ "title": params.title, "body": params.body }))
            .send()
            .await
            .map_err(transport)?;
        Self::decode(resp).await
    }

    async fn update_post(&self, id: u64, params: RemoteWriteParams) -> Result<(), ApiError> {
        self.send_unit(
            Method::PUT,
            &format!("posts/{id}"),
            Some(json!({ "title": params.title, "body": params.body })),
        )
        .await
    }

    async fn delete_post(&self, id: u64) -> Result<(), ApiError> {
        self.send_unit(Method::DELETE, &format!("posts/{id}"), None)
            .await
    }
}
