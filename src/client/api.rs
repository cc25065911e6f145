//! HTTP port used by the client stores
//!
//! The session and admin stores only talk to the server through these traits,
//! so tests can drive them with in-process fakes.

use super::error::ClientError;
use crate::auth::models::{AuthResponse, LoginRequest, PrincipalProfile, RegisterRequest};
use crate::users::api::{
    CreateUserRequest, UpdateUserRequest, UploadImageRequest, UploadImageResponse,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError>;
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError>;
    async fn profile(&self, token: &str) -> Result<PrincipalProfile, ClientError>;
    /// Returns the stored image reference
    async fn upload_image(&self, token: &str, data_uri: &str) -> Result<String, ClientError>;
}

#[async_trait]
pub trait UserAdminApi: Send + Sync {
    async fn list_users(&self, token: &str) -> Result<Vec<PrincipalProfile>, ClientError>;
    async fn search_users(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Vec<PrincipalProfile>, ClientError>;
    async fn get_user(&self, token: &str, id: &str) -> Result<PrincipalProfile, ClientError>;
    async fn create_user(
        &self,
        token: &str,
        request: &CreateUserRequest,
    ) -> Result<PrincipalProfile, ClientError>;
    async fn update_user(
        &self,
        token: &str,
        id: &str,
        patch: &UpdateUserRequest,
    ) -> Result<PrincipalProfile, ClientError>;
    async fn delete_user(&self, token: &str, id: &str) -> Result<(), ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// reqwest-backed implementation of both ports
#[derive(Clone)]
pub struct HttpAuthApi {
    client: Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Map a non-2xx response onto its `message` field
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send(self.client.post(self.url("/auth/login")).json(&body))
            .await
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let body = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send(self.client.post(self.url("/auth/register")).json(&body))
            .await
    }

    async fn profile(&self, token: &str) -> Result<PrincipalProfile, ClientError> {
        self.send(self.client.get(self.url("/auth/profile")).bearer_auth(token))
            .await
    }

    async fn upload_image(&self, token: &str, data_uri: &str) -> Result<String, ClientError> {
        let body = UploadImageRequest {
            image: Some(data_uri.to_string()),
        };
        let response: UploadImageResponse = self
            .send(
                self.client
                    .post(self.url("/users/upload"))
                    .bearer_auth(token)
                    .json(&body),
            )
            .await?;
        Ok(response.profile_image)
    }
}

#[async_trait]
impl UserAdminApi for HttpAuthApi {
    async fn list_users(&self, token: &str) -> Result<Vec<PrincipalProfile>, ClientError> {
        self.send(self.client.get(self.url("/users")).bearer_auth(token))
            .await
    }

    async fn search_users(
        &self,
        token: &str,
        query: &str,
    ) -> Result<Vec<PrincipalProfile>, ClientError> {
        self.send(
            self.client
                .get(self.url("/users/search"))
                .query(&[("query", query)])
                .bearer_auth(token),
        )
        .await
    }

    async fn get_user(&self, token: &str, id: &str) -> Result<PrincipalProfile, ClientError> {
        self.send(
            self.client
                .get(self.url(&format!("/users/{id}")))
                .bearer_auth(token),
        )
        .await
    }

    async fn create_user(
        &self,
        token: &str,
        request: &CreateUserRequest,
    ) -> Result<PrincipalProfile, ClientError> {
        self.send(
            self.client
                .post(self.url("/users"))
                .bearer_auth(token)
                .json(request),
        )
        .await
    }

    async fn update_user(
        &self,
        token: &str,
        id: &str,
        patch: &UpdateUserRequest,
    ) -> Result<PrincipalProfile, ClientError> {
        self.send(
            self.client
                .put(self.url(&format!("/users/{id}")))
                .bearer_auth(token)
                .json(patch),
        )
        .await
    }

    async fn delete_user(&self, token: &str, id: &str) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.url(&format!("/users/{id}")))
            .bearer_auth(token);
        check(request.send().await?).await?;
        Ok(())
    }
}
