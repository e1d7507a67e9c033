use async_trait::async_trait;
use futures::StreamExt;
use products_crm::{
    AuthResponse, ChangeEvent, Opportunity, OpportunityDraft, OpportunityPatch, SignInRequest,
    SignUpRequest,
};
use reqwest::{Client, RequestBuilder, Response};
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    backend::{Backend, ChangeStream, Scope},
    config::ClientConfig,
    error::{ApiErrorBody, BackendError},
};

/// JSON-over-HTTP backend. Successful sign-in/sign-up store the bearer token
/// used by every later call.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self.authorized(request).await.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .json::<ApiErrorBody>()
            .await
            .unwrap_or_else(|_| ApiErrorBody {
                code: status.as_str().to_string(),
                message: status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
                details: None,
            });
        Err(BackendError::Api { status, body })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        Ok(self.send(request).await?.json::<T>().await?)
    }

    async fn authenticate(&self, path: &str, body: &impl serde::Serialize) -> Result<AuthResponse, BackendError> {
        let response: AuthResponse = self
            .send_json(self.client.post(self.url(path)).json(body))
            .await?;
        self.set_token(Some(response.access_token.clone())).await;
        Ok(response)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_opportunities(&self, scope: Scope) -> Result<Vec<Opportunity>, BackendError> {
        let request = self
            .client
            .get(self.url("/opportunities"))
            .query(&[("scope", scope.as_str())]);
        self.send_json(request).await
    }

    async fn create_opportunity(
        &self,
        draft: &OpportunityDraft,
    ) -> Result<Opportunity, BackendError> {
        self.send_json(self.client.post(self.url("/opportunities")).json(draft))
            .await
    }

    async fn update_opportunity(
        &self,
        id: Uuid,
        patch: &OpportunityPatch,
    ) -> Result<Opportunity, BackendError> {
        let request = self
            .client
            .patch(self.url(&format!("/opportunities/{id}")))
            .json(patch);
        self.send_json(request).await
    }

    async fn delete_opportunity(&self, id: Uuid) -> Result<(), BackendError> {
        self.send(self.client.delete(self.url(&format!("/opportunities/{id}"))))
            .await?;
        Ok(())
    }

    async fn subscribe(&self, scope: Scope) -> Result<ChangeStream, BackendError> {
        let request = self
            .authorized(
                self.client
                    .get(self.url("/realtime/opportunities"))
                    .query(&[("scope", scope.as_str())]),
            )
            .await;
        let source = request
            .eventsource()
            .map_err(|err| BackendError::Stream(err.to_string()))?;

        let stream = source.filter_map(|event| async move {
            match event {
                Ok(Event::Open) => {
                    debug!("change feed connected");
                    None
                }
                Ok(Event::Message(message)) => Some(
                    serde_json::from_str::<ChangeEvent>(&message.data).map_err(BackendError::from),
                ),
                Err(reqwest_eventsource::Error::StreamEnded) => {
                    debug!("change feed ended, reconnecting");
                    None
                }
                Err(err) => {
                    warn!(error = %err, "change feed error");
                    Some(Err(BackendError::Stream(err.to_string())))
                }
            }
        });
        Ok(stream.boxed())
    }

    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, BackendError> {
        self.authenticate("/auth/signin", request).await
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, BackendError> {
        self.authenticate("/auth/signup", request).await
    }
}
