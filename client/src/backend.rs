use async_trait::async_trait;
use futures::stream::BoxStream;
use products_crm::{
    AuthResponse, ChangeEvent, Opportunity, OpportunityDraft, OpportunityPatch, SignInRequest,
    SignUpRequest,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BackendError;

/// Live change feed. Ends when the server closes it for good.
pub type ChangeStream = BoxStream<'static, Result<ChangeEvent, BackendError>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Mine,
    All,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Mine => "mine",
            Scope::All => "all",
        }
    }
}

/// Everything the client needs from the server.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_opportunities(&self, scope: Scope) -> Result<Vec<Opportunity>, BackendError>;

    async fn create_opportunity(&self, draft: &OpportunityDraft)
    -> Result<Opportunity, BackendError>;

    async fn update_opportunity(
        &self,
        id: Uuid,
        patch: &OpportunityPatch,
    ) -> Result<Opportunity, BackendError>;

    async fn delete_opportunity(&self, id: Uuid) -> Result<(), BackendError>;

    async fn subscribe(&self, scope: Scope) -> Result<ChangeStream, BackendError>;

    async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, BackendError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthResponse, BackendError>;
}
