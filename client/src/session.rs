use std::sync::Arc;

use products_crm::{
    AuthResponse, SignInRequest, SignUpRequest, User, validation::validate_signup,
};
use tracing::{info, warn};

use crate::{
    backend::Backend,
    config::ClientConfig,
    error::{AUTH_ERROR, ClientError},
};

/// Signed-in state of the workspace.
pub struct Session<B> {
    backend: Arc<B>,
    config: ClientConfig,
    current: Option<AuthResponse>,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: Arc<B>, config: ClientConfig) -> Self {
        Self {
            backend,
            config,
            current: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|auth| &auth.user)
    }

    pub fn access_token(&self) -> Option<&str> {
        self.current.as_ref().map(|auth| auth.access_token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user()
            .is_some_and(|user| user.role == platform_authn::Role::Admin)
    }

    /// Gives up with `TIMEOUT` once `login_timeout` has elapsed.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&User, ClientError> {
        let request = SignInRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let limit = self.config.login_timeout;
        let response = match tokio::time::timeout(limit, self.backend.sign_in(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(error = %err, "sign-in failed");
                return Err(ClientError::from_backend(AUTH_ERROR, err));
            }
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "sign-in timed out");
                return Err(ClientError::timeout(format!(
                    "sign-in timed out after {}ms",
                    limit.as_millis()
                )));
            }
        };
        info!(user_id = %response.user.id, "signed in");
        Ok(&self.current.insert(response).user)
    }

    /// Validates locally first; an invalid form never reaches the server.
    pub async fn sign_up(&mut self, request: SignUpRequest) -> Result<&User, ClientError> {
        validate_signup(&request).map_err(|err| ClientError::validation(err.to_string()))?;
        let response = self
            .backend
            .sign_up(&request)
            .await
            .map_err(|err| ClientError::from_backend(AUTH_ERROR, err))?;
        info!(user_id = %response.user.id, "signed up");
        Ok(&self.current.insert(response).user)
    }

    pub fn logout(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::testing::{Call, FakeBackend};

    #[tokio::test]
    async fn login_stores_the_session() {
        let backend = Arc::new(FakeBackend::default());
        let mut session = Session::new(backend.clone(), ClientConfig::default());
        let user = session.login(" ana@nexo.test ", "secreto1").await.unwrap();
        assert_eq!(user.email, "ana@nexo.test");
        assert!(session.is_authenticated());
        assert!(!session.is_admin());
        assert_eq!(backend.calls(), vec![Call::SignIn("ana@nexo.test".into())]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_login_times_out() {
        let backend = Arc::new(FakeBackend {
            sign_in_delay: Some(Duration::from_secs(30)),
            ..FakeBackend::default()
        });
        let mut session = Session::new(backend, ClientConfig::default());
        let err = session.login("ana@nexo.test", "secreto1").await.unwrap_err();
        assert_eq!(err.code, "TIMEOUT");
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn invalid_sign_up_makes_no_call() {
        let backend = Arc::new(FakeBackend::default());
        let mut session = Session::new(backend.clone(), ClientConfig::default());
        let request = SignUpRequest {
            email: "ana@nexo.test".into(),
            password: "123".into(),
            name: "Ana".into(),
            role: None,
        };
        let err = session.sign_up(request).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn logout_forgets_the_user() {
        let backend = Arc::new(FakeBackend::default());
        let mut session = Session::new(backend, ClientConfig::default());
        session.login("ana@nexo.test", "secreto1").await.unwrap();
        session.logout();
        assert!(session.user().is_none());
    }
}
