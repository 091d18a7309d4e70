use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    api_client::AuthApi,
    credential_store::CredentialStore,
    data_types::{LoginRequest, RegisterRequest, User},
    errors::ApiError,
};

/// Shared slot holding the bearer credential. The session writes it, the HTTP
/// client reads it on every request.
#[derive(Clone, Default)]
pub struct CredentialHandle(Arc<RwLock<Option<String>>>);

impl CredentialHandle {
    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set(&self, token: Option<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

struct SessionState {
    identity: Option<User>,
    loading: bool,
    // bumped on every credential change
    generation: u64,
    resolved_generation: Option<u64>,
}

pub struct Session {
    auth: Arc<dyn AuthApi>,
    store: Arc<dyn CredentialStore>,
    credential: CredentialHandle,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        store: Arc<dyn CredentialStore>,
        credential: CredentialHandle,
    ) -> Self {
        Session {
            auth,
            store,
            credential,
            state: RwLock::new(SessionState {
                identity: None,
                loading: true,
                generation: 0,
                resolved_generation: None,
            }),
        }
    }

    /// Picks up a remembered credential and performs the first identity resolution.
    pub async fn init(&self) {
        match self.store.load() {
            Ok(Some(token)) => {
                log::debug!("Found remembered credential");
                self.replace_credential(Some(token));
            }
            Ok(None) => {}
            Err(e) => log::warn!("Could not read remembered credential: {}", e),
        }

        if let Err(e) = self.resolve_identity().await {
            log::info!("Remembered credential rejected: {}", e);
        }
    }

    pub async fn login(&self, email: &str, password: &str, remember: bool) -> Result<User, ApiError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let grant = match self.auth.login(&request).await {
            Ok(grant) => grant,
            Err(e) => {
                log::warn!("Login for {} failed: {}", email, e);
                if e.is_unauthorized() {
                    self.logout();
                }
                return Err(e);
            }
        };

        self.replace_credential(Some(grant.token.clone()));
        if remember {
            self.persist(&grant.token);
        }

        let user = self.resolved_user().await?;
        log::info!("Logged in as {} ({})", user.username, user.role);
        Ok(user)
    }

    /// Creates an account; the returned credential is always remembered.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, ApiError> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        let grant = self.auth.register(&request).await.map_err(|e| {
            log::warn!("Registration for {} failed: {}", email, e);
            e
        })?;

        self.replace_credential(Some(grant.token.clone()));
        self.persist(&grant.token);

        self.resolved_user().await
    }

    pub fn logout(&self) {
        self.replace_credential(None);
        {
            let mut state = self.write_state();
            state.identity = None;
            state.loading = false;
        }
        if let Err(e) = self.store.clear() {
            log::error!("Could not clear remembered credential: {}", e);
        }
    }

    /// Called by controllers when the backend answers 401 mid-session.
    pub fn handle_unauthorized(&self) {
        if self.credential.get().is_some() {
            log::warn!("Credential rejected by backend, ending session");
        }
        self.logout();
    }

    /// Resolves the identity of the current credential. Runs at most once per
    /// credential change; any failure ends the session.
    pub async fn resolve_identity(&self) -> Result<Option<User>, ApiError> {
        let token = self.credential.get();
        let generation = {
            let mut state = self.write_state();
            if token.is_none() {
                state.identity = None;
                state.loading = false;
                return Ok(None);
            }
            if state.resolved_generation == Some(state.generation) {
                return Ok(state.identity.clone());
            }
            state.generation
        };

        let Some(token) = token else {
            return Ok(None);
        };
        let result = self.auth.me(&token).await;

        let mut state = self.write_state();
        if state.generation != generation {
            log::debug!("Credential changed during identity resolution, dropping result");
            return Ok(state.identity.clone());
        }

        state.resolved_generation = Some(generation);
        state.loading = false;
        match result {
            Ok(user) => {
                state.identity = Some(user.clone());
                Ok(Some(user))
            }
            Err(e) => {
                state.identity = None;
                drop(state);
                self.credential.set(None);
                if let Err(store_err) = self.store.clear() {
                    log::error!("Could not clear remembered credential: {}", store_err);
                }
                Err(e)
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().identity.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().loading
    }

    pub fn identity(&self) -> Option<User> {
        self.read_state().identity.clone()
    }

    pub fn credential_handle(&self) -> CredentialHandle {
        self.credential.clone()
    }

    async fn resolved_user(&self) -> Result<User, ApiError> {
        self.resolve_identity().await?.ok_or(ApiError::MissingData)
    }

    fn replace_credential(&self, token: Option<String>) {
        let mut state = self.write_state();
        state.generation += 1;
        state.resolved_generation = None;
        if token.is_none() {
            state.identity = None;
        }
        self.credential.set(token);
    }

    fn persist(&self, token: &str) {
        if let Err(e) = self.store.save(token) {
            log::error!("Could not remember credential: {}", e);
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
