//! Session Manager
//!
//! Owns the single live identity and its lifecycle:
//! `Anonymous -> Authenticating -> Authenticated -> Anonymous`.
//! An authentication attempt always ends in `Authenticated` or back in
//! `Anonymous`; it never stays in `Authenticating`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use menagerie::{DomainError, Identity, IdentityProvider, PublicKey};

/// Observable authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated { alias: String, public_key: String },
}

/// Lock order: `state` before `identity`.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    identity: RwLock<Option<Arc<Identity>>>,
    state: watch::Sender<SessionState>,
    /// Bumped by every new attempt and every logout; an attempt only settles
    /// the session while its generation is still current
    generation: AtomicU64,
}

fn require_credentials(alias: &str, password: &str) -> Result<(), DomainError> {
    if alias.trim().is_empty() || password.is_empty() {
        return Err(DomainError::validation("Alias and password are required."));
    }
    Ok(())
}

/// A running authentication attempt.
/// Dropping it unfinished, e.g. when the caller's future is cancelled,
/// returns the session to `Anonymous`.
struct Attempt<'a> {
    session: &'a SessionManager,
    generation: u64,
    settled: bool,
}

impl Attempt<'_> {
    /// Install the identity. Fails if a logout or newer attempt superseded this one.
    fn succeed(mut self, identity: Arc<Identity>) -> Result<(), DomainError> {
        self.settled = true;
        let session = self.session;
        let generation = self.generation;
        let installed = session.state.send_if_modified(|state| {
            if !session.is_current(generation, state) {
                return false;
            }
            *state = SessionState::Authenticated {
                alias: identity.alias().to_string(),
                public_key: identity.public_key().to_namespace_form(),
            };
            *session.identity.write() = Some(identity.clone());
            true
        });
        if !installed {
            return Err(DomainError::Authentication(
                "session was logged out while authenticating".to_string(),
            ));
        }
        Ok(())
    }

    fn finish(mut self) {
        self.settled = true;
        self.session.abandon(self.generation);
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!("Authentication attempt {} abandoned", self.generation);
            self.session.abandon(self.generation);
        }
    }
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::Anonymous);
        Self {
            provider,
            identity: RwLock::new(None),
            state,
            generation: AtomicU64::new(0),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Auth state change events
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> Option<Arc<Identity>> {
        self.identity.read().clone()
    }

    /// The live identity, or `NotAuthenticated`
    pub fn require(&self) -> Result<Arc<Identity>, DomainError> {
        self.current().ok_or_else(DomainError::not_authenticated)
    }

    fn is_current(&self, generation: u64, state: &SessionState) -> bool {
        *state == SessionState::Authenticating && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Back to `Anonymous`, unless the attempt was already superseded
    fn abandon(&self, generation: u64) {
        self.state.send_if_modified(|state| {
            if !self.is_current(generation, state) {
                return false;
            }
            *state = SessionState::Anonymous;
            true
        });
    }

    /// Enter `Authenticating`, dropping any live identity.
    /// Fails if another attempt is already running.
    fn begin_attempt(&self) -> Result<Attempt<'_>, DomainError> {
        let mut generation = None;
        self.state.send_if_modified(|state| {
            if *state == SessionState::Authenticating {
                return false;
            }
            *state = SessionState::Authenticating;
            *self.identity.write() = None;
            generation = Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
            true
        });
        match generation {
            Some(generation) => Ok(Attempt {
                session: self,
                generation,
                settled: false,
            }),
            None => Err(DomainError::Authentication(
                "another authentication attempt is in progress".to_string(),
            )),
        }
    }

    /// Create an account. Registration never logs in.
    pub async fn register(&self, alias: &str, password: &str) -> Result<PublicKey, DomainError> {
        require_credentials(alias, password)?;
        let attempt = self.begin_attempt()?;

        let result = self.provider.create(alias, password).await;
        attempt.finish();

        match &result {
            Ok(public_key) => tracing::info!("Registered {} ({})", alias, public_key),
            Err(e) => tracing::warn!("Registration of {} failed: {}", alias, e),
        }
        result
    }

    pub async fn login(&self, alias: &str, password: &str) -> Result<Arc<Identity>, DomainError> {
        require_credentials(alias, password)?;
        let attempt = self.begin_attempt()?;

        let key_pair = match self.provider.authenticate(alias, password).await {
            Ok(key_pair) => key_pair,
            Err(e) => {
                attempt.finish();
                tracing::warn!("Login of {} failed: {}", alias, e);
                return Err(e);
            }
        };

        let identity = Arc::new(Identity::new(alias, key_pair));
        if let Err(e) = attempt.succeed(identity.clone()) {
            tracing::warn!("Login of {} discarded: {}", alias, e);
            return Err(e);
        }
        tracing::info!("Logged in as {}", alias);
        Ok(identity)
    }

    /// Clear the identity before returning. An attempt still in flight is
    /// superseded and will not log in.
    pub fn logout(&self) {
        let mut previous = None;
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            previous = self.identity.write().take();
            *state = SessionState::Anonymous;
        });
        if let Some(identity) = previous {
            tracing::info!("Logged out {}", identity.alias());
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
