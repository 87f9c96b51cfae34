//! Account registration, login and token authentication

use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::auth::password::{DEFAULT_ROUNDS, hash_with_rounds, verify_password};
use crate::auth::{Identity, LoginGrant, TokenIssuer, UserProfile, UserStore};
use crate::config::AuthConfig;
use crate::error::ValidationError;
use crate::{Error, Result};

/// Authentication service shared by the HTTP API and the terminal client
pub struct AuthService {
    /// Persistent storage (wrapped in Mutex for thread safety)
    users: Arc<Mutex<UserStore>>,
    tokens: TokenIssuer,
    /// Hash rounds for new passwords
    rounds: u32,
    /// Verified against when the login is unknown so misses cost a full hash
    dummy_hash: String,
}

impl AuthService {
    pub fn new(users: UserStore, tokens: TokenIssuer) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
            tokens,
            rounds: DEFAULT_ROUNDS,
            dummy_hash: hash_with_rounds("", DEFAULT_ROUNDS),
        }
    }

    /// Open the user table in `db_path` and sign tokens per `config`
    pub fn open(db_path: &str, config: &AuthConfig) -> Result<Self> {
        Ok(Self::new(
            UserStore::new(db_path)?,
            TokenIssuer::from_config(config)?,
        ))
    }

    /// Create an in-memory auth service (for testing)
    pub fn in_memory(secret: &str) -> Result<Self> {
        Ok(Self::new(UserStore::in_memory()?, TokenIssuer::new(secret, None)?))
    }

    /// Use fewer hash rounds, e.g. in tests
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(1);
        self.dummy_hash = hash_with_rounds("", self.rounds);
        self
    }

    /// Create an account and sign it in
    pub fn register(&self, login: &str, password: &str, name: Option<&str>) -> Result<LoginGrant> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        let hash = hash_with_rounds(password, self.rounds);
        let user = {
            let users = self.users.lock()?;
            users.create(login, name.filter(|n| !n.trim().is_empty()), &hash)?
        };

        info!("Registered user {}", user.login);
        let token = self.tokens.issue(&user.id, &user.login)?;
        Ok(LoginGrant {
            user: UserProfile::from(&user),
            token,
        })
    }

    /// Check credentials and issue a token
    pub fn login(&self, login: &str, password: &str) -> Result<LoginGrant> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        let user = {
            let users = self.users.lock()?;
            users.find_by_login(login)?
        };

        let verified = match &user {
            Some(u) => verify_password(password, &u.password_hash),
            None => {
                verify_password(password, &self.dummy_hash);
                false
            }
        };
        let Some(user) = user.filter(|_| verified) else {
            warn!("Failed login attempt for {}", login);
            return Err(Error::InvalidCredentials);
        };

        let token = self.tokens.issue(&user.id, &user.login)?;
        Ok(LoginGrant {
            user: UserProfile::from(&user),
            token,
        })
    }

    /// Resolve a bearer token to the caller's identity
    pub fn authenticate(&self, token: &str) -> Result<Identity> {
        let claims = self.tokens.verify(token)?;
        Ok(Identity {
            user_id: claims.user_id,
            login: claims.login,
        })
    }

    /// Public profile of the authenticated caller
    pub fn profile(&self, identity: &Identity) -> Result<UserProfile> {
        let users = self.users.lock()?;
        users
            .get(&identity.user_id)?
            .map(|u| UserProfile::from(&u))
            .ok_or_else(|| Error::UserNotFound(identity.user_id.clone()))
    }
}
