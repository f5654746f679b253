use std::sync::Arc;

use quiz_core::{ProgressionModel, ProgressionResult};
use storage::repository::ProfileRepository;

use crate::error::ProfileServiceError;
use crate::gateway::{RemoteProfile, SubmissionGateway};

/// Local XP progression plus the remote account view.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    gateway: Arc<dyn SubmissionGateway>,
}

impl ProfileService {
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileRepository>, gateway: Arc<dyn SubmissionGateway>) -> Self {
        Self { profiles, gateway }
    }

    /// Lifetime XP as currently stored.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on repository failures.
    pub async fn load_xp(&self) -> Result<u64, ProfileServiceError> {
        Ok(self.profiles.load_xp().await?)
    }

    /// Current level standing without applying any session.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` on repository failures.
    pub async fn standing(&self) -> Result<ProgressionResult, ProfileServiceError> {
        let xp = self.load_xp().await?;
        Ok(ProgressionModel::apply(xp, 0))
    }

    /// Apply a finished session's score and persist the new XP total.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Storage` if XP cannot be read or written.
    pub async fn apply_session(&self, score: i64) -> Result<ProgressionResult, ProfileServiceError> {
        let prior = self.load_xp().await?;
        let result = ProgressionModel::apply(prior, score);
        if result.xp != prior {
            self.profiles.save_xp(result.xp).await?;
        }
        Ok(result)
    }

    /// Account details from the quiz backend.
    ///
    /// # Errors
    ///
    /// Returns `ProfileServiceError::Gateway`, including `Unauthenticated`
    /// when no token is configured.
    pub async fn remote_profile(&self) -> Result<RemoteProfile, ProfileServiceError> {
        Ok(self.gateway.fetch_profile().await?)
    }
}
