use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sentinel_agent::{CompletionRequest, LlmClient, LlmError, PriceEstimator};
use sentinel_core::domain::identity::UserId;
use sentinel_core::domain::profile::UserProfile;
use sentinel_db::repositories::{
    InMemoryAlertRepository, InMemoryProfileRepository, ProfileRepository, RepositoryError,
};

use crate::state::AppState;

#[derive(Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<usize>,
}

impl ScriptedLlmClient {
    pub fn calls(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        *self.calls.lock().expect("lock") += 1;
        self.replies.lock().expect("lock").pop_front().unwrap_or(Err(LlmError::EmptyResponse))
    }
}

pub struct UnavailableProfileRepository;

#[async_trait]
impl ProfileRepository for UnavailableProfileRepository {
    async fn find_by_id(&self, _id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Err(RepositoryError::Decode("users table unavailable".to_string()))
    }

    async fn create_if_absent(&self, _profile: UserProfile) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Decode("users table unavailable".to_string()))
    }

    async fn update_display_name(
        &self,
        _id: &UserId,
        _display_name: &str,
    ) -> Result<Option<UserProfile>, RepositoryError> {
        Err(RepositoryError::Decode("users table unavailable".to_string()))
    }
}

pub fn state_with_replies(
    replies: Vec<Result<String, LlmError>>,
) -> (AppState, Arc<ScriptedLlmClient>) {
    let client = Arc::new(ScriptedLlmClient {
        replies: Mutex::new(replies.into()),
        calls: Mutex::default(),
    });
    let state = AppState::new(
        Arc::new(InMemoryProfileRepository::default()),
        Arc::new(InMemoryAlertRepository::default()),
        PriceEstimator::new(client.clone()),
    );
    (state, client)
}

pub fn failing_profiles_state() -> AppState {
    AppState::new(
        Arc::new(UnavailableProfileRepository),
        Arc::new(InMemoryAlertRepository::default()),
        PriceEstimator::new(Arc::new(ScriptedLlmClient::default())),
    )
}
