use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::domain::identity::Identity;
use crate::errors::ApplicationError;
use crate::session::engine::transition;
use crate::session::states::{AuthEvent, SessionAction, SessionEvent, SessionState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    AlreadyExisted,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("profile provisioning failed: {message}")]
pub struct ProvisioningError {
    pub message: String,
}

impl ProvisioningError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<ProvisioningError> for ApplicationError {
    fn from(error: ProvisioningError) -> Self {
        ApplicationError::Provisioning(error.message)
    }
}

/// Creates the application profile for an identity if it has none yet.
/// Implementations must be idempotent per uid.
#[async_trait]
pub trait ProfileProvisioner: Send + Sync {
    async fn ensure_profile(&self, identity: &Identity)
        -> Result<ProvisionOutcome, ProvisioningError>;
}

#[async_trait]
impl<P> ProfileProvisioner for Arc<P>
where
    P: ProfileProvisioner + ?Sized,
{
    async fn ensure_profile(
        &self,
        identity: &Identity,
    ) -> Result<ProvisionOutcome, ProvisioningError> {
        (**self).ensure_profile(identity).await
    }
}

/// Ordered source of auth notifications. `None` ends the session shell.
#[async_trait]
pub trait AuthStream: Send {
    async fn next_event(&mut self) -> Option<AuthEvent>;
}

#[async_trait]
impl AuthStream for mpsc::Receiver<AuthEvent> {
    async fn next_event(&mut self) -> Option<AuthEvent> {
        self.recv().await
    }
}

/// Read side of the session state.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    receiver: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn current(&self) -> SessionState {
        self.receiver.borrow().clone()
    }

    /// Waits until the state is no longer loading.
    pub async fn settled(&mut self) -> Option<SessionState> {
        self.receiver.wait_for(|state| !state.is_loading()).await.ok().map(|state| state.clone())
    }
}

/// Single writer of the session state.
pub struct SessionShell<P> {
    provisioner: P,
    sender: watch::Sender<SessionState>,
}

impl<P> SessionShell<P>
where
    P: ProfileProvisioner,
{
    pub fn new(provisioner: P) -> Self {
        let (sender, _) = watch::channel(SessionState::Init);
        Self { provisioner, sender }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle { receiver: self.sender.subscribe() }
    }

    pub fn state(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    /// Applies one auth notification and every follow-up it triggers. The
    /// state does not leave `Provisioning` before the provisioner answers.
    pub async fn apply(&self, event: AuthEvent) -> SessionState {
        let mut pending = vec![SessionEvent::from(event)];

        while let Some(event) = pending.pop() {
            let outcome = transition(&self.state(), event);
            if outcome.changed() {
                info!(
                    event_name = "session.transition",
                    from = outcome.from.label(),
                    to = outcome.to.label(),
                    trigger = outcome.event.label(),
                    "session state changed"
                );
            }
            self.sender.send_replace(outcome.to);

            for action in outcome.actions {
                match action {
                    SessionAction::EnsureProfile(identity) => {
                        pending.push(self.ensure_profile(&identity).await);
                    }
                }
            }
        }

        self.state()
    }

    /// Consumes the stream in arrival order until it ends.
    pub async fn run<S>(&self, mut stream: S)
    where
        S: AuthStream,
    {
        while let Some(event) = stream.next_event().await {
            self.apply(event).await;
        }
        info!(
            event_name = "session.stream_closed",
            state = self.state().label(),
            "auth stream ended"
        );
    }

    async fn ensure_profile(&self, identity: &Identity) -> SessionEvent {
        match self.provisioner.ensure_profile(identity).await {
            Ok(outcome) => {
                info!(
                    event_name = "session.profile_ensured",
                    user_id = %identity.uid,
                    created = outcome == ProvisionOutcome::Created,
                    "profile ensured"
                );
                SessionEvent::ProvisioningSucceeded { uid: identity.uid.clone() }
            }
            Err(error) => {
                warn!(
                    event_name = "session.provisioning_failed",
                    user_id = %identity.uid,
                    error = %error,
                    "profile provisioning failed"
                );
                SessionEvent::ProvisioningFailed {
                    uid: identity.uid.clone(),
                    reason: error.message,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::{ProfileProvisioner, ProvisionOutcome, ProvisioningError, SessionShell};
    use crate::domain::identity::Identity;
    use crate::session::navigation::{decide, NavigationDecision};
    use crate::session::states::{AuthEvent, SessionState};

    #[derive(Default)]
    struct RecordingProvisioner {
        profiles: Mutex<HashSet<String>>,
        creations: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProfileProvisioner for RecordingProvisioner {
        async fn ensure_profile(
            &self,
            identity: &Identity,
        ) -> Result<ProvisionOutcome, ProvisioningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let inserted = self.profiles.lock().expect("lock").insert(identity.uid.0.clone());
            if inserted {
                self.creations.fetch_add(1, Ordering::SeqCst);
                Ok(ProvisionOutcome::Created)
            } else {
                Ok(ProvisionOutcome::AlreadyExisted)
            }
        }
    }

    struct FailingProvisioner;

    #[async_trait]
    impl ProfileProvisioner for FailingProvisioner {
        async fn ensure_profile(
            &self,
            _identity: &Identity,
        ) -> Result<ProvisionOutcome, ProvisioningError> {
            Err(ProvisioningError::new("database unavailable"))
        }
    }

    #[tokio::test]
    async fn starts_loading_without_user() {
        let shell = SessionShell::new(RecordingProvisioner::default());
        let state = shell.handle().current();
        assert!(state.is_loading());
        assert!(state.user().is_none());
        assert_eq!(decide(&state, "/dashboard"), NavigationDecision::ShowLoader);
    }

    #[tokio::test]
    async fn first_sign_in_creates_exactly_one_profile() {
        let provisioner = Arc::new(RecordingProvisioner::default());
        let shell = SessionShell::new(provisioner.clone());
        let identity = Identity::new("uid-1").with_email("sam@example.com");

        let state = shell.apply(AuthEvent::SignedIn(identity.clone())).await;
        assert_eq!(state, SessionState::Authenticated(identity.clone()));
        assert_eq!(provisioner.creations.load(Ordering::SeqCst), 1);

        shell.apply(AuthEvent::SignedOut).await;
        let state = shell.apply(AuthEvent::SignedIn(identity.clone())).await;

        assert_eq!(state.user(), Some(&identity));
        assert_eq!(provisioner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(provisioner.creations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provisioning_failure_blocks_protected_content() {
        let shell = SessionShell::new(FailingProvisioner);
        let state = shell.apply(AuthEvent::SignedIn(Identity::new("uid-1"))).await;

        assert!(matches!(
            state,
            SessionState::ProvisioningFailed { ref reason, .. } if reason == "database unavailable"
        ));
        assert!(state.user().is_none());
        assert_eq!(decide(&state, "/dashboard"), NavigationDecision::ShowError);

        let state = shell.apply(AuthEvent::SignedOut).await;
        assert_eq!(state, SessionState::Unauthenticated);
        assert_eq!(decide(&state, "/dashboard"), NavigationDecision::Redirect("/login"));
    }

    #[tokio::test]
    async fn run_processes_stream_in_order_and_publishes_states() {
        let provisioner = Arc::new(RecordingProvisioner::default());
        let shell = Arc::new(SessionShell::new(provisioner.clone()));
        let mut handle = shell.handle();
        let (sender, receiver) = mpsc::channel(8);

        let runner = {
            let shell = shell.clone();
            tokio::spawn(async move { shell.run(receiver).await })
        };

        sender.send(AuthEvent::SignedIn(Identity::new("uid-1"))).await.expect("send sign-in");
        let settled = handle.settled().await.expect("shell alive");
        assert_eq!(settled, SessionState::Authenticated(Identity::new("uid-1")));

        sender.send(AuthEvent::SignedOut).await.expect("send sign-out");
        sender.send(AuthEvent::SignedIn(Identity::new("uid-2"))).await.expect("send sign-in");
        drop(sender);
        runner.await.expect("runner finishes");

        assert_eq!(shell.state(), SessionState::Authenticated(Identity::new("uid-2")));
        assert_eq!(provisioner.creations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn duplicate_sign_in_events_are_safe() {
        let provisioner = Arc::new(RecordingProvisioner::default());
        let shell = SessionShell::new(provisioner.clone());
        let identity = Identity::new("uid-1");

        shell.apply(AuthEvent::SignedIn(identity.clone())).await;
        let state = shell.apply(AuthEvent::SignedIn(identity.clone())).await;

        assert_eq!(state, SessionState::Authenticated(identity));
        assert_eq!(provisioner.creations.load(Ordering::SeqCst), 1);
    }
}
