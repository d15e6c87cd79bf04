// ── Session-aware request execution ──
//
// Owns the session token for one box. Operations run with the current SID;
// a 403 on an established session triggers exactly one re-login and one
// retry. The executor lives inside the connection worker task, so nothing
// here needs locking.

use tracing::{debug, info, warn};

use fritzbox_api::{Credentials, FritzClient, SessionId};

use crate::error::CoreError;
use crate::model::Device;
use crate::operation::{Operation, OperationOutput};

/// Whether a session token is currently held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    Active(SessionId),
}

/// Runs operations against the box, handling login and session renewal.
#[derive(Debug)]
pub struct SessionExecutor {
    client: FritzClient,
    credentials: Credentials,
    state: SessionState,
}

impl SessionExecutor {
    pub fn new(client: FritzClient, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            state: SessionState::NoSession,
        }
    }

    /// Start from an already established session.
    pub fn with_session(client: FritzClient, credentials: Credentials, sid: SessionId) -> Self {
        Self {
            client,
            credentials,
            state: SessionState::Active(sid),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn client(&self) -> &FritzClient {
        &self.client
    }

    /// Force a fresh handshake. On failure the previous state is kept.
    pub async fn login(&mut self) -> Result<(), CoreError> {
        self.start_session().await.map(|_| ())
    }

    async fn start_session(&mut self) -> Result<SessionId, CoreError> {
        let sid = self.client.get_session_id(&self.credentials).await?;
        debug!("logged in");
        self.state = SessionState::Active(sid.clone());
        Ok(sid)
    }

    /// Run one operation, logging in first when no session is held.
    pub async fn invoke(&mut self, operation: &Operation) -> Result<OperationOutput, CoreError> {
        let sid = match self.state.clone() {
            SessionState::Active(sid) => sid,
            SessionState::NoSession => {
                // A fresh session that is refused right away is not retried.
                let sid = self.start_session().await?;
                return self.dispatch(&sid, operation).await;
            }
        };

        match self.dispatch(&sid, operation).await {
            Err(CoreError::Transport { status: 403, .. }) => {
                debug!(operation = operation.name(), "session expired, renewing");
                self.state = SessionState::NoSession;
                let sid = self.renew().await?;
                info!("session renewed");
                self.state = SessionState::Active(sid.clone());
                self.dispatch(&sid, operation).await
            }
            other => other,
        }
    }

    async fn renew(&self) -> Result<SessionId, CoreError> {
        self.client
            .get_session_id(&self.credentials)
            .await
            .map_err(|e| {
                warn!(error = %e, "session renewal failed");
                match e {
                    fritzbox_api::Error::InvalidCredentials { placeholder: true } => {
                        CoreError::Auth {
                            message: "invalid session id".into(),
                        }
                    }
                    other => CoreError::SessionRenewal {
                        source: Box::new(other.into()),
                    },
                }
            })
    }

    async fn dispatch(
        &self,
        sid: &SessionId,
        operation: &Operation,
    ) -> Result<OperationOutput, CoreError> {
        let client = &self.client;
        let output = match operation {
            Operation::GetDeviceList => OperationOutput::Devices(
                client
                    .device_list_infos(sid)
                    .await?
                    .into_iter()
                    .map(Device::from)
                    .collect(),
            ),
            Operation::GetSwitchState { ain } => {
                OperationOutput::SwitchState(client.switch_state(sid, ain).await?)
            }
            Operation::SetSwitchOn { ain } => {
                OperationOutput::Switched(client.set_switch_on(sid, ain).await?)
            }
            Operation::SetSwitchOff { ain } => {
                OperationOutput::Switched(client.set_switch_off(sid, ain).await?)
            }
            Operation::GetTemperature { ain } => {
                OperationOutput::Temperature(client.temperature(sid, ain).await?)
            }
            Operation::GetTempTarget { ain } => {
                OperationOutput::TempTarget(client.temp_target(sid, ain).await?)
            }
            Operation::SetTempTarget { ain, celsius } => {
                client.set_temp_target(sid, ain, *celsius).await?;
                OperationOutput::Done
            }
        };
        Ok(output)
    }
}
