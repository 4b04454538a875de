//! One cancellable `/ask` request per turn.
//!
//! [`RequestController`] owns the in-flight slot. [`RequestController::submit`]
//! moves it from idle to pending and hands back a [`PendingRequest`] that the
//! caller drives (usually on a spawned task). Whatever happens on the wire,
//! [`PendingRequest::resolve`] produces a [`TurnOutcome`]; the caller then
//! calls [`RequestController::settle`] to return to idle.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{server_error_message, AskRequest, AskResponse};
use crate::utils::url::construct_api_url;

pub type TurnId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Pending,
    /// Pending, and cancellation has been requested.
    Stopping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A request is already in flight.
    Conflict { in_flight: TurnId },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Conflict { in_flight } => {
                write!(f, "turn {in_flight} is still waiting for a response")
            }
        }
    }
}

impl StdError for RequestError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// The request could not complete, or the success body was unreadable.
    Network(String),
    /// The backend answered with a non-2xx status.
    Server { status: u16, message: String },
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Network(detail) => write!(f, "{detail}"),
            TurnError::Server { message, .. } => write!(f, "{message}"),
        }
    }
}

impl StdError for TurnError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed(AskResponse),
    Failed(TurnError),
    Cancelled,
}

/// HTTP side of the controller: where `/ask` lives and how to reach it.
#[derive(Debug, Clone)]
pub struct AskClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl AskClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn ask_url(&self) -> String {
        construct_api_url(&self.base_url, "ask")
    }

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, TurnError> {
        let mut http_request = self
            .client
            .post(self.ask_url())
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(timeout) = self.timeout {
            http_request = http_request.timeout(timeout);
        }

        let response = http_request
            .send()
            .await
            .map_err(|err| TurnError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TurnError::Server {
                status: status.as_u16(),
                message: server_error_message(status.as_u16(), &body),
            });
        }

        response
            .json::<AskResponse>()
            .await
            .map_err(|err| TurnError::Network(format!("unreadable response: {err}")))
    }
}

#[derive(Debug)]
struct InFlight {
    id: TurnId,
    cancel_token: CancellationToken,
    stopping: bool,
}

#[derive(Debug)]
pub struct RequestController {
    client: AskClient,
    in_flight: Option<InFlight>,
    next_id: TurnId,
}

impl RequestController {
    pub fn new(client: AskClient) -> Self {
        Self {
            client,
            in_flight: None,
            next_id: 1,
        }
    }

    pub fn state(&self) -> RequestState {
        match &self.in_flight {
            None => RequestState::Idle,
            Some(in_flight) if in_flight.stopping => RequestState::Stopping,
            Some(_) => RequestState::Pending,
        }
    }

    pub fn in_flight(&self) -> Option<TurnId> {
        self.in_flight.as_ref().map(|in_flight| in_flight.id)
    }

    pub fn submit(
        &mut self,
        user_text: &str,
        model_id: &str,
    ) -> Result<PendingRequest, RequestError> {
        if let Some(in_flight) = &self.in_flight {
            return Err(RequestError::Conflict {
                in_flight: in_flight.id,
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let cancel_token = CancellationToken::new();
        self.in_flight = Some(InFlight {
            id,
            cancel_token: cancel_token.clone(),
            stopping: false,
        });
        debug!(turn = id, model = model_id, "submitting turn");

        Ok(PendingRequest {
            id,
            client: self.client.clone(),
            request: AskRequest {
                message: user_text.to_string(),
                model_type: model_id.to_string(),
            },
            cancel_token,
        })
    }

    /// Ask the in-flight request to stop. Returns false when there is nothing
    /// to stop or a stop was already requested.
    pub fn cancel(&mut self) -> bool {
        match &mut self.in_flight {
            Some(in_flight) if !in_flight.stopping => {
                in_flight.stopping = true;
                in_flight.cancel_token.cancel();
                info!(turn = in_flight.id, "stop requested");
                true
            }
            _ => false,
        }
    }

    /// Return to idle once turn `id` has produced its outcome. Stale ids are ignored.
    pub fn settle(&mut self, id: TurnId) -> bool {
        match &self.in_flight {
            Some(in_flight) if in_flight.id == id => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }
}

/// A submitted turn, ready to be driven to completion.
#[derive(Debug)]
pub struct PendingRequest {
    id: TurnId,
    client: AskClient,
    request: AskRequest,
    cancel_token: CancellationToken,
}

impl PendingRequest {
    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn request(&self) -> &AskRequest {
        &self.request
    }

    pub async fn resolve(self) -> TurnOutcome {
        let PendingRequest {
            id,
            client,
            request,
            cancel_token,
        } = self;

        let outcome = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => TurnOutcome::Cancelled,
            result = client.ask(&request) => match result {
                Ok(response) => TurnOutcome::Completed(response),
                Err(err) => TurnOutcome::Failed(err),
            },
        };

        match &outcome {
            TurnOutcome::Completed(response) => debug!(
                turn = id,
                total_tokens = response.total_tokens,
                "turn completed"
            ),
            TurnOutcome::Failed(err) => debug!(turn = id, error = %err, "turn failed"),
            TurnOutcome::Cancelled => info!(turn = id, "turn stopped by user"),
        }
        outcome
    }
}
