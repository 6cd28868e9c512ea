use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use spectrum_types::{
    EmptyRequest, ErrorBody, GetLeaderboardRequest, GetLeaderboardResponse, Guess,
    GuessWordRequest, GuessWordResponse, LeaderboardDelta, ListWinsResponse, OracleRequest,
    PostWinRequest, PostWinResponse, RoundTiming, SpectrumLabels, SpectrumResponse, Target,
    TargetResponse, TimeUntilNextGraphResponse, WinTally,
};

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Oracle returned {status}")]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Invalid oracle url: {0}")]
    InvalidRequest(String),
}

impl OracleError {
    /// The oracle's own explanation, when it gave one.
    pub fn server_message(&self) -> Option<String> {
        match self {
            OracleError::Server { message, .. } => message.clone(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OracleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OracleError::Timeout
        } else if err.is_builder() {
            OracleError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            OracleError::Decode(err.to_string())
        } else {
            OracleError::Transport(err.to_string())
        }
    }
}

/// The remote scoring service.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn guess_word(&self, word: &str) -> Result<Guess, OracleError>;
    async fn get_spectrum(&self) -> Result<SpectrumLabels, OracleError>;
    async fn get_target(&self) -> Result<Target, OracleError>;
    async fn get_time_until_next_graph(&self) -> Result<RoundTiming, OracleError>;
    async fn get_leaderboard(&self, after_timestamp: i64) -> Result<LeaderboardDelta, OracleError>;
    async fn post_win(&self, token: &str, username: &str) -> Result<(), OracleError>;
    async fn list_wins(&self) -> Result<Vec<WinTally>, OracleError>;
}

/// JSON-over-HTTP oracle. Every call is a POST of `{functionName, request}`
/// to one endpoint.
pub struct HttpOracle {
    client: Client,
    url: String,
}

impl HttpOracle {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<R: DeserializeOwned>(&self, request: OracleRequest) -> Result<R, OracleError> {
        let function = request.function_name();
        debug!(function, "Calling oracle");

        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            // The body may not be JSON at all
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::into_message);
            debug!(function, status = status.as_u16(), ?message, "Oracle rejected call");
            return Err(OracleError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| OracleError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn guess_word(&self, word: &str) -> Result<Guess, OracleError> {
        let response: GuessWordResponse = self
            .call(OracleRequest::GuessWord(GuessWordRequest {
                word: word.to_string(),
            }))
            .await?;
        Ok(response.into_guess(word))
    }

    async fn get_spectrum(&self) -> Result<SpectrumLabels, OracleError> {
        let response: SpectrumResponse = self
            .call(OracleRequest::GetSpectrum(EmptyRequest {}))
            .await?;
        Ok(response.into())
    }

    async fn get_target(&self) -> Result<Target, OracleError> {
        let response: TargetResponse = self.call(OracleRequest::GetTarget(EmptyRequest {})).await?;
        Ok(response.into())
    }

    async fn get_time_until_next_graph(&self) -> Result<RoundTiming, OracleError> {
        let response: TimeUntilNextGraphResponse = self
            .call(OracleRequest::GetTimeUntilNextGraph(EmptyRequest {}))
            .await?;
        Ok(response.into())
    }

    async fn get_leaderboard(&self, after_timestamp: i64) -> Result<LeaderboardDelta, OracleError> {
        let response: GetLeaderboardResponse = self
            .call(OracleRequest::GetLeaderboard(GetLeaderboardRequest {
                after_timestamp,
            }))
            .await?;
        Ok(response.into())
    }

    async fn post_win(&self, token: &str, username: &str) -> Result<(), OracleError> {
        let _: PostWinResponse = self
            .call(OracleRequest::PostWin(PostWinRequest {
                token: token.to_string(),
                username: username.to_string(),
            }))
            .await?;
        Ok(())
    }

    async fn list_wins(&self) -> Result<Vec<WinTally>, OracleError> {
        let response: ListWinsResponse = self.call(OracleRequest::ListWins(EmptyRequest {})).await?;
        Ok(response.into())
    }
}
