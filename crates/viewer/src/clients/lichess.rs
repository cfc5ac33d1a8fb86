use reqwest::{Client, RequestBuilder, StatusCode};

use crate::clients::PositionService;
use crate::config::Config;
use crate::error::FetchError;
use crate::evaluation::{CloudEval, ExplorerResponse};

/// Fixed explorer query sizes.
const EXPLORER_MOVES: u32 = 10;
const EXPLORER_TOP_GAMES: u32 = 10;

pub struct LichessClient {
    client: Client,
    explorer_url: String,
    api_url: String,
    token: Option<String>,
}

impl LichessClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent("PgnViewer/1.0")
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| FetchError::Request(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            explorer_url: config.lichess_explorer_url.trim_end_matches('/').to_string(),
            api_url: config.lichess_api_url.trim_end_matches('/').to_string(),
            token: config.lichess_token.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl PositionService for LichessClient {
    /// Masters database statistics for a position.
    async fn explore(&self, fen: &str) -> Result<ExplorerResponse, FetchError> {
        let url = format!("{}/masters", self.explorer_url);
        let params = [
            ("fen", fen.to_string()),
            ("moves", EXPLORER_MOVES.to_string()),
            ("topGames", EXPLORER_TOP_GAMES.to_string()),
        ];

        let resp = self
            .authorized(self.client.get(&url).query(&params))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        Ok(resp.json().await?)
    }

    /// Cached cloud evaluation. Lichess answers 404 when it has none.
    async fn cloud_eval(&self, fen: &str) -> Result<CloudEval, FetchError> {
        let url = format!("{}/api/cloud-eval", self.api_url);

        let resp = self.client.get(&url).query(&[("fen", fen)]).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound("Evaluation".to_string()));
        }

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        Ok(resp.json().await?)
    }

    /// PGN of a masters database game.
    async fn master_game_pgn(&self, game_id: &str) -> Result<String, FetchError> {
        let url = format!("{}/masters/pgn/{}", self.explorer_url, game_id);

        let resp = self.authorized(self.client.get(&url)).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound("Game".to_string()));
        }

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let text = resp.text().await?;
        tracing::debug!(game_id, bytes = text.len(), "Fetched master game PGN");
        Ok(text)
    }
}
