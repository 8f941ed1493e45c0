use pl_domain::error::Result;

use crate::client::{ApiRequest, Auth, ParalegalClient};
use crate::types::{AskAiRequest, AskAiResponse, SessionAskAiRequest};

const ASK_PATH: &str = "/api/sdk/v1/ai/ask";

impl ParalegalClient {
    /// Ask the firm's AI about a matter, authenticating with the API key.
    pub async fn ask_ai(&self, request: &AskAiRequest) -> Result<AskAiResponse> {
        let req = ApiRequest::post("Request", ASK_PATH, Auth::ApiKey).json(request)?;
        self.fetch_json(&req).await
    }

    /// Same endpoint, scoped by the session's firm and matter.
    pub async fn ask_ai_with_session(
        &self,
        session_token: &str,
        request: &SessionAskAiRequest,
    ) -> Result<AskAiResponse> {
        let req = ApiRequest::post("Request", ASK_PATH, Auth::Session(session_token)).json(request)?;
        self.fetch_json(&req).await
    }
}
