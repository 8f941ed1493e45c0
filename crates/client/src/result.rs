use pl_domain::error::Result;
use serde_json::Value;

use crate::client::{ApiRequest, Auth, ParalegalClient};
use crate::types::{SubmitResultRequest, SubmitResultResponse};

impl ParalegalClient {
    /// POST /api/sdk/v1/result
    ///
    /// `result` is whatever the app produced: usually an object, sometimes a
    /// plain string.
    pub async fn submit_result(
        &self,
        session_token: &str,
        result: impl Into<Value>,
    ) -> Result<SubmitResultResponse> {
        let body = SubmitResultRequest {
            result: result.into(),
        };
        let req = ApiRequest::post("Result submission", "/api/sdk/v1/result", Auth::Session(session_token))
            .json(&body)?;
        self.fetch_json(&req).await
    }
}
