use pl_domain::error::Result;

use crate::attachment::Attachment;
use crate::client::{ApiRequest, Auth, MultipartBody, ParalegalClient};
use crate::types::{FilesResponse, MarkItDownResponse};

impl ParalegalClient {
    /// Store files on the host for this session.
    pub async fn upload_files(&self, session_token: &str, files: &[Attachment]) -> Result<FilesResponse> {
        let req = ApiRequest::post("File upload", "/api/sdk/v1/files/upload", Auth::Session(session_token))
            .multipart(MultipartBody::new().files("files[]", files));
        self.fetch_json(&req).await
    }

    /// Convert documents to Markdown with MarkItDown.
    pub async fn convert_to_markdown(
        &self,
        session_token: &str,
        files: &[Attachment],
    ) -> Result<MarkItDownResponse> {
        let req = ApiRequest::post(
            "MarkItDown conversion",
            "/api/sdk/v1/markitdown/convert",
            Auth::Session(session_token),
        )
        .multipart(MultipartBody::new().files("files[]", files));
        self.fetch_json(&req).await
    }
}
