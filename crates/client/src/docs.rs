//! Document storage: create from Markdown, upload, list, read, update,
//! delete, and convert back to Markdown.

use pl_domain::error::{Error, Result};
use serde_json::json;

use crate::attachment::Attachment;
use crate::client::{ApiRequest, Auth, MultipartBody, ParalegalClient};
use crate::types::{
    DocCreateOptions, DocCreateResponse, DocMarkdownResponse, DocShowResponse, DocUpdateResponse,
    DocUploadResponse, DocsListResponse,
};

const DOCS_PATH: &str = "/api/sdk/v1/docs";

/// New contents for [`ParalegalClient::update_doc`].
#[derive(Debug, Clone)]
pub enum DocContent {
    /// Replace the text content (JSON body).
    Text(String),
    /// Replace the stored file (multipart `file` part).
    File(Attachment),
}

impl ParalegalClient {
    pub async fn create_doc(&self, session_token: &str, options: &DocCreateOptions) -> Result<DocCreateResponse> {
        let req = ApiRequest::post("Document create", format!("{DOCS_PATH}/create"), Auth::Session(session_token))
            .json(options)?;
        self.fetch_json(&req).await
    }

    pub async fn upload_docs(&self, session_token: &str, files: &[Attachment]) -> Result<DocUploadResponse> {
        let req = ApiRequest::post("Document upload", format!("{DOCS_PATH}/upload"), Auth::Session(session_token))
            .multipart(MultipartBody::new().files("files[]", files));
        self.fetch_json(&req).await
    }

    pub async fn list_docs(&self, session_token: &str) -> Result<DocsListResponse> {
        let req = ApiRequest::get("Document list", DOCS_PATH, Auth::Session(session_token));
        self.fetch_json(&req).await
    }

    pub async fn get_doc(&self, session_token: &str, document_id: &str) -> Result<DocShowResponse> {
        let req = ApiRequest::get("Document read", doc_path(document_id)?, Auth::Session(session_token));
        self.fetch_json(&req).await
    }

    pub async fn update_doc(
        &self,
        session_token: &str,
        document_id: &str,
        content: DocContent,
    ) -> Result<DocUpdateResponse> {
        let req = ApiRequest::post("Document update", doc_path(document_id)?, Auth::Session(session_token));
        let req = match content {
            DocContent::Text(text) => req.json(&json!({ "content": text }))?,
            DocContent::File(file) => {
                req.multipart(MultipartBody::new().files("file", std::slice::from_ref(&file)))
            }
        };
        self.fetch_json(&req).await
    }

    /// The host answers with an empty body; only the status matters.
    pub async fn delete_doc(&self, session_token: &str, document_id: &str) -> Result<()> {
        let req = ApiRequest::delete("Document delete", doc_path(document_id)?, Auth::Session(session_token));
        self.execute(&req).await?;
        Ok(())
    }

    pub async fn doc_to_markdown(&self, session_token: &str, document_id: &str) -> Result<DocMarkdownResponse> {
        let path = format!("{}/markdown", doc_path(document_id)?);
        let req = ApiRequest::get("Document to Markdown", path, Auth::Session(session_token));
        self.fetch_json(&req).await
    }
}

/// `/api/sdk/v1/docs/{id}`. Ids are opaque but must stay one path segment.
fn doc_path(document_id: &str) -> Result<String> {
    if document_id.is_empty() || document_id.contains(['/', '?', '#']) {
        return Err(Error::Other(format!("invalid document id '{document_id}'")));
    }
    Ok(format!("{DOCS_PATH}/{document_id}"))
}
