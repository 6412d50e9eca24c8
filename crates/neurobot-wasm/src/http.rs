//! `fetch`-based transport to the Neurobot backend.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use web_sys::{File, FormData};

use neurobot_chat::transport::{ChatRequest, ReplyBody};
use neurobot_chat::{ChatTransport, TransportError};
use neurobot_types::ClientConfig;

use crate::utils::describe_js_error;

pub struct HttpTransport {
    chat_url: String,
    upload_url: String,
    export_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            chat_url: config.endpoint("chat"),
            upload_url: config.endpoint("upload"),
            export_url: config.endpoint("export-pdf"),
        }
    }

    async fn post_form(&self, url: &str, form: FormData) -> Result<Response, TransportError> {
        let request = Request::post(url)
            .body(form)
            .map_err(|e| TransportError::Network(e.to_string()))?;
        request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))
    }
}

fn form_error(e: wasm_bindgen::JsValue) -> TransportError {
    TransportError::Network(format!("failed to build form: {}", describe_js_error(&e)))
}

async fn ensure_success(response: &Response) -> Result<(), TransportError> {
    if response.ok() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(TransportError::from_status(response.status(), &body))
}

async fn read_reply(response: Response) -> Result<String, TransportError> {
    ensure_success(&response).await?;
    let body: ReplyBody = response
        .json()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(body.response)
}

#[async_trait(?Send)]
impl ChatTransport for HttpTransport {
    type Upload = File;

    async fn send_message(&self, text: &str) -> Result<String, TransportError> {
        log::debug!("POST {}", self.chat_url);
        let request = Request::post(&self.chat_url)
            .json(&ChatRequest {
                message: text.to_string(),
            })
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        read_reply(response).await
    }

    async fn upload_file(&self, file: File) -> Result<String, TransportError> {
        log::debug!("POST {} ({}, {} bytes)", self.upload_url, file.name(), file.size());
        let form = FormData::new().map_err(form_error)?;
        form.append_with_blob_and_filename("file", &file, &file.name())
            .map_err(form_error)?;
        let response = self.post_form(&self.upload_url, form).await?;
        read_reply(response).await
    }

    async fn export_conversation(&self, lines: &[String]) -> Result<Vec<u8>, TransportError> {
        log::debug!("POST {} ({} lines)", self.export_url, lines.len());
        let form = FormData::new().map_err(form_error)?;
        for line in lines {
            form.append_with_str("messages", line).map_err(form_error)?;
        }
        let response = self.post_form(&self.export_url, form).await?;
        ensure_success(&response).await?;
        response
            .binary()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
