//! Translation adapter (§4.6, §6 "Provider contract (Translate)").
//!
//! A synchronous REST call, so there is no background task here at all —
//! unlike the STT and TTS adapters, this one is a thin `reqwest` wrapper
//! with a hard timeout and zero retries, exactly as the contract specifies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use voice_translate_config::ProviderCredentials;
use voice_translate_core::{CoreError, Translator};

use crate::error::ProviderError;

const TRANSLATE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct TranslateRequestItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponseItem {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// HTTP client adapter implementing [`Translator`] against the documented
/// Microsoft Translator Text API wire shape (§6): `POST
/// /translate?api-version=3.0&to=<lang>&from=<lang>` with
/// `Ocp-Apim-Subscription-Key`/`Ocp-Apim-Subscription-Region` headers and a
/// JSON array body.
pub struct TranslateAdapter {
    client: reqwest::Client,
    endpoint: String,
    credentials: ProviderCredentials,
}

impl TranslateAdapter {
    pub fn new(credentials: ProviderCredentials) -> Self {
        let endpoint = credentials
            .endpoint
            .clone()
            .unwrap_or_else(|| "https://api.cognitive.microsofttranslator.com".to_string());
        Self {
            client: reqwest::Client::new(),
            endpoint,
            credentials,
        }
    }

    /// The BCP-47 primary subtag, e.g. `"es-ES"` -> `"es"` (§4.6: "source
    /// language is derived from the session's source locale's primary
    /// subtag").
    fn primary_subtag(locale: &str) -> &str {
        locale.split(['-', '_']).next().unwrap_or(locale)
    }
}

#[async_trait]
impl Translator for TranslateAdapter {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_lang: &str,
    ) -> Result<String, CoreError> {
        let from = Self::primary_subtag(source_locale);
        let url = format!("{}/translate", self.endpoint.trim_end_matches('/'));

        let body = vec![TranslateRequestItem { text }];

        let send = self
            .client
            .post(&url)
            .query(&[
                ("api-version", "3.0"),
                ("from", from),
                ("to", target_lang),
            ])
            .header(
                "Ocp-Apim-Subscription-Key",
                self.credentials.key.as_str(),
            )
            .header(
                "Ocp-Apim-Subscription-Region",
                self.credentials.region.as_str(),
            )
            .json(&body)
            .send();

        let response = tokio::time::timeout(TRANSLATE_TIMEOUT, send)
            .await
            .map_err(|_| ProviderError::Timeout)?
            .map_err(ProviderError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let mut parsed: Vec<TranslateResponseItem> = response
            .json()
            .await
            .map_err(ProviderError::Transport)?;

        let item = parsed
            .pop()
            .ok_or_else(|| ProviderError::Protocol("empty translate response array".into()))?;
        let translation = item
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Protocol("no translations in response".into()))?;

        Ok(translation.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn primary_subtag_strips_region() {
        assert_eq!(TranslateAdapter::primary_subtag("es-ES"), "es");
        assert_eq!(TranslateAdapter::primary_subtag("en"), "en");
    }

    /// Hand-rolled loopback HTTP server (§10.5): accepts exactly one
    /// request, discards it, and writes back a fixed status/body.
    async fn serve_once(listener: TcpListener, status_line: &'static str, body: String) {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 8192];
        let _ = stream.read(&mut buf).await.unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        let _ = stream.shutdown().await;
    }

    fn credentials(endpoint: String) -> ProviderCredentials {
        ProviderCredentials { key: "k".into(), region: "eastus".into(), endpoint: Some(endpoint) }
    }

    #[tokio::test]
    async fn translate_parses_the_documented_wire_shape() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = r#"[{"translations":[{"text":"hello world"}]}]"#.to_string();
        tokio::spawn(serve_once(listener, "200 OK", body));

        let adapter = TranslateAdapter::new(credentials(format!("http://{addr}")));
        let result = adapter.translate("hola mundo", "es-ES", "en").await.unwrap();
        assert_eq!(result, "hello world");
    }

    #[tokio::test]
    async fn non_200_response_surfaces_as_provider_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_once(listener, "500 Internal Server Error", "oops".to_string()));

        let adapter = TranslateAdapter::new(credentials(format!("http://{addr}")));
        let err = adapter.translate("hola", "es-ES", "en").await.unwrap_err();
        assert!(err.to_string().contains("provider error"));
    }
}
