//! HTTP client for the natural-language math gateway.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use mathbox_core::ai::{interpret_completion, interpret_reply, MathAnswer, MathQuery};
use mathbox_core::{CalcError, CalcResult};

use crate::config::{AiProtocol, AiSettings};

const USER_AGENT: &str = concat!("Mathbox/", env!("CARGO_PKG_VERSION"));

pub struct AiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    protocol: AiProtocol,
    model: String,
}

impl AiClient {
    /// Build a client from settings. `endpoint` overrides `[ai] endpoint`.
    pub fn from_settings(settings: &AiSettings, endpoint: Option<&str>) -> Result<Self> {
        let endpoint = endpoint
            .map(str::to_string)
            .or_else(|| settings.endpoint.clone())
            .context("no AI endpoint configured; set [ai] endpoint in the settings file or pass --endpoint")?;
        let api_key = std::env::var(&settings.api_key_env).ok().filter(|k| !k.is_empty());

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to create HTTP client")?;

        Ok(AiClient {
            http,
            endpoint,
            api_key,
            protocol: settings.protocol,
            model: settings.model.clone(),
        })
    }

    /// Send one question and interpret the reply.
    pub async fn ask(&self, query: &MathQuery) -> CalcResult<MathAnswer> {
        let request = match self.protocol {
            AiProtocol::Function => self.http.post(self.endpoint.as_str()).json(query),
            AiProtocol::Chat => self.http.post(self.endpoint.as_str()).json(&query.chat_request(&self.model)),
        };
        let request = match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        };

        info!(endpoint = %self.endpoint, protocol = ?self.protocol, "asking math gateway");
        let response = request.send().await.map_err(CalcError::unreachable)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(CalcError::unreachable)?;
        debug!(status, bytes = body.len(), "gateway replied");

        match self.protocol {
            AiProtocol::Function => interpret_reply(status, &body),
            AiProtocol::Chat => interpret_completion(status, &body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serve one canned reply and hand back the raw request
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/ask", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut payload = vec![0u8; content_length];
            reader.read_exact(&mut payload).unwrap();
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            reader.get_mut().write_all(reply.as_bytes()).unwrap();
            head + &String::from_utf8_lossy(&payload)
        });
        (url, handle)
    }

    fn settings(protocol: AiProtocol) -> AiSettings {
        AiSettings {
            api_key_env: "MATHBOX_TEST_KEY_UNSET".to_string(),
            timeout_secs: 5,
            protocol,
            ..AiSettings::default()
        }
    }

    #[test]
    fn missing_endpoint() {
        assert!(AiClient::from_settings(&AiSettings::default(), None).is_err());
    }

    #[tokio::test]
    async fn function_reply() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"result": 12, "expression": "√144", "explanation": "The square root of 144 is 12"}"#,
        );
        let client = AiClient::from_settings(&settings(AiProtocol::Function), Some(&url)).unwrap();
        let answer = client.ask(&MathQuery::new("square root of 144").unwrap()).await.unwrap();
        assert_eq!(answer.result, 12.0);
        assert_eq!(answer.expression, "√144");

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /ask"));
        assert!(request.contains(r#"{"query":"square root of 144"}"#));
        assert!(request.to_ascii_lowercase().contains("user-agent: mathbox/"));
    }

    #[tokio::test]
    async fn rate_limited() {
        let (url, server) = serve_once("429 Too Many Requests", r#"{"error": "slow down"}"#);
        let client = AiClient::from_settings(&settings(AiProtocol::Function), Some(&url)).unwrap();
        let err = client.ask(&MathQuery::new("2+2").unwrap()).await.unwrap_err();
        assert_eq!(err, CalcError::RateLimited);
        server.join().unwrap();
    }

    #[tokio::test]
    async fn chat_reply() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"content":"```json\n{\"result\": 4, \"expression\": \"2+2\", \"explanation\": \"two plus two\"}\n```"}}]}"#,
        );
        let client = AiClient::from_settings(&settings(AiProtocol::Chat), Some(&url)).unwrap();
        let answer = client.ask(&MathQuery::new("two plus two").unwrap()).await.unwrap();
        assert_eq!(answer.result, 4.0);

        let request = server.join().unwrap();
        assert!(request.contains(r#""role":"system""#));
        assert!(request.contains(mathbox_core::ai::DEFAULT_MODEL));
    }

    #[tokio::test]
    async fn unreachable_gateway() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/ask", port);
        let client = AiClient::from_settings(&settings(AiProtocol::Function), Some(&url)).unwrap();
        let err = client.ask(&MathQuery::new("2+2").unwrap()).await.unwrap_err();
        assert_eq!(err.error_code(), "UNREACHABLE");
        assert_eq!(err.notification_title(), "Error");
    }
}
