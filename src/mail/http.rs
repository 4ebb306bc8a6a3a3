use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ServerConfig;
use crate::mail::{FlagUpdate, MailError, MailService, Mailbox, Message, MessageId, OutgoingMessage};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct Ack {
    message: String,
}

/// `MailService` over the store's JSON API.
pub struct HttpMailClient {
    base_url: String,
    client: Client,
}

impl HttpMailClient {
    pub fn new(cfg: &ServerConfig) -> Result<Self> {
        Self::build(
            &cfg.base_url,
            Duration::from_secs(cfg.timeout_secs.max(1)),
            cfg.cookie.as_deref(),
        )
    }

    fn build(base_url: &str, timeout: Duration, cookie: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) {
            let value = HeaderValue::from_str(cookie).map_err(|_| anyhow!("invalid cookie value"))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/emails{}", self.base_url, path)
    }
}

async fn check(response: Response) -> Result<Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .ok()
        .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

    if status == StatusCode::NOT_FOUND {
        Err(MailError::NotFound(message))
    } else {
        Err(MailError::Service { status: status.as_u16(), message })
    }
}

impl MailService for HttpMailClient {
    async fn list_mailbox(&self, mailbox: Mailbox) -> Result<Vec<Message>, MailError> {
        let url = self.url(&format!("/{mailbox}"));
        debug!(%url, "GET mailbox");
        let response = check(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn get_message(&self, id: MessageId) -> Result<Message, MailError> {
        let url = self.url(&format!("/{id}"));
        debug!(%url, "GET message");
        let response = check(self.client.get(&url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn create_message(&self, message: OutgoingMessage) -> Result<String, MailError> {
        let url = self.url("");
        debug!(%url, recipients = %message.recipients, "POST message");
        let response = check(self.client.post(&url).json(&message).send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str::<Ack>(&text)
            .map(|a| a.message)
            .unwrap_or_else(|_| "Message sent".to_string()))
    }

    async fn update_message(&self, id: MessageId, flags: FlagUpdate) -> Result<(), MailError> {
        let url = self.url(&format!("/{id}"));
        debug!(%url, ?flags, "PUT flags");
        check(self.client.put(&url).json(&flags).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::error::ErrorKind;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answers a single request with `status` and `body`, yielding the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{addr}/"), handle)
    }

    fn client(base: &str) -> HttpMailClient {
        HttpMailClient::build(base, Duration::from_secs(5), None).unwrap()
    }

    #[tokio::test]
    async fn lists_mailbox_in_service_order() {
        let (base, server) = serve_once(
            "200 OK",
            r#"[{"id":2,"sender":"b@x.com","subject":"second","timestamp":"t2","read":true},
                {"id":1,"sender":"a@x.com","subject":"first","timestamp":"t1","read":false}]"#,
        )
        .await;

        let messages = client(&base).list_mailbox(Mailbox::Inbox).await.unwrap();
        let ids: Vec<_> = messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(messages[0].read);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /emails/inbox "), "{request}");
    }

    #[tokio::test]
    async fn missing_message_is_not_found() {
        let (base, server) = serve_once("404 Not Found", r#"{"error": "Email not found."}"#).await;

        let err = client(&base).get_message(42).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err, MailError::NotFound(ref m) if m == "Email not found."));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /emails/42 "));
    }

    #[tokio::test]
    async fn rejected_recipients_surface_service_message() {
        let (base, server) =
            serve_once("400 Bad Request", r#"{"error": "User with email x@y.com does not exist."}"#).await;

        let outgoing = OutgoingMessage {
            recipients: "x@y.com".to_string(),
            subject: "Hi".to_string(),
            body: "yo".to_string(),
        };
        let err = client(&base).create_message(outgoing).await.unwrap_err();
        match err {
            MailError::Service { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "User with email x@y.com does not exist.");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /emails "));
        assert!(request.contains(r#""recipients":"x@y.com""#));
        assert!(request.contains(r#""subject":"Hi""#));
    }

    #[tokio::test]
    async fn create_returns_acknowledgment() {
        let (base, _server) = serve_once("201 Created", r#"{"message": "Email sent successfully."}"#).await;

        let ack = client(&base)
            .create_message(OutgoingMessage::default())
            .await
            .unwrap();
        assert_eq!(ack, "Email sent successfully.");
    }

    #[tokio::test]
    async fn update_puts_partial_flags() {
        let (base, server) = serve_once("204 No Content", "").await;

        client(&base).update_message(5, FlagUpdate::read()).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /emails/5 "));
        assert!(request.ends_with(r#"{"read":true}"#), "{request}");
    }

    #[tokio::test]
    async fn update_failure_is_reported() {
        let (base, _server) = serve_once("500 Internal Server Error", "").await;

        let err = client(&base)
            .update_message(5, FlagUpdate::archived(true))
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Service { status: 500, .. }));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let client =
            HttpMailClient::build(&format!("http://{addr}"), Duration::from_millis(200), None).unwrap();
        let err = client.list_mailbox(Mailbox::Sent).await.unwrap_err();
        assert!(matches!(err, MailError::Timeout), "{err:?}");
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"))
            .list_mailbox(Mailbox::Inbox)
            .await
            .unwrap_err();
        assert!(matches!(err, MailError::Network(_)), "{err:?}");
    }

    #[test]
    fn cookie_must_be_a_valid_header() {
        assert!(HttpMailClient::build("http://localhost", Duration::from_secs(1), Some("a\nb")).is_err());
        assert!(HttpMailClient::build("http://localhost", Duration::from_secs(1), Some("sessionid=abc")).is_ok());
    }
}
