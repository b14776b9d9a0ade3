//! SMTP delivery through lettre.

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use log::{debug, info};
use secrecy::ExposeSecret;

use crate::config::SmtpSettings;

use super::{SendError, SmtpConnector, SmtpError, SmtpSession};

/// Connector for the list's outgoing SMTP account (implicit TLS).
pub struct SmtpClient {
    settings: SmtpSettings,
}

impl SmtpClient {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SmtpConnector for SmtpClient {
    type Session = SmtpConnection;

    async fn connect(&self) -> Result<SmtpConnection, SmtpError> {
        let password = self
            .settings
            .auth
            .resolve()
            .map_err(|e| SmtpError::CredentialsNotFound(e.to_string()))?;
        let creds = Credentials::new(
            self.settings.username.clone(),
            password.expose_secret().to_string(),
        );

        debug!(
            "Connecting to SMTP account at {}:{}",
            self.settings.host, self.settings.port
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.host)
            .map_err(|e| SmtpError::Setup(format!("SMTP relay error: {e}")))?
            .port(self.settings.port)
            .credentials(creds)
            .build();

        // Login must fail here, not during the batch: a 535 on send is a
        // negative reply, which counts as a per-recipient rejection, and the
        // message would be moved unsent. The verified connection goes back
        // to the pool.
        debug!("Login to SMTP with user {}", self.settings.username);
        match transport.test_connection().await {
            Ok(true) => {}
            Ok(false) => {
                return Err(SmtpError::ConnectionFailed(format!(
                    "server {} did not accept the connection",
                    self.settings.host
                )))
            }
            Err(e) => return Err(SmtpError::ConnectionFailed(e.to_string())),
        }

        info!("Connected to SMTP server {}", self.settings.host);
        Ok(SmtpConnection {
            transport: Some(transport),
        })
    }
}

/// Pooled lettre transport acting as one logical session.
pub struct SmtpConnection {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

#[async_trait]
impl SmtpSession for SmtpConnection {
    async fn send(&mut self, sender: &str, recipient: &str, raw: &[u8]) -> Result<(), SendError> {
        let transport = self.transport.as_ref().ok_or(SmtpError::Closed)?;
        let envelope = build_envelope(sender, recipient)?;

        match transport.send_raw(&envelope, raw).await {
            Ok(_) => Ok(()),
            // A negative reply concerns this recipient only
            Err(e) if e.is_permanent() || e.is_transient() => Err(SendError::Rejected {
                recipient: recipient.to_string(),
                reason: e.to_string(),
            }),
            Err(e) => Err(SendError::Session(SmtpError::Session(e.to_string()))),
        }
    }

    async fn close(&mut self) -> Result<(), SmtpError> {
        if self.transport.take().is_some() {
            debug!("Closing SMTP session");
        }
        Ok(())
    }
}

fn build_envelope(sender: &str, recipient: &str) -> Result<Envelope, SendError> {
    let rejected = |reason: String| SendError::Rejected {
        recipient: recipient.to_string(),
        reason,
    };

    let from: Address = sender
        .parse()
        .map_err(|e| rejected(format!("invalid sender address '{sender}': {e}")))?;
    let to: Address = recipient
        .parse()
        .map_err(|e| rejected(format!("invalid recipient address: {e}")))?;

    Envelope::new(Some(from), vec![to]).map_err(|e| rejected(format!("invalid envelope: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::PasswordSource;

    #[test]
    fn test_build_envelope() {
        let envelope = build_envelope("alice@example.org", "bob@example.org").unwrap();
        assert_eq!(
            envelope.from().map(|a| a.to_string()).as_deref(),
            Some("alice@example.org")
        );
        assert_eq!(envelope.to().len(), 1);
        assert_eq!(envelope.to()[0].to_string(), "bob@example.org");
    }

    #[test]
    fn test_bad_recipient_is_rejection() {
        let err = build_envelope("alice@example.org", "not an address").unwrap_err();
        match err {
            SendError::Rejected { recipient, .. } => assert_eq!(recipient, "not an address"),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_closed_session_refuses_to_send() {
        let mut connection = SmtpConnection { transport: None };
        let result = connection
            .send("alice@example.org", "bob@example.org", b"Subject: x\r\n\r\n")
            .await;
        assert!(matches!(result, Err(SendError::Session(SmtpError::Closed))));
        assert!(connection.close().await.is_ok());
    }

    fn settings_for(port: u16, auth: PasswordSource) -> SmtpSettings {
        SmtpSettings {
            host: "127.0.0.1".to_string(),
            port,
            username: "list@example.org".to_string(),
            auth,
            list_address: "list@example.org".to_string(),
        }
    }

    #[tokio::test]
    async fn test_connect_without_credentials_fails_before_dialing() {
        let auth = PasswordSource {
            password_env_var: Some("MAILBOY_TEST_SMTP_UNSET_PASSWORD".to_string()),
            ..Default::default()
        };
        let client = SmtpClient::new(settings_for(465, auth));

        assert!(matches!(
            client.connect().await,
            Err(SmtpError::CredentialsNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_verifies_server_before_returning_session() {
        // Reserve a port, then free it so nothing listens there
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let auth = PasswordSource {
            password: Some("secret".to_string()),
            ..Default::default()
        };
        let client = SmtpClient::new(settings_for(port, auth));

        assert!(matches!(
            client.connect().await,
            Err(SmtpError::ConnectionFailed(_))
        ));
    }
}
