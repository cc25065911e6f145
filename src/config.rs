//! Server configuration
//!
//! Every option can come from the command line or the environment (`.env`
//! files are loaded before parsing).

use crate::auth::credentials::{AdminCredentials, AdminSecret};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::warn;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

#[derive(Parser, Debug, Clone)]
#[command(name = "usergate")]
#[command(about = "Credential-based access control API with a configuration-backed admin")]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    pub bind_addr: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "5000")]
    pub port: u16,

    /// HMAC secret used to sign bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Email of the configuration-backed admin
    #[arg(long, env = "ADMIN_EMAIL", default_value = "")]
    pub admin_email: String,

    /// Plaintext password of the configuration-backed admin
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// bcrypt hash of the admin password; takes precedence over ADMIN_PASSWORD
    #[arg(long, env = "ADMIN_PASSWORD_HASH", hide_env_values = true)]
    pub admin_password_hash: Option<String>,

    /// SQLite database holding user records
    #[arg(long, env = "AUTH_DB_PATH", default_value = "usergate_auth.db")]
    pub db_path: PathBuf,

    /// Directory for uploaded profile images
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Largest accepted request body
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    pub fn jwt_secret(&self) -> String {
        match self.jwt_secret.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret.to_string(),
            None => {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        }
    }

    pub fn admin_credentials(&self) -> AdminCredentials {
        let secret = match (&self.admin_password_hash, &self.admin_password) {
            (Some(hash), _) if !hash.trim().is_empty() => AdminSecret::Bcrypt(hash.clone()),
            (_, Some(plain)) => AdminSecret::Plain(plain.clone()),
            _ => AdminSecret::Plain(String::new()),
        };

        if self.admin_email.is_empty() {
            warn!("ADMIN_EMAIL not set, admin login is disabled");
        }

        AdminCredentials {
            email: self.admin_email.clone(),
            secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        let mut argv = vec!["usergate"];
        argv.extend_from_slice(args);
        ServerConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_admin_hash_takes_precedence() {
        let config = parse(&[
            "--admin-email",
            "root@example.com",
            "--admin-password",
            "plain",
            "--admin-password-hash",
            "$2b$04$abcdefghijklmnopqrstuv",
        ]);

        let admin = config.admin_credentials();
        assert_eq!(admin.email, "root@example.com");
        assert!(matches!(admin.secret, AdminSecret::Bcrypt(_)));
    }

    #[test]
    fn test_plain_admin_password() {
        let config = parse(&["--admin-email", "root@example.com", "--admin-password", "plain"]);
        assert!(matches!(
            config.admin_credentials().secret,
            AdminSecret::Plain(ref p) if p == "plain"
        ));
    }

    #[test]
    fn test_listen_addr_and_secret_fallback() {
        let config = parse(&["--port", "8080", "--bind-addr", "127.0.0.1", "--jwt-secret", " "]);
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.jwt_secret(), DEV_JWT_SECRET);
    }
}
