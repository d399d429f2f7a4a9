use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::Error;

/// Describing the server configuration.
///
/// Every section has defaults, so an empty file is a valid configuration.
/// Unknown sections are rejected.
#[derive(Deserialize, Default, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: Server,
    pub store: Storage,
    pub credentials: Credentials,
    pub session: Session,
    /// Outgoing mail. Notifications are only logged when absent.
    pub smtp: Option<Smtp>,
    /// A super admin created at startup if its email is not registered yet.
    pub super_admin: Option<SuperAdmin>,
}

impl Config {
    /// Reads the configuration from a toml file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let string = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&string)?)
    }

    /// Reads the configuration from a toml file, falling back to
    /// the defaults if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(
                "config file {} not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Server {
    pub addr: SocketAddr,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
        }
    }
}

#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct Storage {
    /// Directory records are persisted to. `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Credentials {
    /// Length of generated passwords.
    pub password_length: usize,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            password_length: 12,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Session {
    /// Lifetime of a session token in hours.
    /// `0` means never expire.
    pub expire_hours: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self { expire_hours: 24 }
    }
}

/// Describing mailing configuration.
#[derive(Deserialize, Clone)]
pub struct Smtp {
    pub server: String,
    #[serde(default = "Smtp::default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub address: lettre::Address,
    #[serde(default = "Smtp::default_sender_name")]
    pub sender_name: String,
}

impl Smtp {
    fn default_port() -> u16 {
        587
    }

    fn default_sender_name() -> String {
        "Gaam".to_owned()
    }
}

impl std::fmt::Debug for Smtp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Smtp")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("address", &self.address)
            .field("sender_name", &self.sender_name)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Clone)]
pub struct SuperAdmin {
    pub full_name: String,
    pub email: lettre::Address,
    pub password: String,
}

impl std::fmt::Debug for SuperAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuperAdmin")
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.addr.port(), 8080);
        assert_eq!(config.credentials.password_length, 12);
        assert_eq!(config.session.expire_hours, 24);
        assert!(config.store.data_dir.is_none());
        assert!(config.smtp.is_none());
        assert!(config.super_admin.is_none());
    }

    #[test]
    fn full_file() {
        let config: Config = toml::from_str(
            r#"
            [server]
            addr = "0.0.0.0:3000"

            [store]
            data_dir = "./data/store"

            [credentials]
            password_length = 16

            [session]
            expire_hours = 0

            [smtp]
            server = "smtp.example.org"
            username = "mailer"
            password = "secret"
            address = "noreply@example.org"

            [super_admin]
            full_name = "Root Admin"
            email = "root@example.org"
            password = "change-me-now"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.addr.port(), 3000);
        assert_eq!(config.credentials.password_length, 16);
        assert_eq!(config.session.expire_hours, 0);
        assert_eq!(
            config.store.data_dir.as_deref(),
            Some(std::path::Path::new("./data/store"))
        );
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.sender_name, "Gaam");
        assert_eq!(config.super_admin.unwrap().email.to_string(), "root@example.org");
    }

    #[test]
    fn misspelled_sections_are_rejected() {
        let err = toml::from_str::<Config>("[storage]\ndata_dir = \"./data/store\"").unwrap_err();
        assert!(err.to_string().contains("storage"), "{err}");
    }
}
