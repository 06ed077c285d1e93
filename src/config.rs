//! Connection settings and credential resolution

use crate::error::Result;

/// Login credentials for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Where missing credentials come from. The binary uses terminal prompts;
/// tests plug in canned answers.
pub trait CredentialSource {
    fn username(&mut self) -> Result<String>;
    fn password(&mut self) -> Result<String>;
}

impl Credentials {
    /// Use the supplied values and ask `source` only for what is missing.
    /// Empty strings count as missing.
    pub fn resolve(
        username: Option<String>,
        password: Option<String>,
        source: &mut dyn CredentialSource,
    ) -> Result<Self> {
        let username = match username.filter(|u| !u.is_empty()) {
            Some(u) => u,
            None => source.username()?,
        };
        let password = match password.filter(|p| !p.is_empty()) {
            Some(p) => p,
            None => source.password()?,
        };
        Ok(Credentials { username, password })
    }
}

/// Where to reach the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub insecure: bool,
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}
