// API session module: a small blocking HTTP client that talks to the
// scanner's management API. Every call goes through the same cookie-bearing
// `reqwest` client, so the session cookie set by `/login` is replayed on all
// later requests of the same invocation.

use crate::config::Credentials;
use crate::error::{NessusError, Result};
use reqwest::blocking::{multipart, Client, Response};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Port the scanner web interface listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8834;

/// Authenticated session against one server. Holds the cookie store for the
/// lifetime of the process; there is no explicit logout.
pub struct Session {
    client: Client,
    base_url: String,
}

/// Every JSON answer is wrapped as `{"reply": {"status": "OK", "contents": ..}}`.
#[derive(Deserialize, Debug)]
struct Envelope {
    reply: Reply,
}

#[derive(Deserialize, Debug)]
struct Reply {
    status: String,
    #[serde(default)]
    contents: Value,
}

impl Session {
    /// Log in with form credentials and keep the resulting cookies.
    ///
    /// Transport and TLS failures map to `Connection`; any answer other
    /// than a 2xx with an `OK` envelope maps to `Auth`.
    pub fn login(base_url: &str, credentials: &Credentials, insecure: bool) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(NessusError::Connection)?;
        let session = Session {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        };

        let res = session.send(
            "/login",
            &[
                ("login", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("json", "1"),
            ],
        )?;
        if !res.status().is_success() {
            return Err(NessusError::Auth(format!("HTTP {}", res.status())));
        }
        match res.json::<Envelope>() {
            Ok(envelope) if envelope.reply.status == "OK" => {}
            Ok(envelope) => return Err(NessusError::Auth(envelope.reply.status)),
            Err(e) => return Err(NessusError::protocol("/login", e.to_string())),
        }

        info!(server = %session.base_url, user = %credentials.username, "logged in");
        Ok(session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// POST a form and hand back the raw response. Only transport errors
    /// are mapped here; status checks are up to the caller.
    fn send(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Response> {
        debug!(endpoint, "POST");
        let res = self
            .client
            .post(self.url(endpoint))
            .form(params)
            .send()
            .map_err(NessusError::Connection)?;
        debug!(endpoint, status = %res.status(), "response");
        Ok(res)
    }

    /// JSON call: adds `json=1`, checks the envelope and decodes `contents`.
    pub(crate) fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut form = params.to_vec();
        form.push(("json", "1"));
        let res = ensure_success(endpoint, self.send(endpoint, &form)?)?;

        let envelope: Envelope = res
            .json()
            .map_err(|e| NessusError::protocol(endpoint, format!("malformed reply: {e}")))?;
        if envelope.reply.status != "OK" {
            return Err(NessusError::protocol(
                endpoint,
                format!("server answered status '{}'", envelope.reply.status),
            ));
        }
        serde_json::from_value(envelope.reply.contents)
            .map_err(|e| NessusError::protocol(endpoint, e.to_string()))
    }

    /// Raw download; the body is returned untouched.
    pub(crate) fn download(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Vec<u8>> {
        let res = ensure_success(endpoint, self.send(endpoint, params)?)?;
        let body = res.bytes().map_err(NessusError::Connection)?;
        Ok(body.to_vec())
    }

    /// Multipart upload. The server's answer body carries nothing we need.
    pub(crate) fn upload(&self, endpoint: &str, form: multipart::Form) -> Result<()> {
        debug!(endpoint, "POST multipart");
        let res = self
            .client
            .post(self.url(endpoint))
            .multipart(form)
            .send()
            .map_err(NessusError::Connection)?;
        ensure_success(endpoint, res)?;
        Ok(())
    }
}

fn ensure_success(endpoint: &str, res: Response) -> Result<Response> {
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(NessusError::protocol(endpoint, format!("HTTP {}", res.status())))
    }
}

/// Ids come back as JSON numbers or strings depending on the endpoint.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Timestamps are epoch seconds, sometimes quoted.
pub(crate) fn epoch_seconds<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| de::Error::custom("timestamp out of range")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f as i64)
            .map_err(|_| de::Error::custom(format!("invalid timestamp '{s}'"))),
        other => Err(de::Error::custom(format!("invalid timestamp {other}"))),
    }
}

/// Lists with a single element are sometimes sent as a bare object.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}
