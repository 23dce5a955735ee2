//! SASL authentication.
//!
//! Grounded on lapin's `auth::Credentials` (imported by `src/channel.rs`),
//! narrowed to the two mechanisms the protocol actually names: `PLAIN` and
//! `EXTERNAL`.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials {
            username: "guest".to_string(),
            password: "guest".to_string(),
        }
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SASLMechanism {
    Plain,
    External,
}

impl SASLMechanism {
    pub fn as_str(self) -> &'static str {
        match self {
            SASLMechanism::Plain => "PLAIN",
            SASLMechanism::External => "EXTERNAL",
        }
    }

    /// Picks a mechanism the broker actually offers: prefers the
    /// user-requested one, otherwise falls back to `PLAIN`, the way most real clients do.
    pub fn negotiate(offered: &str, preferred: SASLMechanism) -> crate::Result<SASLMechanism> {
        let offered: Vec<&str> = offered.split(' ').collect();
        if offered.contains(&preferred.as_str()) {
            return Ok(preferred);
        }
        if offered.contains(&"PLAIN") {
            return Ok(SASLMechanism::Plain);
        }
        Err(crate::Error::Auth(format!(
            "broker does not offer a supported SASL mechanism (offered: {})",
            offered.join(", ")
        )))
    }

    /// The `start-ok` response payload for this mechanism.
    ///
    /// `PLAIN`'s wire layout is bit-exact per the protocol:
    /// `\0<username>\0<password>`. `EXTERNAL` carries no response.
    pub fn response(self, credentials: &Credentials) -> Vec<u8> {
        match self {
            SASLMechanism::Plain => {
                let mut buf = Vec::with_capacity(2 + credentials.username().len() + credentials.password().len());
                buf.push(0);
                buf.extend_from_slice(credentials.username().as_bytes());
                buf.push(0);
                buf.extend_from_slice(credentials.password().as_bytes());
                buf
            }
            SASLMechanism::External => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_response_is_nul_delimited() {
        let creds = Credentials::new("guest", "guest");
        let response = SASLMechanism::Plain.response(&creds);
        assert_eq!(response, b"\0guest\0guest");
    }

    #[test]
    fn negotiate_prefers_requested_mechanism_when_offered() {
        let chosen = SASLMechanism::negotiate("PLAIN EXTERNAL", SASLMechanism::External).unwrap();
        assert_eq!(chosen, SASLMechanism::External);
    }

    #[test]
    fn negotiate_falls_back_to_plain() {
        let chosen = SASLMechanism::negotiate("PLAIN", SASLMechanism::External).unwrap();
        assert_eq!(chosen, SASLMechanism::Plain);
    }

    #[test]
    fn negotiate_errors_when_nothing_supported_is_offered() {
        assert!(SASLMechanism::negotiate("GSSAPI", SASLMechanism::Plain).is_err());
    }
}
