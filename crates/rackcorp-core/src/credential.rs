//! API credentials and the discovery chain that locates them.
//!
//! The client itself only needs a resolved [`Credential`]. Discovery is a
//! convenience: environment variables first, then INI-style config files in the
//! user's home directory.

use directories::BaseDirs;
use ini::{Ini, ParseOption};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Environment variable pairs consulted, in order.
pub const ENV_VARIABLE_PAIRS: [(&str, &str); 2] = [
    ("RACKCORP_API_UUID", "RACKCORP_API_SECRET"),
    ("RACKCORP_APIUUID", "RACKCORP_APISECRET"),
];

/// INI section holding the credential keys.
pub const INI_SECTION: &str = "general";
/// INI key holding the API uuid.
pub const INI_UUID_KEY: &str = "apiuuid";
/// INI key holding the API secret.
pub const INI_SECRET_KEY: &str = "apisecret";

/// RackCorp API credential pair, sent as HTTP Basic auth.
#[derive(Debug, Clone)]
pub struct Credential {
    uuid: String,
    secret: SecretString,
}

impl Credential {
    /// Create a credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if either part is empty.
    pub fn new(uuid: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let uuid = uuid.into();
        let secret = secret.into();
        if uuid.is_empty() {
            return Err(Error::Validation(
                "uuid argument must not be empty".to_string(),
            ));
        }
        if secret.is_empty() {
            return Err(Error::Validation(
                "secret argument must not be empty".to_string(),
            ));
        }
        Ok(Self {
            uuid,
            secret: SecretString::from(secret),
        })
    }

    /// The API uuid (Basic auth username).
    #[must_use]
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// The API secret (Basic auth password).
    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    pub(crate) fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

/// Source of a credential pair.
pub trait CredentialProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Resolve a credential, or `None` when this source has none.
    fn credential(&self) -> Option<Credential>;
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads [`ENV_VARIABLE_PAIRS`] from the process environment.
pub struct EnvCredentialProvider {
    lookup: Lookup,
}

impl EnvCredentialProvider {
    /// Provider backed by `std::env`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Provider backed by a custom variable lookup.
    #[must_use]
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl Default for EnvCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn credential(&self) -> Option<Credential> {
        ENV_VARIABLE_PAIRS.iter().find_map(|(uuid_var, secret_var)| {
            let uuid = (self.lookup)(uuid_var).unwrap_or_default();
            let secret = (self.lookup)(secret_var).unwrap_or_default();
            Credential::new(uuid, secret).ok()
        })
    }
}

/// Reads the `[general]` section of INI-style config files, first hit wins.
#[derive(Debug, Clone, Default)]
pub struct IniFileCredentialProvider {
    paths: Vec<PathBuf>,
}

impl IniFileCredentialProvider {
    /// Provider over explicit paths.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Provider over `~/.rackcorp` and `~/.config/.rackcorp/config`.
    #[must_use]
    pub fn from_home() -> Self {
        let paths = BaseDirs::new()
            .map(|dirs| {
                let home = dirs.home_dir();
                vec![
                    home.join(".rackcorp"),
                    home.join(".config").join(".rackcorp").join("config"),
                ]
            })
            .unwrap_or_default();
        Self { paths }
    }

    /// Paths consulted, in order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl CredentialProvider for IniFileCredentialProvider {
    fn name(&self) -> &'static str {
        "config file"
    }

    fn credential(&self) -> Option<Credential> {
        self.paths.iter().find_map(|path| {
            let contents = match std::fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
                Err(err) => {
                    warn!("Skipping credential file {}: {err}", path.display());
                    return None;
                }
            };
            match parse_ini(&contents) {
                Ok(Some(credential)) => Some(credential),
                Ok(None) => {
                    debug!("No credential in {}", path.display());
                    None
                }
                Err(err) => {
                    warn!("Skipping credential file {}: {err}", path.display());
                    None
                }
            }
        })
    }
}

/// Ordered list of providers; the first one that resolves wins.
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialChain {
    /// Chain over explicit providers.
    #[must_use]
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        Self { providers }
    }

    /// Environment variables, then the home-directory config files.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(EnvCredentialProvider::new()),
            Box::new(IniFileCredentialProvider::from_home()),
        ])
    }

    /// Resolve a credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no provider yields one.
    pub fn resolve(&self) -> Result<Credential> {
        for provider in &self.providers {
            if let Some(credential) = provider.credential() {
                debug!("Loaded RackCorp credentials from {}", provider.name());
                return Ok(credential);
            }
        }
        Err(Error::Config(
            "failed to load API credentials from environment".to_string(),
        ))
    }
}

/// Extract `apiuuid`/`apisecret` from the `[general]` section of INI text.
///
/// Yields `None` unless both keys are present and non-empty. Backslashes in
/// values are kept literally; surrounding quotes are stripped.
///
/// # Errors
///
/// Returns [`Error::Config`] when the text is not valid INI.
pub fn parse_ini(contents: &str) -> Result<Option<Credential>> {
    let options = ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(contents, options)
        .map_err(|err| Error::Config(format!("invalid INI: {err}")))?;

    let Some(section) = ini.section(Some(INI_SECTION)) else {
        return Ok(None);
    };
    let (Some(uuid), Some(secret)) = (section.get(INI_UUID_KEY), section.get(INI_SECRET_KEY))
    else {
        return Ok(None);
    };
    Ok(Credential::new(uuid.trim(), secret.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> EnvCredentialProvider {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        EnvCredentialProvider::with_lookup(move |name| vars.get(name).cloned())
    }

    #[test]
    fn test_credential_new() {
        let credential = Credential::new("dummy-uuid", "dummy-secret").unwrap();
        assert_eq!(credential.uuid(), "dummy-uuid");
        assert_eq!(credential.secret().expose_secret(), "dummy-secret");
    }

    #[test]
    fn test_credential_rejects_empty_parts() {
        assert!(matches!(
            Credential::new("", "dummy-secret"),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Credential::new("dummy-uuid", ""),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_credential_debug_redacts_secret() {
        let credential = Credential::new("dummy-uuid", "dummy-secret").unwrap();
        let debug = format!("{credential:?}");
        assert!(debug.contains("dummy-uuid"));
        assert!(!debug.contains("dummy-secret"));
    }

    #[test]
    fn test_parse_ini() {
        let credential = parse_ini("[general]\napiuuid=dummy-uuid\napisecret=dummy-secret\n")
            .unwrap()
            .unwrap();
        assert_eq!(credential.uuid(), "dummy-uuid");
        assert_eq!(credential.expose_secret(), "dummy-secret");
    }

    #[test]
    fn test_parse_ini_ignores_other_sections() {
        let contents = "; comment\n[other]\napiuuid=wrong\n\n[general]\napiuuid = \"u\"\napisecret = s\n";
        let credential = parse_ini(contents).unwrap().unwrap();
        assert_eq!(credential.uuid(), "u");
        assert_eq!(credential.expose_secret(), "s");

        assert!(parse_ini("[other]\napiuuid=a\napisecret=b\n")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_parse_ini_requires_both_keys() {
        assert!(parse_ini("[general]\napiuuid=dummy-uuid\n").unwrap().is_none());
        assert!(parse_ini("[general]\napiuuid=\napisecret=x\n").unwrap().is_none());
    }

    #[test]
    fn test_parse_ini_colon_separator_and_comments() {
        let contents = "# written by hand\n[general]\napiuuid: colon-uuid\n; note\napisecret : colon-secret\n";
        let credential = parse_ini(contents).unwrap().unwrap();
        assert_eq!(credential.uuid(), "colon-uuid");
        assert_eq!(credential.expose_secret(), "colon-secret");
    }

    #[test]
    fn test_parse_ini_keeps_backslashes() {
        let contents = "[general]\napiuuid=u\napisecret=ab\\ncd\n";
        let credential = parse_ini(contents).unwrap().unwrap();
        assert_eq!(credential.expose_secret(), "ab\\ncd");
    }

    #[test]
    fn test_parse_ini_rejects_broken_section() {
        let err = parse_ini("[general\napiuuid=u\napisecret=s\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_env_provider_prefers_first_pair() {
        let provider = env(&[
            ("RACKCORP_API_UUID", "first"),
            ("RACKCORP_API_SECRET", "first-secret"),
            ("RACKCORP_APIUUID", "second"),
            ("RACKCORP_APISECRET", "second-secret"),
        ]);
        assert_eq!(provider.credential().unwrap().uuid(), "first");
    }

    #[test]
    fn test_env_provider_falls_back_to_second_pair() {
        let provider = env(&[
            ("RACKCORP_API_UUID", "incomplete"),
            ("RACKCORP_APIUUID", "second"),
            ("RACKCORP_APISECRET", "second-secret"),
        ]);
        assert_eq!(provider.credential().unwrap().uuid(), "second");
    }

    #[test]
    fn test_ini_provider_skips_missing_files() {
        let dir = std::env::temp_dir().join(format!("rackcorp-cred-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let present = dir.join("config");
        std::fs::write(&present, "[general]\napiuuid=file-uuid\napisecret=file-secret\n").unwrap();

        let provider = IniFileCredentialProvider::new(vec![dir.join("missing"), present]);
        assert_eq!(provider.credential().unwrap().uuid(), "file-uuid");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_chain_first_hit_wins() {
        let chain = CredentialChain::new(vec![
            Box::new(env(&[])),
            Box::new(env(&[
                ("RACKCORP_APIUUID", "chained"),
                ("RACKCORP_APISECRET", "chained-secret"),
            ])),
        ]);
        assert_eq!(chain.resolve().unwrap().uuid(), "chained");
    }

    #[test]
    fn test_chain_without_credentials() {
        let chain = CredentialChain::new(vec![Box::new(env(&[]))]);
        assert!(matches!(chain.resolve(), Err(Error::Config(_))));
    }
}
