//! API key storage and resolution
//!
//! The Gemini key lives in the OS keyring under the `uturu` service. A
//! `--api-key` flag overrides whatever is stored, and the `GEMINI_API_KEY`
//! environment variable is the fallback when neither is available. An
//! empty resolved key is not fatal here; submission is where it blocks.

use keyring::Entry;
use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use tracing::warn;

const KEYRING_SERVICE: &str = "uturu";
const KEYRING_USER: &str = "gemini";

pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Describes failures when accessing the system keyring.
///
/// Recoverable errors mean the credential backend was temporarily
/// unavailable (a locked keychain, a missing secret service); callers
/// degrade to the environment variable in that case. Permanent errors
/// surface the underlying cause.
#[derive(Debug)]
pub enum KeyringAccessError {
    Recoverable(keyring::Error),
    Permanent(keyring::Error),
}

impl KeyringAccessError {
    fn inner(&self) -> &keyring::Error {
        match self {
            KeyringAccessError::Recoverable(err) | KeyringAccessError::Permanent(err) => err,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, KeyringAccessError::Recoverable(_))
    }
}

impl From<keyring::Error> for KeyringAccessError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                KeyringAccessError::Recoverable(err)
            }
            other => KeyringAccessError::Permanent(other),
        }
    }
}

impl fmt::Display for KeyringAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner())
    }
}

impl Error for KeyringAccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner())
    }
}

/// Where the effective API key came from, for the startup banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Flag,
    Keyring,
    Environment,
    Missing,
}

impl KeySource {
    pub fn describe(self) -> &'static str {
        match self {
            KeySource::Flag => "command-line override",
            KeySource::Keyring => "system keyring",
            KeySource::Environment => "environment variable",
            KeySource::Missing => "not configured",
        }
    }
}

pub struct AuthManager {
    use_keyring: bool,
}

impl AuthManager {
    pub fn new() -> Self {
        Self { use_keyring: true }
    }

    /// Construct an AuthManager with keyring access disabled (useful for
    /// tests, which must never touch the real credential store).
    pub fn new_without_keyring() -> Self {
        Self { use_keyring: false }
    }

    fn entry(&self) -> Result<Entry, KeyringAccessError> {
        Entry::new(KEYRING_SERVICE, KEYRING_USER).map_err(KeyringAccessError::from)
    }

    pub fn store_token(&self, token: &str) -> Result<(), Box<dyn Error>> {
        if !self.use_keyring {
            return Ok(());
        }
        let entry = self.entry()?;
        entry
            .set_password(token)
            .map_err(KeyringAccessError::from)?;
        Ok(())
    }

    pub fn get_token(&self) -> Result<Option<String>, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(None);
        }
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(KeyringAccessError::from(err)),
        }
    }

    /// Remove the stored key. Returns false when nothing was stored.
    pub fn remove_token(&self) -> Result<bool, Box<dyn Error>> {
        if !self.use_keyring {
            return Ok(false);
        }
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(Box::new(KeyringAccessError::from(err))),
        }
    }

    /// Resolve the effective API key. An empty string means no key is
    /// available; the caller surfaces that at submission time.
    pub fn resolve_api_key(&self, cli_override: Option<String>) -> (String, KeySource) {
        if let Some(key) = cli_override {
            let trimmed = key.trim().to_string();
            if !trimmed.is_empty() {
                return (trimmed, KeySource::Flag);
            }
        }

        match self.get_token() {
            Ok(Some(token)) => return (token, KeySource::Keyring),
            Ok(None) => {}
            Err(err) => {
                // A locked or absent credential backend should not take
                // the whole app down; fall through to the environment.
                warn!(recoverable = err.is_recoverable(), "keyring unavailable: {err}");
            }
        }

        match std::env::var(API_KEY_ENV_VAR) {
            Ok(key) if !key.trim().is_empty() => (key.trim().to_string(), KeySource::Environment),
            _ => (String::new(), KeySource::Missing),
        }
    }

    pub fn interactive_auth(&self) -> Result<(), Box<dyn Error>> {
        println!("🔐 Uturu Authentication Setup");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!();
        let configured = matches!(self.get_token(), Ok(Some(_)));
        if configured {
            println!("A Gemini API key is already stored; entering a new one replaces it.");
        } else {
            println!("Store your Gemini API key in the system keyring.");
        }
        println!("Get a free key at https://aistudio.google.com/app/apikey");
        println!();

        let token = prompt_masked_token("Enter your Gemini API key: ")?;
        if token.is_empty() {
            return Err("API key cannot be empty".into());
        }
        self.store_token(&token)?;

        println!("✓ API key stored securely");
        println!("You can now run `uturu` without setting {API_KEY_ENV_VAR}.");
        Ok(())
    }

    pub fn interactive_deauth(&self) -> Result<(), Box<dyn Error>> {
        println!("🗑️  Uturu Authentication Removal");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!();
        if self.remove_token()? {
            println!("✓ Stored API key removed");
        } else {
            println!("No stored API key found.");
        }
        Ok(())
    }
}

impl Default for AuthManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a line from the terminal without echoing it, printing `*` per
/// typed character. Enter finishes, Ctrl+C cancels.
fn prompt_masked_token(prompt: &str) -> Result<String, Box<dyn Error>> {
    use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
    use ratatui::crossterm::terminal::{disable_raw_mode, enable_raw_mode};

    print!("{prompt}");
    io::stdout().flush()?;

    enable_raw_mode()?;
    let mut token = String::new();
    let outcome: Result<String, Box<dyn Error>> = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Enter => break Ok(token),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    break Err("Cancelled".into());
                }
                KeyCode::Backspace => {
                    if token.pop().is_some() {
                        print!("\u{8} \u{8}");
                        let _ = io::stdout().flush();
                    }
                }
                KeyCode::Char(c) => {
                    token.push(c);
                    print!("*");
                    let _ = io::stdout().flush();
                }
                _ => {}
            },
            Ok(_) => {}
            Err(e) => break Err(Box::new(e)),
        }
    };
    disable_raw_mode()?;
    println!();

    outcome.map(|token| token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_override_wins_over_everything() {
        let auth = AuthManager::new_without_keyring();
        let (key, source) = auth.resolve_api_key(Some("flag-key".to_string()));
        assert_eq!(key, "flag-key");
        assert_eq!(source, KeySource::Flag);
    }

    #[test]
    fn blank_flag_override_is_ignored() {
        let auth = AuthManager::new_without_keyring();
        let (_, source) = auth.resolve_api_key(Some("   ".to_string()));
        // Falls through to env/missing rather than treating blanks as a key.
        assert_ne!(source, KeySource::Flag);
    }

    #[test]
    fn disabled_keyring_reports_no_token() {
        let auth = AuthManager::new_without_keyring();
        assert!(auth.get_token().unwrap().is_none());
        assert!(!auth.remove_token().unwrap());
    }

    #[test]
    fn key_sources_describe_themselves() {
        assert_eq!(KeySource::Flag.describe(), "command-line override");
        assert_eq!(KeySource::Missing.describe(), "not configured");
    }
}
