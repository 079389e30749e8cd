use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const API_KEY: &str = "AZURE_OPENAI_KEY";
pub const DEPLOYMENT: &str = "DEPLOYMENT";
pub const ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";

/// Read-only key-value lookup for service credentials
pub trait CredentialProvider {
    fn get(&self, key: &str) -> Option<String>;
}

impl CredentialProvider for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

/// Values needed to reach the completion service
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub api_key: String,
    pub deployment: String,
    pub endpoint: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Credentials {
    pub fn from_provider(provider: &dyn CredentialProvider) -> Result<Self> {
        let lookup = |key: &str| {
            provider
                .get(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("Credential {} not found", key))
        };

        Ok(Self {
            api_key: lookup(API_KEY)?,
            deployment: lookup(DEPLOYMENT)?,
            endpoint: lookup(ENDPOINT)?,
        })
    }
}

/// `.env` style file holding `KEY=value` lines
#[derive(Debug, Clone)]
pub struct DotEnvStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl DotEnvStore {
    /// Load the store; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        let mut values = BTreeMap::new();

        if path.exists() {
            let entries = dotenv::from_path_iter(path)
                .with_context(|| format!("Failed to open credentials file: {}", path.display()))?;
            for entry in entries {
                let (key, value) = entry
                    .with_context(|| format!("Failed to parse credentials file: {}", path.display()))?;
                values.insert(key, value);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Overwrite the three credential keys, keeping every other line as written
    pub fn store(&mut self, api_key: &str, deployment: &str, endpoint: &str) -> Result<()> {
        let updates = [(API_KEY, api_key), (DEPLOYMENT, deployment), (ENDPOINT, endpoint)];
        for (key, value) in &updates {
            if value.contains(['\n', '\r']) {
                bail!("Credential {} must be a single line", key);
            }
        }

        let existing = if self.path.exists() {
            std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read credentials file: {}", self.path.display()))?
        } else {
            String::new()
        };

        let mut content: String = existing
            .lines()
            .filter(|line| !entry_key(line).is_some_and(|key| updates.iter().any(|(k, _)| *k == key)))
            .map(|line| format!("{}\n", line))
            .collect();
        for (key, value) in &updates {
            content.push_str(&format!("{}={}\n", key, single_quote(value)));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write credentials to: {}", self.path.display()))?;

        for (key, value) in updates {
            self.values.insert(key.to_string(), value.to_string());
        }

        tracing::info!(path = %self.path.display(), "credentials updated");
        Ok(())
    }
}

impl CredentialProvider for DotEnvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Key of a `KEY=value` or `export KEY=value` line; None for comments and blanks
fn entry_key(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = match line.strip_prefix("export") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => line,
    };
    let end = line
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(line.len());
    Some(&line[..end]).filter(|key| !key.is_empty())
}

/// Single quotes are read literally by the dotenv parser; an embedded quote
/// closes the run, is escaped, and a new run opens
fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_credentials_from_provider() {
        let mut values = BTreeMap::new();
        values.insert(API_KEY.to_string(), "secret".to_string());
        values.insert(DEPLOYMENT.to_string(), "gpt-4".to_string());
        values.insert(ENDPOINT.to_string(), "https://example.openai.azure.com".to_string());

        let credentials = Credentials::from_provider(&values).unwrap();
        assert_eq!(credentials.api_key, "secret");
        assert_eq!(credentials.deployment, "gpt-4");
        assert_eq!(credentials.endpoint, "https://example.openai.azure.com");
    }

    #[test]
    fn test_credentials_missing_key_is_named() {
        let mut values = BTreeMap::new();
        values.insert(API_KEY.to_string(), "secret".to_string());
        values.insert(DEPLOYMENT.to_string(), "  ".to_string());

        let err = Credentials::from_provider(&values).unwrap_err();
        assert!(err.to_string().contains("DEPLOYMENT not found"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let credentials = Credentials {
            api_key: "secret".to_string(),
            deployment: "gpt-4".to_string(),
            endpoint: "https://example".to_string(),
        };
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("gpt-4"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = DotEnvStore::load(&dir.path().join(".env")).unwrap();
        assert_eq!(store.get(API_KEY), None);
    }

    #[test]
    fn test_load_reads_existing_entries() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "AZURE_OPENAI_KEY=abc123").unwrap();
        writeln!(file, "DEPLOYMENT=\"slate-gpt\"").unwrap();

        let store = DotEnvStore::load(file.path()).unwrap();
        assert_eq!(store.get(API_KEY).as_deref(), Some("abc123"));
        assert_eq!(store.get(DEPLOYMENT).as_deref(), Some("slate-gpt"));
    }

    #[test]
    fn test_store_keeps_unrelated_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OTHER_SETTING=keep-me\nDEPLOYMENT=old\n").unwrap();

        let mut store = DotEnvStore::load(&path).unwrap();
        store
            .store("new-key", "new-deployment", "https://example.openai.azure.com")
            .unwrap();

        let reloaded = DotEnvStore::load(&path).unwrap();
        assert_eq!(reloaded.get("OTHER_SETTING").as_deref(), Some("keep-me"));
        assert_eq!(reloaded.get(DEPLOYMENT).as_deref(), Some("new-deployment"));
        assert_eq!(reloaded.get(API_KEY).as_deref(), Some("new-key"));
        assert_eq!(
            reloaded.get(ENDPOINT).as_deref(),
            Some("https://example.openai.azure.com")
        );
    }

    #[test]
    fn test_store_round_trips_shell_metacharacters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        let api_key = r#"ab$cd\x"y'z"#;
        let endpoint = "https://example.openai.azure.com/?sig=$SIG&q='a b'";

        let mut store = DotEnvStore::load(&path).unwrap();
        store.store(api_key, "dep $HOME", endpoint).unwrap();

        let reloaded = DotEnvStore::load(&path).unwrap();
        assert_eq!(reloaded.get(API_KEY).as_deref(), Some(api_key));
        assert_eq!(reloaded.get(DEPLOYMENT).as_deref(), Some("dep $HOME"));
        assert_eq!(reloaded.get(ENDPOINT).as_deref(), Some(endpoint));
    }

    #[test]
    fn test_store_writes_unrelated_lines_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        let original = "# service settings\nPROXY_URL=\"http://$PROXY_HOST:8080\"\nexport AZURE_OPENAI_KEY=old\n";
        std::fs::write(&path, original).unwrap();

        let mut store = DotEnvStore::load(&path).unwrap();
        store.store("new-key", "dep", "https://e").unwrap();
        store.store("newer-key", "dep", "https://e").unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# service settings\nPROXY_URL=\"http://$PROXY_HOST:8080\"\n"));
        assert_eq!(written.matches("AZURE_OPENAI_KEY=").count(), 1);
        assert!(written.contains("AZURE_OPENAI_KEY='newer-key'\n"));
        assert_eq!(store.get(API_KEY).as_deref(), Some("newer-key"));
    }

    #[test]
    fn test_store_rejects_multiline_value_without_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OTHER_SETTING=keep-me\n").unwrap();

        let mut store = DotEnvStore::load(&path).unwrap();
        let err = store.store("line one\nline two", "dep", "https://e").unwrap_err();

        assert!(err.to_string().contains("AZURE_OPENAI_KEY must be a single line"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "OTHER_SETTING=keep-me\n");
        assert_eq!(store.get(API_KEY), None);
    }

    #[test]
    fn test_entry_key() {
        assert_eq!(entry_key("AZURE_OPENAI_KEY='x'"), Some("AZURE_OPENAI_KEY"));
        assert_eq!(entry_key("  export DEPLOYMENT=gpt"), Some("DEPLOYMENT"));
        assert_eq!(entry_key("exported=1"), Some("exported"));
        assert_eq!(entry_key("# AZURE_OPENAI_KEY=x"), None);
        assert_eq!(entry_key("   "), None);
    }

    #[test]
    fn test_store_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(".env");

        let mut store = DotEnvStore::load(&path).unwrap();
        store.store("k", "d", "https://e").unwrap();

        assert!(path.exists());
        let credentials = Credentials::from_provider(&DotEnvStore::load(&path).unwrap()).unwrap();
        assert_eq!(credentials.api_key, "k");
    }
}
