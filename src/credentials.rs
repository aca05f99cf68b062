use crate::Result;
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the OAuth client credentials, relative to the working directory.
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

/// OAuth client credentials as they appear in a Google Cloud Console section.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Registered redirect URIs. Only the first one is used.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    pub auth_uri: Option<String>,
    pub token_uri: Option<String>,
}

/// Contents of the credentials file.
///
/// Two layouts are accepted: the file downloaded from the Google Cloud Console, with the client
/// nested under `installed` or `web`, and a flat layout carrying `client_id`, `client_secret` and
/// `redirect_url` at the root. Every field is optional here; validation happens when the
/// credentials are turned into an [`AuthorizationConfig`](crate::auth::AuthorizationConfig).
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialsFile {
    /// Credentials for installed (desktop) applications.
    pub installed: Option<ClientSection>,
    /// Credentials for web applications.
    pub web: Option<ClientSection>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
    pub auth_uri: Option<String>,
    pub token_uri: Option<String>,
}

/// Something that can provide the OAuth client credentials.
pub trait CredentialSource {
    /// Loads the credentials.
    fn load(&self) -> Result<CredentialsFile>;
}

/// A `CredentialSource` backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialSource {
    path: PathBuf,
}

impl FileCredentialSource {
    /// Creates a new `FileCredentialSource` reading from `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> FileCredentialSource {
        FileCredentialSource {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the credentials file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileCredentialSource {
    fn default() -> Self {
        FileCredentialSource::new(DEFAULT_CREDENTIALS_PATH)
    }
}

impl CredentialSource for FileCredentialSource {
    fn load(&self) -> Result<CredentialsFile> {
        log::info!("loading credentials from {}", self.path.display());

        let credentials = Config::builder()
            .add_source(File::from(self.path.as_path()).format(FileFormat::Json))
            .build()?
            .try_deserialize()?;

        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::io::Write;

    fn write_credentials(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_flat_layout() {
        let file = write_credentials(
            r#"{
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "secret",
                "redirect_url": "urn:ietf:wg:oauth:2.0:oob"
            }"#,
        );

        let credentials = FileCredentialSource::new(file.path()).load().unwrap();

        assert_eq!(
            credentials,
            CredentialsFile {
                client_id: Some("id.apps.googleusercontent.com".into()),
                client_secret: Some("secret".into()),
                redirect_url: Some("urn:ietf:wg:oauth:2.0:oob".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn load_console_layout() {
        let file = write_credentials(
            r#"{
                "installed": {
                    "client_id": "id.apps.googleusercontent.com",
                    "project_id": "agenda",
                    "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                    "token_uri": "https://oauth2.googleapis.com/token",
                    "client_secret": "secret",
                    "redirect_uris": ["http://localhost"]
                }
            }"#,
        );

        let credentials = FileCredentialSource::new(file.path()).load().unwrap();
        let installed = credentials.installed.unwrap();

        assert_eq!(installed.client_id.as_deref(), Some("id.apps.googleusercontent.com"));
        assert_eq!(installed.client_secret.as_deref(), Some("secret"));
        assert_eq!(installed.redirect_uris, vec!["http://localhost".to_owned()]);
        assert_eq!(
            installed.token_uri.as_deref(),
            Some("https://oauth2.googleapis.com/token")
        );
        assert!(credentials.web.is_none());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileCredentialSource::new(dir.path().join("credentials.json"));

        assert!(matches!(source.load(), Err(Error::Configuration(_))));
    }

    #[test]
    fn malformed_file() {
        let file = write_credentials("{ this is not json");

        assert!(matches!(
            FileCredentialSource::new(file.path()).load(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn default_path() {
        assert_eq!(
            FileCredentialSource::default().path(),
            Path::new(DEFAULT_CREDENTIALS_PATH)
        );
    }
}
