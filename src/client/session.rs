//! Access gate and display-name session, persisted in device-local storage.
//!
//! States run `Unauthenticated -> NameUnset -> Ready(name)`. The display name
//! expires after [`NAME_TTL_MS`] without activity, which drops a session back
//! to `NameUnset` while keeping the access flag.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::api::{ClientError, DictionaryClient};

pub const ACCESS_KEY: &str = "hasAccess";
pub const NAME_KEY: &str = "currentUserName";
pub const NAME_SET_AT_KEY: &str = "currentUserNameSetAt";
pub const THEME_KEY: &str = "theme";

/// Two hours, in milliseconds.
pub const NAME_TTL_MS: i64 = 2 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please tell us who you are.")]
    MissingName,
    #[error("Please enter the access code.")]
    MissingCode,
    #[error("Access has not been granted yet")]
    NoAccess,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Device storage
// ============================================================================

/// String key/value storage local to the device.
///
/// Writes are best-effort, like browser `localStorage`: a backend that fails
/// to persist logs the failure and keeps serving the new value from memory.
pub trait DeviceStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str);
    fn remove_item(&mut self, key: &str);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl DeviceStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove_item(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Storage kept as a flat JSON object on disk and rewritten on every change.
/// A failed rewrite is logged; the value stays readable for this process.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    fn persist(&self) {
        let result = serde_json::to_vec_pretty(&self.values)
            .map_err(SessionError::from)
            .and_then(|raw| std::fs::write(&self.path, raw).map_err(SessionError::from));
        if let Err(e) = result {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to persist session storage");
        }
    }
}

impl DeviceStorage for JsonFileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.persist();
    }

    fn remove_item(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.persist();
        }
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Anything but `"dark"` is light.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    NameUnset,
    Ready(String),
}

pub struct Session<S: DeviceStorage> {
    storage: S,
    state: SessionState,
    theme: Theme,
}

impl<S: DeviceStorage> Session<S> {
    /// Rebuild the session from storage, dropping a stale display name.
    pub fn restore(mut storage: S, now: DateTime<Utc>) -> Self {
        let theme = Theme::parse(storage.get_item(THEME_KEY).as_deref());
        storage.set_item(THEME_KEY, theme.as_str());

        let has_access = storage.get_item(ACCESS_KEY).as_deref() == Some("true");
        let name = storage.get_item(NAME_KEY).filter(|n| !n.is_empty());

        let mut session = Self {
            storage,
            state: SessionState::Unauthenticated,
            theme,
        };

        let name = match name {
            Some(name) if session.name_expired(now) => {
                session.clear_name();
                tracing::debug!(name = %name, "Display name expired");
                None
            }
            other => other,
        };

        session.state = match (has_access, name) {
            (false, _) => SessionState::Unauthenticated,
            (true, None) => SessionState::NameUnset,
            (true, Some(name)) => SessionState::Ready(name),
        };
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn display_name(&self) -> Option<&str> {
        match &self.state {
            SessionState::Ready(name) => Some(name),
            _ => None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Validate the form, check the code with the server, and on success
    /// store the access flag together with the name.
    pub async fn log_in(
        &mut self,
        client: &DictionaryClient,
        name: &str,
        access_code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let name = name.trim();
        let access_code = access_code.trim();
        if name.is_empty() {
            return Err(SessionError::MissingName);
        }
        if access_code.is_empty() {
            return Err(SessionError::MissingCode);
        }

        client.check_access(access_code).await?;
        self.grant_access(name, now);
        Ok(())
    }

    /// Record a successful access check for `name`.
    pub fn grant_access(&mut self, name: &str, now: DateTime<Utc>) {
        self.storage.set_item(ACCESS_KEY, "true");
        self.store_name(name, now);
    }

    /// Pick a display name after the previous one expired.
    pub fn choose_name(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.state == SessionState::Unauthenticated {
            return Err(SessionError::NoAccess);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::MissingName);
        }
        self.store_name(name, now);
        Ok(())
    }

    /// Record activity. A name already past its window expires instead of
    /// being refreshed.
    pub fn touch(&mut self, now: DateTime<Utc>) -> &SessionState {
        if let SessionState::Ready(_) = self.state {
            if self.name_expired(now) {
                self.clear_name();
                self.state = SessionState::NameUnset;
            } else {
                self.storage
                    .set_item(NAME_SET_AT_KEY, &now.timestamp_millis().to_string());
            }
        }
        &self.state
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.storage.set_item(THEME_KEY, self.theme.as_str());
        self.theme
    }

    fn store_name(&mut self, name: &str, now: DateTime<Utc>) {
        let name = name.trim().to_string();
        self.storage.set_item(NAME_KEY, &name);
        self.storage
            .set_item(NAME_SET_AT_KEY, &now.timestamp_millis().to_string());
        self.state = SessionState::Ready(name);
    }

    fn clear_name(&mut self) {
        self.storage.remove_item(NAME_KEY);
        self.storage.remove_item(NAME_SET_AT_KEY);
    }

    /// A name without a readable timestamp never expires.
    fn name_expired(&self, now: DateTime<Utc>) -> bool {
        self.storage
            .get_item(NAME_SET_AT_KEY)
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .is_some_and(|set_at| now.timestamp_millis() - set_at > NAME_TTL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn storage_with(pairs: &[(&str, &str)]) -> MemoryStorage {
        let mut storage = MemoryStorage::default();
        for (k, v) in pairs {
            storage.set_item(k, v);
        }
        storage
    }

    #[test]
    fn test_fresh_device_is_unauthenticated() {
        let session = Session::restore(MemoryStorage::default(), Utc::now());
        assert_eq!(session.state(), &SessionState::Unauthenticated);
        assert_eq!(session.theme(), Theme::Light);
        assert_eq!(session.storage().get_item(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_restore_ready_within_window() {
        let now = Utc::now();
        let set_at = (now - Duration::minutes(30)).timestamp_millis().to_string();
        let storage = storage_with(&[
            (ACCESS_KEY, "true"),
            (NAME_KEY, "Ana"),
            (NAME_SET_AT_KEY, &set_at),
            (THEME_KEY, "dark"),
        ]);

        let session = Session::restore(storage, now);
        assert_eq!(session.state(), &SessionState::Ready("Ana".to_string()));
        assert_eq!(session.display_name(), Some("Ana"));
        assert_eq!(session.theme(), Theme::Dark);
    }

    #[test]
    fn test_restore_expires_stale_name() {
        let now = Utc::now();
        let set_at = (now - Duration::hours(3)).timestamp_millis().to_string();
        let storage = storage_with(&[
            (ACCESS_KEY, "true"),
            (NAME_KEY, "Ana"),
            (NAME_SET_AT_KEY, &set_at),
        ]);

        let session = Session::restore(storage, now);
        assert_eq!(session.state(), &SessionState::NameUnset);
        assert_eq!(session.storage().get_item(NAME_KEY), None);
        assert_eq!(session.storage().get_item(NAME_SET_AT_KEY), None);
        assert_eq!(session.storage().get_item(ACCESS_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn test_touch_slides_the_window() {
        let start = Utc::now();
        let mut session = Session::restore(MemoryStorage::default(), start);
        session.grant_access("Ana", start);

        // Activity every 90 minutes keeps the name alive past two hours.
        let t1 = start + Duration::minutes(90);
        assert_eq!(session.touch(t1), &SessionState::Ready("Ana".to_string()));
        let t2 = t1 + Duration::minutes(90);
        assert_eq!(session.touch(t2), &SessionState::Ready("Ana".to_string()));

        // Then a long idle period expires it.
        let t3 = t2 + Duration::hours(2) + Duration::seconds(1);
        assert_eq!(session.touch(t3), &SessionState::NameUnset);

        session.choose_name("Ion", t3).unwrap();
        assert_eq!(session.display_name(), Some("Ion"));
    }

    #[test]
    fn test_choose_name_requires_access_and_name() {
        let now = Utc::now();
        let mut session = Session::restore(MemoryStorage::default(), now);
        assert!(matches!(
            session.choose_name("Ana", now),
            Err(SessionError::NoAccess)
        ));

        session.grant_access("Ana", now);
        assert!(matches!(
            session.choose_name("   ", now),
            Err(SessionError::MissingName)
        ));
    }

    #[tokio::test]
    async fn test_log_in_validates_before_contacting_server() {
        // Nothing listens on this port; validation must fail first.
        let client = DictionaryClient::new("http://127.0.0.1:9");
        let mut session = Session::restore(MemoryStorage::default(), Utc::now());

        let err = session.log_in(&client, "  ", "code", Utc::now()).await;
        assert!(matches!(err, Err(SessionError::MissingName)));

        let err = session.log_in(&client, "Ana", "", Utc::now()).await;
        assert!(matches!(err, Err(SessionError::MissingCode)));
        assert_eq!(session.state(), &SessionState::Unauthenticated);
    }

    #[test]
    fn test_theme_toggle_persists() {
        let mut session = Session::restore(MemoryStorage::default(), Utc::now());
        assert_eq!(session.toggle_theme(), Theme::Dark);
        assert_eq!(session.storage().get_item(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(session.toggle_theme(), Theme::Light);
    }

    #[test]
    fn test_json_file_storage_round_trips() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        let mut storage = JsonFileStorage::open(&path).unwrap();
        storage.set_item(ACCESS_KEY, "true");
        storage.set_item(NAME_KEY, "Ana");
        storage.remove_item(NAME_KEY);

        let reopened = JsonFileStorage::open(&path).unwrap();
        assert_eq!(reopened.get_item(ACCESS_KEY).as_deref(), Some("true"));
        assert_eq!(reopened.get_item(NAME_KEY), None);
    }

    #[test]
    fn test_json_file_storage_keeps_value_when_write_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing").join("session.json");

        let mut storage = JsonFileStorage::open(&path).unwrap();
        storage.set_item(ACCESS_KEY, "true");
        assert_eq!(storage.get_item(ACCESS_KEY).as_deref(), Some("true"));
        assert!(!path.exists());
    }
}
