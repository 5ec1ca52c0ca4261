/// Session credential storage.
///
/// The dashboard controller owns exactly one [`SessionStore`] and asks it
/// for the current credential before every authenticated request. There is
/// no client-side expiry: whether a stored credential is still good is
/// decided by the server's validate endpoint.
///
/// [`FileSessionStore`] persists to a small JSON file so that a later
/// invocation picks the session up without logging in again:
///
/// ```json
/// { "sessionId": "9f2c…", "username": "admin" }
/// ```
///
/// All file I/O is best-effort: write failures are logged and the
/// in-memory state stays authoritative for the rest of the process.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Well-known key under which the credential is persisted.
pub const STORAGE_KEY: &str = "sessionId";

/// An authenticated panel session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque token sent as `X-Session-ID`.
    pub credential: String,
    /// Panel admin name, empty until the server has confirmed it.
    pub username: String,
}

impl Session {
    pub fn new(credential: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            username: username.into(),
        }
    }
}

/// Holder of the current session. At most one session at a time.
pub trait SessionStore {
    fn get(&self) -> Option<Session>;
    fn set(&mut self, session: Session);
    fn clear(&mut self);
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Session store that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    current: Option<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            current: Some(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<Session> {
        self.current.clone()
    }

    fn set(&mut self, session: Session) {
        self.current = Some(session);
    }

    fn clear(&mut self) {
        self.current = None;
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Session store persisted to a JSON file.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    current: Option<Session>,
}

impl FileSessionStore {
    /// Open the store at `path`, restoring a previously saved session.
    ///
    /// A missing, unreadable, or malformed file means "no session".
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = load_state(&path).and_then(SessionFile::into_session);
        Self { path, current }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        let result = match &self.current {
            Some(session) => save_state(&self.path, &SessionFile::from_session(session)),
            None => remove_state(&self.path),
        };
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "could not persist session state");
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<Session> {
        self.current.clone()
    }

    fn set(&mut self, session: Session) {
        self.current = Some(session);
        self.persist();
    }

    fn clear(&mut self) {
        self.current = None;
        self.persist();
    }
}

// ---------------------------------------------------------------------------
// Serializable state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,
    #[serde(default)]
    username: String,
}

impl SessionFile {
    fn from_session(session: &Session) -> Self {
        Self {
            session_id: Some(session.credential.clone()),
            username: session.username.clone(),
        }
    }

    fn into_session(self) -> Option<Session> {
        let credential = self.session_id.filter(|id| !id.is_empty())?;
        Some(Session {
            credential,
            username: self.username,
        })
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn load_state(path: &Path) -> Option<SessionFile> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn save_state(path: &Path, state: &SessionFile) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state).map_err(std::io::Error::other)?;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    // The file holds a live credential: owner read/write only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies at creation; tighten files left by older builds.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(json.as_bytes())
}

fn remove_state(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
