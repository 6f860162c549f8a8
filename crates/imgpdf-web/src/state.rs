use imgpdf_core::{AppConfig, DocumentAssembler, ImageSequence};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session data for one image-to-PDF session
pub struct Session {
    /// Images in the order the user arranged them
    pub images: ImageSequence,
    /// Assembler owning this session's single generation slot
    pub assembler: Arc<DocumentAssembler>,
    pub created_at: Instant,
}

/// Global application state
pub struct AppState {
    /// Active sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Configuration shared by all sessions
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a new session holding `images`.
    ///
    /// Returns the session ID as a string (for URL embedding).
    pub async fn create_session(&self, images: ImageSequence) -> String {
        let id = Uuid::new_v4();

        let session = Session {
            images,
            assembler: Arc::new(DocumentAssembler::from_config(&self.config)),
            created_at: Instant::now(),
        };

        self.sessions.write().await.insert(id, session);
        id.to_string()
    }

    /// Get a session by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        if sessions.contains_key(&uuid) {
            Some(SessionRef {
                id: uuid,
                state: self,
            })
        } else {
            None
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions older than the configured TTL.
    ///
    /// Sessions with a generation in flight are kept until it finishes.
    pub async fn cleanup_old_sessions(&self) -> usize {
        let max_age = Duration::from_secs(self.config.session_ttl_secs);
        self.cleanup_sessions_older_than(max_age).await
    }

    async fn cleanup_sessions_older_than(&self, max_age: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();

        sessions.retain(|_, session| {
            now.duration_since(session.created_at) < max_age || session.assembler.is_generating()
        });

        before - sessions.len()
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// Locks are only taken inside synchronous closures, so no guard is ever
/// held across an `.await` point.
///
/// ```ignore
/// let snapshot = session.with_session(|s| s.images.snapshot()).await?;
/// assembler.generate_async(snapshot, None).await;
/// ```
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    /// Access session data immutably within a closure.
    ///
    /// The closure runs synchronously while holding a read lock.
    /// The lock is released before this method returns.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }

    /// Access session data mutably within a closure.
    ///
    /// The closure runs synchronously while holding a write lock.
    /// The lock is released before this method returns.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.state.sessions.write().await;
        sessions.get_mut(&self.id).map(f)
    }
}
