//! Core ContentGateway trait

use async_trait::async_trait;

use crate::cache::CacheStats;
use crate::session::{SessionGateState, SessionStatus};
use crate::{GenerationRequest, NormalizedResult, Result};

/// The in-process boundary route handlers call into.
///
/// Implementations must always produce usable content: provider outages
/// degrade to template results instead of errors. The only errors returned
/// are caller bugs (malformed requests) and closed sessions.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Generate content for one request, counting it against its session.
    async fn generate(&self, request: &GenerationRequest) -> Result<NormalizedResult>;

    /// Result cache counters.
    fn cache_stats(&self) -> CacheStats;

    /// Gate state of a session, if it has been seen.
    fn session_status(&self, session_id: &str) -> Option<SessionGateState>;

    /// Whether the session may still generate. Unknown sessions are created.
    fn can_generate(&self, session_id: &str) -> bool;

    /// Signal that the caller finished the session.
    fn mark_completed(&self, session_id: &str) -> SessionStatus;

    /// Drop the in-memory gate state of a session.
    fn evict_session(&self, session_id: &str) -> Option<SessionGateState>;
}
