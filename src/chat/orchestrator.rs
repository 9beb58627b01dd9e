//! Per-query orchestration of the chat core.

use super::{append_and_trim, compose, sanitize, Exchange};
use crate::error::{CineRagError, Result};
use crate::retrieval::CompletionBackend;
use crate::session::{Session, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Ties session lookup, prompt composition, completion, sanitization, and
/// history persistence together for one incoming query.
///
/// Collaborators are injected at construction time; the orchestrator holds
/// no other state. A session lookup miss is a hard [`CineRagError::NotFound`]
/// rather than silent session creation; sessions are only created through
/// [`QueryOrchestrator::start_session`].
pub struct QueryOrchestrator {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn CompletionBackend>,
    history_window: usize,
    completion_timeout: Duration,
}

impl QueryOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn CompletionBackend>,
        history_window: usize,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            store,
            backend,
            history_window,
            completion_timeout: Duration::from_secs(timeout_seconds),
        }
    }

    /// Start a fresh session for a user and return its identifier.
    #[instrument(skip(self))]
    pub async fn start_session(&self, user_id: &str, owner: Option<String>) -> Result<String> {
        if user_id.trim().is_empty() {
            return Err(CineRagError::Validation("user_id must not be empty".to_string()));
        }

        let session = Session::new(user_id, owner);
        self.store.insert(&session).await?;

        info!("Started session {} for user {}", session.id, user_id);
        Ok(session.id)
    }

    /// Answer one query within an existing session.
    ///
    /// History is written back exactly once, after the answer is sanitized.
    /// Adapter failures abort the call with no history mutation; a failed
    /// write after a produced answer is logged and the answer still returned.
    #[instrument(skip(self, query), fields(query = %query))]
    pub async fn handle_query(
        &self,
        user_id: &str,
        session_id: &str,
        query: &str,
        principal: Option<&str>,
    ) -> Result<String> {
        if query.trim().is_empty() {
            return Err(CineRagError::Validation("query must not be empty".to_string()));
        }

        let session = self
            .store
            .find(user_id, session_id)
            .await?
            .ok_or_else(|| CineRagError::NotFound("session not found".to_string()))?;

        // A session claimed by a principal is invisible to everyone else.
        if let Some(owner) = &session.owner {
            if principal != Some(owner.as_str()) {
                return Err(CineRagError::NotFound("session not found".to_string()));
            }
        }

        let prompt = compose(&session.history, query);
        debug!("Composed prompt with {} prior exchanges", session.history.len());

        let raw = tokio::time::timeout(self.completion_timeout, self.backend.complete(&prompt))
            .await
            .map_err(|_| CineRagError::UpstreamTimeout(self.completion_timeout.as_secs()))??;

        let answer = sanitize(raw);

        let updated = append_and_trim(
            session.history,
            Exchange::new(query, answer.clone()),
            self.history_window,
        );

        // The answer is already produced; prefer delivering it over
        // guaranteeing history consistency.
        if let Err(e) = self.store.replace_history(&session.id, &updated).await {
            warn!("Failed to persist history for session {}: {}", session.id, e);
        }

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::Completion;
    use crate::session::MemorySessionStore;
    use async_trait::async_trait;

    struct FixedBackend(Completion);

    #[async_trait]
    impl CompletionBackend for FixedBackend {
        async fn complete(&self, _prompt: &str) -> Result<Completion> {
            Ok(self.0.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        async fn complete(&self, _prompt: &str) -> Result<Completion> {
            Err(CineRagError::Upstream("completion unavailable".to_string()))
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl CompletionBackend for SlowBackend {
        async fn complete(&self, _prompt: &str) -> Result<Completion> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Completion::Text("too late".into()))
        }
    }

    /// Records the prompt it was handed.
    struct RecordingBackend {
        prompts: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionBackend for RecordingBackend {
        async fn complete(&self, prompt: &str) -> Result<Completion> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(Completion::Text("ok".into()))
        }
    }

    fn orchestrator(backend: Arc<dyn CompletionBackend>) -> (QueryOrchestrator, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (QueryOrchestrator::new(store.clone(), backend, 5, 30), store)
    }

    #[tokio::test]
    async fn test_end_to_end_query() {
        let backend = Arc::new(FixedBackend(Completion::Enveloped {
            result: "<think>search done</think>Leonardo DiCaprio, ...".into(),
        }));
        let (orch, store) = orchestrator(backend);

        let session_id = orch.start_session("7", None).await.unwrap();
        let answer = orch
            .handle_query("7", &session_id, "Inception, who are actors in it?", None)
            .await
            .unwrap();

        assert_eq!(answer, "Leonardo DiCaprio, ...");

        let session = store.find("7", &session_id).await.unwrap().unwrap();
        assert_eq!(session.history.len(), 1);
        assert_eq!(session.history[0].query, "Inception, who are actors in it?");
        assert_eq!(session.history[0].answer, "Leonardo DiCaprio, ...");
    }

    #[tokio::test]
    async fn test_empty_query_rejected_without_mutation() {
        let backend = Arc::new(FixedBackend(Completion::Text("unused".into())));
        let (orch, store) = orchestrator(backend);

        let session_id = orch.start_session("7", None).await.unwrap();
        let err = orch.handle_query("7", &session_id, "   ", None).await.unwrap_err();
        assert!(matches!(err, CineRagError::Validation(_)));

        let session = store.find("7", &session_id).await.unwrap().unwrap();
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let backend = Arc::new(FixedBackend(Completion::Text("unused".into())));
        let (orch, _store) = orchestrator(backend);

        let err = orch.handle_query("7", "missing", "hello", None).await.unwrap_err();
        assert!(matches!(err, CineRagError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_session_isolation_by_user() {
        let backend = Arc::new(FixedBackend(Completion::Text("leak?".into())));
        let (orch, store) = orchestrator(backend);

        let session_id = orch.start_session("7", None).await.unwrap();

        // Valid session id, wrong user.
        let err = orch.handle_query("8", &session_id, "hello", None).await.unwrap_err();
        assert!(matches!(err, CineRagError::NotFound(_)));

        let session = store.find("7", &session_id).await.unwrap().unwrap();
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_session_isolation_by_owner() {
        let backend = Arc::new(FixedBackend(Completion::Text("leak?".into())));
        let (orch, store) = orchestrator(backend);

        let session_id = orch
            .start_session("7", Some("alice".to_string()))
            .await
            .unwrap();

        let err = orch
            .handle_query("7", &session_id, "hello", Some("mallory"))
            .await
            .unwrap_err();
        assert!(matches!(err, CineRagError::NotFound(_)));

        let err = orch.handle_query("7", &session_id, "hello", None).await.unwrap_err();
        assert!(matches!(err, CineRagError::NotFound(_)));

        let answer = orch
            .handle_query("7", &session_id, "hello", Some("alice"))
            .await
            .unwrap();
        assert_eq!(answer, "leak?");

        let session = store.find("7", &session_id).await.unwrap().unwrap();
        assert_eq!(session.history.len(), 1);
    }

    #[tokio::test]
    async fn test_no_mutation_on_upstream_failure() {
        let ok_backend = Arc::new(FixedBackend(Completion::Text("first".into())));
        let store = Arc::new(MemorySessionStore::new());
        let orch = QueryOrchestrator::new(store.clone(), ok_backend, 5, 30);

        let session_id = orch.start_session("7", None).await.unwrap();
        orch.handle_query("7", &session_id, "q1", None).await.unwrap();
        let before = store.find("7", &session_id).await.unwrap().unwrap().history;

        let failing = QueryOrchestrator::new(store.clone(), Arc::new(FailingBackend), 5, 30);
        let err = failing.handle_query("7", &session_id, "q2", None).await.unwrap_err();
        assert!(matches!(err, CineRagError::Upstream(_)));

        let after = store.find("7", &session_id).await.unwrap().unwrap().history;
        assert_eq!(before, after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let (orch, store) = {
            let store = Arc::new(MemorySessionStore::new());
            (
                QueryOrchestrator::new(store.clone(), Arc::new(SlowBackend), 5, 1),
                store,
            )
        };

        let session_id = orch.start_session("7", None).await.unwrap();
        let err = orch.handle_query("7", &session_id, "hello", None).await.unwrap_err();
        assert!(matches!(err, CineRagError::UpstreamTimeout(1)));

        let session = store.find("7", &session_id).await.unwrap().unwrap();
        assert!(session.history.is_empty());
    }

    #[tokio::test]
    async fn test_history_window_enforced_across_queries() {
        let backend = Arc::new(FixedBackend(Completion::Text("a".into())));
        let (orch, store) = orchestrator(backend);

        let session_id = orch.start_session("7", None).await.unwrap();
        for n in 1..=7 {
            orch.handle_query("7", &session_id, &format!("q{}", n), None)
                .await
                .unwrap();
        }

        let session = store.find("7", &session_id).await.unwrap().unwrap();
        let queries: Vec<&str> = session.history.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, ["q3", "q4", "q5", "q6", "q7"]);
    }

    #[tokio::test]
    async fn test_prompt_carries_history() {
        let backend = Arc::new(RecordingBackend {
            prompts: std::sync::Mutex::new(Vec::new()),
        });
        let store = Arc::new(MemorySessionStore::new());
        let orch = QueryOrchestrator::new(store, backend.clone(), 5, 30);

        let session_id = orch.start_session("7", None).await.unwrap();
        orch.handle_query("7", &session_id, "first", None).await.unwrap();
        orch.handle_query("7", &session_id, "second", None).await.unwrap();

        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts[0], "User: first");
        assert_eq!(prompts[1], "User: first\nBot: ok\nUser: second");
    }

    #[tokio::test]
    async fn test_start_session_requires_user_id() {
        let backend = Arc::new(FixedBackend(Completion::Text("unused".into())));
        let (orch, _store) = orchestrator(backend);

        let err = orch.start_session("  ", None).await.unwrap_err();
        assert!(matches!(err, CineRagError::Validation(_)));
    }
}
