//! Session title lifecycle.
//!
//! A session starts with the [`UNTITLED_TITLE`] sentinel. After a turn, the
//! manager reads the current title; only while it is still untitled does it
//! ask the label model for a short title built from the latest exchange.
//! Degenerate output and failures leave the session untitled so a later
//! turn can retry. The transition happens at most once per session.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::error::ServiceError;
use crate::llm::provider::LabelGenerator;
use crate::observability::{FIELD_SESSION_ID, SPAN_TITLE};
use crate::store::ConversationStore;

/// Sentinel title of a session eligible for title synthesis.
pub const UNTITLED_TITLE: &str = "untitled";

/// Default title written by older stores; also treated as untitled.
pub const LEGACY_UNTITLED_TITLE: &str = "Untitled Session";

/// Generic labels that are never persisted.
pub const FALLBACK_TITLES: &[&str] = &["Conversation", "Mindful Moment"];

/// Whether `title` marks a session as still untitled.
pub fn is_untitled(title: &str) -> bool {
    let title = title.trim();
    title.is_empty()
        || title.eq_ignore_ascii_case(UNTITLED_TITLE)
        || title.eq_ignore_ascii_case(LEGACY_UNTITLED_TITLE)
}

/// Whether `title` is a generic fallback label.
pub fn is_fallback_title(title: &str) -> bool {
    FALLBACK_TITLES
        .iter()
        .any(|f| title.trim().eq_ignore_ascii_case(f))
}

/// Prompt for the label model, built from the latest exchange only.
pub fn build_title_prompt(user_input: &str, assistant_reply: &str) -> String {
    format!(
        "Create a very short (2-4 words) title summarizing this conversation exchange:\n\
         User: {user_input}\nAssistant: {assistant_reply}\n\nTitle:"
    )
}

const QUOTE_CHARS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '`'];
const MARKDOWN_CHARS: &[char] = &['*', '_', '#', '>'];

/// Normalize raw label output into a title of at most `max_words` words.
///
/// Takes the first non-empty line, drops a leading `Title:`, strips
/// surrounding quotes and markdown, and collapses whitespace. Returns
/// `None` when nothing is left.
pub fn clean_title(raw: &str, max_words: usize) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line.trim_matches(MARKDOWN_CHARS).trim();
    let line = match line.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("title:") => &line[6..],
        _ => line,
    };
    let line = line
        .trim()
        .trim_matches(|c: char| QUOTE_CHARS.contains(&c) || MARKDOWN_CHARS.contains(&c))
        .trim()
        .trim_end_matches(['.', '!', ',', ';', ':']);

    let title = line
        .split_whitespace()
        .take(max_words.max(1))
        .collect::<Vec<_>>()
        .join(" ");
    let title = title.trim_matches(|c: char| QUOTE_CHARS.contains(&c)).trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_owned())
    }
}

/// What the title check did on this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleOutcome {
    /// The session already had a title; synthesis was not invoked.
    AlreadyTitled(String),
    /// A title was synthesized and persisted on this turn.
    Generated(String),
    /// Synthesis was attempted but nothing was persisted.
    Rejected {
        /// Why the title was not persisted.
        reason: String,
    },
    /// The current title could not be read; no decision was made.
    Skipped,
}

impl TitleOutcome {
    /// The session's title after this check, if it has one.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::AlreadyTitled(t) | Self::Generated(t) => Some(t),
            Self::Rejected { .. } | Self::Skipped => None,
        }
    }
}

/// Decides once per session whether to synthesize and persist a title.
pub struct SessionTitleManager {
    generator: Arc<dyn LabelGenerator>,
    store: Arc<dyn ConversationStore>,
    timeout: Duration,
    max_words: usize,
}

impl SessionTitleManager {
    /// Create a manager.
    pub fn new(
        generator: Arc<dyn LabelGenerator>,
        store: Arc<dyn ConversationStore>,
        timeout: Duration,
        max_words: usize,
    ) -> Self {
        Self {
            generator,
            store,
            timeout,
            max_words,
        }
    }

    /// The persisted title, or `None` while untitled or unreadable.
    pub async fn current(&self, user_id: &str, session_id: &str) -> Option<String> {
        match self.store.get_title(user_id, session_id).await {
            Ok(title) if !is_untitled(&title) => Some(title),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session title");
                None
            }
        }
    }

    /// Title the session from the latest exchange if it is still untitled.
    pub async fn ensure_title(
        &self,
        user_id: &str,
        session_id: &str,
        user_input: &str,
        assistant_reply: &str,
    ) -> TitleOutcome {
        let span = tracing::info_span!(SPAN_TITLE, { FIELD_SESSION_ID } = session_id);
        self.ensure_title_inner(user_id, session_id, user_input, assistant_reply)
            .instrument(span)
            .await
    }

    async fn ensure_title_inner(
        &self,
        user_id: &str,
        session_id: &str,
        user_input: &str,
        assistant_reply: &str,
    ) -> TitleOutcome {
        let current = match self.store.get_title(user_id, session_id).await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read session title; skipping title check");
                return TitleOutcome::Skipped;
            }
        };
        if !is_untitled(&current) {
            return TitleOutcome::AlreadyTitled(current);
        }

        let title = match self.synthesize(user_input, assistant_reply).await {
            Ok(title) => title,
            Err(e) => {
                tracing::warn!(error = %e, "title synthesis failed; session stays untitled");
                return TitleOutcome::Rejected {
                    reason: e.to_string(),
                };
            }
        };

        if let Err(e) = self.store.set_title(user_id, session_id, &title).await {
            tracing::warn!(error = %e, "failed to persist session title");
            return TitleOutcome::Rejected {
                reason: e.to_string(),
            };
        }
        tracing::info!(title = %title, "session titled");
        TitleOutcome::Generated(title)
    }

    async fn synthesize(
        &self,
        user_input: &str,
        assistant_reply: &str,
    ) -> Result<String, ServiceError> {
        let prompt = build_title_prompt(user_input, assistant_reply);
        let raw = tokio::time::timeout(self.timeout, self.generator.generate_short_label(&prompt))
            .await
            .map_err(|_| {
                ServiceError::TimeoutError(format!(
                    "title synthesis timed out after {} ms",
                    self.timeout.as_millis()
                ))
            })??;

        match clean_title(&raw, self.max_words) {
            Some(title) if !is_fallback_title(&title) && !is_untitled(&title) => Ok(title),
            Some(title) => Err(ServiceError::ResponseError(format!(
                "generic title \"{title}\" not persisted"
            ))),
            None => Err(ServiceError::ResponseError("empty title".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::store::MemoryConversationStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLabel {
        reply: Result<String, ServiceError>,
        calls: AtomicUsize,
    }

    impl CountingLabel {
        fn new(reply: Result<String, ServiceError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LabelGenerator for CountingLabel {
        async fn generate_short_label(&self, _prompt: &str) -> Result<String, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }

    struct StalledLabel;

    #[async_trait]
    impl LabelGenerator for StalledLabel {
        async fn generate_short_label(&self, _prompt: &str) -> Result<String, ServiceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("Too Late".into())
        }
    }

    async fn setup(
        label: Arc<CountingLabel>,
    ) -> (SessionTitleManager, Arc<MemoryConversationStore>, String) {
        let store = Arc::new(MemoryConversationStore::new());
        let id = store.create_session("u1").await.unwrap();
        let manager = SessionTitleManager::new(label, store.clone(), Duration::from_millis(100), 4);
        (manager, store, id)
    }

    #[test]
    fn untitled_sentinels() {
        assert!(is_untitled("untitled"));
        assert!(is_untitled("UNTITLED"));
        assert!(is_untitled("Untitled Session"));
        assert!(is_untitled("  "));
        assert!(!is_untitled("Morning Walk"));
    }

    #[test]
    fn fallback_titles_detected() {
        assert!(is_fallback_title("conversation"));
        assert!(is_fallback_title("Mindful Moment"));
        assert!(!is_fallback_title("Mindful Morning"));
    }

    #[test]
    fn prompt_uses_latest_exchange() {
        let prompt = build_title_prompt("I can't sleep", "That sounds exhausting");
        assert!(prompt.starts_with("Create a very short (2-4 words) title"));
        assert!(prompt.contains("User: I can't sleep\nAssistant: That sounds exhausting"));
        assert!(prompt.ends_with("Title:"));
    }

    #[test]
    fn clean_title_strips_decoration() {
        assert_eq!(clean_title("\"Late Night Worries\"", 4).as_deref(), Some("Late Night Worries"));
        assert_eq!(clean_title("Title: 'Sleepless'", 4).as_deref(), Some("Sleepless"));
        assert_eq!(clean_title("**Work Stress**\nmore text", 4).as_deref(), Some("Work Stress"));
        assert_eq!(clean_title("\n\n  “Quiet Sunday.”  ", 4).as_deref(), Some("Quiet Sunday"));
    }

    #[test]
    fn clean_title_truncates_words() {
        assert_eq!(
            clean_title("A Long Title With Far Too Many Words", 4).as_deref(),
            Some("A Long Title With")
        );
    }

    #[test]
    fn clean_title_empty_is_none() {
        assert!(clean_title("", 4).is_none());
        assert!(clean_title("  \"\"  ", 4).is_none());
        assert!(clean_title("Title:", 4).is_none());
    }

    #[tokio::test]
    async fn untitled_session_gets_titled_once() {
        let label = CountingLabel::new(Ok("\"Evening Calm\"".into()));
        let (manager, store, id) = setup(label.clone()).await;

        let first = manager.ensure_title("u1", &id, "hi", "hello").await;
        assert_eq!(first, TitleOutcome::Generated("Evening Calm".into()));
        let second = manager.ensure_title("u1", &id, "again", "sure").await;
        assert_eq!(second, TitleOutcome::AlreadyTitled("Evening Calm".into()));

        assert_eq!(label.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_title("u1", &id).await.unwrap(), "Evening Calm");
    }

    #[tokio::test]
    async fn fallback_label_is_not_persisted() {
        let label = CountingLabel::new(Ok("Mindful Moment".into()));
        let (manager, store, id) = setup(label.clone()).await;
        let outcome = manager.ensure_title("u1", &id, "hi", "hello").await;
        assert!(matches!(outcome, TitleOutcome::Rejected { .. }));
        assert_eq!(outcome.title(), None);
        assert_eq!(store.get_title("u1", &id).await.unwrap(), UNTITLED_TITLE);

        // Still eligible on the next turn.
        manager.ensure_title("u1", &id, "hi", "hello").await;
        assert_eq!(label.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn generator_failure_leaves_untitled() {
        let label = CountingLabel::new(Err(ServiceError::AuthError("bad key".into())));
        let (manager, store, id) = setup(label).await;
        let outcome = manager.ensure_title("u1", &id, "hi", "hello").await;
        match outcome {
            TitleOutcome::Rejected { reason } => assert!(reason.contains("AUTH_FAILED")),
            other => unreachable!("unexpected outcome {other:?}"),
        }
        assert_eq!(store.get_title("u1", &id).await.unwrap(), UNTITLED_TITLE);
    }

    #[tokio::test]
    async fn stalled_generator_times_out_and_leaves_untitled() {
        let store = Arc::new(MemoryConversationStore::new());
        let id = store.create_session("u1").await.unwrap();
        let label: Arc<dyn LabelGenerator> = Arc::new(StalledLabel);
        let manager = SessionTitleManager::new(label, store.clone(), Duration::from_millis(50), 4);

        let outcome = manager.ensure_title("u1", &id, "hi", "hello").await;
        match outcome {
            TitleOutcome::Rejected { reason } => assert!(reason.contains("TIMEOUT_ERROR")),
            other => unreachable!("unexpected outcome {other:?}"),
        }
        assert_eq!(store.get_title("u1", &id).await.unwrap(), UNTITLED_TITLE);
        assert_eq!(manager.current("u1", &id).await, None);
    }

    #[tokio::test]
    async fn unreadable_title_skips() {
        let label = CountingLabel::new(Ok("Anything".into()));
        let (manager, _store, _id) = setup(label.clone()).await;
        let outcome = manager.ensure_title("u1", "missing", "hi", "hello").await;
        assert_eq!(outcome, TitleOutcome::Skipped);
        assert_eq!(label.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn legacy_sentinel_is_eligible() {
        let label = CountingLabel::new(Ok("Fresh Start".into()));
        let (manager, store, id) = setup(label).await;
        store.set_title("u1", &id, LEGACY_UNTITLED_TITLE).await.unwrap();
        let outcome = manager.ensure_title("u1", &id, "hi", "hello").await;
        assert_eq!(outcome.title(), Some("Fresh Start"));
    }

    #[tokio::test]
    async fn current_hides_sentinel() {
        let label = CountingLabel::new(Ok("x".into()));
        let (manager, store, id) = setup(label).await;
        assert_eq!(manager.current("u1", &id).await, None);
        store.set_title("u1", &id, "Named").await.unwrap();
        assert_eq!(manager.current("u1", &id).await.as_deref(), Some("Named"));
    }
}
