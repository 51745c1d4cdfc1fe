//! Shared conversation state fed by stream handlers.
//!
//! The UI owns the transcript; streams only reach it through the handlers
//! built here. Every update goes through one mutex, so the deltas of a stream
//! are applied strictly in the order they are dispatched.

use crate::handlers::StreamHandlers;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use taxdesk_core::{Conversation, StreamEvent};

/// Cloneable handle to a conversation that streams write into.
#[derive(Debug, Clone, Default)]
pub struct ConversationAccumulator {
    inner: Arc<Mutex<Conversation>>,
}

impl ConversationAccumulator {
    /// Create an accumulator over an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator over an existing conversation.
    #[must_use]
    pub fn from_conversation(conversation: Conversation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conversation)),
        }
    }

    /// Submit a question, opening a new assistant turn.
    pub fn submit(&self, question: &str) -> Option<usize> {
        self.inner.lock().submit(question)
    }

    /// Apply one event to the open turn.
    pub fn apply(&self, event: &StreamEvent) -> bool {
        self.inner.lock().apply(event)
    }

    /// Freeze the open turn without adding text. Call after aborting a stream.
    pub fn stop(&self) -> bool {
        self.inner.lock().stop()
    }

    /// Whether an answer is still streaming.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.inner.lock().is_streaming()
    }

    /// Remove the turns at the given indices.
    pub fn delete_selected(&self, indices: &BTreeSet<usize>) -> usize {
        self.inner.lock().delete_selected(indices)
    }

    /// Remove every turn.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Copy of the current transcript.
    #[must_use]
    pub fn snapshot(&self) -> Conversation {
        self.inner.lock().clone()
    }

    /// Read the transcript without copying it.
    pub fn with<R>(&self, f: impl FnOnce(&Conversation) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Handlers that fold every channel into this conversation.
    #[must_use]
    pub fn handlers(&self) -> StreamHandlers {
        let message = self.clone();
        let route = self.clone();
        let chart = self.clone();
        let summary = self.clone();
        let error = self.clone();
        let done = self.clone();

        StreamHandlers::new()
            .on_message(move |content| {
                message.apply(&StreamEvent::message(content));
            })
            .on_route(move |r, company| {
                route.apply(&StreamEvent::route(r.clone(), company.map(str::to_string)));
            })
            .on_chart(move |payload| {
                chart.apply(&StreamEvent::chart(payload.clone()));
            })
            .on_summary(move |content| {
                summary.apply(&StreamEvent::summary(content));
            })
            .on_error(move |message| {
                error.apply(&StreamEvent::error(message));
            })
            .on_done(move || {
                done.apply(&StreamEvent::Done);
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use taxdesk_core::Route;

    #[test]
    fn test_handlers_fold_into_open_turn() {
        let acc = ConversationAccumulator::new();
        acc.submit("利润总额").unwrap();
        let mut handlers = acc.handlers();

        for event in [
            StreamEvent::route("financial", Some("示例公司".into())),
            StreamEvent::message("利润"),
            StreamEvent::message("增长"),
            StreamEvent::chart(json!({"title": "利润"})),
            StreamEvent::summary("总结"),
        ] {
            handlers.dispatch(&event);
        }
        assert!(acc.is_streaming());

        handlers.dispatch(&StreamEvent::Done);
        assert!(!acc.is_streaming());

        let turn = acc.with(|c| c.turns()[1].as_assistant().cloned()).unwrap();
        assert_eq!(turn.content, "利润增长");
        assert_eq!(turn.route, Some(Route::Financial));
        assert_eq!(turn.charts.len(), 1);
        assert_eq!(turn.summary, "总结");
    }

    #[test]
    fn test_error_via_handler_annotates() {
        let acc = ConversationAccumulator::new();
        acc.submit("q").unwrap();
        let mut handlers = acc.handlers();

        handlers.dispatch(&StreamEvent::message("部分"));
        handlers.dispatch(&StreamEvent::error("upstream timeout"));
        handlers.dispatch(&StreamEvent::Done);

        let snapshot = acc.snapshot();
        let turn = snapshot.turns()[1].as_assistant().unwrap();
        assert_eq!(turn.content, "部分\n\n❌ 错误: upstream timeout");
        assert!(!snapshot.is_streaming());
    }

    #[test]
    fn test_clear_mid_stream_drops_later_deltas() {
        let acc = ConversationAccumulator::new();
        acc.submit("q").unwrap();
        let mut handlers = acc.handlers();

        handlers.dispatch(&StreamEvent::message("a"));
        acc.clear();
        handlers.dispatch(&StreamEvent::message("b"));

        assert!(acc.snapshot().is_empty());
    }

    #[test]
    fn test_stop_after_abort_ends_streaming() {
        let acc = ConversationAccumulator::new();
        acc.submit("q").unwrap();
        let mut handlers = acc.handlers();
        handlers.dispatch(&StreamEvent::message("部分"));

        assert!(acc.stop());
        assert!(!acc.is_streaming());

        let snapshot = acc.snapshot();
        let turn = snapshot.turns()[1].as_assistant().unwrap();
        assert_eq!(turn.content, "部分");
    }

    #[test]
    fn test_delete_selected() {
        let acc = ConversationAccumulator::from_conversation(Conversation::new());
        acc.submit("a").unwrap();
        acc.apply(&StreamEvent::Done);
        assert_eq!(acc.delete_selected(&BTreeSet::from([0])), 1);
        assert_eq!(acc.snapshot().len(), 1);
    }

    #[test]
    fn test_clones_share_state() {
        let acc = ConversationAccumulator::new();
        let other = acc.clone();
        acc.submit("q").unwrap();
        assert!(other.is_streaming());
    }
}
