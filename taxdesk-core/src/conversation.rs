//! Conversation transcript and the reducer that folds stream events into it.
//!
//! A conversation is an ordered list of turns. Submitting a question appends a
//! user turn followed by an empty, open assistant turn; stream events then
//! mutate that open turn until a `done` or `error` event freezes it.

use crate::chart::ChartPayload;
use crate::event::StreamEvent;
use crate::route::Route;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

/// Prefix of the inline annotation appended when a stream fails.
pub const ERROR_ANNOTATION_PREFIX: &str = "\n\n❌ 错误: ";

/// Format the inline annotation for an error message.
#[must_use]
pub fn error_annotation(message: &str) -> String {
    format!("{}{}", ERROR_ANNOTATION_PREFIX, message)
}

/// A question asked by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTurn {
    /// Question text.
    pub content: String,
    /// When the question was submitted.
    pub timestamp: DateTime<Utc>,
}

impl UserTurn {
    /// Submission time as `HH:MM:SS` in local time.
    #[must_use]
    pub fn display_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

/// An answer streamed by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantTurn {
    /// Accumulated answer text.
    pub content: String,
    /// Reasoning path reported by the backend.
    pub route: Option<Route>,
    /// Charts in arrival order.
    pub charts: Vec<ChartPayload>,
    /// Accumulated summary text, drawn after the charts.
    pub summary: String,
    /// Whether the turn still receives deltas.
    pub open: bool,
}

impl AssistantTurn {
    /// Create an empty turn that accepts deltas.
    #[must_use]
    pub fn open() -> Self {
        Self {
            open: true,
            ..Self::default()
        }
    }

    /// Whether the turn still receives deltas.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Apply one event. Returns `false` if the turn is frozen.
    pub fn apply(&mut self, event: &StreamEvent) -> bool {
        if !self.open {
            return false;
        }

        match event {
            StreamEvent::Message { content } => self.content.push_str(content),
            StreamEvent::Route { route, .. } => self.route = Some(route.clone()),
            StreamEvent::Chart { payload } => self.charts.push(payload.clone()),
            StreamEvent::Summary { content } => self.summary.push_str(content),
            StreamEvent::Error { message } => {
                self.content.push_str(&error_annotation(message));
                self.open = false;
            }
            StreamEvent::Done => self.open = false,
        }
        true
    }
}

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ConversationTurn {
    /// A user question.
    User(UserTurn),
    /// An assistant answer.
    Assistant(AssistantTurn),
}

impl ConversationTurn {
    /// Get the user turn, if this is one.
    pub fn as_user(&self) -> Option<&UserTurn> {
        match self {
            Self::User(turn) => Some(turn),
            Self::Assistant(_) => None,
        }
    }

    /// Get the assistant turn, if this is one.
    pub fn as_assistant(&self) -> Option<&AssistantTurn> {
        match self {
            Self::Assistant(turn) => Some(turn),
            Self::User(_) => None,
        }
    }
}

/// Ordered conversation transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All turns in order.
    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the conversation has no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Submit a question now. See [`Conversation::submit_at`].
    pub fn submit(&mut self, question: &str) -> Option<usize> {
        self.submit_at(question, Utc::now())
    }

    /// Append a user turn and an open assistant turn.
    ///
    /// Returns the index of the new assistant turn, or `None` if the question
    /// is blank. A turn left open by an earlier stream is frozen first.
    pub fn submit_at(&mut self, question: &str, timestamp: DateTime<Utc>) -> Option<usize> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        if let Some(previous) = self.open_turn_mut() {
            tracing::debug!("freezing assistant turn left open by a previous stream");
            previous.open = false;
        }

        self.turns.push(ConversationTurn::User(UserTurn {
            content: question.to_string(),
            timestamp,
        }));
        self.turns
            .push(ConversationTurn::Assistant(AssistantTurn::open()));
        Some(self.turns.len() - 1)
    }

    /// The assistant turn currently receiving deltas.
    #[must_use]
    pub fn open_turn(&self) -> Option<&AssistantTurn> {
        match self.turns.last() {
            Some(ConversationTurn::Assistant(turn)) if turn.open => Some(turn),
            _ => None,
        }
    }

    fn open_turn_mut(&mut self) -> Option<&mut AssistantTurn> {
        match self.turns.last_mut() {
            Some(ConversationTurn::Assistant(turn)) if turn.open => Some(turn),
            _ => None,
        }
    }

    /// Whether an answer is still streaming.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.open_turn().is_some()
    }

    /// Apply an event to the open turn.
    ///
    /// Returns `false` when there is no open turn, e.g. because the user
    /// deleted it or cleared the conversation mid-stream.
    pub fn apply(&mut self, event: &StreamEvent) -> bool {
        match self.open_turn_mut() {
            Some(turn) => turn.apply(event),
            None => {
                tracing::trace!(channel = ?event.channel(), "no open turn, event ignored");
                false
            }
        }
    }

    /// Freeze the open turn as it is, without a `done` or `error`.
    ///
    /// Used when the caller aborts a stream. Returns `false` if no turn was open.
    pub fn stop(&mut self) -> bool {
        match self.open_turn_mut() {
            Some(turn) => {
                turn.open = false;
                true
            }
            None => false,
        }
    }

    /// Remove the turns at the given indices. Returns how many were removed.
    pub fn delete_selected(&mut self, indices: &BTreeSet<usize>) -> usize {
        let before = self.turns.len();
        let mut index = 0;
        self.turns.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
        before - self.turns.len()
    }

    /// Remove every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Indices of user turns asking exactly `question`, oldest first.
    #[must_use]
    pub fn user_turn_indices(&self, question: &str) -> Vec<usize> {
        self.turns
            .iter()
            .enumerate()
            .filter_map(|(i, turn)| match turn {
                ConversationTurn::User(user) if user.content == question => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Export the transcript as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        for (i, turn) in self.turns.iter().enumerate() {
            if i > 0 {
                out.push_str("---\n\n");
            }
            match turn {
                ConversationTurn::User(user) => {
                    let _ = write!(
                        out,
                        "### 用户 ({})\n\n{}\n\n",
                        user.display_time(),
                        user.content
                    );
                }
                ConversationTurn::Assistant(assistant) => {
                    out.push_str("### AI助手");
                    if let Some(badge) = assistant.route.as_ref().and_then(Route::badge) {
                        let _ = write!(out, " [{}]", badge);
                    }
                    out.push_str("\n\n");

                    if !assistant.content.is_empty() {
                        out.push_str(&assistant.content);
                        out.push_str("\n\n");
                    }

                    for chart in &assistant.charts {
                        if let Some(spec) = chart.spec() {
                            if let Some(title) = &spec.title {
                                let _ = write!(out, "#### {}\n\n", title);
                            }
                            out.push_str(&spec.to_markdown_table());
                            out.push('\n');
                        }
                    }

                    if !assistant.summary.is_empty() {
                        out.push_str(&assistant.summary);
                        out.push_str("\n\n");
                    }
                }
            }
        }

        out
    }
}

/// Pure form of [`Conversation::apply`].
#[must_use]
pub fn reduce(mut conversation: Conversation, event: &StreamEvent) -> Conversation {
    conversation.apply(event);
    conversation
}

/// Cycles through the answers to a repeated question.
///
/// The first activation for a question jumps to its newest user turn; each
/// further activation steps to the previous occurrence, wrapping around to
/// the newest after the oldest.
#[derive(Debug, Clone, Default)]
pub struct HistoryNavigator {
    last_target: HashMap<String, usize>,
}

impl HistoryNavigator {
    /// Create a navigator with no remembered positions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the turn to jump to, or `None` if the question was never asked
    /// in this conversation.
    pub fn next_target(&mut self, conversation: &Conversation, question: &str) -> Option<usize> {
        let indices = conversation.user_turn_indices(question);
        let newest = *indices.last()?;

        let target = match self
            .last_target
            .get(question)
            .and_then(|last| indices.iter().position(|i| i == last))
        {
            Some(pos) if pos > 0 => indices[pos - 1],
            _ => newest,
        };

        self.last_target.insert(question.to_string(), target);
        Some(target)
    }

    /// Forget all remembered positions.
    pub fn reset(&mut self) {
        self.last_target.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn streaming(question: &str) -> Conversation {
        let mut conversation = Conversation::new();
        conversation.submit(question).unwrap();
        conversation
    }

    fn assistant(conversation: &Conversation, index: usize) -> &AssistantTurn {
        conversation.turns()[index].as_assistant().unwrap()
    }

    #[test]
    fn test_submit_appends_user_then_open_assistant() {
        let mut conversation = Conversation::new();
        let idx = conversation.submit("  营业收入是多少  ").unwrap();

        assert_eq!(idx, 1);
        assert_eq!(conversation.len(), 2);
        assert_eq!(
            conversation.turns()[0].as_user().unwrap().content,
            "营业收入是多少"
        );
        assert_eq!(conversation.open_turn(), Some(&AssistantTurn::open()));
        assert!(conversation.is_streaming());
    }

    #[test]
    fn test_blank_question_is_rejected() {
        let mut conversation = Conversation::new();
        assert!(conversation.submit("   ").is_none());
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_message_and_summary_deltas_concatenate() {
        let mut conversation = streaming("q");
        for part in ["Hel", "lo", "", " world"] {
            assert!(conversation.apply(&StreamEvent::message(part)));
        }
        conversation.apply(&StreamEvent::summary("\n**分析总结**:\n"));
        conversation.apply(&StreamEvent::summary("增长稳定"));

        let turn = assistant(&conversation, 1);
        assert_eq!(turn.content, "Hello world");
        assert_eq!(turn.summary, "\n**分析总结**:\n增长稳定");
    }

    #[test]
    fn test_route_overwrites_and_drops_company() {
        let mut conversation = streaming("q");
        conversation.apply(&StreamEvent::route("coze", None));
        conversation.apply(&StreamEvent::route("financial", Some("示例公司".into())));

        assert_eq!(assistant(&conversation, 1).route, Some(Route::Financial));
    }

    #[test]
    fn test_charts_accumulate_in_order() {
        let mut conversation = streaming("q");
        conversation.apply(&StreamEvent::chart(json!({"title": "a"})));
        conversation.apply(&StreamEvent::chart(json!({"title": "a"})));
        conversation.apply(&StreamEvent::chart(json!({"title": "b"})));

        let titles: Vec<_> = assistant(&conversation, 1)
            .charts
            .iter()
            .map(|c| c.title().unwrap())
            .collect();
        assert_eq!(titles, vec!["a", "a", "b"]);
    }

    #[test]
    fn test_error_annotates_and_freezes() {
        let mut conversation = streaming("q");
        conversation.apply(&StreamEvent::message("partial"));
        conversation.apply(&StreamEvent::error("upstream timeout"));

        let turn = assistant(&conversation, 1);
        assert_eq!(turn.content, "partial\n\n❌ 错误: upstream timeout");
        assert!(!turn.is_open());
        assert!(!conversation.is_streaming());

        assert!(!conversation.apply(&StreamEvent::message("late")));
        assert_eq!(assistant(&conversation, 1).content, "partial\n\n❌ 错误: upstream timeout");
    }

    #[test]
    fn test_done_freezes_without_text_change() {
        let conversation = reduce(streaming("q"), &StreamEvent::message("answer"));
        let conversation = reduce(conversation, &StreamEvent::Done);
        let conversation = reduce(conversation, &StreamEvent::summary("ignored"));

        let turn = assistant(&conversation, 1);
        assert_eq!(turn.content, "answer");
        assert!(turn.summary.is_empty());
        assert!(!turn.is_open());
    }

    #[test]
    fn test_stop_keeps_partial_answer() {
        let mut conversation = Conversation::new();
        conversation.submit("现金流量").unwrap();
        conversation.apply(&StreamEvent::message("经营活动"));

        assert!(conversation.stop());
        assert!(!conversation.is_streaming());
        assert!(!conversation.stop());

        let turn = conversation.turns()[1].as_assistant().unwrap();
        assert_eq!(turn.content, "经营活动");
        assert!(!conversation.apply(&StreamEvent::message("净额")));
    }

    #[test]
    fn test_submit_freezes_previous_open_turn() {
        let mut conversation = streaming("first");
        conversation.apply(&StreamEvent::message("half"));
        conversation.submit("second").unwrap();

        assert!(!assistant(&conversation, 1).is_open());
        assert!(assistant(&conversation, 3).is_open());

        conversation.apply(&StreamEvent::message("new"));
        assert_eq!(assistant(&conversation, 1).content, "half");
        assert_eq!(assistant(&conversation, 3).content, "new");
    }

    #[test]
    fn test_deleting_open_turn_stops_updates() {
        let mut conversation = streaming("first");
        conversation.apply(&StreamEvent::Done);
        conversation.submit("second").unwrap();

        let removed = conversation.delete_selected(&BTreeSet::from([3]));
        assert_eq!(removed, 1);
        assert!(!conversation.apply(&StreamEvent::message("orphan")));
        assert_eq!(assistant(&conversation, 1).content, "");
    }

    #[test]
    fn test_delete_selected_keeps_order() {
        let mut conversation = Conversation::new();
        for q in ["a", "b", "c"] {
            conversation.submit(q).unwrap();
            conversation.apply(&StreamEvent::Done);
        }

        conversation.delete_selected(&BTreeSet::from([0, 1, 4, 99]));
        let users: Vec<_> = conversation
            .turns()
            .iter()
            .filter_map(|t| t.as_user().map(|u| u.content.as_str()))
            .collect();
        assert_eq!(users, vec!["b"]);
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut conversation = streaming("q");
        conversation.clear();
        assert!(conversation.is_empty());
        assert!(!conversation.apply(&StreamEvent::message("x")));
    }

    #[test]
    fn test_history_navigation_cycles_newest_first() {
        let mut conversation = Conversation::new();
        for q in ["利润", "收入", "利润", "利润"] {
            conversation.submit(q).unwrap();
            conversation.apply(&StreamEvent::Done);
        }
        assert_eq!(conversation.user_turn_indices("利润"), vec![0, 4, 6]);

        let mut nav = HistoryNavigator::new();
        let targets: Vec<_> = (0..4)
            .map(|_| nav.next_target(&conversation, "利润").unwrap())
            .collect();
        assert_eq!(targets, vec![6, 4, 0, 6]);

        assert_eq!(nav.next_target(&conversation, "收入"), Some(2));
        assert_eq!(nav.next_target(&conversation, "收入"), Some(2));
        assert_eq!(nav.next_target(&conversation, "税率"), None);
    }

    #[test]
    fn test_history_navigation_recovers_from_stale_position() {
        let mut conversation = Conversation::new();
        for q in ["a", "a"] {
            conversation.submit(q).unwrap();
            conversation.apply(&StreamEvent::Done);
        }
        let mut nav = HistoryNavigator::new();
        assert_eq!(nav.next_target(&conversation, "a"), Some(2));

        conversation.delete_selected(&BTreeSet::from([0, 1]));
        conversation.submit("a").unwrap();
        assert_eq!(conversation.user_turn_indices("a"), vec![0, 2]);
        // remembered index 2 still matches, so step back
        assert_eq!(nav.next_target(&conversation, "a"), Some(0));
    }

    #[test]
    fn test_markdown_export() {
        let mut conversation = streaming("营业收入");
        conversation.apply(&StreamEvent::route("financial", None));
        conversation.apply(&StreamEvent::message("收入增长"));
        conversation.apply(&StreamEvent::chart(json!({
            "title": "收入",
            "labels": ["2023"],
            "datasets": [{"label": "收入", "data": [10]}]
        })));
        conversation.apply(&StreamEvent::summary("总结"));
        conversation.apply(&StreamEvent::Done);

        let md = conversation.to_markdown();
        assert!(md.starts_with("### 用户 ("));
        assert!(md.contains("营业收入\n\n---\n\n### AI助手 [📊 财务数据]\n\n收入增长\n\n"));
        assert!(md.contains("#### 收入\n\n| | 2023 |\n|---|---|\n| 收入 | 10 |\n\n"));
        assert!(md.ends_with("总结\n\n"));
    }

    #[test]
    fn test_serde_roundtrip_of_transcript() {
        let mut conversation = streaming("q");
        conversation.apply(&StreamEvent::route("tax_incentive", None));
        let json = serde_json::to_string(&conversation).unwrap();
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conversation);
    }
}
