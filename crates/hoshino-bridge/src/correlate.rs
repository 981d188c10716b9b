//! Positional correlation over an extracted text sequence.
//!
//! The chat app renders a sent message's recipient label immediately before
//! the system "发送消息给X" confirmation line, and an inbound message renders
//! an "@"-mention line directly after the sender's name line. "The fragment
//! before the marker" is therefore a usable positional proxy for the value of
//! interest, without parsing any UI semantics.
//!
//! The scans are behind [`CorrelationStrategy`] so the positional heuristic
//! can be swapped out (content classifier, timestamp ordering) without
//! touching the orchestrator.

/// Confirmation-line prefix the app prints after a message is delivered to a
/// named agent. The full marker is this prefix plus the agent's name.
pub const SENT_MARKER_PREFIX: &str = "发送消息给";

/// Substring identifying a mention line.
pub const MENTION_MARKER: &str = "@";

/// Outcome of a marker-mode scan.
///
/// "Marker present but first in the sequence" is a distinct outcome from
/// "marker absent": the former means the screen is mid-update, the latter
/// that no delivery confirmation for that agent is visible at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerMatch {
    /// Marker found with a predecessor — the presumed reply text.
    Found(String),
    /// Marker found as the very first fragment; nothing precedes it.
    FoundNoPredecessor,
    /// No fragment contains the marker.
    NotFound,
}

/// Outcome of a mention-mode scan: the first "@" fragment and the fragment
/// before it. Both absent when no fragment contains "@".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationResult {
    /// Fragment immediately preceding the marker, interpreted by the
    /// orchestrator as the agent's display name.
    pub preceding: Option<String>,
    /// The matching fragment itself.
    pub marker: Option<String>,
}

/// A correlation policy over a text sequence.
///
/// Both scans are single-pass, first-match, in traversal order. Later
/// matches are never considered.
pub trait CorrelationStrategy: Send + Sync {
    /// Marker mode: locate `"发送消息给" + agent_name` and report its
    /// predecessor.
    fn find_reply(&self, texts: &[String], agent_name: &str) -> MarkerMatch;

    /// Mention mode: locate the first "@" fragment and its predecessor, used
    /// to discover which agent most recently received output.
    fn find_mention(&self, texts: &[String]) -> CorrelationResult;
}

/// The production strategy: adjacent-fragment lookup, substring matching.
pub struct AdjacentText;

impl CorrelationStrategy for AdjacentText {
    fn find_reply(&self, texts: &[String], agent_name: &str) -> MarkerMatch {
        let pattern = format!("{SENT_MARKER_PREFIX}{agent_name}");

        for (i, text) in texts.iter().enumerate() {
            if text.contains(&pattern) {
                return match i {
                    0 => MarkerMatch::FoundNoPredecessor,
                    _ => MarkerMatch::Found(texts[i - 1].clone()),
                };
            }
        }

        MarkerMatch::NotFound
    }

    fn find_mention(&self, texts: &[String]) -> CorrelationResult {
        for (i, text) in texts.iter().enumerate() {
            if text.contains(MENTION_MARKER) {
                return CorrelationResult {
                    preceding: (i > 0).then(|| texts[i - 1].clone()),
                    marker: Some(text.clone()),
                };
            }
        }

        CorrelationResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn marker_returns_exact_predecessor() {
        let texts = seq(&["noise", "A", "发送消息给黍", "later"]);
        assert_eq!(
            AdjacentText.find_reply(&texts, "黍"),
            MarkerMatch::Found("A".to_string())
        );
    }

    #[test]
    fn marker_at_index_zero_has_no_predecessor() {
        let texts = seq(&["发送消息给黍", "A"]);
        assert_eq!(
            AdjacentText.find_reply(&texts, "黍"),
            MarkerMatch::FoundNoPredecessor
        );
    }

    #[test]
    fn marker_absent_is_not_found() {
        let texts = seq(&["A", "B"]);
        assert_eq!(AdjacentText.find_reply(&texts, "黍"), MarkerMatch::NotFound);
    }

    #[test]
    fn marker_for_other_agent_does_not_match() {
        let texts = seq(&["A", "发送消息给星"]);
        assert_eq!(AdjacentText.find_reply(&texts, "黍"), MarkerMatch::NotFound);
    }

    // First-match policy: only the earliest marker in traversal order counts.
    #[test]
    fn marker_first_match_wins() {
        let texts = seq(&["first", "发送消息给黍", "second", "发送消息给黍"]);
        assert_eq!(
            AdjacentText.find_reply(&texts, "黍"),
            MarkerMatch::Found("first".to_string())
        );
    }

    #[test]
    fn marker_matches_as_substring() {
        let texts = seq(&["reply", "已发送消息给黍 10:32"]);
        assert_eq!(
            AdjacentText.find_reply(&texts, "黍"),
            MarkerMatch::Found("reply".to_string())
        );
    }

    #[test]
    fn mention_absent_yields_double_none() {
        let texts = seq(&["plain", "text", "only"]);
        assert_eq!(AdjacentText.find_mention(&texts), CorrelationResult::default());
    }

    #[test]
    fn mention_reports_marker_and_predecessor() {
        let texts = seq(&["黍", "@黍 收到新消息", "body"]);
        let result = AdjacentText.find_mention(&texts);
        assert_eq!(result.preceding.as_deref(), Some("黍"));
        assert_eq!(result.marker.as_deref(), Some("@黍 收到新消息"));
    }

    #[test]
    fn mention_at_index_zero_has_marker_but_no_predecessor() {
        let texts = seq(&["@黍 收到新消息", "body"]);
        let result = AdjacentText.find_mention(&texts);
        assert_eq!(result.preceding, None);
        assert_eq!(result.marker.as_deref(), Some("@黍 收到新消息"));
    }

    #[test]
    fn mention_first_match_wins() {
        let texts = seq(&["one", "@first", "two", "@second"]);
        let result = AdjacentText.find_mention(&texts);
        assert_eq!(result.marker.as_deref(), Some("@first"));
        assert_eq!(result.preceding.as_deref(), Some("one"));
    }

    #[test]
    fn empty_sequence_matches_nothing() {
        let texts: Vec<String> = Vec::new();
        assert_eq!(AdjacentText.find_reply(&texts, "黍"), MarkerMatch::NotFound);
        assert_eq!(AdjacentText.find_mention(&texts), CorrelationResult::default());
    }
}
