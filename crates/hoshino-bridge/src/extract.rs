//! Text extraction from a uiautomator XML dump.

use std::path::Path;

/// Extract every non-empty `text` attribute from the snapshot at `path`,
/// trimmed, in document order.
///
/// A missing file, unreadable bytes, or a malformed document all yield the
/// empty sequence. Downstream logic cannot tell these apart from a screen
/// with no text — an accepted ambiguity of the design, pinned by the tests
/// below.
pub fn extract_texts(path: &Path) -> Vec<String> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };

    let doc = match roxmltree::Document::parse(&raw) {
        Ok(doc) => doc,
        Err(_) => return Vec::new(),
    };

    doc.descendants()
        .filter_map(|node| node.attribute("text"))
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_attributes_are_dropped() {
        let file = write_fixture(
            r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
  <node text="A" class="android.widget.TextView"/>
  <node text="" class="android.widget.FrameLayout"/>
  <node text="发送消息给黍" class="android.widget.TextView"/>
</hierarchy>"#,
        );
        let texts = extract_texts(file.path());
        assert_eq!(texts, vec!["A", "发送消息给黍"]);

        // The empty fragment must not shift marker adjacency: the reply for
        // 黍 is the fragment before the marker in the FILTERED sequence.
        use crate::correlate::{AdjacentText, CorrelationStrategy, MarkerMatch};
        assert_eq!(
            AdjacentText.find_reply(&texts, "黍"),
            MarkerMatch::Found("A".to_string())
        );
    }

    #[test]
    fn whitespace_only_text_is_dropped_and_rest_trimmed() {
        let file = write_fixture(
            r#"<hierarchy><node text="  hello  "/><node text="   "/></hierarchy>"#,
        );
        assert_eq!(extract_texts(file.path()), vec!["hello"]);
    }

    #[test]
    fn nested_nodes_come_out_in_document_order() {
        let file = write_fixture(
            r#"<hierarchy>
  <node text="first"><node text="second"/></node>
  <node text="third"/>
</hierarchy>"#,
        );
        assert_eq!(extract_texts(file.path()), vec!["first", "second", "third"]);
    }

    // Malformed input and a missing file are indistinguishable from a blank
    // screen. That is the designed behavior, not an oversight.
    #[test]
    fn malformed_document_yields_empty_sequence() {
        let file = write_fixture("<hierarchy><node text=\"A\"");
        assert!(extract_texts(file.path()).is_empty());
    }

    #[test]
    fn missing_file_yields_empty_sequence() {
        assert!(extract_texts(Path::new("/nonexistent/ui_dump.xml")).is_empty());
    }
}
