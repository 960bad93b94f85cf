use serde_json::{json, Value};

/// Wrap plain text as a single-paragraph Atlassian Document Format document.
pub fn paragraph_document(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }]
        }]
    })
}

/// Text nodes of the document's top-level paragraphs, in order.
///
/// Returns `None` when the value is not a document with a `content` array.
/// Non-paragraph blocks (tables, code blocks, panels) are skipped.
pub fn paragraph_texts(doc: &Value) -> Option<Vec<String>> {
    let blocks = doc.get("content")?.as_array()?;
    let texts = blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("paragraph"))
        .filter_map(|block| block.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|node| node.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|node| node.get("text").and_then(Value::as_str))
        .map(String::from)
        .collect();
    Some(texts)
}

/// Extract plain text from any ADF node, walking nested content.
///
/// Comment bodies go through this deep walk, so text inside lists or quotes
/// still shows up. Descriptions use `paragraph_texts`, which reports
/// non-paragraph layouts as complex content instead.
pub fn extract_text_from_adf(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(arr) => {
            let parts: Vec<String> = arr.iter().filter_map(extract_text_from_adf).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        Value::Object(obj) => {
            if obj.get("type").and_then(|v| v.as_str()) == Some("text") {
                return obj.get("text").and_then(|v| v.as_str()).map(String::from);
            }
            if let Some(content) = obj.get("content") {
                return extract_text_from_adf(content);
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_document_has_exact_shape() {
        let doc = paragraph_document("hello");
        assert_eq!(
            doc,
            json!({
                "type": "doc",
                "version": 1,
                "content": [{"type": "paragraph", "content": [{"type": "text", "text": "hello"}]}]
            })
        );
    }

    #[test]
    fn paragraph_texts_skips_other_blocks() {
        let doc = json!({
            "type": "doc",
            "version": 1,
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "one"}, {"type": "hardBreak"}]},
                {"type": "codeBlock", "content": [{"type": "text", "text": "let x = 1;"}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "two"}]}
            ]
        });
        assert_eq!(paragraph_texts(&doc).unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn paragraph_texts_rejects_non_documents() {
        assert!(paragraph_texts(&json!("plain")).is_none());
        assert!(paragraph_texts(&json!({"type": "doc"})).is_none());
        assert_eq!(
            paragraph_texts(&json!({"content": [{"type": "table"}]})).unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn extract_walks_nested_content() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "bulletList", "content": [
                    {"type": "listItem", "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "deep"}]}
                    ]}
                ]},
                {"type": "paragraph", "content": [{"type": "text", "text": "shallow"}]}
            ]
        });
        assert_eq!(extract_text_from_adf(&doc).unwrap(), "deep shallow");
        assert_eq!(extract_text_from_adf(&Value::Null), None);
    }
}
