//! # Artifact File Format
//!
//! Prompts and templates are stored as plain UTF-8 text with a YAML header:
//!
//! ```text
//! ---                      <-- opening delimiter (must be the first line)
//! id: code-review
//! version: 1.0.2
//! title: Code Review
//! tags: [dev, review]
//! ---                      <-- closing delimiter
//!                          <-- blank separator (written, stripped on read)
//! Review the following diff...
//! ```
//!
//! ## Parsing
//!
//! - Missing opening delimiter, missing closing delimiter, invalid UTF-8 or a
//!   header that is not a YAML mapping: [`PromptError::MalformedArtifact`].
//! - Leading blank lines of the body are dropped. Everything else in the body,
//!   internal blank lines and indentation included, is kept byte for byte.
//! - Header keys accept aliases (`name` for `title`, `summary` for
//!   `description`, `slots` for `variables`, `template_ref` for `template`).
//! - Unrecognized keys land in [`Header::extra`] in file order.
//!
//! ## Serializing
//!
//! Output is canonical: delimiters, canonical key names, unknown keys after the
//! known ones, one blank line, then the body with exactly one trailing newline.
//! Serializing a parsed canonical file reproduces it exactly, so repeated
//! load/save cycles are stable after the first save.

use crate::error::{PromptError, Result};
use crate::model::{Slot, Version};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const DELIMITER: &str = "---";

/// The decoded metadata block, shared by prompts and templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    #[serde(default, alias = "name", skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, alias = "summary", skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, alias = "slots", skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<Slot>,
    #[serde(default, alias = "template_ref", skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

/// A parsed artifact: header plus body text.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub header: Header,
    pub body: String,
}

/// Decodes raw artifact bytes.
pub fn parse(raw: &[u8]) -> Result<Document> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| PromptError::MalformedArtifact(format!("not valid UTF-8: {}", e)))?;
    parse_str(text)
}

pub fn parse_str(text: &str) -> Result<Document> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let (first, mut rest) = split_line(text);
    if !is_delimiter(first) {
        return Err(PromptError::MalformedArtifact(
            "missing opening '---' delimiter".to_string(),
        ));
    }

    let header_start = text.len() - rest.len();
    let mut header_end = None;
    while !rest.is_empty() {
        let offset = text.len() - rest.len();
        let (line, next) = split_line(rest);
        if is_delimiter(line) {
            header_end = Some((offset, next));
            break;
        }
        rest = next;
    }
    let Some((header_end, after)) = header_end else {
        return Err(PromptError::MalformedArtifact(
            "missing closing '---' delimiter".to_string(),
        ));
    };

    let block = &text[header_start..header_end];
    let header = if block.trim().is_empty() {
        Header::default()
    } else {
        serde_yaml::from_str(block)
            .map_err(|e| PromptError::MalformedArtifact(format!("invalid metadata: {}", e)))?
    };

    Ok(Document {
        header,
        body: trim_leading_blank_lines(after).to_string(),
    })
}

/// Encodes a header and body into canonical artifact text.
pub fn serialize(header: &Header, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(header)
        .map_err(|e| PromptError::Store(format!("failed to encode metadata: {}", e)))?;
    let body = trim_leading_blank_lines(body).trim_end();

    let mut out = String::with_capacity(yaml.len() + body.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    // An empty mapping encodes as `{}`; leave the block empty instead.
    if yaml.trim() != "{}" {
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push_str(DELIMITER);
    out.push('\n');
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    Ok(out)
}

/// Lowercase hex SHA-256 of raw bytes.
pub fn content_hash(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    format!("{:x}", hasher.finalize())
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == DELIMITER
}

/// Splits off the first line (without its terminator) from the rest.
fn split_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => (text, ""),
    }
}

fn trim_leading_blank_lines(text: &str) -> &str {
    let mut rest = text;
    loop {
        let (line, next) = split_line(rest);
        if rest.is_empty() || !line.trim().is_empty() {
            return rest;
        }
        rest = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "---\nid: p1\nversion: 1.0.0\ntitle: First\ntags:\n- ai\n---\n\nLine one\n\n  indented\n";

    #[test]
    fn test_parse_basic() {
        let doc = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.header.id, "p1");
        assert_eq!(doc.header.version, Some(Version::new(1, 0, 0)));
        assert_eq!(doc.header.title, "First");
        assert_eq!(doc.header.tags, vec!["ai"]);
        assert_eq!(doc.body, "Line one\n\n  indented\n");
    }

    #[test]
    fn test_parse_missing_opening_delimiter() {
        let err = parse(b"id: p1\n---\nbody").unwrap_err();
        assert!(matches!(err, PromptError::MalformedArtifact(_)));
    }

    #[test]
    fn test_parse_missing_closing_delimiter() {
        let err = parse(b"---\nid: p1\nbody without end").unwrap_err();
        assert!(matches!(err, PromptError::MalformedArtifact(_)));
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let err = parse(&[b'-', b'-', b'-', b'\n', 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, PromptError::MalformedArtifact(_)));
    }

    #[test]
    fn test_parse_rejects_non_mapping_header() {
        let err = parse(b"---\n- just\n- a list\n---\nbody").unwrap_err();
        assert!(matches!(err, PromptError::MalformedArtifact(_)));
    }

    #[test]
    fn test_parse_empty_header_and_body() {
        let doc = parse(b"---\n---\n").unwrap();
        assert_eq!(doc.header, Header::default());
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_parse_crlf_delimiters() {
        let doc = parse(b"---\r\nid: p1\r\n---\r\n\r\nBody\r\n").unwrap();
        assert_eq!(doc.header.id, "p1");
        assert_eq!(doc.body, "Body\r\n");
    }

    #[test]
    fn test_parse_accepts_aliases() {
        let raw = "---\nid: t1\nname: Named\nsummary: Short\nslots:\n- name: topic\n  required: true\ntemplate_ref: base\n---\nBody";
        let doc = parse_str(raw).unwrap();
        assert_eq!(doc.header.title, "Named");
        assert_eq!(doc.header.description, "Short");
        assert_eq!(doc.header.variables.len(), 1);
        assert!(doc.header.variables[0].required);
        assert_eq!(doc.header.template.as_deref(), Some("base"));
        assert!(doc.header.extra.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_preserved() {
        let raw = "---\nid: p1\nauthor: someone\nmodel:\n  name: big\n  temperature: 0.2\n---\n\nBody\n";
        let doc = parse_str(raw).unwrap();
        assert_eq!(doc.header.extra.len(), 2);

        let out = serialize(&doc.header, &doc.body).unwrap();
        assert!(out.contains("author: someone"));
        assert!(out.contains("temperature: 0.2"));

        let again = parse_str(&out).unwrap();
        assert_eq!(again.header.extra, doc.header.extra);
    }

    #[test]
    fn test_body_leading_blank_lines_trimmed_internal_kept() {
        let doc = parse_str("---\nid: p1\n---\n\n\n   \nfirst\n\n\nsecond   \n").unwrap();
        assert_eq!(doc.body, "first\n\n\nsecond   \n");
    }

    #[test]
    fn test_serialize_single_trailing_newline() {
        let header = Header {
            id: "p1".to_string(),
            ..Default::default()
        };
        let a = serialize(&header, "Body\n\n\n   ").unwrap();
        let b = serialize(&header, "Body").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "---\nid: p1\n---\n\nBody\n");
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let doc = parse_str("---\nname: X\nid: p1\nextra: 1\n---\nBody   \n\n").unwrap();
        let first = serialize(&doc.header, &doc.body).unwrap();
        let reparsed = parse_str(&first).unwrap();
        let second = serialize(&reparsed.header, &reparsed.body).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_serialize_empty_body() {
        let header = Header {
            id: "p1".to_string(),
            ..Default::default()
        };
        let out = serialize(&header, "\n\n").unwrap();
        assert_eq!(out, "---\nid: p1\n---\n");
        assert_eq!(parse_str(&out).unwrap().body, "");
    }

    #[test]
    fn test_content_hash_is_stable_hex() {
        let h = content_hash(b"abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(content_hash(b"abd"), h);
    }
}
