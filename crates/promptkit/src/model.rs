//! # Domain Model: Prompts, Templates and Versions
//!
//! This module defines the artifacts promptkit manages: [`Prompt`], [`Template`]
//! (with its ordered [`Slot`]s) and the [`Version`] number that orders the edit
//! history of a prompt.
//!
//! ## Artifacts on Disk
//!
//! Every artifact is a single text file: a YAML metadata block fenced by `---`
//! lines, followed by the free-form body. See [`crate::codec`] for the exact
//! format. The model types are the decoded view of those files; the mapping
//! between the two lives here ([`Prompt::from_document`], [`Prompt::to_header`]).
//!
//! ## Ownership of Fields
//!
//! Callers own the descriptive fields (`id`, `name`, `summary`, `tags`, `content`, ...).
//! The store owns the bookkeeping fields:
//! - `file_path`: assigned on save, storage-relative with `/` separators.
//! - `content_hash`: SHA-256 of the raw file bytes, computed on load.
//! - `created_at`/`updated_at`: stamped on save.
//! - `version`: bumped on save when the caller left it unchanged.
//!
//! ## Lazy Bodies
//!
//! Listings served from the metadata cache carry no body. Such prompts report
//! `is_hydrated() == false` until [`crate::store::PromptStore::hydrate`] fills
//! them in, and the store refuses to save them in that state.
//!
//! ## Unknown Metadata
//!
//! Keys the decoder does not recognize are kept in `extra`, in file order, and
//! written back untouched. A file written by a newer release therefore survives
//! being edited by an older one.

use crate::codec::{Document, Header};
use crate::error::{PromptError, Result};
use crate::query::TagSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Collection a prompt belongs to when none is given.
pub const DEFAULT_PACK: &str = "personal";

/// A `MAJOR.MINOR.PATCH` version number.
///
/// Parsing is lenient about the surface form (`v1.2`, `3`) but always
/// renders the full three-component form. A semver pre-release or build
/// suffix (`1.0.0-beta`, `1.0.0+ci.7`) is accepted and dropped, so it does
/// not survive a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The next patch version, or None if the patch is already `u64::MAX`.
    pub fn bump_patch(&self) -> Option<Self> {
        Some(Self {
            patch: self.patch.checked_add(1)?,
            ..*self
        })
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PromptError::MalformedArtifact(format!("invalid version '{}'", s));
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let digits = digits.split(['-', '+']).next().unwrap_or(digits);
        if digits.is_empty() {
            return Err(invalid());
        }

        let mut parts = [0u64; 3];
        let mut count = 0;
        for component in digits.split('.') {
            if count == 3 {
                return Err(invalid());
            }
            parts[count] = component.parse().map_err(|_| invalid())?;
            count += 1;
        }

        Ok(Version::new(parts[0], parts[1], parts[2]))
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

// YAML happily types `version: 1.2` as a float and `version: 2` as an integer,
// so accept any scalar and go through the string form.
impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct VersionVisitor;

        impl serde::de::Visitor<'_> for VersionVisitor {
            type Value = Version;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a version such as 1.0.0")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<Version, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<Version, E> {
                Ok(Version::new(v, 0, 0))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<Version, E> {
                u64::try_from(v)
                    .map(|major| Version::new(major, 0, 0))
                    .map_err(|_| E::custom(format!("negative version {}", v)))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<Version, E> {
                v.to_string().parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(VersionVisitor)
    }
}

/// A prompt artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prompt {
    pub id: String,
    pub version: Version,
    pub name: String,
    pub summary: String,
    /// Display-preserving; matching folds case (see [`Prompt::tag_set`]).
    pub tags: Vec<String>,
    pub template_ref: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_path: Option<String>,
    pub content_hash: Option<String>,
    pub pack: String,
    #[serde(skip_serializing_if = "serde_yaml::Mapping::is_empty")]
    pub extra: serde_yaml::Mapping,
    #[serde(skip)]
    pub(crate) hydrated: bool,
}

impl Prompt {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            version: Version::default(),
            name: name.into(),
            summary: String::new(),
            tags: Vec::new(),
            template_ref: None,
            content: content.into(),
            created_at: now,
            updated_at: now,
            file_path: None,
            content_hash: None,
            pack: DEFAULT_PACK.to_string(),
            extra: serde_yaml::Mapping::new(),
            hydrated: true,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets tags, dropping case-insensitive duplicates (first spelling wins).
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.clear();
        for tag in tags {
            self.add_tag(tag);
        }
        self
    }

    pub fn with_pack(mut self, pack: impl Into<String>) -> Self {
        self.pack = pack.into();
        self
    }

    pub fn with_template(mut self, template_id: impl Into<String>) -> Self {
        self.template_ref = Some(template_id.into());
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Adds a tag unless an equal tag (ignoring case) is already present.
    /// Returns whether the tag was added.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into().trim().to_string();
        if tag.is_empty() || self.has_tag(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.trim().to_lowercase() == needle)
    }

    /// Case-folded tag set used by query evaluation.
    pub fn tag_set(&self) -> TagSet {
        self.tags.iter().collect()
    }

    /// False for prompts served from the metadata cache without a body.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Builds a prompt from a decoded artifact. A missing id falls back to the
    /// file stem so hand-written files without an `id:` line still list. A
    /// missing pack falls back to the directory under `prompts/`, then to
    /// [`DEFAULT_PACK`].
    pub(crate) fn from_document(doc: Document, file_path: &str, hash: String) -> Self {
        let Document { header, body } = doc;
        let now = Utc::now();
        let id = if header.id.is_empty() {
            file_stem(file_path)
        } else {
            header.id
        };
        let created_at = header.created_at.or(header.updated_at).unwrap_or(now);

        Self {
            id,
            version: header.version.unwrap_or_default(),
            name: header.title,
            summary: header.description,
            tags: header.tags,
            template_ref: header.template,
            content: body,
            created_at,
            updated_at: header.updated_at.unwrap_or(created_at),
            file_path: Some(file_path.to_string()),
            content_hash: Some(hash),
            pack: header
                .pack
                .or_else(|| pack_from_path(file_path))
                .unwrap_or_else(|| DEFAULT_PACK.to_string()),
            extra: header.extra,
            hydrated: true,
        }
    }

    pub(crate) fn to_header(&self) -> Header {
        Header {
            id: self.id.clone(),
            version: Some(self.version),
            title: self.name.clone(),
            description: self.summary.clone(),
            tags: self.tags.clone(),
            variables: Vec::new(),
            template: self.template_ref.clone(),
            pack: Some(self.pack.clone()),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
            extra: self.extra.clone(),
        }
    }
}

/// A named placeholder in a template body, written as `{{name}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Slot {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: Option<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: false,
            default,
        }
    }
}

/// A template artifact. Slot order is for display only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub id: String,
    pub version: Version,
    pub name: String,
    pub description: String,
    pub slots: Vec<Slot>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "serde_yaml::Mapping::is_empty")]
    pub extra: serde_yaml::Mapping,
}

impl Template {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            version: Version::default(),
            name: name.into(),
            description: String::new(),
            slots: Vec::new(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            file_path: None,
            extra: serde_yaml::Mapping::new(),
        }
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Substitutes `{{name}}` placeholders (inner whitespace allowed).
    ///
    /// Values come from `values`, then from the slot default. A required slot
    /// with neither fails with [`PromptError::MissingSlot`]; an optional slot
    /// with neither renders empty. Placeholders naming neither a slot nor a
    /// supplied value are left as written.
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String> {
        let mut resolved: HashMap<&str, &str> = values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        for slot in &self.slots {
            if resolved.contains_key(slot.name.as_str()) {
                continue;
            }
            match (&slot.default, slot.required) {
                (Some(default), _) => {
                    resolved.insert(&slot.name, default);
                }
                (None, true) => {
                    return Err(PromptError::MissingSlot {
                        template: self.id.clone(),
                        slot: slot.name.clone(),
                    })
                }
                (None, false) => {
                    resolved.insert(&slot.name, "");
                }
            }
        }

        let mut out = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let placeholder = &rest[start..start + 2 + end + 2];
            match resolved.get(after[..end].trim()) {
                Some(value) => out.push_str(value),
                None => out.push_str(placeholder),
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        Ok(out)
    }

    pub(crate) fn from_document(doc: Document, file_path: &str) -> Self {
        let Document { header, body } = doc;
        let now = Utc::now();
        let id = if header.id.is_empty() {
            file_stem(file_path)
        } else {
            header.id
        };
        let created_at = header.created_at.or(header.updated_at).unwrap_or(now);

        Self {
            id,
            version: header.version.unwrap_or_default(),
            name: header.title,
            description: header.description,
            slots: header.variables,
            content: body,
            created_at,
            updated_at: header.updated_at.unwrap_or(created_at),
            file_path: Some(file_path.to_string()),
            extra: header.extra,
        }
    }

    pub(crate) fn to_header(&self) -> Header {
        Header {
            id: self.id.clone(),
            version: Some(self.version),
            title: self.name.clone(),
            description: self.description.clone(),
            tags: Vec::new(),
            variables: self.slots.clone(),
            template: None,
            pack: None,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
            extra: self.extra.clone(),
        }
    }
}

/// `work` for `prompts/work/x.md`; None for anything not directly in a pack.
fn pack_from_path(file_path: &str) -> Option<String> {
    let mut parts = file_path.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(crate::store::PROMPTS_DIR), Some(pack), Some(_), None) if !pack.is_empty() => {
            Some(pack.to_string())
        }
        _ => None,
    }
}

fn file_stem(file_path: &str) -> String {
    let name = file_path.rsplit('/').next().unwrap_or(file_path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse_full() {
        let v: Version = "1.2.3".parse().unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
        assert_eq!(v.to_string(), "1.2.3");
    }

    #[test]
    fn test_version_parse_lenient_forms() {
        assert_eq!("v2".parse::<Version>().unwrap(), Version::new(2, 0, 0));
        assert_eq!("1.4".parse::<Version>().unwrap(), Version::new(1, 4, 0));
        assert_eq!(" V0.1.9 ".parse::<Version>().unwrap(), Version::new(0, 1, 9));
    }

    #[test]
    fn test_version_parse_rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
        assert!("one".parse::<Version>().is_err());
        assert!("1..2".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_ordering_is_numeric() {
        let a: Version = "1.0.9".parse().unwrap();
        let b: Version = "1.0.10".parse().unwrap();
        assert!(a < b);
        assert!(Version::new(2, 0, 0) > Version::new(1, 99, 99));
    }

    #[test]
    fn test_bump_patch() {
        assert_eq!(
            Version::new(1, 0, 0).bump_patch(),
            Some(Version::new(1, 0, 1))
        );
        assert_eq!(Version::new(1, 2, u64::MAX).bump_patch(), None);
    }

    #[test]
    fn test_version_parse_ignores_semver_suffix() {
        assert_eq!(
            "1.0.0-beta".parse::<Version>().unwrap(),
            Version::new(1, 0, 0)
        );
        assert_eq!(
            "v2.1.3+ci.7".parse::<Version>().unwrap(),
            Version::new(2, 1, 3)
        );
        assert_eq!(
            "1.2.0-rc.1+build".parse::<Version>().unwrap(),
            Version::new(1, 2, 0)
        );
        assert!("-beta".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_deserializes_yaml_scalars() {
        let v: Version = serde_yaml::from_str("1.5").unwrap();
        assert_eq!(v, Version::new(1, 5, 0));
        let v: Version = serde_yaml::from_str("3").unwrap();
        assert_eq!(v, Version::new(3, 0, 0));
        let v: Version = serde_yaml::from_str("\"2.0.1\"").unwrap();
        assert_eq!(v, Version::new(2, 0, 1));
    }

    #[test]
    fn test_prompt_defaults() {
        let p = Prompt::new("p1", "First", "Body");
        assert_eq!(p.version, Version::new(1, 0, 0));
        assert_eq!(p.pack, DEFAULT_PACK);
        assert!(p.is_hydrated());
        assert!(p.file_path.is_none());
    }

    #[test]
    fn test_tags_dedupe_case_insensitively() {
        let p = Prompt::new("p1", "First", "").with_tags(["AI", "ai", "Writing", " writing "]);
        assert_eq!(p.tags, vec!["AI", "Writing"]);
        assert!(p.has_tag("ai"));
        assert!(p.has_tag("WRITING"));
        assert!(!p.has_tag("analysis"));
    }

    #[test]
    fn test_pack_from_path() {
        assert_eq!(pack_from_path("prompts/work/x.md").as_deref(), Some("work"));
        assert_eq!(pack_from_path("prompts/x.md"), None);
        assert_eq!(pack_from_path("prompts/work/nested/x.md"), None);
        assert_eq!(pack_from_path("archive/prompts/work/x@1.0.0.md"), None);
    }

    #[test]
    fn test_from_document_takes_pack_from_directory() {
        let doc = crate::codec::parse_str("---\nid: x\n---\nbody\n").unwrap();
        let p = Prompt::from_document(doc, "prompts/work/x.md", String::new());
        assert_eq!(p.pack, "work");

        let doc = crate::codec::parse_str("---\nid: x\npack: team\n---\nbody\n").unwrap();
        let p = Prompt::from_document(doc, "prompts/work/x.md", String::new());
        assert_eq!(p.pack, "team");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("prompts/personal/p1.md"), "p1");
        assert_eq!(file_stem("p1"), "p1");
        assert_eq!(file_stem("archive/prompts/x/p1@1.0.0.md"), "p1@1.0.0");
    }

    fn greeting() -> Template {
        Template::new("greet", "Greeting", "Hello {{ name }}, welcome to {{place}}!{{sig}}")
            .with_slot(Slot::required("name"))
            .with_slot(Slot::optional("place", Some("the team".to_string())))
            .with_slot(Slot::optional("sig", None))
    }

    #[test]
    fn test_render_uses_values_and_defaults() {
        let mut values = HashMap::new();
        values.insert("name".to_string(), "Ada".to_string());
        let out = greeting().render(&values).unwrap();
        assert_eq!(out, "Hello Ada, welcome to the team!");
    }

    #[test]
    fn test_render_missing_required_slot() {
        let err = greeting().render(&HashMap::new()).unwrap_err();
        match err {
            PromptError::MissingSlot { template, slot } => {
                assert_eq!(template, "greet");
                assert_eq!(slot, "name");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let t = Template::new("t", "T", "{{known}} and {{unknown}} and {{unterminated");
        let mut values = HashMap::new();
        values.insert("known".to_string(), "yes".to_string());
        assert_eq!(
            t.render(&values).unwrap(),
            "yes and {{unknown}} and {{unterminated"
        );
    }
}
