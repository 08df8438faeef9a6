//! Style templates: pulling a prompt skeleton out of a markdown style document
//! and merging subjects into it.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::constants::SUBJECT_PLACEHOLDER;
use crate::error::GemimgError;

/// A header line naming a (Prompt) Template, `#` marker optional, then the
/// first fenced block after it.
#[allow(clippy::expect_used)] // literal pattern
static TEMPLATE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:prompt[ \t]*)?template[^\n]*\n+(?:[^\n]*\n)*?[ \t]*```[^\n]*\n((?s:.*?))```",
    )
    .expect("template block pattern")
});

#[allow(clippy::expect_used)] // literal pattern
static PLACEHOLDER_SPELLINGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[YOUR SUBJECT[^\]]*\]|\[SUBJECT\]|\{subject\}")
        .expect("placeholder pattern")
});

/// A prompt skeleton with at most one kind of insertion point, `{subject}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StyleTemplate(String);

impl StyleTemplate {
    /// Parses a style document, naming `source` in the error when no template is found.
    pub fn parse(document: &str, source: &Path) -> Result<Self, GemimgError> {
        extract_template(document).ok_or_else(|| GemimgError::TemplateNotFound(source.into()))
    }

    /// The normalized template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the template carries the canonical placeholder.
    pub fn has_placeholder(&self) -> bool {
        self.0.contains(SUBJECT_PLACEHOLDER)
    }

    /// Builds the final prompt for one subject.
    ///
    /// Without a placeholder the subject is prepended as its own sentence and the
    /// template is kept verbatim.
    pub fn compose(&self, subject: &str) -> Result<String, GemimgError> {
        if self.has_placeholder() {
            substitute_subject(&self.0, subject)
        } else {
            Ok(format!("{subject}. {}", self.0))
        }
    }
}

impl From<&str> for StyleTemplate {
    /// Wraps already-extracted template text, normalizing its placeholders.
    fn from(text: &str) -> Self {
        Self(normalize_placeholders(text))
    }
}

/// Finds the first template block in a style document.
pub fn extract_template(document: &str) -> Option<StyleTemplate> {
    let captures = TEMPLATE_BLOCK.captures(document)?;
    let body = captures.get(1)?.as_str().trim();
    Some(StyleTemplate::from(body))
}

/// Rewrites `[YOUR SUBJECT ...]`, `[SUBJECT]` and `{subject}` (any case) to `{subject}`.
pub fn normalize_placeholders(text: &str) -> String {
    PLACEHOLDER_SPELLINGS
        .replace_all(text, SUBJECT_PLACEHOLDER)
        .into_owned()
}

/// Reads and parses a style document from disk.
pub fn load_style_template(path: &Path) -> Result<StyleTemplate, GemimgError> {
    if !path.exists() {
        return Err(GemimgError::StyleNotFound(path.to_path_buf()));
    }
    let document = std::fs::read_to_string(path)?;
    let template = StyleTemplate::parse(&document, path)?;
    debug!(
        "Loaded template from {} ({} chars, placeholder: {})",
        path.display(),
        template.as_str().len(),
        template.has_placeholder()
    );
    Ok(template)
}

/// Treats the template as a format string with a single named field.
///
/// `{{` and `}}` are literal braces. Any other field, a stray `}` or an
/// unterminated `{` is rejected.
fn substitute_subject(template: &str, subject: &str) -> Result<String, GemimgError> {
    let mut rendered = String::with_capacity(template.len() + subject.len());
    let mut rest = template;
    let mut inserted = 0usize;

    while let Some(pos) = rest.find(['{', '}']) {
        rendered.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            rendered.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            rendered.push('}');
            rest = after;
        } else if tail.starts_with('}') {
            return Err(GemimgError::MalformedTemplate(
                "single '}' encountered in template".to_string(),
            ));
        } else {
            let Some(end) = tail.find('}') else {
                return Err(GemimgError::MalformedTemplate(
                    "unterminated '{' in template".to_string(),
                ));
            };
            let field = &tail[1..end];
            if field != "subject" {
                return Err(GemimgError::MalformedTemplate(format!(
                    "unsupported field '{{{field}}}'; only {SUBJECT_PLACEHOLDER} is allowed"
                )));
            }
            rendered.push_str(subject);
            inserted += 1;
            rest = &tail[end + 1..];
        }
    }
    rendered.push_str(rest);

    if inserted == 0 {
        return Err(GemimgError::MalformedTemplate(format!(
            "{SUBJECT_PLACEHOLDER} only appears escaped, the subject would be dropped"
        )));
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLE_DOC: &str = "# Purple Glass 3D\n\nGlossy translucent icons.\n\n## Prompt Template\n\nUse this with any subject:\n\n```text\n  A {subject} rendered in purple glass, soft studio light.  \n```\n\n## Examples\n";

    #[test]
    fn extracts_block_after_prose() {
        let template = extract_template(STYLE_DOC).expect("template");
        assert_eq!(
            template.as_str(),
            "A {subject} rendered in purple glass, soft studio light."
        );
    }

    #[test]
    fn extracts_block_directly_after_header() {
        let doc = "### template\n```\nneon {subject}\n```\n";
        let template = extract_template(doc).expect("template");
        assert_eq!(template.as_str(), "neon {subject}");
    }

    #[test]
    fn first_template_header_wins() {
        let doc = "## Template\n```\nfirst {subject}\n```\n\n## Prompt Template\n```\nsecond\n```\n";
        let template = extract_template(doc).expect("template");
        assert_eq!(template.as_str(), "first {subject}");
    }

    #[test]
    fn hash_inside_prose_is_not_a_header() {
        let doc = "# Notes\n\nWorks like C# templates do.\n\n```\nnot the template\n```\n\n## Prompt Template\n\n```\nreal {subject}\n```\n";
        let template = extract_template(doc).expect("template");
        assert_eq!(template.as_str(), "real {subject}");
    }

    #[test]
    fn header_marker_is_optional() {
        let doc = "Prompt Template\n\n```\nbare {subject}\n```\n";
        let template = extract_template(doc).expect("template");
        assert_eq!(template.as_str(), "bare {subject}");
    }

    #[test]
    fn missing_header_is_template_not_found() {
        let doc = "# Style\n\nJust prose.\n\n```\nnot a template {subject}\n```\n";
        assert!(extract_template(doc).is_none());
        let err = StyleTemplate::parse(doc, Path::new("style.md")).expect_err("no template");
        assert!(matches!(err, GemimgError::TemplateNotFound(_)));
    }

    #[test]
    fn header_without_code_block_is_not_found() {
        assert!(extract_template("## Prompt Template\n\nno fence here\n").is_none());
    }

    #[test]
    fn placeholder_spellings_normalize() {
        for spelling in [
            "[YOUR SUBJECT HERE]",
            "[your subject, e.g. a rocket]",
            "[SUBJECT]",
            "[Subject]",
            "{subject}",
            "{SUBJECT}",
        ] {
            assert_eq!(
                normalize_placeholders(&format!("a {spelling} icon")),
                "a {subject} icon",
                "spelling {spelling}"
            );
        }
    }

    #[test]
    fn extraction_normalizes_placeholders() {
        let doc = "## Prompt Template\n```\nA [YOUR SUBJECT - keep it short] on black\n```\n";
        let template = extract_template(doc).expect("template");
        assert_eq!(template.as_str(), "A {subject} on black");
    }

    #[test]
    fn compose_substitutes_at_placeholder() {
        let template = StyleTemplate::from("Minimal {subject} on a white background");
        let prompt = template.compose("gear icon").expect("compose");
        assert_eq!(prompt, "Minimal gear icon on a white background");
        assert_eq!(prompt.matches("gear icon").count(), 1);
        assert!(!prompt.contains(SUBJECT_PLACEHOLDER));
    }

    #[test]
    fn compose_without_placeholder_prepends_subject() {
        let template = StyleTemplate::from("Glossy render, {{literal}} braces kept");
        let prompt = template.compose("cube").expect("compose");
        assert_eq!(prompt, "cube. Glossy render, {{literal}} braces kept");
    }

    #[test]
    fn compose_honors_escaped_braces() {
        let template = StyleTemplate::from("{subject} with {{json}} label");
        assert_eq!(
            template.compose("cube").expect("compose"),
            "cube with {json} label"
        );
    }

    #[test]
    fn compose_rejects_only_escaped_placeholder() {
        let template = StyleTemplate::from("A {{subject}} icon");
        let err = template.compose("gear").expect_err("subject dropped");
        assert!(matches!(err, GemimgError::MalformedTemplate(_)));
    }

    #[test]
    fn compose_rejects_foreign_fields() {
        for text in [
            "{subject} in {color}",
            "{subject} and {}",
            "{subject} }",
            "{subject} {unterminated",
        ] {
            let err = StyleTemplate::from(text)
                .compose("cube")
                .expect_err("malformed");
            assert!(
                matches!(err, GemimgError::MalformedTemplate(_)),
                "template {text}"
            );
        }
    }

    #[test]
    fn load_reports_missing_style() {
        let err = load_style_template(Path::new("/definitely/not/here/style.md"))
            .expect_err("missing");
        assert!(matches!(err, GemimgError::StyleNotFound(_)));
        assert!(err.is_configuration());
    }

    #[test]
    fn load_reads_style_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("purple_glass_3d.md");
        std::fs::write(&path, STYLE_DOC).expect("write style");
        let template = load_style_template(&path).expect("load");
        assert!(template.has_placeholder());
    }
}
