//! Docstring parsing and representation
//!
//! Documentation text attached to Puppet code objects follows YARD
//! conventions: free text followed by `@tag` lines such as
//! `@param [Integer] port The port to listen on.`, `@example`, `@api private`.
//! This module normalizes raw text ([`scrub`]) and splits it into the
//! description and its tags.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// A tag line: `@name` followed by optional content
    static ref TAG_REGEX: Regex = Regex::new(r"^@(!?[A-Za-z_][\w.]*)(?:[ \t]+(.*))?$").unwrap();

    /// First sentence of a description
    static ref SUMMARY_REGEX: Regex = Regex::new(r"(?s)^(.*?[.!?])(?:\s|$)").unwrap();
}

/// A documentation tag, e.g. `@param [String] name The name.`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag name without the `@` marker
    pub name: String,

    /// Free text of the tag
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,

    /// Name the tag is about (parameter name, example title...)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject: Option<String>,

    /// Types listed in brackets
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub types: Option<Vec<String>>,
}

impl Tag {
    /// Create a tag with optional text
    pub fn new(name: impl Into<String>, text: Option<String>) -> Self {
        Self {
            name: name.into(),
            text,
            subject: None,
            types: None,
        }
    }

    /// Set the subject
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the type list
    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.types = Some(types);
        self
    }

    /// Text of the tag, or "" when it has none
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Parsed documentation of a code object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Docstring {
    /// Description text (everything before the first tag)
    pub text: String,

    /// Tags in source order
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<Tag>,
}

impl Docstring {
    /// Create a new empty docstring
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from description text only, without looking for tags
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
        }
    }

    /// Scrub raw documentation text and split it into description and tags.
    ///
    /// A tag continues on the following lines indented deeper than the tag
    /// line. The first non-blank line that is not indented deeper ends the
    /// tag and goes back to the description.
    pub fn parse(raw: &str) -> Self {
        let scrubbed = scrub(raw);
        let mut description = Vec::new();
        let mut tags = Vec::new();
        let mut current: Option<PendingTag> = None;

        for line in scrubbed.lines() {
            if line.trim().is_empty() {
                match current.as_mut() {
                    Some(tag) => tag.blanks += 1,
                    None => description.push(""),
                }
                continue;
            }

            let indent = indentation(line);
            if let Some(caps) = TAG_REGEX.captures(&line[indent..]) {
                if let Some(tag) = current.take() {
                    tags.push(tag.finish());
                }
                current = Some(PendingTag {
                    name: caps[1].to_string(),
                    content: caps.get(2).map_or("", |m| m.as_str()),
                    rest: Vec::new(),
                    indent,
                    blanks: 0,
                });
                continue;
            }

            match current.take() {
                Some(mut tag) if indent > tag.indent => {
                    tag.rest.extend(std::iter::repeat("").take(tag.blanks));
                    tag.blanks = 0;
                    tag.rest.push(line);
                    current = Some(tag);
                }
                Some(tag) => {
                    description.extend(std::iter::repeat("").take(tag.blanks));
                    tags.push(tag.finish());
                    description.push(line);
                }
                None => description.push(line),
            }
        }
        if let Some(tag) = current {
            tags.push(tag.finish());
        }

        Self {
            text: description.join("\n").trim().to_string(),
            tags,
        }
    }

    /// Check if there is neither text nor tags
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tags.is_empty()
    }

    /// Description text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// First tag named `name`
    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// All tags named `name`
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |t| t.name == name)
    }

    /// Check for a tag named `name`
    pub fn has_tag(&self, name: &str) -> bool {
        self.tag(name).is_some()
    }

    /// Append a tag
    pub fn add_tag(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    /// Get all @param tags
    pub fn params(&self) -> impl Iterator<Item = &Tag> {
        self.tags_named("param")
    }

    /// Get the @param tag documenting `name`
    pub fn param(&self, name: &str) -> Option<&Tag> {
        self.params().find(|t| t.subject.as_deref() == Some(name))
    }

    /// Get all @example tags
    pub fn examples(&self) -> impl Iterator<Item = &Tag> {
        self.tags_named("example")
    }

    /// Value of the @api tag
    pub fn api(&self) -> Option<&str> {
        self.tag("api").map(Tag::text)
    }

    /// The @summary tag, or the first sentence of the description
    pub fn summary(&self) -> Option<String> {
        if let Some(tag) = self.tag("summary") {
            return Some(tag.text().to_string());
        }
        if self.text.is_empty() {
            return None;
        }
        let first = SUMMARY_REGEX
            .captures(&self.text)
            .and_then(|caps| caps.get(1))
            .map_or(self.text.as_str(), |m| m.as_str());
        Some(first.replace('\n', " "))
    }
}

/// Normalize raw documentation text.
///
/// A one-liner is trimmed. Multi-line text loses, on every line, at most the
/// indentation shared by its non-blank lines. A first line flush with the
/// opening quote (`desc "Summary.\n    Details."`) does not count towards
/// that indentation. Trailing whitespace and leading and trailing blank
/// lines are dropped too.
pub fn scrub(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.contains('\n') {
        return trimmed.to_string();
    }

    let mut lines = text.lines();
    let first = lines.next().filter(|line| indentation(line) > 0);
    let excess = first
        .into_iter()
        .chain(lines)
        .filter(|line| !line.trim().is_empty())
        .map(indentation)
        .min()
        .unwrap_or(0);

    let lines: Vec<&str> = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line[indentation(line).min(excess)..].trim_end()
            }
        })
        .collect();

    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

/// Byte length of the leading blanks of a line
fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// A tag whose continuation lines are still being collected
struct PendingTag<'a> {
    name: String,
    content: &'a str,
    rest: Vec<&'a str>,
    /// Indentation of the tag line
    indent: usize,
    /// Blank lines seen since the last continuation line
    blanks: usize,
}

impl PendingTag<'_> {
    fn finish(self) -> Tag {
        parse_single_tag(&self.name, self.content, &self.rest)
    }
}

/// Build a tag from its first line content and continuation lines
fn parse_single_tag(name: &str, content: &str, rest: &[&str]) -> Tag {
    if name == "example" {
        let title = content.trim();
        let body = scrub(&rest.join("\n"));
        let tag = Tag::new(name, non_empty(body));
        return if title.is_empty() {
            tag
        } else {
            tag.with_subject(title)
        };
    }

    let mut full = content.trim().to_string();
    for line in rest {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !full.is_empty() {
            full.push('\n');
        }
        full.push_str(line);
    }

    match name {
        "param" | "option" => parse_subject_tag(name, &full),
        "return" | "raise" | "yieldreturn" => {
            let (types, text) = extract_types(&full);
            let tag = Tag::new(name, non_empty(text.to_string()));
            match types {
                Some(types) => tag.with_types(types),
                None => tag,
            }
        }
        _ => Tag::new(name, non_empty(full)),
    }
}

/// Parse `[Types] name text` or `name [Types] text`
fn parse_subject_tag(name: &str, content: &str) -> Tag {
    let (mut types, rest) = extract_types(content);
    let (subject, rest) = split_first_word(rest);
    let text = if types.is_none() {
        let (after_types, text) = extract_types(rest);
        types = after_types;
        text
    } else {
        rest
    };

    let mut tag = Tag::new(name, non_empty(text.to_string()));
    if !subject.is_empty() {
        tag = tag.with_subject(subject);
    }
    if let Some(types) = types {
        tag = tag.with_types(types);
    }
    tag
}

/// Extract a `[Type, Type]` list at the start of content
fn extract_types(content: &str) -> (Option<Vec<String>>, &str) {
    if !content.starts_with('[') {
        return (None, content);
    }
    let mut depth = 0usize;
    for (i, c) in content.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    let types = split_types(&content[1..i]);
                    return (Some(types), content[i + 1..].trim_start());
                }
            }
            _ => {}
        }
    }
    (None, content)
}

/// Split a type list on top-level commas (`Hash[String, Integer], Undef`)
fn split_types(list: &str) -> Vec<String> {
    let mut types = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                types.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        types.push(current.trim().to_string());
    }
    types
}

fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim()),
        None => (s, ""),
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_string())
    }
}
