//! HTML-to-WhatsApp markup conversion for outgoing text.
//!
//! Collaborators hand over lightly formatted HTML. WhatsApp understands
//! `*bold*`, `_italic_` and plain line breaks, so tags are mapped where a
//! counterpart exists and stripped otherwise.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).expect("valid formatting pattern"),
        replacement,
    }
}

/// Whitespace normalization around tags.
static SPACING_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"&nbsp;", " "),
        rule(r"(?is)<br\s*/?>", "\n"),
        // " </x>" becomes "</x> "
        rule(r"(?is) (</[a-z]+>)", "${1} "),
        // "<x> " becomes " <x>"
        rule(r"(?is)(<[a-z]+(?:\s[^>]*)?>) ", " ${1}"),
        rule(r"(?is) \n", "\n"),
    ]
});

/// `<x ...>   </x>` with matching names; checked in code, the regex engine
/// has no backreferences.
static EMPTY_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<([a-z]+)(?:\s[^>]*)?>\s*</([a-z]+)>").expect("valid formatting pattern")
});

/// Tag-to-markup mappings and entity decoding.
static MARKUP_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"(?is)<strong(?:\s[^>]*)?>(.*?)</strong>", "*${1}*"),
        rule(r"(?is)<em(?:\s[^>]*)?>(.*?)</em>", "_${1}_"),
        rule(r"(?is)<i(?:\s[^>]*)?>(.*?)</i>", "_${1}_"),
        rule(r"(?is)<ul(?:\s[^>]*)?>(.*?)</ul>", "\n${1}\n"),
        rule(r"(?is)<li(?:\s[^>]*)?>(.*?)</li>", " - ${1}\n"),
        rule(r"&quot;", "\""),
        rule(r"&#39;", "'"),
        rule(r"&amp;", "&"),
        rule(r"&lt;", "<"),
        rule(r"&gt;", ">"),
        // Any remaining tag, including one cut off at the end
        rule(r"</?[^>]+(>|$)", ""),
        // Any remaining entity
        rule(r"&[^;]+;", ""),
    ]
});

fn apply(rules: &[Rule], text: String) -> String {
    rules.iter().fold(text, |acc, rule| {
        match rule.pattern.replace_all(&acc, rule.replacement) {
            Cow::Borrowed(_) => acc,
            Cow::Owned(replaced) => replaced,
        }
    })
}

/// Convert HTML-ish text to WhatsApp markup.
///
/// `"<strong>Hi</strong><br>there"` becomes `"*Hi*\nthere"`.
pub fn format_message(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let text = apply(&SPACING_RULES, input.to_string());

    let text = EMPTY_ELEMENT
        .replace_all(&text, |caps: &Captures| {
            if caps[1].eq_ignore_ascii_case(&caps[2]) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    apply(&MARKUP_RULES, text)
}
