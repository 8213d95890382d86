//! Rewrites that only make sense for a particular target language: JavaScript, SQL or HTML.

use crate::technique::{Category, Technique};
use regex::{Captures, Regex};
use rand_core::RngCore;
use std::sync::LazyLock;

const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "UNION", "INSERT", "UPDATE", "DELETE", "DROP",
    "TABLE",
];

static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)(\w+)").expect("tag name pattern is valid"));
static OPENING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\w+)").expect("opening tag pattern is valid"));

/// Wraps the payload in a backtick literal, escaping backticks and `${`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsTemplateLiteral;

impl Technique for JsTemplateLiteral {
    fn name(&self) -> &str {
        "js_template_literal"
    }

    fn category(&self) -> Category {
        Category::Context
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let escaped = payload.replace('`', "\\`").replace("${", "\\${");
        Ok(vec![format!("`{escaped}`")])
    }
}

/// `eval` of the payload as a string, and of the payload rebuilt from char codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsEvalWrap;

impl Technique for JsEvalWrap {
    fn name(&self) -> &str {
        "js_eval_wrap"
    }

    fn category(&self) -> Category {
        Category::Context
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let char_codes: Vec<String> = payload.chars().map(|c| (c as u32).to_string()).collect();
        Ok(vec![
            format!("eval(\"{payload}\")"),
            format!("eval(String.fromCharCode({}))", char_codes.join(",")),
        ])
    }
}

/// Replaces whitespace between words with inline SQL comments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlCommentInject;

impl Technique for SqlCommentInject {
    fn name(&self) -> &str {
        "sql_comment_inject"
    }

    fn category(&self) -> Category {
        Category::Context
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let words: Vec<&str> = payload.split_whitespace().collect();
        if words.len() < 2 {
            return Ok(Vec::new());
        }
        Ok(vec![words.join("/**/")])
    }
}

/// Breaks SQL keywords in half with an inline comment: `SEL/**/ECT`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlKeywordSplit;

impl Technique for SqlKeywordSplit {
    fn name(&self) -> &str {
        "sql_keyword_split"
    }

    fn category(&self) -> Category {
        Category::Context
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let words: Vec<String> = payload
            .split_whitespace()
            .map(|word| {
                let chars: Vec<char> = word.chars().collect();
                if chars.len() > 2 && SQL_KEYWORDS.contains(&word.to_uppercase().as_str()) {
                    let mid = chars.len() / 2;
                    let head: String = chars[..mid].iter().collect();
                    let tail: String = chars[mid..].iter().collect();
                    format!("{head}/**/{tail}")
                } else {
                    word.to_string()
                }
            })
            .collect();
        let joined = words.join(" ");
        if joined == payload {
            return Ok(Vec::new());
        }
        Ok(vec![joined])
    }
}

/// Swaps attribute quote styles and uppercases tag names.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlAttributeVariation;

impl Technique for HtmlAttributeVariation {
    fn name(&self) -> &str {
        "html_attr_variation"
    }

    fn category(&self) -> Category {
        Category::Context
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let mut variants = Vec::new();
        if payload.contains('\'') {
            variants.push(payload.replace('\'', "\""));
        }
        if payload.contains('"') {
            variants.push(payload.replace('"', "'"));
        }
        if payload.contains('<') {
            let upper_tags = TAG_NAME.replace_all(payload, |caps: &Captures| {
                format!("<{}{}", &caps[1], caps[2].to_uppercase())
            });
            variants.push(upper_tags.into_owned());
        }
        Ok(variants)
    }
}

/// Malformed but tolerated tag spellings: `< script` and `<script/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlTagMutation;

impl Technique for HtmlTagMutation {
    fn name(&self) -> &str {
        "html_tag_mutation"
    }

    fn category(&self) -> Category {
        Category::Context
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        if !payload.contains('<') {
            return Ok(Vec::new());
        }
        Ok(vec![
            OPENING_TAG.replace_all(payload, "< ${1}").into_owned(),
            OPENING_TAG.replace_all(payload, "<${1}/").into_owned(),
        ])
    }
}
