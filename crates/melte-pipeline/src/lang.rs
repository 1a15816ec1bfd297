//! Section languages.
//!
//! A section's `lang` attribute is resolved once into one of these variants;
//! every later decision (rewrite syntax, which sub-transformer runs) matches
//! on the variant.

use melte_transformer::ScriptSyntax;
use serde::Serialize;

/// The language of a script section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLang {
    /// Plain JavaScript; no sub-transform.
    #[default]
    JavaScript,
    TypeScript,
    CoffeeScript,
}

impl ScriptLang {
    /// Resolves a `lang` attribute value. Unknown values are JavaScript.
    pub fn from_attribute(lang: Option<&str>) -> Self {
        match lang {
            Some("ts" | "typescript") => ScriptLang::TypeScript,
            Some("coffee" | "coffeescript") => ScriptLang::CoffeeScript,
            _ => ScriptLang::JavaScript,
        }
    }

    /// The syntax the reactive rewrite parses with, if it can parse this
    /// language at all.
    pub fn rewrite_syntax(self) -> Option<ScriptSyntax> {
        match self {
            ScriptLang::JavaScript => Some(ScriptSyntax::JavaScript),
            ScriptLang::TypeScript => Some(ScriptSyntax::TypeScript),
            ScriptLang::CoffeeScript => None,
        }
    }

    pub fn needs_transform(self) -> bool {
        self != ScriptLang::JavaScript
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptLang::JavaScript => "javascript",
            ScriptLang::TypeScript => "typescript",
            ScriptLang::CoffeeScript => "coffeescript",
        }
    }
}

/// The language of a style section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleLang {
    /// Plain CSS; no sub-transform.
    #[default]
    Css,
    Postcss,
    Less,
    Scss,
    Sass,
}

impl StyleLang {
    /// Resolves a `lang` attribute value. Unknown values are CSS.
    pub fn from_attribute(lang: Option<&str>) -> Self {
        match lang {
            Some("postcss" | "pcss") => StyleLang::Postcss,
            Some("less") => StyleLang::Less,
            Some("scss") => StyleLang::Scss,
            Some("sass") => StyleLang::Sass,
            _ => StyleLang::Css,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleLang::Css => "css",
            StyleLang::Postcss => "postcss",
            StyleLang::Less => "less",
            StyleLang::Scss => "scss",
            StyleLang::Sass => "sass",
        }
    }
}

/// The language of any section, as sent to the sub-transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "lang", rename_all = "lowercase")]
pub enum SectionLang {
    Script(ScriptLang),
    Style(StyleLang),
}
