//! Section types for component documents.

use smol_str::SmolStr;
use source_map::Span;

/// A component document split into its sections.
///
/// Markup outside the sections is not modelled; preprocessing only ever
/// replaces section content and copies everything else verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentDocument {
    /// The module-level script (`<script context="module">`).
    pub module_script: Option<Section>,
    /// The instance script (`<script>`).
    pub instance_script: Option<Section>,
    /// The style block (`<style>`).
    pub style: Option<Section>,
}

impl ComponentDocument {
    /// Returns every section in document order.
    pub fn sections(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = [&self.module_script, &self.instance_script, &self.style]
            .into_iter()
            .flatten()
            .collect();
        sections.sort_by_key(|section| section.span.start);
        sections
    }
}

/// Which kind of element a section is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionKind {
    Script,
    Style,
}

/// A top-level `<script>` or `<style>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    /// The span of the entire element including tags.
    pub span: Span,
    /// The span of just the content.
    pub content_span: Span,
    /// The raw content.
    pub content: String,
    /// Attributes on the opening tag, in source order.
    pub attributes: Vec<Attribute>,
}

impl Section {
    /// Returns the first attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Returns the text value of an attribute, if present with a value.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|attr| attr.value.as_deref())
    }

    /// The `lang` attribute, falling back to a `type` of `text/<lang>`.
    pub fn lang(&self) -> Option<&str> {
        self.attribute_value("lang").or_else(|| {
            self.attribute_value("type")
                .map(|ty| ty.strip_prefix("text/").unwrap_or(ty))
        })
    }

    /// Returns the script context.
    pub fn context(&self) -> ScriptContext {
        if self.attribute_value("context") == Some("module") || self.attribute("module").is_some()
        {
            ScriptContext::Module
        } else {
            ScriptContext::Default
        }
    }
}

/// An attribute on a section's opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub span: Span,
    pub name: SmolStr,
    /// `None` for boolean attributes (`<script module>`); expression values
    /// keep their braces.
    pub value: Option<SmolStr>,
}

/// The context of a script block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScriptContext {
    /// Default instance context.
    #[default]
    Default,
    /// Module context (`context="module"` or bare `module`).
    Module,
}

/// The page region a markup-only document contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HtmlSectionKind {
    Head,
    Body,
}

impl HtmlSectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtmlSectionKind::Head => "head",
            HtmlSectionKind::Body => "body",
        }
    }
}

/// The trimmed inner HTML of a top-level `<head>` or `<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HtmlSection {
    pub section: HtmlSectionKind,
    pub data: String,
}

/// The result of document-type detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    /// A component to run through the pipeline.
    Component(ComponentDocument),
    /// A plain HTML file contributing head/body markup; never compiled.
    Markup(Vec<HtmlSection>),
}
