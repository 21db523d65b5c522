//! Structured rich text and its HTML serialization
//!
//! Output follows the conventions of Prismic's own `asHtml` serializer:
//! consecutive list items are grouped into `<ul>`/`<ol>`, line breaks inside a
//! block become `<br />`, and images are wrapped in `<p class="block-img">`.

use serde::{Deserialize, Serialize};

use crate::helpers::{escape_html, post_path, TrustedHtml};

/// One block of structured text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RichTextBlock {
    #[serde(rename = "paragraph")]
    Paragraph(TextBlock),
    #[serde(rename = "heading1")]
    Heading1(TextBlock),
    #[serde(rename = "heading2")]
    Heading2(TextBlock),
    #[serde(rename = "heading3")]
    Heading3(TextBlock),
    #[serde(rename = "heading4")]
    Heading4(TextBlock),
    #[serde(rename = "heading5")]
    Heading5(TextBlock),
    #[serde(rename = "heading6")]
    Heading6(TextBlock),
    #[serde(rename = "preformatted")]
    Preformatted(TextBlock),
    #[serde(rename = "list-item")]
    ListItem(TextBlock),
    #[serde(rename = "o-list-item")]
    OrderedListItem(TextBlock),
    #[serde(rename = "image")]
    Image(ImageBlock),
    #[serde(rename = "embed")]
    Embed(EmbedBlock),
    /// Block types this renderer does not know; skipped on output
    #[serde(other)]
    Unsupported,
}

impl RichTextBlock {
    /// Plain text of text-bearing blocks
    pub fn text(&self) -> Option<&str> {
        self.text_block().map(|b| b.text.as_str())
    }

    fn text_block(&self) -> Option<&TextBlock> {
        match self {
            RichTextBlock::Paragraph(b)
            | RichTextBlock::Heading1(b)
            | RichTextBlock::Heading2(b)
            | RichTextBlock::Heading3(b)
            | RichTextBlock::Heading4(b)
            | RichTextBlock::Heading5(b)
            | RichTextBlock::Heading6(b)
            | RichTextBlock::Preformatted(b)
            | RichTextBlock::ListItem(b)
            | RichTextBlock::OrderedListItem(b) => Some(b),
            _ => None,
        }
    }

    /// Convenience constructor used by loaders and tests
    pub fn paragraph(text: &str) -> Self {
        RichTextBlock::Paragraph(TextBlock {
            text: text.to_string(),
            spans: Vec::new(),
        })
    }
}

/// Text with inline formatting ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// Inline formatting over `[start, end)` in UTF-16 code units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Span {
    #[serde(rename = "strong")]
    Strong { start: usize, end: usize },
    #[serde(rename = "em")]
    Em { start: usize, end: usize },
    #[serde(rename = "hyperlink")]
    Hyperlink {
        start: usize,
        end: usize,
        data: LinkData,
    },
    #[serde(rename = "label")]
    Label {
        start: usize,
        end: usize,
        data: LabelData,
    },
    #[serde(other)]
    Unsupported,
}

impl Span {
    fn range(&self) -> Option<(usize, usize)> {
        match self {
            Span::Strong { start, end }
            | Span::Em { start, end }
            | Span::Hyperlink { start, end, .. }
            | Span::Label { start, end, .. } => Some((*start, *end)),
            Span::Unsupported => None,
        }
    }

    fn open_tag(&self) -> String {
        match self {
            Span::Strong { .. } => "<strong>".to_string(),
            Span::Em { .. } => "<em>".to_string(),
            Span::Hyperlink { data, .. } => {
                let target = data
                    .target
                    .as_deref()
                    .map(|t| format!(r#" target="{}" rel="noopener""#, escape_html(t)))
                    .unwrap_or_default();
                format!(r#"<a href="{}"{}>"#, escape_html(&data.href()), target)
            }
            Span::Label { data, .. } => {
                format!(r#"<span class="{}">"#, escape_html(&data.label))
            }
            Span::Unsupported => String::new(),
        }
    }

    fn close_tag(&self) -> &'static str {
        match self {
            Span::Strong { .. } => "</strong>",
            Span::Em { .. } => "</em>",
            Span::Hyperlink { .. } => "</a>",
            Span::Label { .. } => "</span>",
            Span::Unsupported => "",
        }
    }
}

/// Target of a hyperlink span or linked image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(default)]
    pub link_type: String,
    pub url: Option<String>,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub target: Option<String>,
}

impl LinkData {
    /// Resolve the link to an href; document links route through our pages
    pub fn href(&self) -> String {
        if self.link_type == "Document" {
            return match (self.document_type.as_deref(), self.uid.as_deref()) {
                (Some("posts"), Some(uid)) => post_path(uid),
                _ => "/".to_string(),
            };
        }
        self.url.clone().unwrap_or_else(|| "#".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelData {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    pub alt: Option<String>,
    pub copyright: Option<String>,
    #[serde(rename = "linkTo")]
    pub link_to: Option<LinkData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    pub oembed: Oembed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oembed {
    pub embed_url: Option<String>,
    #[serde(rename = "type")]
    pub embed_type: Option<String>,
    pub provider_name: Option<String>,
    pub html: Option<String>,
}

/// Serialize a sequence of blocks to HTML
pub fn as_html(blocks: &[RichTextBlock]) -> TrustedHtml {
    let mut out = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list_tag = match block {
            RichTextBlock::ListItem(_) => Some("ul"),
            RichTextBlock::OrderedListItem(_) => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                out.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                out.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        out.push_str(&block_html(block));
    }

    if let Some(tag) = open_list {
        out.push_str(&format!("</{}>", tag));
    }

    TrustedHtml::from_trusted(out)
}

fn block_html(block: &RichTextBlock) -> String {
    let wrap = |tag: &str, b: &TextBlock| format!("<{0}>{1}</{0}>", tag, inline_html(b));

    match block {
        RichTextBlock::Paragraph(b) => wrap("p", b),
        RichTextBlock::Heading1(b) => wrap("h1", b),
        RichTextBlock::Heading2(b) => wrap("h2", b),
        RichTextBlock::Heading3(b) => wrap("h3", b),
        RichTextBlock::Heading4(b) => wrap("h4", b),
        RichTextBlock::Heading5(b) => wrap("h5", b),
        RichTextBlock::Heading6(b) => wrap("h6", b),
        RichTextBlock::Preformatted(b) => wrap("pre", b),
        RichTextBlock::ListItem(b) | RichTextBlock::OrderedListItem(b) => wrap("li", b),
        RichTextBlock::Image(img) => {
            let tag = format!(
                r#"<img src="{}" alt="{}" />"#,
                escape_html(&img.url),
                escape_html(img.alt.as_deref().unwrap_or(""))
            );
            let inner = match img.link_to {
                Some(ref link) => format!(r#"<a href="{}">{}</a>"#, escape_html(&link.href()), tag),
                None => tag,
            };
            format!(r#"<p class="block-img">{}</p>"#, inner)
        }
        RichTextBlock::Embed(embed) => {
            let o = &embed.oembed;
            format!(
                r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                escape_html(o.embed_url.as_deref().unwrap_or("")),
                escape_html(o.embed_type.as_deref().unwrap_or("")),
                escape_html(o.provider_name.as_deref().unwrap_or("")),
                // oEmbed markup comes from the CMS and is trusted as-is
                o.html.as_deref().unwrap_or("")
            )
        }
        RichTextBlock::Unsupported => String::new(),
    }
}

fn inline_html(block: &TextBlock) -> String {
    let units: Vec<u16> = block.text.encode_utf16().collect();
    let mut spans: Vec<&Span> = block.spans.iter().filter(|s| s.range().is_some()).collect();
    // Outer spans first: earlier start, then longer extent
    spans.sort_by_key(|s| {
        let (start, end) = s.range().unwrap_or_default();
        (start, std::cmp::Reverse(end))
    });
    render_range(&units, 0, units.len(), &spans)
}

fn render_range(units: &[u16], start: usize, end: usize, spans: &[&Span]) -> String {
    let mut out = String::new();
    let mut pos = start;
    let mut i = 0;

    while i < spans.len() {
        let (span_start, span_end) = spans[i].range().unwrap_or_default();
        let s = span_start.max(pos).min(end);
        let e = span_end.min(end);
        if s >= e {
            i += 1;
            continue;
        }

        out.push_str(&text_html(&units[pos..s]));

        // Spans opening inside this one become its children
        let mut j = i + 1;
        while j < spans.len() && spans[j].range().map_or(false, |(cs, _)| cs < e) {
            j += 1;
        }

        out.push_str(&spans[i].open_tag());
        out.push_str(&render_range(units, s, e, &spans[i + 1..j]));
        out.push_str(spans[i].close_tag());

        pos = e;
        i = j;
    }

    if pos < end {
        out.push_str(&text_html(&units[pos..end]));
    }
    out
}

fn text_html(units: &[u16]) -> String {
    escape_html(&String::from_utf16_lossy(units)).replace('\n', "<br />")
}
