//! Minimal block-to-markdown renderer.
//!
//! Covers the everyday Notion block types. Anything else, including outline
//! blocks like `child_page`, renders to nothing. Nested children are not
//! fetched, so only the top level of a page is rendered.

use serde_json::Value;

use crate::contract::{plain_text, Block, BlockRenderer};

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        MarkdownRenderer
    }
}

impl BlockRenderer for MarkdownRenderer {
    fn render(&self, blocks: &[Block]) -> String {
        let mut out = String::new();
        let mut previous_was_list = false;

        for block in blocks {
            let Some(text) = render_block(block) else {
                continue;
            };
            let is_list = is_list_item(block);
            if !out.is_empty() {
                out.push_str(if is_list && previous_was_list { "\n" } else { "\n\n" });
            }
            out.push_str(&text);
            previous_was_list = is_list;
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

fn is_list_item(block: &Block) -> bool {
    matches!(
        block.kind.as_str(),
        "bulleted_list_item" | "numbered_list_item" | "to_do"
    )
}

fn render_block(block: &Block) -> Option<String> {
    let content = block.content();
    let text = || content.map(|c| rich_text(c.get("rich_text"))).unwrap_or_default();

    let rendered = match block.kind.as_str() {
        "paragraph" => text(),
        "heading_1" => format!("# {}", text()),
        "heading_2" => format!("## {}", text()),
        "heading_3" => format!("### {}", text()),
        "bulleted_list_item" => format!("- {}", text()),
        "numbered_list_item" => format!("1. {}", text()),
        "to_do" => {
            let checked = content
                .and_then(|c| c.get("checked"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!("- [{}] {}", if checked { "x" } else { " " }, text())
        }
        "quote" | "callout" => quote(&text()),
        "toggle" => text(),
        "code" => {
            let language = content
                .and_then(|c| c.get("language"))
                .and_then(Value::as_str)
                .filter(|l| *l != "plain text")
                .unwrap_or("");
            let code = content
                .and_then(|c| c.get("rich_text"))
                .map(plain_text)
                .unwrap_or_default();
            format!("```{language}\n{code}\n```")
        }
        "divider" => "---".to_owned(),
        "equation" => {
            let expression = content
                .and_then(|c| c.get("expression"))
                .and_then(Value::as_str)?;
            format!("$$\n{expression}\n$$")
        }
        "image" => {
            let content = content?;
            let url = content
                .get("file")
                .or_else(|| content.get("external"))
                .and_then(|f| f.get("url"))
                .and_then(Value::as_str)?;
            let caption = content
                .get("caption")
                .map(plain_text)
                .unwrap_or_default();
            format!("![{caption}]({url})")
        }
        "bookmark" | "embed" | "link_preview" => {
            let url = content?.get("url").and_then(Value::as_str)?;
            format!("[{url}]({url})")
        }
        _ => return None,
    };
    Some(rendered)
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rich text with inline annotations and links applied.
fn rich_text(value: Option<&Value>) -> String {
    let Some(parts) = value.and_then(Value::as_array) else {
        return String::new();
    };

    parts
        .iter()
        .map(|part| {
            let mut text = part
                .get("plain_text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            if text.trim().is_empty() {
                return text;
            }
            let annotations = part.get("annotations");
            let flag = |name: &str| {
                annotations
                    .and_then(|a| a.get(name))
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
            };
            if flag("code") {
                text = format!("`{text}`");
            }
            if flag("bold") {
                text = format!("**{text}**");
            }
            if flag("italic") {
                text = format!("*{text}*");
            }
            if flag("strikethrough") {
                text = format!("~~{text}~~");
            }
            if let Some(href) = part.get("href").and_then(Value::as_str) {
                text = format!("[{text}]({href})");
            }
            text
        })
        .collect()
}
