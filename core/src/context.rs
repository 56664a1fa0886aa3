use crate::config::NO_CONTEXT_MESSAGE;
use crate::corpus::Document;
use serde::{Deserialize, Serialize};

/// One retrieved page as handed to the response generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextPage {
    pub title: String,
    pub body: String,
    pub source: Option<String>,
}

impl From<&Document> for ContextPage {
    fn from(doc: &Document) -> Self {
        Self { title: doc.title.clone(), body: doc.body.clone(), source: doc.source.clone() }
    }
}

/// Render retrieved pages as the knowledge block of a prompt.
pub fn render_context(pages: &[ContextPage]) -> String {
    if pages.is_empty() {
        return NO_CONTEXT_MESSAGE.to_string();
    }
    pages
        .iter()
        .map(|p| format!("## {}\n{}", p.title, p.body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sections() {
        let pages = vec![
            ContextPage { title: "Charging".into(), body: "Fast chargers.".into(), source: None },
            ContextPage { title: "Battery".into(), body: "Long range.".into(), source: Some("https://x".into()) },
        ];
        assert_eq!(render_context(&pages), "## Charging\nFast chargers.\n\n## Battery\nLong range.");
    }

    #[test]
    fn empty_renders_placeholder() {
        assert_eq!(render_context(&[]), NO_CONTEXT_MESSAGE);
    }
}
