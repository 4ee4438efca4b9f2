use serde::Serialize;

use crate::compile::{CompileOutcome, EntryRender, PageKind};

/// Result of a compile run: the artifact reference plus the logical page
/// outline and per-entry outcomes, so callers can see exactly what the
/// document contains without parsing it.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CompileResponse {
    /// Media reference of the compiled document.
    #[schema(example = "media/pdf/77a1….pdf")]
    pub file: String,
    /// Logical pages in order: `cover`, `title`, `entry:<id>`.
    pub pages: Vec<String>,
    pub entries: Vec<EntryOutcome>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryOutcome {
    pub id: i32,
    /// `rendered`, `text_only`, or `skipped`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<CompileOutcome> for CompileResponse {
    fn from(outcome: CompileOutcome) -> Self {
        Self {
            file: outcome.artifact.to_string(),
            pages: outcome
                .pages
                .iter()
                .map(|page| match page {
                    PageKind::Cover => "cover".to_string(),
                    PageKind::Title => "title".to_string(),
                    PageKind::Entry(id) => format!("entry:{id}"),
                })
                .collect(),
            entries: outcome
                .entries
                .into_iter()
                .map(|(id, render)| match render {
                    EntryRender::Rendered => EntryOutcome {
                        id,
                        outcome: "rendered",
                        reason: None,
                    },
                    EntryRender::RenderedTextOnly => EntryOutcome {
                        id,
                        outcome: "text_only",
                        reason: None,
                    },
                    EntryRender::Skipped(reason) => EntryOutcome {
                        id,
                        outcome: "skipped",
                        reason: Some(reason),
                    },
                })
                .collect(),
        }
    }
}
