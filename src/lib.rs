//! # cdcr
//!
//! Entity mention annotation for cross-document coreference.
//!
//! An annotator is shown a news article and a science paper, each with its
//! mentions highlighted, and asked whether one mention from each refers to
//! the same thing. This crate ties the pieces together:
//!
//! - **Span tree + rendering** (`cdcr-core`): nested mention highlighting as a
//!   restartable fragment stream, plain or HTML
//! - **Consistency propagation** (`cdcr-coalesce`): one yes/no answer becomes a
//!   write plan covering every related judgment
//! - **Session driver** ([`session`]): submit / refresh cycle over any
//!   [`AnnotationSession`] transport
//! - **Settings** ([`config`]): TOML-backed display and refresh settings
//!
//! ## Quick Start
//!
//! ```rust
//! use cdcr::prelude::*;
//!
//! let task = Task::from_json(r#"{
//!     "id": 1, "hash": "h1",
//!     "news_ent": "cat;4;7", "sci_ent": "Felis catus;0;11",
//!     "news_article_id": 10, "sci_paper_id": 20,
//!     "news_text": "The cat sat.", "sci_text": "Felis catus purrs.",
//!     "news_ents": ["The;0;3", "cat;4;7"], "sci_ents": ["Felis catus;0;11"]
//! }"#)?;
//!
//! let selection = SecondaryEntitySelection::seeded(&task);
//! let tree = task.span_tree(DocumentSide::News)?;
//! let options = Settings::default().render_options(&task, &selection, DocumentSide::News);
//! let html = render_html(tree.render(&options));
//! assert!(html.contains("<mark data-key=\"cat;4;7\">cat</mark>"));
//! # Ok::<(), cdcr::SessionError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod session;

pub use cdcr_coalesce::{
    BatchItem, BatchWrite, CoreferencePropagator, SingleWrite, SingletonRequest, SubmissionPlan,
    TaskFetch, WriteMethod, WritePlan,
};
pub use cdcr_core::{
    find_crossings, render_html, validate_spans, Answer, BadTaskReport, DocumentSide, Fragment,
    Fragments, Highlight, Mention, MentionEdit, MentionEditor, MentionKey, Preview,
    ProposedPrimaries, RelatedAnswer, RenderOptions, SecondaryEntitySelection, SpanNode, SpanTree,
    Task, UserAnswer, Wrapper,
};
pub use config::Settings;
pub use error::{Result, SessionError};
pub use session::{AnnotationSession, Annotator, MockSession, RefreshPolicy};

pub mod prelude {
    //! Commonly used items, re-exported for convenience.
    pub use crate::config::Settings;
    pub use crate::error::{Result, SessionError};
    pub use crate::session::{AnnotationSession, Annotator, RefreshPolicy};
    pub use cdcr_coalesce::{CoreferencePropagator, SubmissionPlan, TaskFetch, WritePlan};
    pub use cdcr_core::{
        render_html, Answer, DocumentSide, Fragment, Mention, MentionKey, RenderOptions,
        SecondaryEntitySelection, SpanTree, Task,
    };
}
