//! # cdcr-core
//!
//! Core types for cross-document coreference annotation: shared data
//! structures used across the cdcr crates.
//!
//! This crate provides:
//! - **Mentions**: `Mention`, `MentionKey` (`"label;start;end"`), `DocumentSide`
//! - **Tasks**: `Task`, `Answer`, `RelatedAnswer`, `ProposedPrimaries`, `BadTaskReport`
//! - **Selection**: `SecondaryEntitySelection`
//! - **Span tree**: `SpanTree`, `SpanNode`, and its fragment renderer
//! - **Mention editor**: `MentionEditor`, `MentionEdit`
//!
//! # Example
//!
//! ```
//! use cdcr_core::{Mention, RenderOptions, SpanTree};
//!
//! let text = "The cat sat.";
//! let mut tree = SpanTree::new(text);
//! tree.insert(Mention::new(text, 4, 7)?)?;
//! tree.insert(Mention::new(text, 0, 7)?)?;
//!
//! let options = RenderOptions::new();
//! assert_eq!(tree.render(&options).plain_text(), text);
//! # Ok::<(), cdcr_core::Error>(())
//! ```

#![warn(missing_docs)]

pub mod editor;
pub mod error;
pub mod mention;
pub mod offset;
pub mod render;
pub mod selection;
pub mod task;
pub mod tree;

pub use editor::{MentionEdit, MentionEditor, Preview, DEFAULT_PREVIEW_CONTEXT};
pub use error::{Error, Result};
pub use mention::{DocumentSide, KeyParts, Mention, MentionKey};
pub use render::{
    render_html, Fragment, Fragments, Highlight, RenderOptions, Wrapper,
    DEFAULT_SECONDARY_STYLE, MUTED_STYLE,
};
pub use selection::SecondaryEntitySelection;
pub use task::{Answer, BadTaskReport, ProposedPrimaries, RelatedAnswer, Task, UserAnswer};
pub use tree::{find_crossings, validate_spans, SpanNode, SpanTree, Walk};
