//! Moving or resizing a mention.
//!
//! The annotator opens the editor on a mention, nudges its start and end
//! offsets while watching a preview with some surrounding context, and
//! confirms. Confirmation yields a [`MentionEdit`] request for the session;
//! nothing here touches the task.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mention::{DocumentSide, Mention, MentionKey};
use crate::offset::CharIndex;
use crate::task::Task;

/// Characters of context shown on each side of the preview.
pub const DEFAULT_PREVIEW_CONTEXT: usize = 20;

/// Request to replace one mention of a document with another span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionEdit {
    /// Which document.
    pub side: DocumentSide,
    /// Document id on that side.
    pub doc_id: u64,
    /// Key being replaced.
    #[serde(rename = "oldEntity")]
    pub old_entity: MentionKey,
    /// Replacement key.
    #[serde(rename = "newEntity")]
    pub new_entity: MentionKey,
}

impl MentionEdit {
    /// True when the span did not actually change.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.old_entity == self.new_entity
    }
}

/// The preview split around the edited span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Context before the span, prefixed with `...` when elided.
    pub prefix: String,
    /// The span's text.
    pub mention: String,
    /// Context after the span, suffixed with `...` when elided.
    pub suffix: String,
}

/// Editor state for one mention.
#[derive(Debug, Clone)]
pub struct MentionEditor {
    side: DocumentSide,
    doc_id: u64,
    text: String,
    index: CharIndex,
    original: MentionKey,
    start: usize,
    end: usize,
}

impl MentionEditor {
    /// Open the editor on the task's primary mention for `side`.
    pub fn open(task: &Task, side: DocumentSide) -> Result<Self> {
        let key = task.primary(side).ok_or_else(|| {
            Error::invalid_input(format!("task {} has no {side} mention to edit", task.id))
        })?;
        Self::for_mention(task, side, key)
    }

    /// Open the editor on any mention of `side`.
    pub fn for_mention(task: &Task, side: DocumentSide, key: &MentionKey) -> Result<Self> {
        let text = task.text(side).to_string();
        let mention = Mention::from_key(&text, key)?;
        Ok(Self {
            side,
            doc_id: task.doc_id(side),
            index: CharIndex::new(&text),
            text,
            original: key.clone(),
            start: mention.start(),
            end: mention.end(),
        })
    }

    /// Proposed start offset.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Proposed end offset.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Move the start offset.
    pub fn set_start(&mut self, start: usize) {
        self.start = start;
    }

    /// Move the end offset.
    pub fn set_end(&mut self, end: usize) {
        self.end = end;
    }

    /// Preview with up to `context` characters either side.
    ///
    /// Out-of-range offsets are clamped so the preview can follow the
    /// annotator's typing; validation happens in [`MentionEditor::to_edit`].
    #[must_use]
    pub fn preview(&self, context: usize) -> Preview {
        let len = self.index.len_chars();
        let start = self.start.min(len);
        let end = self.end.clamp(start, len);

        let prefix = if start > context {
            format!("...{}", self.index.slice(&self.text, start - context, start))
        } else {
            self.index.slice(&self.text, 0, start).to_string()
        };
        let suffix = if end + context < len {
            format!("{}...", self.index.slice(&self.text, end, end + context))
        } else {
            self.index.slice(&self.text, end, len).to_string()
        };

        Preview {
            prefix,
            mention: self.index.slice(&self.text, start, end).to_string(),
            suffix,
        }
    }

    /// Key of the span as currently proposed.
    pub fn proposed_key(&self) -> Result<MentionKey> {
        Mention::new(&self.text, self.start, self.end).map(|m| m.key().clone())
    }

    /// Confirm the edit.
    pub fn to_edit(&self) -> Result<MentionEdit> {
        Ok(MentionEdit {
            side: self.side,
            doc_id: self.doc_id,
            old_entity: self.original.clone(),
            new_entity: self.proposed_key()?,
        })
    }
}
