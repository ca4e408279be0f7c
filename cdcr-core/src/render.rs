//! Rendering a [`SpanTree`] as a stream of text runs and highlight wrappers.
//!
//! [`SpanTree::render`] returns [`Fragments`], a lazy iterator of
//! [`Fragment`] events in document order:
//!
//! ```text
//! "The cat sat."  with "The" muted and "cat" primary
//!
//! Open(The, Muted)  Text("The")  Close(The)
//! Text(" ")
//! Open(cat, Primary)  Text("cat")  Close(cat)
//! Text(" sat.")
//! ```
//!
//! Concatenating the `Text` events reproduces the document exactly. The
//! iterator is `Clone`, and `render` can be called any number of times.
//!
//! Roles are not stored on the tree. The caller passes a [`RenderOptions`]
//! carrying the primary key, the secondary set, the secondary style tag,
//! and the click callback; it travels down the traversal as context.

use std::collections::BTreeSet;
use std::fmt;

use crate::mention::{DocumentSide, MentionKey};
use crate::selection::SecondaryEntitySelection;
use crate::task::Task;
use crate::tree::{SpanNode, SpanTree};

/// Default CSS class for secondary mentions.
pub const DEFAULT_SECONDARY_STYLE: &str = "text-success";

/// CSS class for mentions that are neither primary nor secondary.
pub const MUTED_STYLE: &str = "text-info";

// ============================================================================
// Options
// ============================================================================

/// How a mention wrapper should look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight<'a> {
    /// The mention under question.
    Primary,
    /// A selected secondary mention, with the caller's style tag.
    Secondary(&'a str),
    /// A known mention that is not currently relevant.
    Muted,
}

/// Render-time context: roles, filtering, styling and click handling.
pub struct RenderOptions<'a> {
    show_all: bool,
    primary: Option<&'a MentionKey>,
    secondary: Option<&'a BTreeSet<MentionKey>>,
    secondary_style: String,
    on_mention_click: Option<Box<dyn Fn(&MentionKey) + 'a>>,
}

impl<'a> RenderOptions<'a> {
    /// Options with every mention shown and no roles assigned.
    #[must_use]
    pub fn new() -> Self {
        Self {
            show_all: true,
            primary: None,
            secondary: None,
            secondary_style: DEFAULT_SECONDARY_STYLE.to_string(),
            on_mention_click: None,
        }
    }

    /// Roles for one side of a task: its primary and the selected secondaries.
    #[must_use]
    pub fn for_side(
        task: &'a Task,
        selection: &'a SecondaryEntitySelection,
        side: DocumentSide,
    ) -> Self {
        let mut options = Self::new().secondary(selection.get(side));
        options.primary = task.primary(side);
        options
    }

    /// When false, muted mentions are rendered as plain text.
    #[must_use]
    pub fn show_all(mut self, show_all: bool) -> Self {
        self.show_all = show_all;
        self
    }

    /// Mark `key` as the primary mention.
    #[must_use]
    pub fn primary(mut self, key: &'a MentionKey) -> Self {
        self.primary = Some(key);
        self
    }

    /// Mark every key in `keys` as secondary.
    #[must_use]
    pub fn secondary(mut self, keys: &'a BTreeSet<MentionKey>) -> Self {
        self.secondary = Some(keys);
        self
    }

    /// Style tag attached to secondary wrappers.
    #[must_use]
    pub fn secondary_style(mut self, style: impl Into<String>) -> Self {
        self.secondary_style = style.into();
        self
    }

    /// Callback receiving the key of a clicked mention.
    #[must_use]
    pub fn on_mention_click(mut self, callback: impl Fn(&MentionKey) + 'a) -> Self {
        self.on_mention_click = Some(Box::new(callback));
        self
    }

    /// Highlight for a mention; primary takes precedence over secondary.
    #[must_use]
    pub fn highlight(&self, key: &MentionKey) -> Highlight<'_> {
        if self.primary == Some(key) {
            Highlight::Primary
        } else if self.secondary.is_some_and(|set| set.contains(key)) {
            Highlight::Secondary(&self.secondary_style)
        } else {
            Highlight::Muted
        }
    }

    /// Whether a mention gets a wrapper at all.
    #[must_use]
    pub fn is_visible(&self, key: &MentionKey) -> bool {
        self.show_all || self.highlight(key) != Highlight::Muted
    }

    /// Report a click on `key` to the callback, if any.
    pub fn click(&self, key: &MentionKey) {
        if let Some(callback) = &self.on_mention_click {
            callback(key);
        }
    }
}

impl Default for RenderOptions<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RenderOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("show_all", &self.show_all)
            .field("primary", &self.primary)
            .field("secondary", &self.secondary)
            .field("secondary_style", &self.secondary_style)
            .field("on_mention_click", &self.on_mention_click.is_some())
            .finish()
    }
}

// ============================================================================
// Fragments
// ============================================================================

/// A highlighted mention wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapper<'t> {
    /// Key reported when the wrapper is clicked.
    pub key: &'t MentionKey,
    /// How to draw it.
    pub highlight: Highlight<'t>,
    /// Start offset (chars).
    pub start: usize,
    /// End offset (chars).
    pub end: usize,
}

/// One rendering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'t> {
    /// A run of document text.
    Text(&'t str),
    /// Start of a mention wrapper.
    Open(Wrapper<'t>),
    /// End of the most recently opened wrapper.
    Close(Wrapper<'t>),
}

#[derive(Debug, Clone)]
struct Frame<'t> {
    node: &'t SpanNode,
    next_child: usize,
    cursor: usize,
    wrapper: Option<Wrapper<'t>>,
}

/// Lazy depth-first fragment stream returned by [`SpanTree::render`].
#[derive(Debug, Clone)]
pub struct Fragments<'t> {
    tree: &'t SpanTree,
    options: &'t RenderOptions<'t>,
    stack: Vec<Frame<'t>>,
}

impl<'t> Iterator for Fragments<'t> {
    type Item = Fragment<'t>;

    fn next(&mut self) -> Option<Fragment<'t>> {
        loop {
            let frame = self.stack.last_mut()?;
            let node = frame.node;

            if let Some(child) = node.children.get(frame.next_child) {
                if frame.cursor < child.start {
                    let text = self.tree.slice(frame.cursor, child.start);
                    frame.cursor = child.start;
                    return Some(Fragment::Text(text));
                }

                frame.next_child += 1;
                // Crossing input can start a child before the cursor; never re-emit text.
                let child_cursor = frame.cursor.max(child.start);
                frame.cursor = frame.cursor.max(child.end);

                let options = self.options;
                let wrapper = child
                    .key
                    .as_ref()
                    .filter(|key| options.is_visible(key))
                    .map(|key| Wrapper {
                        key,
                        highlight: options.highlight(key),
                        start: child.start,
                        end: child.end,
                    });
                self.stack.push(Frame {
                    node: child,
                    next_child: 0,
                    cursor: child_cursor,
                    wrapper,
                });
                if let Some(wrapper) = wrapper {
                    return Some(Fragment::Open(wrapper));
                }
                continue;
            }

            if frame.cursor < node.end {
                let text = self.tree.slice(frame.cursor, node.end);
                frame.cursor = node.end;
                return Some(Fragment::Text(text));
            }

            if let Some(Frame {
                wrapper: Some(wrapper),
                ..
            }) = self.stack.pop()
            {
                return Some(Fragment::Close(wrapper));
            }
        }
    }
}

impl<'t> Fragments<'t> {
    /// Concatenate the text runs, dropping wrappers.
    #[must_use]
    pub fn plain_text(self) -> String {
        self.filter_map(|fragment| match fragment {
            Fragment::Text(text) => Some(text),
            _ => None,
        })
        .collect()
    }
}

impl SpanTree {
    /// Render the document as a fragment stream.
    #[must_use]
    pub fn render<'t>(&'t self, options: &'t RenderOptions<'t>) -> Fragments<'t> {
        Fragments {
            tree: self,
            options,
            stack: vec![Frame {
                node: self.root(),
                next_child: 0,
                cursor: 0,
                wrapper: None,
            }],
        }
    }

    /// Innermost visible mention covering char `offset`.
    #[must_use]
    pub fn mention_at<'t>(
        &'t self,
        offset: usize,
        options: &RenderOptions<'_>,
    ) -> Option<&'t MentionKey> {
        self.path_at(offset)
            .into_iter()
            .rev()
            .filter_map(SpanNode::key)
            .find(|key| options.is_visible(key))
    }

    /// Dispatch a click at char `offset` to the innermost visible mention.
    ///
    /// The callback fires at most once: enclosing wrappers are not notified.
    pub fn click_at(&self, offset: usize, options: &RenderOptions<'_>) -> Option<MentionKey> {
        let key = self.mention_at(offset, options)?;
        options.click(key);
        Some(key.clone())
    }
}

// ============================================================================
// HTML
// ============================================================================

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Turn a fragment stream into an HTML fragment.
///
/// Primary mentions become `<mark>`, secondary mentions a `<span>` with the
/// secondary style class, muted mentions `<span class="text-info">`. Each
/// wrapper carries its key in `data-key` for click dispatch.
#[must_use]
pub fn render_html<'t>(fragments: impl IntoIterator<Item = Fragment<'t>>) -> String {
    let mut html = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => html.push_str(&html_escape(text)),
            Fragment::Open(w) => {
                let key = html_escape(w.key.as_str());
                match w.highlight {
                    Highlight::Primary => {
                        html.push_str(&format!(r#"<mark data-key="{key}">"#));
                    }
                    Highlight::Secondary(style) => {
                        html.push_str(&format!(
                            r#"<span class="{}" data-key="{key}">"#,
                            html_escape(style)
                        ));
                    }
                    Highlight::Muted => {
                        html.push_str(&format!(r#"<span class="{MUTED_STYLE}" data-key="{key}">"#));
                    }
                }
            }
            Fragment::Close(w) => match w.highlight {
                Highlight::Primary => html.push_str("</mark>"),
                _ => html.push_str("</span>"),
            },
        }
    }
    html
}
