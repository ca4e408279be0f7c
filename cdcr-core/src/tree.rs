//! Containment-resolving span tree.
//!
//! Mentions in a document may nest ("The cat" contains "cat") or sit side by
//! side. [`SpanTree`] turns a flat list of mention spans into a hierarchy
//! that can be rendered as properly nested highlights:
//!
//! ```text
//! text:  The cat sat.
//!        [The cat]          <- child of root
//!            [cat]          <- child of "The cat"
//!
//! root [0,12)
//! └── The cat;0;7 [0,7)
//!     └── cat;4;7 [4,7)
//! ```
//!
//! # Invariants (for non-crossing input)
//!
//! - exactly one root spanning the whole text, never rendered as a highlight
//! - any two nodes are disjoint or one contains the other
//! - children are sorted by start and never overlap
//! - a node's span covers the union of its children's spans
//!
//! # Insertion
//!
//! Children are scanned left to right and the first rule that matches wins:
//!
//! 1. the new span ends at or before the child's start: insert before it
//! 2. the child contains the new span (and is not identical): recurse into it
//! 3. the new span contains the child (identical spans included): the child
//!    moves under the new node and scanning continues, so a wide mention can
//!    absorb several existing siblings
//!
//! Anything left unplaced is appended. Crossing spans (intersecting, neither
//! containing the other) match no rule for that child; they are logged and
//! placed by whatever rule matches next. Use [`validate_spans`] to reject
//! such input up front.

use crate::error::{Error, Result};
use crate::mention::{span_contains, spans_cross, Mention, MentionKey};
use crate::offset::CharIndex;

// ============================================================================
// SpanNode
// ============================================================================

/// One node of a [`SpanTree`]: a mention span and the mentions nested in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanNode {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) key: Option<MentionKey>,
    pub(crate) children: Vec<SpanNode>,
}

impl SpanNode {
    fn root(len: usize) -> Self {
        Self {
            start: 0,
            end: len,
            key: None,
            children: Vec::new(),
        }
    }

    fn leaf(mention: Mention) -> Self {
        Self {
            start: mention.start(),
            end: mention.end(),
            key: Some(mention.key().clone()),
            children: Vec::new(),
        }
    }

    /// Start offset (chars).
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End offset (chars, exclusive).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// `(start, end)`.
    #[must_use]
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Mention key; `None` only for the root.
    #[must_use]
    pub fn key(&self) -> Option<&MentionKey> {
        self.key.as_ref()
    }

    /// True for the document root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.key.is_none()
    }

    /// Directly nested mentions, sorted by start.
    #[must_use]
    pub fn children(&self) -> &[SpanNode] {
        &self.children
    }

    fn insert(&mut self, mut node: SpanNode) {
        let span = node.span();
        let mut index = 0;

        while index < self.children.len() {
            let child_span = self.children[index].span();

            if span.1 <= child_span.0 {
                break;
            }

            if span != child_span && span_contains(child_span, span) {
                self.children[index].insert(node);
                return;
            }

            if span_contains(span, child_span) {
                // Removal shifts the next sibling into `index`.
                node.children.push(self.children.remove(index));
                continue;
            }

            if spans_cross(span, child_span) {
                log::warn!(
                    "mention {} crosses {} without nesting; placing by first match",
                    node.key.as_ref().map(MentionKey::as_str).unwrap_or("?"),
                    self.children[index]
                        .key
                        .as_ref()
                        .map(MentionKey::as_str)
                        .unwrap_or("?")
                );
            }
            index += 1;
        }

        self.children.insert(index, node);
    }
}

// ============================================================================
// SpanTree
// ============================================================================

/// A document's text and its mentions, nested by containment.
#[derive(Debug, Clone)]
pub struct SpanTree {
    text: String,
    index: CharIndex,
    root: SpanNode,
    len: usize,
}

impl SpanTree {
    /// Empty tree over `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let index = CharIndex::new(&text);
        let root = SpanNode::root(index.len_chars());
        Self {
            text,
            index,
            root,
            len: 0,
        }
    }

    /// Build a tree from mentions, inserting them in ascending start order.
    pub fn from_mentions(
        text: impl Into<String>,
        mentions: impl IntoIterator<Item = Mention>,
    ) -> Result<Self> {
        let mut tree = Self::new(text);
        let mut mentions: Vec<Mention> = mentions.into_iter().collect();
        mentions.sort_by_key(Mention::start);
        for mention in mentions {
            tree.insert(mention)?;
        }
        Ok(tree)
    }

    /// Build a tree from stored mention keys.
    pub fn from_keys(text: impl Into<String>, keys: &[MentionKey]) -> Result<Self> {
        let text = text.into();
        let mentions = keys
            .iter()
            .map(|key| Mention::from_key(&text, key))
            .collect::<Result<Vec<_>>>()?;
        Self::from_mentions(text, mentions)
    }

    /// Insert one mention.
    ///
    /// Fails only when the span does not fit in this tree's text. Crossing
    /// spans are tolerated (see the module docs).
    pub fn insert(&mut self, mention: Mention) -> Result<()> {
        let len = self.root.end;
        if mention.end() > len {
            return Err(Error::out_of_bounds(mention.start(), mention.end(), len));
        }
        self.root.insert(SpanNode::leaf(mention));
        self.len += 1;
        Ok(())
    }

    /// Resolve a stored key against this tree's text and insert it.
    pub fn insert_key(&mut self, key: &MentionKey) -> Result<()> {
        let mention = Mention::from_key(&self.text, key)?;
        self.insert(mention)
    }

    /// Full document text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The root node spanning the whole text.
    #[must_use]
    pub fn root(&self) -> &SpanNode {
        &self.root
    }

    /// Number of inserted mentions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no mention has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Text between two char offsets, clamped to the document.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &str {
        self.index.slice(&self.text, start, end)
    }

    /// Pre-order walk over all mention nodes with their depth (root children
    /// are depth 1).
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.root.children.iter().rev().map(|n| (1, n)).collect(),
        }
    }

    /// First node (in pre-order) carrying `key`.
    #[must_use]
    pub fn find(&self, key: &MentionKey) -> Option<&SpanNode> {
        self.walk()
            .map(|(_, node)| node)
            .find(|node| node.key.as_ref() == Some(key))
    }

    /// Chain of nodes covering `offset`, outermost first, excluding the root.
    pub(crate) fn path_at(&self, offset: usize) -> Vec<&SpanNode> {
        let mut path = Vec::new();
        let mut node = &self.root;
        while let Some(child) = node
            .children
            .iter()
            .find(|c| c.start <= offset && offset < c.end)
        {
            path.push(child);
            node = child;
        }
        path
    }
}

/// Pre-order iterator returned by [`SpanTree::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'t> {
    stack: Vec<(usize, &'t SpanNode)>,
}

impl<'t> Iterator for Walk<'t> {
    type Item = (usize, &'t SpanNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

// ============================================================================
// Validation
// ============================================================================

/// All pairs of mentions whose spans cross, as `(earlier, later)` keys.
#[must_use]
pub fn find_crossings(mentions: &[Mention]) -> Vec<(MentionKey, MentionKey)> {
    let mut sorted: Vec<&Mention> = mentions.iter().collect();
    sorted.sort_by_key(|m| (m.start(), std::cmp::Reverse(m.end())));

    let mut crossings = Vec::new();
    for (i, a) in sorted.iter().enumerate() {
        for b in sorted[i + 1..].iter().take_while(|b| b.start() < a.end()) {
            if a.crosses(b) {
                crossings.push((a.key().clone(), b.key().clone()));
            }
        }
    }
    crossings
}

/// Resolve every key against `text` and reject out-of-range or crossing spans.
pub fn validate_spans(text: &str, keys: &[MentionKey]) -> Result<Vec<Mention>> {
    let mentions = keys
        .iter()
        .map(|key| Mention::from_key(text, key))
        .collect::<Result<Vec<_>>>()?;

    if let Some((first, second)) = find_crossings(&mentions).into_iter().next() {
        return Err(Error::CrossingSpan {
            first: first.to_string(),
            second: second.to_string(),
        });
    }
    Ok(mentions)
}
