//! Property-based tests for span tree structure and rendering.
//!
//! Mention sets are generated without crossing spans: every pair is either
//! disjoint or nested.

use cdcr::{Fragment, Mention, MentionKey, RenderOptions, SpanNode, SpanTree};
use proptest::prelude::*;

/// Multibyte on purpose: offsets are chars, not bytes.
const TEXT: &str = "αβγ δεζ ηθι κλμ νξο πρσ";

fn text_len() -> usize {
    TEXT.chars().count()
}

fn crosses(a: (usize, usize), b: (usize, usize)) -> bool {
    (a.0 < b.0 && b.0 < a.1 && a.1 < b.1) || (b.0 < a.0 && a.0 < b.1 && b.1 < a.1)
}

/// Distinct, pairwise non-crossing spans.
fn laminar_spans() -> impl Strategy<Value = Vec<(usize, usize)>> {
    let n = text_len();
    prop::collection::vec((0..n, 1..=10usize), 0..16).prop_map(move |raw| {
        let mut kept: Vec<(usize, usize)> = Vec::new();
        for (start, len) in raw {
            let span = (start, (start + len).min(n));
            if span.0 >= span.1 || kept.contains(&span) {
                continue;
            }
            if kept.iter().all(|&k| !crosses(k, span)) {
                kept.push(span);
            }
        }
        kept
    })
}

fn build(spans: &[(usize, usize)]) -> SpanTree {
    let mut tree = SpanTree::new(TEXT);
    for &(start, end) in spans {
        tree.insert(Mention::new(TEXT, start, end).unwrap()).unwrap();
    }
    tree
}

fn shape(node: &SpanNode) -> String {
    let inner: Vec<String> = node.children().iter().map(shape).collect();
    let key = node.key().map_or("ROOT", MentionKey::as_str);
    format!("{key}[{}]", inner.join(","))
}

fn check_nesting(node: &SpanNode) -> Result<usize, String> {
    let mut count = 0;
    for pair in node.children().windows(2) {
        if pair[0].start() > pair[1].start() {
            return Err(format!("children out of order: {:?}", node.span()));
        }
        if pair[0].end() > pair[1].start() {
            return Err(format!("siblings overlap: {:?} {:?}", pair[0].span(), pair[1].span()));
        }
    }
    for child in node.children() {
        if child.start() < node.start() || child.end() > node.end() {
            return Err(format!("{:?} escapes {:?}", child.span(), node.span()));
        }
        count += 1 + check_nesting(child)?;
    }
    Ok(count)
}

proptest! {
    #[test]
    fn nesting_invariant_holds(spans in laminar_spans()) {
        let tree = build(&spans);
        let count = check_nesting(tree.root()).map_err(TestCaseError::fail)?;
        prop_assert_eq!(count, spans.len());
    }

    #[test]
    fn insertion_order_does_not_matter(
        (spans, shuffled) in laminar_spans().prop_flat_map(|spans| {
            let shuffled = Just(spans.clone()).prop_shuffle();
            (Just(spans), shuffled)
        })
    ) {
        prop_assert_eq!(shape(build(&spans).root()), shape(build(&shuffled).root()));
    }

    #[test]
    fn render_reproduces_text(spans in laminar_spans(), show_all in any::<bool>(), pick in any::<prop::sample::Index>()) {
        let tree = build(&spans);
        let keys: Vec<MentionKey> = spans
            .iter()
            .map(|&(s, e)| Mention::new(TEXT, s, e).unwrap().key().clone())
            .collect();
        let mut options = RenderOptions::new().show_all(show_all);
        if !keys.is_empty() {
            options = options.primary(&keys[pick.index(keys.len())]);
        }

        prop_assert_eq!(tree.render(&options).plain_text(), TEXT);

        let mut depth = 0usize;
        for fragment in tree.render(&options) {
            match fragment {
                Fragment::Open(_) => depth += 1,
                Fragment::Close(_) => {
                    prop_assert!(depth > 0);
                    depth -= 1;
                }
                Fragment::Text(text) => prop_assert!(!text.is_empty()),
            }
        }
        prop_assert_eq!(depth, 0);
    }

    #[test]
    fn render_is_restartable(spans in laminar_spans()) {
        let tree = build(&spans);
        let options = RenderOptions::new();
        let first: Vec<Fragment<'_>> = tree.render(&options).collect();
        let second: Vec<Fragment<'_>> = tree.render(&options).collect();
        prop_assert_eq!(first, second);
    }
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn two_muted_mentions() {
    let text = "The cat sat.";
    let mut tree = SpanTree::new(text);
    tree.insert(Mention::new(text, 0, 3).unwrap()).unwrap();
    tree.insert(Mention::new(text, 4, 7).unwrap()).unwrap();

    let options = RenderOptions::new();
    let rendered: Vec<(String, bool)> = {
        let mut out = Vec::new();
        let mut inside = false;
        for fragment in tree.render(&options) {
            match fragment {
                Fragment::Open(w) => {
                    assert_eq!(w.highlight, cdcr::Highlight::Muted);
                    inside = true;
                }
                Fragment::Close(_) => inside = false,
                Fragment::Text(t) => out.push((t.to_string(), inside)),
            }
        }
        out
    };
    assert_eq!(
        rendered,
        vec![
            ("The".to_string(), true),
            (" ".to_string(), false),
            ("cat".to_string(), true),
            (" sat.".to_string(), false),
        ]
    );
    assert_eq!(tree.render(&options).plain_text(), text);
}

#[test]
fn wide_then_narrow_equals_narrow_then_wide() {
    let text = "The cat sat.";
    let wide_first = build_in(text, &[(0, 11), (4, 7)]);
    let narrow_first = build_in(text, &[(4, 7), (0, 11)]);
    assert_eq!(shape(wide_first.root()), "ROOT[The cat sat;0;11[cat;4;7[]]]");
    assert_eq!(shape(wide_first.root()), shape(narrow_first.root()));
}

fn build_in(text: &str, spans: &[(usize, usize)]) -> SpanTree {
    let mut tree = SpanTree::new(text);
    for &(start, end) in spans {
        tree.insert(Mention::new(text, start, end).unwrap()).unwrap();
    }
    tree
}
