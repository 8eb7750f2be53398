//! Projection of the token array onto the surface and back.

use crate::surface::{
    ATTR_ID, ATTR_INSTANCE, ATTR_LABEL, ATTR_TOKEN_TYPE, ATTR_VALUE, Attrs, Surface, SurfaceNode,
    WidgetNode,
};
use crate::token::{ReferenceToken, Token, virtual_tokens};
use crate::widget::{InlineRenderer, WidgetKind, WidgetRegistry};

pub fn instance_key(token: &ReferenceToken, index: usize) -> String {
    format!("{}#{index}", token.id)
}

fn widget_node(kind: WidgetKind, token: &ReferenceToken, index: usize) -> SurfaceNode {
    let mut attrs = Attrs::new();
    attrs.insert(ATTR_TOKEN_TYPE.to_string(), kind.as_str().to_string());
    attrs.insert(ATTR_ID.to_string(), token.id.clone());
    attrs.insert(ATTR_LABEL.to_string(), token.label.clone());
    attrs.insert(ATTR_VALUE.to_string(), token.value.clone());
    attrs.insert(ATTR_INSTANCE.to_string(), instance_key(token, index));
    SurfaceNode::Widget(WidgetNode { attrs })
}

/// Builds surface nodes for `[mode?, ...tokens]`, one node per token, plus a
/// trailing empty text slot when the stream ends on a widget.
pub fn render_nodes(tokens: &[Token], mode: Option<&ReferenceToken>) -> Vec<SurfaceNode> {
    let mut nodes: Vec<SurfaceNode> = virtual_tokens(mode, tokens)
        .iter()
        .enumerate()
        .map(|(index, token)| match token {
            Token::Text { value } => SurfaceNode::Text(value.clone()),
            Token::Reference(reference) => widget_node(WidgetKind::Reference, reference, index),
            Token::Mode(reference) => widget_node(WidgetKind::Mode, reference, index),
        })
        .collect();

    if matches!(nodes.last(), Some(SurfaceNode::Widget(_))) {
        nodes.push(SurfaceNode::Text(String::new()));
    }
    nodes
}

/// Reads the content tokens back from the surface.
///
/// Text runs and marker spans accumulate into one text token until a widget
/// boundary. Mode widgets are skipped without splitting the text around them;
/// the mode lives outside the surface.
pub fn extract(surface: &Surface) -> Vec<Token> {
    fn flush(out: &mut Vec<Token>, text: &mut String) {
        if !text.is_empty() {
            out.push(Token::text(std::mem::take(text)));
        }
    }

    let mut out: Vec<Token> = Vec::new();
    let mut text = String::new();

    for node in surface.nodes() {
        match node {
            SurfaceNode::Text(run) => text.push_str(run),
            SurfaceNode::Marker(marker) => text.push_str(&marker.text),
            SurfaceNode::Widget(widget) => {
                if widget.attr(ATTR_TOKEN_TYPE) == Some(WidgetKind::Mode.as_str()) {
                    continue;
                }
                flush(&mut out, &mut text);
                if widget.attr(ATTR_ID).is_none() || widget.attr(ATTR_VALUE).is_none() {
                    tracing::warn!(
                        attrs = ?widget.attrs,
                        "widget is missing its token identity; extracting an empty reference"
                    );
                }
                out.push(Token::Reference(ReferenceToken {
                    id: widget.attr(ATTR_ID).unwrap_or("").to_string(),
                    label: widget.attr(ATTR_LABEL).unwrap_or("").to_string(),
                    value: widget.attr(ATTR_VALUE).unwrap_or("").to_string(),
                }));
            }
        }
    }
    flush(&mut out, &mut text);
    out
}

#[derive(Debug, Clone, PartialEq)]
struct RenderSnapshot {
    tokens: Vec<Token>,
    mode: Option<ReferenceToken>,
}

impl RenderSnapshot {
    fn new(tokens: &[Token], mode: Option<&ReferenceToken>) -> Self {
        Self {
            tokens: tokens.to_vec(),
            mode: mode.cloned(),
        }
    }
}

/// Owns the surface, the live widget instances and the last rendered value.
pub struct SurfaceSynchronizer {
    surface: Surface,
    renderer: Box<dyn InlineRenderer>,
    widgets: WidgetRegistry,
    rendered: Option<RenderSnapshot>,
    pending_cursor: Option<usize>,
}

impl SurfaceSynchronizer {
    pub fn new(renderer: Box<dyn InlineRenderer>) -> Self {
        Self {
            surface: Surface::new(),
            renderer,
            widgets: WidgetRegistry::new(),
            rendered: None,
            pending_cursor: None,
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn pending_cursor(&self) -> Option<usize> {
        self.pending_cursor
    }

    pub fn is_rendered(&self, tokens: &[Token], mode: Option<&ReferenceToken>) -> bool {
        self.rendered.as_ref() == Some(&RenderSnapshot::new(tokens, mode))
    }

    /// Rebuilds the surface when the value differs from the last rendered one
    /// or when a cursor placement is requested. The caret is captured in cursor
    /// space before the rebuild and restored by [`Self::after_layout`].
    pub fn sync(
        &mut self,
        tokens: &[Token],
        mode: Option<&ReferenceToken>,
        cursor: Option<usize>,
    ) -> bool {
        if cursor.is_none() && self.is_rendered(tokens, mode) {
            return false;
        }

        let captured = self.surface.caret();
        self.render(tokens, mode);
        self.rendered = Some(RenderSnapshot::new(tokens, mode));
        self.pending_cursor = cursor.or(captured);
        tracing::debug!(
            tokens = tokens.len(),
            has_mode = mode.is_some(),
            restore = ?self.pending_cursor,
            "surface rebuilt"
        );
        true
    }

    /// Replaces the surface content and the widget instances backing it.
    pub fn render(&mut self, tokens: &[Token], mode: Option<&ReferenceToken>) {
        let disposed = self.widgets.drain();
        if disposed > 0 {
            tracing::trace!(disposed, "widget instances disposed");
        }

        for (index, token) in virtual_tokens(mode, tokens).iter().enumerate() {
            let (kind, reference) = match token {
                Token::Reference(reference) => (WidgetKind::Reference, reference),
                Token::Mode(reference) => (WidgetKind::Mode, reference),
                Token::Text { .. } => continue,
            };
            let widget = self.renderer.create(kind, reference);
            self.widgets.insert(instance_key(reference, index), widget);
        }

        self.surface.replace_nodes(render_nodes(tokens, mode));
    }

    /// Records a value as rendered without touching the surface, used when the
    /// surface itself produced that value.
    pub fn mark_rendered(&mut self, tokens: &[Token], mode: Option<&ReferenceToken>) {
        self.rendered = Some(RenderSnapshot::new(tokens, mode));
    }

    /// Runs the deferred caret restoration scheduled by the last rebuild.
    pub fn after_layout(&mut self) -> Option<usize> {
        let pos = self.pending_cursor.take()?;
        self.place_cursor(pos);
        Some(pos)
    }

    /// Collapses the caret at `pos`, clamped to the content and to the slot
    /// after a leading mode.
    pub fn place_cursor(&mut self, pos: usize) {
        self.surface.set_cursor(pos);
    }

    /// Tears the surface down, disposing every widget instance.
    pub fn dispose(&mut self) {
        self.widgets.drain();
        self.surface.replace_nodes(Vec::new());
        self.rendered = None;
        self.pending_cursor = None;
    }
}

impl std::fmt::Debug for SurfaceSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceSynchronizer")
            .field("surface", &self.surface)
            .field("widgets", &self.widgets)
            .field("rendered", &self.rendered)
            .field("pending_cursor", &self.pending_cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::NoopRenderer;

    #[test]
    fn trailing_widget_gets_an_empty_text_slot() {
        let nodes = render_nodes(&[Token::text("a"), Token::reference("r", "R", "v")], None);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2], SurfaceNode::Text(String::new()));
    }

    #[test]
    fn malformed_widget_extracts_as_empty_reference() {
        let surface = Surface::from_nodes(vec![
            SurfaceNode::Text("hi ".into()),
            SurfaceNode::Widget(WidgetNode::default()),
        ]);
        assert_eq!(
            extract(&surface),
            vec![Token::text("hi "), Token::reference("", "", "")]
        );
    }

    #[test]
    fn text_around_a_mode_widget_extracts_as_one_run() {
        let nodes = render_nodes(&[Token::text("ab")], Some(&ReferenceToken::new("m", "M", "m")));
        let mut shuffled = vec![SurfaceNode::Text("x".into())];
        shuffled.extend(nodes);
        assert_eq!(extract(&Surface::from_nodes(shuffled)), vec![Token::text("xab")]);
    }

    #[test]
    fn unchanged_value_does_not_rebuild() {
        let mut sync = SurfaceSynchronizer::new(Box::new(NoopRenderer));
        let tokens = vec![Token::text("a")];
        assert!(sync.sync(&tokens, None, None));
        assert!(!sync.sync(&tokens.clone(), None, None));
        assert!(sync.sync(&tokens, None, Some(1)));
        assert_eq!(sync.after_layout(), Some(1));
        assert_eq!(sync.surface().caret(), Some(1));
    }

    #[test]
    fn restore_after_trailing_widget_lands_in_the_slot() {
        let mut sync = SurfaceSynchronizer::new(Box::new(NoopRenderer));
        let tokens = vec![Token::text("ab"), Token::reference("r", "R", "v")];
        sync.sync(&tokens, None, Some(3));
        sync.after_layout();
        assert_eq!(sync.surface().caret(), Some(3));
        sync.surface_mut().insert_text("c");
        assert_eq!(
            extract(sync.surface()),
            vec![
                Token::text("ab"),
                Token::reference("r", "R", "v"),
                Token::text("c")
            ]
        );
    }
}
