//! In-memory model of the host's editable text surface.
//!
//! The surface is a flat run of nodes: plain text, marker spans (text tagged
//! with the menu that owns it) and atomic widgets. Widgets are opaque to text
//! addressing; their only cursor presence is the single unit they occupy.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::mapper::{cursor_to_surface, surface_to_cursor};
use crate::ops::split_chars;
use crate::widget::WidgetKind;

pub type Attrs = BTreeMap<String, String>;

pub const ATTR_TOKEN_TYPE: &str = "token-type";
pub const ATTR_ID: &str = "id";
pub const ATTR_LABEL: &str = "label";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_INSTANCE: &str = "instance";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WidgetNode {
    pub attrs: Attrs,
}

impl WidgetNode {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerNode {
    pub menu_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceNode {
    Text(String),
    Marker(MarkerNode),
    Widget(WidgetNode),
}

impl SurfaceNode {
    pub fn text_content(&self) -> Option<&str> {
        match self {
            SurfaceNode::Text(text) => Some(text),
            SurfaceNode::Marker(marker) => Some(&marker.text),
            SurfaceNode::Widget(_) => None,
        }
    }

    pub fn cursor_len(&self) -> usize {
        match self.text_content() {
            Some(text) => text.chars().count(),
            None => 1,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            SurfaceNode::Text(text) => Some(text),
            SurfaceNode::Marker(marker) => Some(&mut marker.text),
            SurfaceNode::Widget(_) => None,
        }
    }
}

/// A native caret location.
///
/// `Text` addresses a char offset inside a text-bearing node. `Boundary`
/// addresses the gap before child `index`, which is the only way to put the
/// caret next to a widget that has no text neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePoint {
    Text { node: usize, offset: usize },
    Boundary { index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSelection {
    pub anchor: SurfacePoint,
    pub focus: SurfacePoint,
}

impl SurfaceSelection {
    pub fn collapsed(point: SurfacePoint) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone, Default)]
pub struct Surface {
    nodes: Vec<SurfaceNode>,
    selection: Option<SurfaceSelection>,
    focused: bool,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<SurfaceNode>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> &[SurfaceNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<SurfaceNode> {
        &mut self.nodes
    }

    /// Swaps in new content. Like a DOM subtree replacement, the old selection
    /// does not survive.
    pub fn replace_nodes(&mut self, nodes: Vec<SurfaceNode>) {
        self.nodes = nodes;
        self.selection = None;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn selection(&self) -> Option<SurfaceSelection> {
        self.selection
    }

    pub fn set_selection(&mut self, selection: Option<SurfaceSelection>) {
        self.selection = selection;
    }

    pub fn cursor_len(&self) -> usize {
        self.nodes.iter().map(SurfaceNode::cursor_len).sum()
    }

    pub fn units_before(&self, index: usize) -> usize {
        self.nodes
            .iter()
            .take(index)
            .map(SurfaceNode::cursor_len)
            .sum()
    }

    pub fn text_content(&self) -> String {
        self.nodes
            .iter()
            .filter_map(SurfaceNode::text_content)
            .collect()
    }

    pub fn caret(&self) -> Option<usize> {
        self.selection
            .map(|selection| surface_to_cursor(self, selection.focus))
    }

    /// The selection in cursor space, ordered start..end.
    pub fn cursor_range(&self) -> Option<Range<usize>> {
        self.selection.map(|selection| {
            let anchor = surface_to_cursor(self, selection.anchor);
            let focus = surface_to_cursor(self, selection.focus);
            anchor.min(focus)..anchor.max(focus)
        })
    }

    /// Lowest caret position. A leading mode widget is never typed in front of.
    pub fn cursor_floor(&self) -> usize {
        match self.nodes.first() {
            Some(SurfaceNode::Widget(widget))
                if widget.attr(ATTR_TOKEN_TYPE) == Some(WidgetKind::Mode.as_str()) =>
            {
                1
            }
            _ => 0,
        }
    }

    pub fn set_cursor(&mut self, pos: usize) {
        let point = cursor_to_surface(self, pos.max(self.cursor_floor()));
        self.selection = Some(SurfaceSelection::collapsed(point));
    }

    pub fn set_cursor_range(&mut self, anchor: usize, focus: usize) {
        let floor = self.cursor_floor();
        self.selection = Some(SurfaceSelection {
            anchor: cursor_to_surface(self, anchor.max(floor)),
            focus: cursor_to_surface(self, focus.max(floor)),
        });
    }

    /// Native typing: replaces a non-collapsed selection, then inserts at the
    /// caret.
    pub fn insert_text(&mut self, text: &str) {
        let floor = self.cursor_floor();
        match self.cursor_range() {
            Some(range) if range.end <= floor => self.set_cursor(floor),
            Some(range) if !range.is_empty() => {
                self.remove_units(range.start.max(floor)..range.end)
            }
            Some(_) => {}
            None => self.set_cursor(self.cursor_len()),
        }
        if text.is_empty() {
            return;
        }

        let Some(selection) = self.selection else {
            return;
        };
        let inserted = text.chars().count();
        let point = match selection.focus {
            SurfacePoint::Text { node, offset }
                if self
                    .nodes
                    .get(node)
                    .and_then(SurfaceNode::text_content)
                    .is_some() =>
            {
                SurfacePoint::Text { node, offset }
            }
            other => cursor_to_surface(self, surface_to_cursor(self, other)),
        };

        let caret = match point {
            SurfacePoint::Text { node, offset } => {
                let Some(target) = self.nodes.get_mut(node).and_then(SurfaceNode::text_mut) else {
                    return;
                };
                let offset = offset.min(target.chars().count());
                let byte = target.len() - split_chars(target, offset).1.len();
                target.insert_str(byte, text);
                SurfacePoint::Text {
                    node,
                    offset: offset + inserted,
                }
            }
            SurfacePoint::Boundary { index } => {
                let index = index.min(self.nodes.len());
                let prev_is_text = index > 0 && matches!(self.nodes[index - 1], SurfaceNode::Text(_));
                let next_is_text = matches!(self.nodes.get(index), Some(SurfaceNode::Text(_)));
                if prev_is_text {
                    let offset = self.nodes[index - 1].cursor_len() + inserted;
                    if let Some(prev) = self.nodes[index - 1].text_mut() {
                        prev.push_str(text);
                    }
                    SurfacePoint::Text {
                        node: index - 1,
                        offset,
                    }
                } else if next_is_text {
                    if let Some(next) = self.nodes[index].text_mut() {
                        next.insert_str(0, text);
                    }
                    SurfacePoint::Text {
                        node: index,
                        offset: inserted,
                    }
                } else {
                    self.nodes.insert(index, SurfaceNode::Text(text.to_string()));
                    SurfacePoint::Text {
                        node: index,
                        offset: inserted,
                    }
                }
            }
        };
        self.selection = Some(SurfaceSelection::collapsed(caret));
    }

    /// Native backspace. A widget before the caret goes away as a whole, the
    /// way a browser removes a non-editable inline element.
    pub fn delete_backward(&mut self) {
        let Some(range) = self.cursor_range() else {
            return;
        };
        if !range.is_empty() {
            self.remove_units(range);
        } else if range.start > 0 {
            self.remove_units(range.start - 1..range.start);
        }
    }

    pub fn move_caret(&mut self, delta: isize) {
        let Some(caret) = self.caret() else {
            return;
        };
        let max = self.cursor_len() as isize;
        let next = (caret as isize + delta).clamp(0, max) as usize;
        self.set_cursor(next);
    }

    pub(crate) fn remove_units(&mut self, range: Range<usize>) {
        let mut acc = 0usize;
        let mut out: Vec<SurfaceNode> = Vec::with_capacity(self.nodes.len());

        for node in self.nodes.drain(..) {
            let len = node.cursor_len();
            let start = acc;
            acc += len;
            if start + len <= range.start || start >= range.end {
                out.push(node);
                continue;
            }

            let lo = range.start.saturating_sub(start).min(len);
            let hi = (range.end - start).min(len);
            let keep = |text: &str| {
                let (head, rest) = split_chars(text, lo);
                let (_, tail) = split_chars(rest, hi - lo);
                format!("{head}{tail}")
            };

            match node {
                SurfaceNode::Widget(_) => {}
                SurfaceNode::Text(text) => {
                    let kept = keep(&text);
                    if !kept.is_empty() {
                        out.push(SurfaceNode::Text(kept));
                    }
                }
                SurfaceNode::Marker(marker) => {
                    let kept = keep(&marker.text);
                    if !kept.is_empty() {
                        out.push(SurfaceNode::Marker(MarkerNode {
                            menu_id: marker.menu_id,
                            text: kept,
                        }));
                    }
                }
            }
        }

        self.nodes = out;
        self.set_cursor(range.start);
    }
}
