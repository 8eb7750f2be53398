//! Trigger detection and the marker span that tracks an open menu's filter.

use crate::ops::{char_before, split_chars};
use crate::surface::{MarkerNode, Surface, SurfaceNode, SurfacePoint};
use crate::token::{ReferenceToken, Token};

/// Whether a trigger typed at cursor-space `position` may open a menu.
///
/// Start-anchored menus accept slot 0, or slot 1 when a mode already occupies
/// slot 0. Free menus accept the start of content or a position right after
/// whitespace, never a slot in front of the mode.
pub fn is_trigger_position_valid(
    content: &[Token],
    mode: Option<&ReferenceToken>,
    position: usize,
    use_at_start: bool,
) -> bool {
    let mode_len = usize::from(mode.is_some());
    if use_at_start {
        return position == 0 || (position == 1 && mode.is_some());
    }
    if position < mode_len {
        return false;
    }
    if position == mode_len {
        return true;
    }
    char_before(content, position - mode_len).is_some_and(char::is_whitespace)
}

/// Wraps the trigger at cursor-space `position` and the text following it up
/// to the next whitespace in a marker span. The caret keeps its cursor-space
/// position. Returns false when no such trigger char is on the surface.
pub fn wrap_trigger(surface: &mut Surface, menu_id: &str, trigger: char, position: usize) -> bool {
    let caret = surface.caret();

    let mut acc = 0usize;
    let mut found: Option<(usize, usize, String)> = None;
    for (index, node) in surface.nodes().iter().enumerate() {
        let len = node.cursor_len();
        if let SurfaceNode::Text(text) = node {
            if position >= acc && position < acc + len {
                let offset = position - acc;
                if text.chars().nth(offset) == Some(trigger) {
                    found = Some((index, offset, text.clone()));
                }
                break;
            }
        }
        acc += len;
    }
    let Some((index, offset, text)) = found else {
        tracing::debug!(menu_id, position, "trigger char not found on surface");
        return false;
    };

    surface.nodes_mut().remove(index);
    let (before, rest) = split_chars(&text, offset);
    let region_len = rest
        .chars()
        .skip(1)
        .position(char::is_whitespace)
        .map_or(rest.chars().count(), |ix| ix + 1);
    let (region, after) = split_chars(rest, region_len);

    let mut replacement = Vec::with_capacity(3);
    if !before.is_empty() {
        replacement.push(SurfaceNode::Text(before.to_string()));
    }
    replacement.push(SurfaceNode::Marker(MarkerNode {
        menu_id: menu_id.to_string(),
        text: region.to_string(),
    }));
    if !after.is_empty() {
        replacement.push(SurfaceNode::Text(after.to_string()));
    }
    for (ix, node) in replacement.into_iter().enumerate() {
        surface.nodes_mut().insert(index + ix, node);
    }

    if let Some(caret) = caret {
        surface.set_cursor(caret);
    }
    true
}

pub fn find_marker(surface: &Surface, menu_id: &str) -> Option<usize> {
    surface.nodes().iter().position(|node| {
        matches!(node, SurfaceNode::Marker(marker) if marker.menu_id == menu_id)
    })
}

pub fn marker_text(surface: &Surface, index: usize) -> Option<&str> {
    match surface.nodes().get(index) {
        Some(SurfaceNode::Marker(marker)) => Some(&marker.text),
        _ => None,
    }
}

/// True when the caret sits inside the marker, after its trigger char.
pub fn caret_in_marker(surface: &Surface, index: usize) -> bool {
    let Some(selection) = surface.selection() else {
        return false;
    };
    if !selection.is_collapsed() {
        return false;
    }
    let Some(caret) = surface.caret() else {
        return false;
    };
    let Some(marker) = surface.nodes().get(index) else {
        return false;
    };
    let start = surface.units_before(index);
    let len = marker.cursor_len();
    match selection.focus {
        SurfacePoint::Text { node, offset } if node == index => offset >= 1,
        _ => caret > start && caret <= start + len,
    }
}

/// Turns every marker back into plain text, merging it with neighbouring
/// text runs. The caret keeps its cursor-space position.
pub fn unwrap_markers(surface: &mut Surface) -> bool {
    if !surface
        .nodes()
        .iter()
        .any(|node| matches!(node, SurfaceNode::Marker(_)))
    {
        return false;
    }

    let caret = surface.caret();
    let nodes = std::mem::take(surface.nodes_mut());
    let mut out: Vec<SurfaceNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let text = match node {
            SurfaceNode::Marker(marker) => marker.text,
            SurfaceNode::Text(text) => text,
            widget => {
                out.push(widget);
                continue;
            }
        };
        match out.last_mut() {
            Some(SurfaceNode::Text(prev)) => prev.push_str(&text),
            _ => out.push(SurfaceNode::Text(text)),
        }
    }
    *surface.nodes_mut() = out;

    if let Some(caret) = caret {
        surface.set_cursor(caret);
    }
    true
}
