//! Conversion between cursor space and surface space.
//!
//! Cursor space counts every text char and every widget as one unit. Surface
//! space addresses text-bearing nodes only, so a widget advances the cursor by
//! one while contributing nothing to text offsets.

use crate::surface::{Surface, SurfaceNode, SurfacePoint};

/// Resolves a cursor-space position to a caret location on the surface.
///
/// A position sitting between a text run and a following widget resolves to
/// the end of the text run; a position right after a widget resolves to the
/// start of the next text run. Positions past the end clamp to the end.
pub fn cursor_to_surface(surface: &Surface, pos: usize) -> SurfacePoint {
    let total = surface.cursor_len();
    let pos = if pos > total {
        tracing::debug!(pos, total, "cursor position past end of content; clamping");
        total
    } else {
        pos
    };

    let mut remaining = pos;
    for (index, node) in surface.nodes().iter().enumerate() {
        match node {
            SurfaceNode::Widget(_) => {
                if remaining == 0 {
                    return SurfacePoint::Boundary { index };
                }
                remaining -= 1;
            }
            SurfaceNode::Text(_) | SurfaceNode::Marker(_) => {
                let len = node.cursor_len();
                if remaining <= len {
                    return SurfacePoint::Text {
                        node: index,
                        offset: remaining,
                    };
                }
                remaining -= len;
            }
        }
    }

    SurfacePoint::Boundary {
        index: surface.nodes().len(),
    }
}

/// Structural inverse of [`cursor_to_surface`]. Unresolvable points map to the
/// end of content.
pub fn surface_to_cursor(surface: &Surface, point: SurfacePoint) -> usize {
    match point {
        SurfacePoint::Text { node, offset } => match surface.nodes().get(node) {
            Some(found) if found.text_content().is_some() => {
                surface.units_before(node) + offset.min(found.cursor_len())
            }
            _ => {
                tracing::debug!(node, "caret points at a missing text node; using end");
                surface.cursor_len()
            }
        },
        SurfacePoint::Boundary { index } => {
            if index > surface.nodes().len() {
                tracing::debug!(index, "caret boundary out of range; using end");
            }
            surface.units_before(index)
        }
    }
}
