use manos_prompt_core::{
    ATTR_LABEL, ATTR_TOKEN_TYPE, InlineRenderer, InlineWidget, MenuState, PromptInput,
    ReferenceToken, SurfaceNode, WidgetKind,
};

/// Chip widgets that only log their lifecycle.
#[derive(Debug, Default)]
pub struct ChipRenderer {
    next_id: usize,
}

struct Chip {
    id: usize,
    label: String,
}

impl InlineWidget for Chip {
    fn dispose(&mut self) {
        tracing::trace!(chip = self.id, label = %self.label, "chip disposed");
    }
}

impl InlineRenderer for ChipRenderer {
    fn create(&mut self, kind: WidgetKind, token: &ReferenceToken) -> Box<dyn InlineWidget> {
        self.next_id += 1;
        tracing::trace!(chip = self.next_id, kind = kind.as_str(), label = %token.label, "chip created");
        Box::new(Chip {
            id: self.next_id,
            label: token.label.clone(),
        })
    }
}

/// One line picture of the surface: `<mode>`, `[reference]`, `{marker}` and
/// `|` for the caret.
pub fn surface_line(prompt: &PromptInput) -> String {
    let mut caret = prompt.cursor_position();
    let mut out = String::new();
    let mut pos = 0usize;

    let mut put_caret = |out: &mut String, at: usize| {
        if caret == Some(at) {
            out.push('|');
            caret = None;
        }
    };

    for node in prompt.surface().nodes() {
        match node {
            SurfaceNode::Text(text) => {
                for c in text.chars() {
                    put_caret(&mut out, pos);
                    out.extend(c.escape_default());
                    pos += 1;
                }
            }
            SurfaceNode::Marker(marker) => {
                out.push('{');
                for c in marker.text.chars() {
                    put_caret(&mut out, pos);
                    out.push(c);
                    pos += 1;
                }
                put_caret(&mut out, pos);
                out.push('}');
            }
            SurfaceNode::Widget(widget) => {
                put_caret(&mut out, pos);
                let label = widget.attr(ATTR_LABEL).unwrap_or("?");
                if widget.attr(ATTR_TOKEN_TYPE) == Some(WidgetKind::Mode.as_str()) {
                    out.push_str(&format!("<{label}>"));
                } else {
                    out.push_str(&format!("[{label}]"));
                }
                pos += 1;
            }
        }
    }
    put_caret(&mut out, pos);
    out
}

pub fn menu_lines(prompt: &PromptInput) -> Vec<String> {
    let MenuState::Open(open) = prompt.menu_state() else {
        return Vec::new();
    };
    let mut lines = vec![format!(
        "  menu {} filter {:?} at {}",
        open.menu_id, open.filter_text, open.trigger_position
    )];
    for (ix, option) in prompt.filtered_options().into_iter().enumerate() {
        let pointer = if open.highlighted == Some(ix) { '>' } else { ' ' };
        let disabled = if option.disabled { " (disabled)" } else { "" };
        lines.push(format!("   {pointer} {}{disabled}", option.display_label()));
    }
    lines
}
