use serde::Serialize;

use crate::menu::MenuOption;
use crate::token::{ReferenceToken, Token};

/// Notifications published to the host, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PromptEvent {
    /// Content changed. The host is expected to echo `tokens`/`mode` back.
    Change {
        value: String,
        tokens: Vec<Token>,
        #[serde(skip_serializing_if = "Option::is_none")]
        mode: Option<ReferenceToken>,
    },
    /// Submit.
    Action { value: String, tokens: Vec<Token> },
    /// Backspace reached the mode widget; the host should drop the mode.
    ModeRemoved,
    MenuItemSelected {
        menu_id: String,
        option: MenuOption,
    },
    MenuLoadItems {
        menu_id: String,
        filtering_text: String,
        first_page: bool,
        same_page: bool,
    },
    MenuLoadMore { menu_id: String },
}

impl PromptEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PromptEvent::Change { .. } => "change",
            PromptEvent::Action { .. } => "action",
            PromptEvent::ModeRemoved => "mode_removed",
            PromptEvent::MenuItemSelected { .. } => "menu_item_selected",
            PromptEvent::MenuLoadItems { .. } => "menu_load_items",
            PromptEvent::MenuLoadMore { .. } => "menu_load_more",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_name() {
        let event = PromptEvent::MenuLoadMore {
            menu_id: "people".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["menu_id"], "people");
    }
}
