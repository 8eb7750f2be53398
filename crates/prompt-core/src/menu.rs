use serde::{Deserialize, Serialize};

use crate::ops::{insert_at, normalize, remove_units};
use crate::token::{ReferenceToken, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilteringType {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuStatus {
    Pending,
    Loading,
    Error,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl MenuOption {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: None,
            description: None,
            disabled: false,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }

    fn matches(&self, needle: &str) -> bool {
        [
            Some(self.value.as_str()),
            self.label.as_deref(),
            self.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }

    pub fn to_reference(&self) -> ReferenceToken {
        ReferenceToken::new(
            self.value.clone(),
            self.display_label().to_string(),
            self.value.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDefinition {
    pub id: String,
    pub trigger: char,
    /// Start-anchored menus produce the mode token instead of a reference.
    #[serde(default)]
    pub use_at_start: bool,
    #[serde(default)]
    pub options: Vec<MenuOption>,
    #[serde(default)]
    pub filtering_type: FilteringType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MenuStatus>,
}

impl MenuDefinition {
    pub fn new(id: impl Into<String>, trigger: char) -> Self {
        Self {
            id: id.into(),
            trigger,
            use_at_start: false,
            options: Vec::new(),
            filtering_type: FilteringType::Auto,
            status: None,
        }
    }

    pub fn use_at_start(mut self, use_at_start: bool) -> Self {
        self.use_at_start = use_at_start;
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = MenuOption>) -> Self {
        self.options = options.into_iter().collect();
        self
    }

    pub fn filtering_type(mut self, filtering_type: FilteringType) -> Self {
        self.filtering_type = filtering_type;
        self
    }

    pub fn status(mut self, status: Option<MenuStatus>) -> Self {
        self.status = status;
        self
    }
}

/// Options visible for a filter text. Manual menus are filtered by the caller.
pub fn filter_options<'a>(menu: &'a MenuDefinition, filter_text: &str) -> Vec<&'a MenuOption> {
    if menu.filtering_type == FilteringType::Manual || filter_text.is_empty() {
        return menu.options.iter().collect();
    }
    let needle = filter_text.to_lowercase();
    menu.options
        .iter()
        .filter(|option| option.matches(&needle))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMenu {
    pub menu_id: String,
    pub filter_text: String,
    /// Cursor-space position of the trigger character.
    pub trigger_position: usize,
    /// Index into the filtered options.
    pub highlighted: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open(OpenMenu),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTrigger {
    pub menu_id: String,
    pub trigger: char,
    pub position: usize,
}

#[derive(Debug, Default)]
pub struct MenuController {
    state: MenuState,
    pending: Option<PendingTrigger>,
}

impl MenuController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn open_menu(&self) -> Option<&OpenMenu> {
        match &self.state {
            MenuState::Open(open) => Some(open),
            MenuState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open(_))
    }

    /// Remembers an accepted trigger keystroke until its character has landed.
    pub fn arm(&mut self, pending: PendingTrigger) {
        self.pending = Some(pending);
    }

    pub fn take_pending(&mut self) -> Option<PendingTrigger> {
        self.pending.take()
    }

    pub fn disarm(&mut self) {
        self.pending = None;
    }

    pub fn open(&mut self, menu_id: impl Into<String>, trigger_position: usize) {
        let menu_id = menu_id.into();
        tracing::debug!(%menu_id, trigger_position, "menu opened");
        self.state = MenuState::Open(OpenMenu {
            menu_id,
            filter_text: String::new(),
            trigger_position,
            highlighted: None,
        });
    }

    /// Returns true when the filter text changed. A new filter resets the
    /// highlight since the option list changes under it.
    pub fn update_filter(&mut self, filter_text: &str, trigger_position: usize) -> bool {
        let MenuState::Open(open) = &mut self.state else {
            return false;
        };
        open.trigger_position = trigger_position;
        if open.filter_text == filter_text {
            return false;
        }
        open.filter_text = filter_text.to_string();
        open.highlighted = None;
        true
    }

    pub fn close(&mut self) -> Option<OpenMenu> {
        self.pending = None;
        match std::mem::take(&mut self.state) {
            MenuState::Open(open) => {
                tracing::debug!(menu_id = %open.menu_id, "menu closed");
                Some(open)
            }
            MenuState::Closed => None,
        }
    }

    pub fn set_highlight(&mut self, index: Option<usize>) {
        if let MenuState::Open(open) = &mut self.state {
            open.highlighted = index;
        }
    }

    /// Moves the highlight by `delta`, wrapping at both ends and skipping
    /// disabled options.
    pub fn move_highlight(&mut self, delta: isize, options: &[&MenuOption]) {
        let MenuState::Open(open) = &mut self.state else {
            return;
        };
        let count = options.len() as isize;
        if count == 0 {
            open.highlighted = None;
            return;
        }

        let mut ix = match open.highlighted {
            Some(ix) => ix as isize,
            None if delta > 0 => -1,
            None => count,
        };
        for _ in 0..count {
            ix = (ix + delta).rem_euclid(count);
            if !options[ix as usize].disabled {
                open.highlighted = Some(ix as usize);
                return;
            }
        }
    }
}

/// Outcome of committing a menu option against the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCommit {
    pub tokens: Vec<Token>,
    pub mode: Option<ReferenceToken>,
    /// Desired cursor-space caret position after the rebuild.
    pub cursor: usize,
}

/// Replaces the trigger and its filter text with the chosen option.
///
/// Start-anchored menus swap in a mode token at slot 0; free menus splice a
/// reference plus one trailing space in place of the trigger region.
pub fn commit_selection(
    content: &[Token],
    mode: Option<&ReferenceToken>,
    open: &OpenMenu,
    menu: &MenuDefinition,
    option: &MenuOption,
) -> MenuCommit {
    let trigger_length = 1 + open.filter_text.chars().count();
    let mode_len = usize::from(mode.is_some());
    let content_pos = open.trigger_position.saturating_sub(mode_len);
    let without_trigger = remove_units(content, content_pos..content_pos + trigger_length);

    if menu.use_at_start {
        return MenuCommit {
            tokens: normalize(without_trigger),
            mode: Some(option.to_reference()),
            cursor: 1,
        };
    }

    let tokens = insert_at(
        &without_trigger,
        content_pos,
        vec![Token::Reference(option.to_reference()), Token::text(" ")],
    );
    MenuCommit {
        tokens: normalize(tokens),
        mode: mode.cloned(),
        cursor: content_pos + mode_len + 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> MenuDefinition {
        MenuDefinition::new("people", '@').options([
            MenuOption::new("john").label("John Doe"),
            MenuOption::new("jane").description("Design lead"),
            MenuOption::new("bob").disabled(true),
        ])
    }

    #[test]
    fn auto_filter_matches_label_value_and_description() {
        let menu = people();
        let values = |filter: &str| {
            filter_options(&menu, filter)
                .into_iter()
                .map(|o| o.value.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(values(""), vec!["john", "jane", "bob"]);
        assert_eq!(values("DOE"), vec!["john"]);
        assert_eq!(values("design"), vec!["jane"]);
        assert_eq!(values("j"), vec!["john", "jane"]);
    }

    #[test]
    fn manual_filter_returns_everything() {
        let menu = people().filtering_type(FilteringType::Manual);
        assert_eq!(filter_options(&menu, "zzz").len(), 3);
    }

    #[test]
    fn highlight_wraps_and_skips_disabled() {
        let menu = people();
        let options = filter_options(&menu, "");
        let mut controller = MenuController::new();
        controller.open("people", 0);

        controller.move_highlight(1, &options);
        assert_eq!(controller.open_menu().unwrap().highlighted, Some(0));
        controller.move_highlight(1, &options);
        assert_eq!(controller.open_menu().unwrap().highlighted, Some(1));
        controller.move_highlight(1, &options);
        assert_eq!(controller.open_menu().unwrap().highlighted, Some(0));
        controller.move_highlight(-1, &options);
        assert_eq!(controller.open_menu().unwrap().highlighted, Some(1));
    }

    #[test]
    fn arrow_up_from_nothing_starts_at_the_end() {
        let menu = MenuDefinition::new("m", '/')
            .options([MenuOption::new("a"), MenuOption::new("b")]);
        let options = filter_options(&menu, "");
        let mut controller = MenuController::new();
        controller.open("m", 0);
        controller.move_highlight(-1, &options);
        assert_eq!(controller.open_menu().unwrap().highlighted, Some(1));
    }

    #[test]
    fn filter_change_resets_highlight() {
        let mut controller = MenuController::new();
        controller.open("people", 3);
        controller.set_highlight(Some(1));
        assert!(!controller.update_filter("", 3));
        assert_eq!(controller.open_menu().unwrap().highlighted, Some(1));
        assert!(controller.update_filter("jo", 3));
        assert_eq!(controller.open_menu().unwrap().highlighted, None);
    }

    #[test]
    fn reference_commit_splices_reference_and_space() {
        let open = OpenMenu {
            menu_id: "people".into(),
            filter_text: "jo".into(),
            trigger_position: 3,
            highlighted: Some(0),
        };
        let commit = commit_selection(
            &[Token::text("hi @jo")],
            None,
            &open,
            &people(),
            &MenuOption::new("john"),
        );
        assert_eq!(
            commit.tokens,
            vec![
                Token::text("hi "),
                Token::reference("john", "john", "john"),
                Token::text(" ")
            ]
        );
        assert_eq!(commit.cursor, 5);
    }

    #[test]
    fn commit_after_mode_puts_caret_after_the_space() {
        let mode = ReferenceToken::new("dev", "Developer", "dev");
        for trigger_position in [0, 1] {
            let open = OpenMenu {
                menu_id: "people".into(),
                filter_text: "jo".into(),
                trigger_position,
                highlighted: Some(0),
            };
            let commit = commit_selection(
                &[Token::text("@jo tail")],
                Some(&mode),
                &open,
                &people(),
                &MenuOption::new("john"),
            );
            assert_eq!(
                commit.tokens,
                vec![Token::reference("john", "john", "john"), Token::text("  tail")]
            );
            assert_eq!(commit.cursor, 3);
        }
    }

    #[test]
    fn start_anchored_commit_replaces_mode() {
        let menu = MenuDefinition::new("modes", '/').use_at_start(true);
        let current = ReferenceToken::new("old", "Old", "old");
        let open = OpenMenu {
            menu_id: "modes".into(),
            filter_text: "de".into(),
            trigger_position: 1,
            highlighted: None,
        };
        let commit = commit_selection(
            &[Token::text("/de rest")],
            Some(&current),
            &open,
            &menu,
            &MenuOption::new("dev").label("Developer"),
        );
        assert_eq!(commit.tokens, vec![Token::text(" rest")]);
        assert_eq!(
            commit.mode,
            Some(ReferenceToken::new("dev", "Developer", "dev"))
        );
        assert_eq!(commit.cursor, 1);
    }
}
