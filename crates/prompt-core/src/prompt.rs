//! The prompt input: a controlled token editor driven by host events.
//!
//! The host owns `tokens` and `mode`. Every content edit is published as a
//! [`PromptEvent::Change`] carrying the full replacement value, which the host
//! feeds back through [`PromptInput::set_props`]. Typed edits already live on
//! the surface, so echoing them back does not rebuild anything; edits the core
//! computes itself (menu commits, atomic deletions) reach the surface only
//! through that echo, together with the caret position they asked for.

use crate::config::{ConfigError, PromptConfig};
use crate::events::PromptEvent;
use crate::input::{Key, KeyInput, KeyOutcome};
use crate::menu::{
    FilteringType, MenuController, MenuDefinition, MenuOption, MenuState, MenuStatus,
    PendingTrigger, commit_selection, filter_options,
};
use crate::ops::{remove_units, token_before};
use crate::serde_value::PromptValue;
use crate::surface::Surface;
use crate::sync::{SurfaceSynchronizer, extract};
use crate::token::{ReferenceToken, Token, TokensToText, serialize_with, virtual_tokens};
use crate::trigger::{
    caret_in_marker, find_marker, is_trigger_position_valid, marker_text, unwrap_markers,
    wrap_trigger,
};
use crate::widget::{InlineRenderer, NoopRenderer};

pub struct PromptInput {
    config: PromptConfig,
    tokens_to_text: Option<TokensToText>,
    tokens: Vec<Token>,
    mode: Option<ReferenceToken>,
    sync: SurfaceSynchronizer,
    menu: MenuController,
    events: Vec<PromptEvent>,
    cursor_request: Option<CursorRequest>,
}

/// Caret position for the rebuild that echoes one computed edit. Any other
/// value arriving first cancels it.
#[derive(Debug, Clone)]
struct CursorRequest {
    tokens: Vec<Token>,
    mode: Option<ReferenceToken>,
    cursor: usize,
}

impl CursorRequest {
    fn matches(&self, tokens: &[Token], mode: Option<&ReferenceToken>) -> bool {
        self.tokens == tokens && self.mode.as_ref() == mode
    }
}

impl PromptInput {
    pub fn new(config: PromptConfig) -> Self {
        Self::with_renderer(config, Box::new(NoopRenderer))
    }

    pub fn with_renderer(config: PromptConfig, renderer: Box<dyn InlineRenderer>) -> Self {
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "prompt created with an invalid menu configuration");
        }
        Self {
            config,
            tokens_to_text: None,
            tokens: Vec::new(),
            mode: None,
            sync: SurfaceSynchronizer::new(renderer),
            menu: MenuController::new(),
            events: Vec::new(),
            cursor_request: None,
        }
    }

    /// Overrides how tokens turn into the published `value` string.
    pub fn tokens_to_text(mut self, tokens_to_text: TokensToText) -> Self {
        self.tokens_to_text = Some(tokens_to_text);
        self
    }

    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn mode(&self) -> Option<&ReferenceToken> {
        self.mode.as_ref()
    }

    pub fn value(&self) -> PromptValue {
        PromptValue::new(self.tokens.clone(), self.mode.clone())
    }

    /// Serialized text carried by the hidden form field.
    pub fn form_value(&self) -> String {
        self.serialize(&self.tokens)
    }

    pub fn menu_state(&self) -> &MenuState {
        self.menu.state()
    }

    pub fn surface(&self) -> &Surface {
        self.sync.surface()
    }

    /// Direct access for hosts applying native edits themselves. Follow any
    /// mutation with [`Self::handle_input`] or [`Self::handle_selection_change`].
    pub fn surface_mut(&mut self) -> &mut Surface {
        self.sync.surface_mut()
    }

    pub fn widget_count(&self) -> usize {
        self.sync.widget_count()
    }

    pub fn cursor_position(&self) -> Option<usize> {
        self.sync.surface().caret()
    }

    pub fn drain_events(&mut self) -> Vec<PromptEvent> {
        std::mem::take(&mut self.events)
    }

    /// Supplies the authoritative value. Returns true when the surface was
    /// rebuilt; the caret is restored by the next [`Self::after_layout`].
    pub fn set_props(&mut self, tokens: Vec<Token>, mode: Option<ReferenceToken>) -> bool {
        let stray = tokens.iter().filter(|token| token.is_mode()).count();
        if stray > 0 {
            tracing::warn!(stray, "mode tokens in content are ignored; pass the mode separately");
        }
        self.tokens = tokens.into_iter().filter(|token| !token.is_mode()).collect();
        self.mode = mode;

        let cursor = self.cursor_request.take().and_then(|request| {
            if request.matches(&self.tokens, self.mode.as_ref()) {
                Some(request.cursor)
            } else {
                tracing::debug!(
                    cursor = request.cursor,
                    "echo differs from the requested edit; caret request dropped"
                );
                None
            }
        });
        let rebuilt = self.sync.sync(&self.tokens, self.mode.as_ref(), cursor);
        if rebuilt {
            // The rebuild wiped any marker span.
            self.menu.close();
        }
        rebuilt
    }

    pub fn set_menus(&mut self, menus: Vec<MenuDefinition>) -> Result<(), ConfigError> {
        let config = PromptConfig {
            menus,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;

        let Some(open) = self.menu.open_menu().cloned() else {
            return Ok(());
        };
        match self.config.menu(&open.menu_id) {
            None => self.close_menu(),
            Some(menu) => {
                let count = filter_options(menu, &open.filter_text).len();
                if open.highlighted.is_some_and(|ix| ix >= count) {
                    self.menu.set_highlight(None);
                }
            }
        }
        Ok(())
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.config.disabled = disabled;
        if disabled {
            self.blur();
        }
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.config.read_only = read_only;
        if read_only {
            self.close_menu();
        }
    }

    /// Runs the caret restoration deferred by the last rebuild.
    pub fn after_layout(&mut self) -> Option<usize> {
        let restored = self.sync.after_layout();
        if let Some(pos) = restored {
            tracing::debug!(pos, "caret restored after layout");
        }
        restored
    }

    pub fn handle_key_down(&mut self, key: KeyInput) -> KeyOutcome {
        if self.config.disabled {
            return KeyOutcome::Handled;
        }
        if key.composing {
            return KeyOutcome::Default;
        }
        if self.config.read_only {
            return match key.key {
                Key::ArrowLeft | Key::ArrowRight | Key::ArrowUp | Key::ArrowDown => {
                    KeyOutcome::Default
                }
                _ => KeyOutcome::Handled,
            };
        }

        match key.key {
            Key::Enter if key.modifiers.is_empty() => self.enter(),
            Key::Escape if self.menu.is_open() => {
                self.close_menu();
                KeyOutcome::Handled
            }
            Key::ArrowDown if self.menu.is_open() => {
                self.move_highlight(1);
                KeyOutcome::Handled
            }
            Key::ArrowUp if self.menu.is_open() => {
                self.move_highlight(-1);
                KeyOutcome::Handled
            }
            Key::Backspace => self.backspace(),
            Key::Char(_) => {
                if let Some(c) = key.printable() {
                    self.detect_trigger(c);
                }
                KeyOutcome::Default
            }
            _ => KeyOutcome::Default,
        }
    }

    /// Content of the surface changed natively.
    pub fn handle_input(&mut self) {
        if let Some(pending) = self.menu.take_pending() {
            let surface = self.sync.surface_mut();
            if wrap_trigger(surface, &pending.menu_id, pending.trigger, pending.position) {
                self.menu.open(pending.menu_id.clone(), pending.position);
                self.events.push(PromptEvent::MenuLoadItems {
                    menu_id: pending.menu_id,
                    filtering_text: String::new(),
                    first_page: true,
                    same_page: false,
                });
            }
        }

        let content = extract(self.sync.surface());
        self.refresh_menu();

        if content != self.tokens {
            // A typed edit supersedes any computed edit the host has not echoed.
            self.cursor_request = None;
            self.sync.mark_rendered(&content, self.mode.as_ref());
            self.tokens = content.clone();
            self.publish_change(content, self.mode.clone());
        }
    }

    pub fn handle_selection_change(&mut self) {
        self.refresh_menu();
    }

    pub fn handle_blur(&mut self) {
        self.menu.disarm();
        self.close_menu();
    }

    /// Key-down, then the platform default when not suppressed, then the
    /// follow-up input or selection event.
    pub fn press(&mut self, key: KeyInput) -> KeyOutcome {
        let outcome = self.handle_key_down(key);
        if outcome == KeyOutcome::Handled || key.composing || key.modifiers.has_command() {
            return outcome;
        }

        match key.key {
            Key::Char(_) => {
                if let Some(c) = key.printable() {
                    self.sync.surface_mut().insert_text(c.encode_utf8(&mut [0; 4]));
                    self.handle_input();
                }
            }
            Key::Enter => {
                self.sync.surface_mut().insert_text("\n");
                self.handle_input();
            }
            Key::Backspace => {
                self.sync.surface_mut().delete_backward();
                self.handle_input();
            }
            Key::ArrowLeft => {
                self.sync.surface_mut().move_caret(-1);
                self.handle_selection_change();
            }
            Key::ArrowRight => {
                self.sync.surface_mut().move_caret(1);
                self.handle_selection_change();
            }
            _ => {}
        }
        outcome
    }

    pub fn focus(&mut self) {
        if self.config.disabled {
            return;
        }
        let surface = self.sync.surface_mut();
        surface.focus();
        if surface.selection().is_none() {
            let end = surface.cursor_len();
            surface.set_cursor(end);
        }
    }

    pub fn blur(&mut self) {
        self.sync.surface_mut().blur();
        self.handle_blur();
    }

    pub fn select(&mut self) {
        let surface = self.sync.surface_mut();
        let end = surface.cursor_len();
        surface.set_cursor_range(0, end);
        self.handle_selection_change();
    }

    /// Selects `start..end` in cursor space, clamped to the content and kept
    /// after a leading mode.
    pub fn set_selection_range(&mut self, start: usize, end: usize) {
        let surface = self.sync.surface_mut();
        let len = surface.cursor_len();
        surface.set_cursor_range(start.min(len), end.min(len));
        self.handle_selection_change();
    }

    /// Types `text` one char at a time at `position` (or the caret), running
    /// the same trigger detection as keyboard input.
    pub fn insert_text(&mut self, text: &str, position: Option<usize>) {
        if !self.config.is_editable() {
            return;
        }
        self.focus();
        if let Some(pos) = position {
            let surface = self.sync.surface_mut();
            let pos = pos.min(surface.cursor_len());
            surface.set_cursor(pos);
            self.handle_selection_change();
        }

        for c in text.chars() {
            if c == '\n' {
                self.sync.surface_mut().insert_text("\n");
                self.handle_input();
            } else {
                self.press(KeyInput::char(c));
            }
        }
    }

    /// Options of the open menu after filtering.
    pub fn filtered_options(&self) -> Vec<&MenuOption> {
        let Some(open) = self.menu.open_menu() else {
            return Vec::new();
        };
        match self.config.menu(&open.menu_id) {
            Some(menu) => filter_options(menu, &open.filter_text),
            None => Vec::new(),
        }
    }

    pub fn highlight_option(&mut self, index: Option<usize>) {
        self.menu.set_highlight(index);
    }

    /// Commits the filtered option at `index`. Returns false when no menu is
    /// open or the option is missing or disabled.
    pub fn select_option(&mut self, index: usize) -> bool {
        let Some(open) = self.menu.open_menu().cloned() else {
            return false;
        };
        let Some(menu) = self.config.menu(&open.menu_id).cloned() else {
            return false;
        };
        let Some(option) = filter_options(&menu, &open.filter_text)
            .get(index)
            .map(|option| (*option).clone())
        else {
            return false;
        };
        if option.disabled {
            return false;
        }

        let content = extract(self.sync.surface());
        let commit = commit_selection(&content, self.mode.as_ref(), &open, &menu, &option);
        self.close_menu();
        tracing::debug!(menu_id = %open.menu_id, option = %option.value, "menu option committed");

        self.events.push(PromptEvent::MenuItemSelected {
            menu_id: open.menu_id,
            option,
        });
        self.cursor_request = Some(CursorRequest {
            tokens: commit.tokens.clone(),
            mode: commit.mode.clone(),
            cursor: commit.cursor,
        });
        self.publish_change(commit.tokens, commit.mode);
        true
    }

    /// The options list reached its end; asks for the next page while the
    /// menu still has more to load.
    pub fn menu_scrolled_to_end(&mut self) {
        let Some(open) = self.menu.open_menu() else {
            return;
        };
        let pending = self
            .config
            .menu(&open.menu_id)
            .is_some_and(|menu| menu.status == Some(MenuStatus::Pending));
        if pending {
            self.events.push(PromptEvent::MenuLoadMore {
                menu_id: open.menu_id.clone(),
            });
        }
    }

    /// Retry after a failed load.
    pub fn menu_recovery(&mut self) {
        let Some(open) = self.menu.open_menu() else {
            return;
        };
        self.events.push(PromptEvent::MenuLoadItems {
            menu_id: open.menu_id.clone(),
            filtering_text: open.filter_text.clone(),
            first_page: false,
            same_page: true,
        });
    }

    pub fn dispose(&mut self) {
        self.menu.close();
        self.sync.dispose();
        self.cursor_request = None;
    }

    fn serialize(&self, tokens: &[Token]) -> String {
        match &self.tokens_to_text {
            Some(tokens_to_text) => tokens_to_text(tokens),
            None => serialize_with(tokens, self.config.serialize_style),
        }
    }

    fn publish_change(&mut self, tokens: Vec<Token>, mode: Option<ReferenceToken>) {
        let value = self.serialize(&tokens);
        self.events.push(PromptEvent::Change {
            value,
            tokens,
            mode,
        });
    }

    fn close_menu(&mut self) {
        if self.menu.close().is_some() {
            unwrap_markers(self.sync.surface_mut());
        }
    }

    fn move_highlight(&mut self, delta: isize) {
        let Some(open) = self.menu.open_menu() else {
            return;
        };
        let Some(menu) = self.config.menu(&open.menu_id) else {
            return;
        };
        let filter_text = open.filter_text.clone();
        let options = filter_options(menu, &filter_text);
        self.menu.move_highlight(delta, &options);
    }

    fn enter(&mut self) -> KeyOutcome {
        if let Some(highlighted) = self.menu.open_menu().map(|open| open.highlighted) {
            match highlighted {
                Some(index) => {
                    self.select_option(index);
                    return KeyOutcome::Handled;
                }
                None => self.close_menu(),
            }
        }
        if !self.config.submit_on_enter {
            return KeyOutcome::Default;
        }

        tracing::debug!(tokens = self.tokens.len(), "submit");
        let value = self.serialize(&self.tokens);
        self.events.push(PromptEvent::Action {
            value,
            tokens: self.tokens.clone(),
        });
        KeyOutcome::Handled
    }

    fn backspace(&mut self) -> KeyOutcome {
        let Some(range) = self.sync.surface().cursor_range() else {
            return KeyOutcome::Default;
        };

        if let Some(trigger_position) = self.menu.open_menu().map(|open| open.trigger_position) {
            // Deleting the trigger itself ends the menu; the filter text is
            // edited natively.
            if range.is_empty() && range.start == trigger_position + 1 {
                self.close_menu();
            }
            return KeyOutcome::Default;
        }
        if !range.is_empty() || range.start == 0 {
            return KeyOutcome::Default;
        }

        let pos = range.start;
        let content = extract(self.sync.surface());
        let stream = virtual_tokens(self.mode.as_ref(), &content);
        match token_before(&stream, pos).and_then(|ix| stream.get(ix)) {
            Some(Token::Mode(_)) => {
                tracing::debug!("backspace reached the mode");
                self.cursor_request = Some(CursorRequest {
                    tokens: content,
                    mode: None,
                    cursor: pos - 1,
                });
                self.events.push(PromptEvent::ModeRemoved);
                KeyOutcome::Handled
            }
            Some(Token::Reference(_)) => {
                let at = pos - 1 - usize::from(self.mode.is_some());
                let tokens = remove_units(&content, at..at + 1);
                self.cursor_request = Some(CursorRequest {
                    tokens: tokens.clone(),
                    mode: self.mode.clone(),
                    cursor: pos - 1,
                });
                self.publish_change(tokens, self.mode.clone());
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Default,
        }
    }

    fn detect_trigger(&mut self, c: char) {
        if self.menu.is_open() {
            return;
        }
        let Some(menu) = self.config.menu_for_trigger(c) else {
            return;
        };
        let surface = self.sync.surface();
        let range = surface
            .cursor_range()
            .unwrap_or_else(|| surface.cursor_len()..surface.cursor_len());

        // Typing replaces the selection, so judge the content without it.
        let mode_len = usize::from(self.mode.is_some());
        let content = extract(surface);
        let content = if range.is_empty() {
            content
        } else {
            remove_units(
                &content,
                range.start.saturating_sub(mode_len)..range.end.saturating_sub(mode_len),
            )
        };

        if is_trigger_position_valid(&content, self.mode.as_ref(), range.start, menu.use_at_start) {
            self.menu.arm(PendingTrigger {
                menu_id: menu.id.clone(),
                trigger: c,
                position: range.start,
            });
        } else {
            tracing::trace!(trigger = %c, position = range.start, "trigger ignored at this position");
        }
    }

    /// Re-reads the open menu's filter from its marker span, closing the menu
    /// when the span is gone or the caret has left it.
    fn refresh_menu(&mut self) {
        let Some(open) = self.menu.open_menu() else {
            return;
        };
        let menu_id = open.menu_id.clone();
        let surface = self.sync.surface();

        let Some(index) = find_marker(surface, &menu_id) else {
            tracing::debug!(%menu_id, "marker span lost; closing menu");
            self.menu.close();
            return;
        };
        let Some(menu) = self.config.menu(&menu_id) else {
            self.close_menu();
            return;
        };
        if !caret_in_marker(surface, index) {
            self.close_menu();
            return;
        }
        let filter = marker_text(surface, index)
            .and_then(|text| text.strip_prefix(menu.trigger))
            .filter(|filter| !filter.contains(char::is_whitespace))
            .map(str::to_string);
        let Some(filter) = filter else {
            self.close_menu();
            return;
        };

        let manual = menu.filtering_type == FilteringType::Manual;
        let trigger_position = surface.units_before(index);
        if self.menu.update_filter(&filter, trigger_position) && manual {
            self.events.push(PromptEvent::MenuLoadItems {
                menu_id,
                filtering_text: filter,
                first_page: true,
                same_page: false,
            });
        }
    }
}

impl Default for PromptInput {
    fn default() -> Self {
        Self::new(PromptConfig::default())
    }
}

impl std::fmt::Debug for PromptInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptInput")
            .field("config", &self.config)
            .field("tokens", &self.tokens)
            .field("mode", &self.mode)
            .field("sync", &self.sync)
            .field("menu", &self.menu)
            .field("events", &self.events)
            .field("cursor_request", &self.cursor_request)
            .finish()
    }
}
