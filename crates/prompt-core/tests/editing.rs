use std::sync::Arc;

use manos_prompt_core::{
    Key, KeyInput, KeyOutcome, MenuDefinition, MenuOption, MenuState, PromptConfig, PromptEvent,
    PromptInput, ReferenceToken, SerializeStyle, SurfaceNode, SurfacePoint, SurfaceSelection,
    Token, virtual_tokens,
};

fn modes() -> MenuDefinition {
    MenuDefinition::new("modes", '/').use_at_start(true).options([
        MenuOption::new("dev").label("Developer"),
        MenuOption::new("ask").label("Ask"),
    ])
}

fn prompt_at(
    config: PromptConfig,
    tokens: Vec<Token>,
    mode: Option<ReferenceToken>,
    caret: usize,
) -> PromptInput {
    let mut prompt = PromptInput::new(config);
    prompt.set_props(tokens, mode);
    prompt.after_layout();
    prompt.focus();
    prompt.set_selection_range(caret, caret);
    prompt
}

fn echo(prompt: &mut PromptInput) -> Vec<PromptEvent> {
    let events = prompt.drain_events();
    for event in &events {
        if let PromptEvent::Change { tokens, mode, .. } = event {
            prompt.set_props(tokens.clone(), mode.clone());
            prompt.after_layout();
        }
    }
    events
}

fn type_str(prompt: &mut PromptInput, text: &str) {
    for c in text.chars() {
        prompt.press(KeyInput::char(c));
        echo(prompt);
    }
}

#[test]
fn enter_submits_serialized_value() {
    let tokens = vec![
        Token::text("Hi "),
        Token::reference("j", "J", "<ref>J</ref>"),
    ];
    let mut prompt = prompt_at(PromptConfig::default(), tokens.clone(), None, 4);
    assert_eq!(prompt.press(KeyInput::new(Key::Enter)), KeyOutcome::Handled);
    assert_eq!(
        prompt.drain_events(),
        vec![PromptEvent::Action {
            value: "Hi <ref>J</ref>".into(),
            tokens,
        }]
    );
    assert_eq!(prompt.surface().text_content(), "Hi ");
}

#[test]
fn shift_enter_inserts_a_line_break() {
    let mut prompt = prompt_at(PromptConfig::default(), vec![Token::text("a")], None, 1);
    let key: KeyInput = "shift-enter".parse().unwrap();
    assert_eq!(prompt.press(key), KeyOutcome::Default);
    assert_eq!(prompt.tokens(), &[Token::text("a\n")]);
}

#[test]
fn enter_is_native_when_submit_is_off() {
    let config = PromptConfig {
        submit_on_enter: false,
        ..PromptConfig::default()
    };
    let mut prompt = prompt_at(config, vec![Token::text("a")], None, 1);
    assert_eq!(prompt.press(KeyInput::new(Key::Enter)), KeyOutcome::Default);
    assert!(matches!(
        prompt.drain_events().as_slice(),
        [PromptEvent::Change { value, .. }] if value == "a\n"
    ));
}

#[test]
fn composing_enter_is_left_alone() {
    let mut prompt = prompt_at(PromptConfig::default(), vec![Token::text("a")], None, 1);
    let outcome = prompt.handle_key_down(KeyInput::new(Key::Enter).composing());
    assert_eq!(outcome, KeyOutcome::Default);
    assert!(prompt.drain_events().is_empty());
}

#[test]
fn backspace_after_reference_removes_only_the_reference() {
    let tokens = vec![
        Token::text("ab"),
        Token::reference("r", "R", "r"),
        Token::text("cd"),
    ];
    let mut prompt = prompt_at(PromptConfig::default(), tokens, None, 3);
    assert_eq!(
        prompt.press(KeyInput::new(Key::Backspace)),
        KeyOutcome::Handled
    );

    let events = echo(&mut prompt);
    assert_eq!(
        events,
        vec![PromptEvent::Change {
            value: "abcd".into(),
            tokens: vec![Token::text("ab"), Token::text("cd")],
            mode: None,
        }]
    );
    assert_eq!(prompt.cursor_position(), Some(2));
    assert_eq!(prompt.surface().text_content(), "abcd");
    assert_eq!(prompt.widget_count(), 0);
}

#[test]
fn backspace_inside_text_is_native() {
    let tokens = vec![Token::reference("r", "R", "r"), Token::text("cd")];
    let mut prompt = prompt_at(PromptConfig::default(), tokens, None, 3);
    assert_eq!(
        prompt.press(KeyInput::new(Key::Backspace)),
        KeyOutcome::Default
    );
    assert_eq!(
        prompt.tokens(),
        &[Token::reference("r", "R", "r"), Token::text("c")]
    );
}

#[test]
fn backspace_after_mode_asks_the_host_to_drop_it() {
    let mode = ReferenceToken::new("dev", "Developer", "dev");
    let mut prompt = prompt_at(
        PromptConfig::default(),
        vec![Token::text("x")],
        Some(mode),
        1,
    );
    assert_eq!(
        prompt.press(KeyInput::new(Key::Backspace)),
        KeyOutcome::Handled
    );
    assert_eq!(prompt.drain_events(), vec![PromptEvent::ModeRemoved]);

    assert!(prompt.set_props(vec![Token::text("x")], None));
    prompt.after_layout();
    assert_eq!(prompt.cursor_position(), Some(0));
    assert_eq!(prompt.surface().text_content(), "x");
}

#[test]
fn typing_at_the_start_lands_after_the_mode() {
    let mode = ReferenceToken::new("dev", "Developer", "dev");
    let mut prompt = prompt_at(
        PromptConfig::default(),
        vec![Token::text("ab")],
        Some(mode.clone()),
        0,
    );
    assert_eq!(prompt.cursor_position(), Some(1));

    prompt
        .surface_mut()
        .set_selection(Some(SurfaceSelection::collapsed(SurfacePoint::Boundary {
            index: 0,
        })));
    type_str(&mut prompt, "x");
    assert_eq!(prompt.tokens(), &[Token::text("xab")]);
    assert_eq!(prompt.mode(), Some(&mode));
    assert!(matches!(
        prompt.surface().nodes().first(),
        Some(SurfaceNode::Widget(_))
    ));
    assert_eq!(prompt.surface().text_content(), "xab");
    assert_eq!(prompt.cursor_position(), Some(2));

    assert_eq!(
        prompt.press(KeyInput::new(Key::Backspace)),
        KeyOutcome::Default
    );
    assert_eq!(
        echo(&mut prompt),
        vec![PromptEvent::Change {
            value: "ab".into(),
            tokens: vec![Token::text("ab")],
            mode: Some(mode),
        }]
    );
    assert_eq!(prompt.cursor_position(), Some(1));
}

#[test]
fn ignored_mode_removal_leaves_later_typing_alone() {
    let mode = ReferenceToken::new("dev", "Developer", "dev");
    let mut prompt = prompt_at(
        PromptConfig::default(),
        vec![Token::text("x")],
        Some(mode.clone()),
        1,
    );
    prompt.press(KeyInput::new(Key::Backspace));
    assert_eq!(prompt.drain_events(), vec![PromptEvent::ModeRemoved]);

    prompt.press(KeyInput::char('y'));
    let events = prompt.drain_events();
    let [PromptEvent::Change { tokens, mode: echoed, .. }] = events.as_slice() else {
        panic!("expected a single change, got {events:?}");
    };
    assert_eq!(echoed.as_ref(), Some(&mode));
    assert!(!prompt.set_props(tokens.clone(), echoed.clone()));
    prompt.after_layout();
    assert_eq!(prompt.tokens(), &[Token::text("yx")]);
    assert_eq!(prompt.cursor_position(), Some(2));
}

#[test]
fn ignored_reference_deletion_is_not_replayed() {
    let tokens = vec![
        Token::text("ab"),
        Token::reference("r", "R", "r"),
        Token::text("cd"),
    ];
    let mut prompt = prompt_at(PromptConfig::default(), tokens, None, 3);
    prompt.press(KeyInput::new(Key::Backspace));
    assert_eq!(prompt.drain_events().len(), 1);

    prompt.press(KeyInput::char('z'));
    let events = prompt.drain_events();
    let [PromptEvent::Change { tokens, mode, .. }] = events.as_slice() else {
        panic!("expected a single change, got {events:?}");
    };
    assert!(!prompt.set_props(tokens.clone(), mode.clone()));
    prompt.after_layout();
    assert_eq!(prompt.surface().text_content(), "abzcd");
    assert_eq!(prompt.cursor_position(), Some(4));
}

#[test]
fn different_echo_keeps_the_captured_caret() {
    let tokens = vec![
        Token::text("ab"),
        Token::reference("r", "R", "r"),
        Token::text("cd"),
    ];
    let mut prompt = prompt_at(PromptConfig::default(), tokens, None, 3);
    prompt.press(KeyInput::new(Key::Backspace));
    prompt.drain_events();

    assert!(prompt.set_props(vec![Token::text("hello world")], None));
    prompt.after_layout();
    assert_eq!(prompt.cursor_position(), Some(3));
}

#[test]
fn start_commit_sets_a_single_mode() {
    let config = PromptConfig::with_menus(vec![modes()]);
    let mut prompt = prompt_at(config, Vec::new(), None, 0);

    type_str(&mut prompt, "/");
    prompt.press(KeyInput::new(Key::ArrowDown));
    prompt.press(KeyInput::new(Key::Enter));
    let events = echo(&mut prompt);
    assert!(events.contains(&PromptEvent::Change {
        value: String::new(),
        tokens: Vec::new(),
        mode: Some(ReferenceToken::new("dev", "Developer", "dev")),
    }));
    assert_eq!(prompt.cursor_position(), Some(1));

    type_str(&mut prompt, "/as");
    prompt.press(KeyInput::new(Key::ArrowDown));
    prompt.press(KeyInput::new(Key::Enter));
    echo(&mut prompt);

    let ask = ReferenceToken::new("ask", "Ask", "ask");
    assert_eq!(prompt.mode(), Some(&ask));
    assert!(prompt.tokens().is_empty());
    let stream = virtual_tokens(prompt.mode(), prompt.tokens());
    assert_eq!(stream.iter().filter(|token| token.is_mode()).count(), 1);
    assert_eq!(prompt.cursor_position(), Some(1));
}

#[test]
fn start_trigger_mid_text_is_plain_text() {
    let config = PromptConfig::with_menus(vec![modes()]);
    let mut prompt = prompt_at(config, vec![Token::text("a ")], None, 2);
    type_str(&mut prompt, "/");
    assert_eq!(prompt.menu_state(), &MenuState::Closed);
    assert_eq!(prompt.tokens(), &[Token::text("a /")]);
}

#[test]
fn stray_mode_tokens_are_dropped_from_content() {
    let mut prompt = PromptInput::default();
    prompt.set_props(vec![Token::mode("m", "M", "m"), Token::text("a")], None);
    assert_eq!(prompt.tokens(), &[Token::text("a")]);
}

#[test]
fn insert_text_at_position() {
    let mut prompt = prompt_at(PromptConfig::default(), vec![Token::text("ac")], None, 2);
    prompt.insert_text("b", Some(1));
    assert_eq!(prompt.tokens(), &[Token::text("abc")]);
    assert_eq!(prompt.cursor_position(), Some(2));
}

#[test]
fn select_all_then_type_replaces_content() {
    let tokens = vec![Token::text("old "), Token::reference("r", "R", "r")];
    let mut prompt = prompt_at(PromptConfig::default(), tokens, None, 0);
    prompt.select();
    prompt.press(KeyInput::char('x'));
    assert_eq!(prompt.tokens(), &[Token::text("x")]);
}

#[test]
fn custom_serializer_and_label_style() {
    let tokens = vec![Token::text("Hi "), Token::reference("j", "J", "<ref>J</ref>")];

    let config = PromptConfig {
        serialize_style: SerializeStyle::Labels,
        ..PromptConfig::default()
    };
    let prompt = prompt_at(config, tokens.clone(), None, 0);
    assert_eq!(prompt.form_value(), "Hi J");

    let mut prompt = PromptInput::new(PromptConfig::default())
        .tokens_to_text(Arc::new(|tokens: &[Token]| format!("{} tokens", tokens.len())));
    prompt.set_props(tokens, None);
    prompt.handle_key_down(KeyInput::new(Key::Enter));
    assert!(matches!(
        prompt.drain_events().as_slice(),
        [PromptEvent::Action { value, .. }] if value == "2 tokens"
    ));
}

#[test]
fn value_carries_the_mode() {
    let mode = ReferenceToken::new("dev", "Developer", "dev");
    let prompt = prompt_at(
        PromptConfig::default(),
        vec![Token::text("go")],
        Some(mode.clone()),
        0,
    );
    let value = prompt.value();
    assert_eq!(value.mode, Some(mode));
    assert_eq!(value.tokens, vec![Token::text("go")]);
}
