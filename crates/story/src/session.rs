use std::path::Path;

use anyhow::Context as _;
use manos_prompt_core::{
    FilteringType, KeyInput, MenuDefinition, MenuOption, MenuStatus, PromptConfig, ReferenceToken,
    Token,
};
use serde::Deserialize;

/// One scripted host interaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Types text one key at a time.
    Type { text: String },
    /// Presses a key written like `"down"` or `"shift-enter"`.
    Key { key: String },
    /// Programmatic insertion, e.g. from transcription.
    Insert {
        text: String,
        #[serde(default)]
        position: Option<usize>,
    },
    Select { index: usize },
    Caret { position: usize },
    ScrollToEnd,
    Recover,
    Blur,
    Focus,
}

impl Step {
    pub fn key_input(key: &str) -> anyhow::Result<KeyInput> {
        key.parse::<KeyInput>()
            .with_context(|| format!("invalid key in session script: {key:?}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub config: PromptConfig,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub mode: Option<ReferenceToken>,
    pub steps: Vec<Step>,
}

impl Session {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session {}", path.display()))?;
        let session: Session = serde_json::from_str(&source)
            .with_context(|| format!("failed to parse session {}", path.display()))?;
        session.config.validate()?;
        Ok(session)
    }

    /// A walk through mentions, modes, atomic deletion and submit.
    pub fn demo() -> Self {
        let people = MenuDefinition::new("people", '@').options([
            MenuOption::new("john").label("John Doe"),
            MenuOption::new("jane")
                .label("Jane Roe")
                .description("Design lead"),
            MenuOption::new("bob").label("Bob").disabled(true),
        ]);
        let modes = MenuDefinition::new("modes", '/')
            .use_at_start(true)
            .options([
                MenuOption::new("ask").label("Ask"),
                MenuOption::new("dev").label("Developer"),
            ]);
        let files = MenuDefinition::new("files", '#')
            .filtering_type(FilteringType::Manual)
            .status(Some(MenuStatus::Pending));

        let step_type = |text: &str| Step::Type {
            text: text.to_string(),
        };
        let key = |key: &str| Step::Key {
            key: key.to_string(),
        };

        Session {
            config: PromptConfig::with_menus(vec![people, modes, files]),
            tokens: Vec::new(),
            mode: None,
            steps: vec![
                step_type("/de"),
                key("down"),
                key("enter"),
                step_type("ping @ja"),
                key("down"),
                key("enter"),
                step_type("about #rep"),
                Step::ScrollToEnd,
                key("escape"),
                step_type(" @x"),
                key("backspace"),
                key("backspace"),
                key("backspace"),
                Step::Insert {
                    text: " now".to_string(),
                    position: None,
                },
                key("enter"),
            ],
        }
    }
}
