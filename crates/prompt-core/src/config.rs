use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::menu::MenuDefinition;
use crate::token::SerializeStyle;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate menu id `{0}`")]
    DuplicateMenuId(String),
    #[error("trigger `{trigger}` is used by both `{first}` and `{second}`")]
    DuplicateTrigger {
        trigger: char,
        first: String,
        second: String,
    },
    #[error("menu `{0}` uses a whitespace trigger")]
    WhitespaceTrigger(String),
    #[error("invalid prompt config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub menus: Vec<MenuDefinition>,
    pub serialize_style: SerializeStyle,
    /// Plain Enter submits instead of inserting a line break.
    pub submit_on_enter: bool,
    pub disabled: bool,
    pub read_only: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            menus: Vec::new(),
            serialize_style: SerializeStyle::default(),
            submit_on_enter: true,
            disabled: false,
            read_only: false,
        }
    }
}

impl PromptConfig {
    pub fn with_menus(menus: Vec<MenuDefinition>) -> Self {
        Self {
            menus,
            ..Self::default()
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = HashSet::new();
        for menu in &self.menus {
            if !ids.insert(menu.id.as_str()) {
                return Err(ConfigError::DuplicateMenuId(menu.id.clone()));
            }
            if menu.trigger.is_whitespace() {
                return Err(ConfigError::WhitespaceTrigger(menu.id.clone()));
            }
        }
        for (ix, menu) in self.menus.iter().enumerate() {
            if let Some(other) = self.menus[..ix].iter().find(|m| m.trigger == menu.trigger) {
                return Err(ConfigError::DuplicateTrigger {
                    trigger: menu.trigger,
                    first: other.id.clone(),
                    second: menu.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn menu(&self, id: &str) -> Option<&MenuDefinition> {
        self.menus.iter().find(|menu| menu.id == id)
    }

    pub fn menu_for_trigger(&self, trigger: char) -> Option<&MenuDefinition> {
        self.menus.iter().find(|menu| menu.trigger == trigger)
    }

    /// Editing is allowed at all.
    pub fn is_editable(&self) -> bool {
        !self.disabled && !self.read_only
    }
}
