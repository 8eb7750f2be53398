use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::token::ReferenceToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Reference,
    Mode,
}

impl WidgetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WidgetKind::Reference => "reference",
            WidgetKind::Mode => "mode",
        }
    }
}

/// A live host component embedded in the surface for one token.
pub trait InlineWidget {
    fn dispose(&mut self);
}

/// Creates the host components shown for reference and mode tokens.
pub trait InlineRenderer {
    fn create(&mut self, kind: WidgetKind, token: &ReferenceToken) -> Box<dyn InlineWidget>;
}

/// Renderer for hosts that draw widgets themselves from the node attributes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

struct NoopWidget;

impl InlineWidget for NoopWidget {
    fn dispose(&mut self) {}
}

impl InlineRenderer for NoopRenderer {
    fn create(&mut self, _kind: WidgetKind, _token: &ReferenceToken) -> Box<dyn InlineWidget> {
        Box::new(NoopWidget)
    }
}

/// Live widget instances keyed by their instance key.
///
/// Every instance is disposed exactly once: when replaced under the same key,
/// when the registry is drained, or when the registry is dropped.
#[derive(Default)]
pub struct WidgetRegistry {
    instances: HashMap<String, Box<dyn InlineWidget>>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, widget: Box<dyn InlineWidget>) {
        if let Some(mut previous) = self.instances.insert(key.into(), widget) {
            previous.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.instances.contains_key(key)
    }

    pub fn drain(&mut self) -> usize {
        let count = self.instances.len();
        for (_, mut widget) in self.instances.drain() {
            widget.dispose();
        }
        count
    }
}

impl Drop for WidgetRegistry {
    fn drop(&mut self) {
        self.drain();
    }
}

impl std::fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetRegistry")
            .field("instances", &self.instances.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Counted(Rc<Cell<usize>>);

    impl InlineWidget for Counted {
        fn dispose(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn replacing_a_key_disposes_the_old_instance() {
        let disposed = Rc::new(Cell::new(0));
        let mut registry = WidgetRegistry::new();
        registry.insert("a", Box::new(Counted(disposed.clone())));
        registry.insert("a", Box::new(Counted(disposed.clone())));
        assert_eq!(disposed.get(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn drop_disposes_everything() {
        let disposed = Rc::new(Cell::new(0));
        {
            let mut registry = WidgetRegistry::new();
            registry.insert("a", Box::new(Counted(disposed.clone())));
            registry.insert("b", Box::new(Counted(disposed.clone())));
        }
        assert_eq!(disposed.get(), 2);
    }
}
