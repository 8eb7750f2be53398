mod config;
mod events;
mod input;
mod mapper;
mod menu;
mod ops;
mod prompt;
mod serde_value;
mod surface;
mod sync;
mod token;
mod trigger;
mod widget;

pub use crate::config::*;
pub use crate::events::*;
pub use crate::input::*;
pub use crate::mapper::*;
pub use crate::menu::*;
pub use crate::ops::*;
pub use crate::prompt::*;
pub use crate::serde_value::*;
pub use crate::surface::*;
pub use crate::sync::*;
pub use crate::token::*;
pub use crate::trigger::*;
pub use crate::widget::*;
