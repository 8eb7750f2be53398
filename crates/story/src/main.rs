mod render;
mod session;

use std::path::PathBuf;

use clap::Parser;
use manos_prompt_core::{KeyInput, PromptConfig, PromptEvent, PromptInput};
use tracing_subscriber::EnvFilter;

use crate::render::{ChipRenderer, menu_lines, surface_line};
use crate::session::{Session, Step};

/// Drives a prompt input through a scripted session and prints what a host
/// would see after every step.
#[derive(Debug, Parser)]
#[command(name = "manos-prompt-story", version)]
struct Args {
    /// Session script (JSON). Runs the built-in demo when omitted.
    session: Option<PathBuf>,

    /// Menu configuration (JSON) replacing the session's own.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print events as JSON lines.
    #[arg(long)]
    json: bool,

    /// Keep the content after a submit instead of clearing it.
    #[arg(long)]
    keep: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut session = match &args.session {
        Some(path) => Session::load(path)?,
        None => Session::demo(),
    };
    if let Some(path) = &args.config {
        let source = std::fs::read_to_string(path)?;
        session.config = PromptConfig::from_json_str(&source)?;
    }

    let mut host = Host::new(session.config.clone(), &args);
    host.prompt.set_props(session.tokens.clone(), session.mode.clone());
    host.prompt.after_layout();
    host.prompt.focus();
    host.show("start");

    for step in &session.steps {
        host.run(step)?;
    }

    println!("final: {}", host.prompt.value().to_json_pretty()?);
    host.prompt.dispose();
    Ok(())
}

/// A controlled host: echoes every change back and reacts to submit and
/// mode removal.
struct Host {
    prompt: PromptInput,
    json: bool,
    keep: bool,
}

impl Host {
    fn new(config: PromptConfig, args: &Args) -> Self {
        Self {
            prompt: PromptInput::with_renderer(config, Box::new(ChipRenderer::default())),
            json: args.json,
            keep: args.keep,
        }
    }

    fn run(&mut self, step: &Step) -> anyhow::Result<()> {
        let label = match step {
            Step::Type { text } => {
                for c in text.chars() {
                    self.prompt.press(KeyInput::char(c));
                    self.flush()?;
                }
                format!("type {text:?}")
            }
            Step::Key { key } => {
                let outcome = self.prompt.press(Step::key_input(key)?);
                self.flush()?;
                format!("key {key} ({outcome:?})")
            }
            Step::Insert { text, position } => {
                self.prompt.insert_text(text, *position);
                self.flush()?;
                format!("insert {text:?}")
            }
            Step::Select { index } => {
                let selected = self.prompt.select_option(*index);
                self.flush()?;
                format!("select {index} ({selected})")
            }
            Step::Caret { position } => {
                self.prompt.set_selection_range(*position, *position);
                self.flush()?;
                format!("caret {position}")
            }
            Step::ScrollToEnd => {
                self.prompt.menu_scrolled_to_end();
                self.flush()?;
                "scroll to end".to_string()
            }
            Step::Recover => {
                self.prompt.menu_recovery();
                self.flush()?;
                "recover".to_string()
            }
            Step::Blur => {
                self.prompt.blur();
                self.flush()?;
                "blur".to_string()
            }
            Step::Focus => {
                self.prompt.focus();
                "focus".to_string()
            }
        };
        self.show(&label);
        Ok(())
    }

    /// Delivers pending events, feeding the results back as props.
    fn flush(&mut self) -> anyhow::Result<()> {
        for event in self.prompt.drain_events() {
            self.print_event(&event)?;
            match event {
                PromptEvent::Change { tokens, mode, .. } => {
                    self.prompt.set_props(tokens, mode);
                    self.prompt.after_layout();
                }
                PromptEvent::ModeRemoved => {
                    let tokens = self.prompt.tokens().to_vec();
                    self.prompt.set_props(tokens, None);
                    self.prompt.after_layout();
                }
                PromptEvent::Action { .. } if !self.keep => {
                    self.prompt.set_props(Vec::new(), None);
                    self.prompt.after_layout();
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn print_event(&self, event: &PromptEvent) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("  -> {} {event:?}", event.name());
        }
        Ok(())
    }

    fn show(&self, label: &str) {
        println!("{label:<24} {}", surface_line(&self.prompt));
        for line in menu_lines(&self.prompt) {
            println!("{line}");
        }
    }
}
