//! Interactive conflict resolution
//!
//! When a path is claimed as both file and directory and neither force list
//! settles it, the resolver gets a say. The prompt implementation asks on
//! the terminal via `dialoguer`; the scripted implementation answers from a
//! fixed table and backs both tests and `--assume` style automation.

use std::collections::HashMap;
use std::io::IsTerminal;

use dialoguer::{theme::ColorfulTheme, Select};
use tracing::warn;

use crate::types::{KindClaim, PathKey};

/// Answers a file-versus-directory question for one path. `None` means the
/// question stays unresolved and the default policy applies.
pub trait ConflictResolver {
    fn resolve(&mut self, path: &PathKey) -> Option<KindClaim>;
}

/// Terminal prompt. Declines to answer when stdin is not a terminal.
#[derive(Debug, Default)]
pub struct PromptResolver;

impl ConflictResolver for PromptResolver {
    fn resolve(&mut self, path: &PathKey) -> Option<KindClaim> {
        if !std::io::stdin().is_terminal() {
            return None;
        }
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "'{}' is declared as both a file and a directory. Treat it as:",
                path
            ))
            .items(&["file", "directory", "leave unresolved"])
            .default(1)
            .interact_opt();
        match selection {
            Ok(Some(0)) => Some(KindClaim::AsFile),
            Ok(Some(1)) => Some(KindClaim::AsDirectory),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %path, error = %e, "conflict prompt failed");
                None
            }
        }
    }
}

/// Preseeded answers keyed by path. Unlisted paths stay unresolved.
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    answers: HashMap<String, KindClaim>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, path: &str, claim: KindClaim) -> Self {
        self.answers.insert(path.to_string(), claim);
        self
    }
}

impl ConflictResolver for ScriptedResolver {
    fn resolve(&mut self, path: &PathKey) -> Option<KindClaim> {
        self.answers.get(path.as_str()).copied()
    }
}

/// Resolver that never answers. Used by non-interactive runs.
#[derive(Debug, Default)]
pub struct SilentResolver;

impl ConflictResolver for SilentResolver {
    fn resolve(&mut self, _path: &PathKey) -> Option<KindClaim> {
        None
    }
}
