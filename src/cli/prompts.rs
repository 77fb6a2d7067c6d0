//! Interactive prompts using dialoguer

use anyhow::Result;
use dialoguer::Confirm;
use std::path::Path;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Ask before a run replaces model files that already exist
pub fn confirm_overwrite_models(existing: &[&Path]) -> Result<bool> {
    let names: Vec<String> = existing.iter().map(|p| p.display().to_string()).collect();
    let message = format!(
        "{} saved model file(s) may be replaced ({}). Continue?",
        existing.len(),
        names.join(", ")
    );
    confirm_step(&message)
}
