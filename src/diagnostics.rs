use std::path::Path;

use crate::config::Config;

pub fn check(cfg: &Config, token_path: &Path) -> anyhow::Result<()> {
    let mut errors: Vec<String> = Vec::new();

    // Check 1: token file present and readable
    match std::fs::OpenOptions::new().read(true).open(token_path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => errors.push(format!(
            "no token at {}\n  \
             → create one: oathkey token init",
            token_path.display()
        )),
        Err(e) => errors.push(format!(
            "cannot open {}: {e}\n  \
             → check the file permissions or pass --token",
            token_path.display()
        )),
    }

    // Check 2: pinentry binary found. Only prompts and touch need it.
    if let Err(e) = std::process::Command::new(&cfg.pinentry)
        .arg("--version")
        .output()
    {
        tracing::warn!(
            pinentry = %cfg.pinentry,
            error = %e,
            "pinentry binary not found; prompts and touch will fail"
        );
    }

    if errors.is_empty() {
        return Ok(());
    }

    for err in &errors {
        eprintln!("ERROR: {err}");
    }
    anyhow::bail!("{} preflight check(s) failed", errors.len());
}
