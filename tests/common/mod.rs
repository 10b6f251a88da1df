#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use oathkey::prompt::{PromptError, Prompter};
use oathkey::store::SoftToken;
use oathkey::up::{UpError, UpPrompt, UserPresence};
use oathkey::version::Version;

/// Base32 of the RFC 4226 / RFC 6238 test secret "12345678901234567890".
pub const RFC_SECRET_B32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

pub struct Present;

impl UserPresence for Present {
    fn require(&self, _: &UpPrompt) -> Result<(), UpError> {
        Ok(())
    }
}

pub struct Absent;

impl UserPresence for Absent {
    fn require(&self, _: &UpPrompt) -> Result<(), UpError> {
        Err(UpError::Timeout)
    }
}

/// Answers every confirmation with `answer` and hands out queued passwords.
pub struct ScriptedPrompter {
    answer: bool,
    passwords: Mutex<Vec<String>>,
    pub prompts: AtomicUsize,
    pub touches: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            passwords: Mutex::new(Vec::new()),
            prompts: AtomicUsize::new(0),
            touches: AtomicUsize::new(0),
        }
    }

    pub fn with_passwords(self, passwords: &[&str]) -> Self {
        *self.passwords.lock().unwrap() = passwords.iter().rev().map(|p| p.to_string()).collect();
        self
    }

    pub fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt_hidden(&self, _text: &str, _confirm: bool) -> Result<String, PromptError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.passwords.lock().unwrap().pop().ok_or(PromptError::Cancelled)
    }

    fn prompt(&self, text: &str) -> Result<String, PromptError> {
        self.prompt_hidden(text, false)
    }

    fn confirm(&self, _text: &str) -> Result<bool, PromptError> {
        Ok(self.answer)
    }

    fn touch_requested(&self) {
        self.touches.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn token_path(dir: &Path) -> PathBuf {
    dir.join("token.cbor")
}

pub fn settings_path(dir: &Path) -> PathBuf {
    dir.join("oath.json")
}

/// Create a fresh token in `dir` and open it with an always-present user.
pub fn new_token(dir: &Path, firmware: Version) -> SoftToken {
    let path = token_path(dir);
    SoftToken::create(&path, firmware).unwrap();
    reopen(dir)
}

pub fn reopen(dir: &Path) -> SoftToken {
    SoftToken::open(&token_path(dir), Box::new(Present)).unwrap()
}
