//! In-memory fakes for unit tests.

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::oath::{Code, Credential, CredentialData, CredentialId, OathType};
use crate::prompt::{PromptError, Prompter};
use crate::store::{AccessKey, CredentialStore, StoreError};
use crate::version::Version;

pub struct FakeStore {
    pub version: Version,
    pub device_id: String,
    pub credentials: Vec<Credential>,
    pub key: Option<AccessKey>,
    pub unlocked: bool,
    /// Error returned by the next `put_credential`.
    pub put_error: Option<StoreError>,
    /// Touch credentials fail as if the user never touched.
    pub deny_touch: bool,
    pub puts: Cell<usize>,
    pub code_calls: Cell<usize>,
    pub hmac_calls: Cell<usize>,
    pub validate_calls: Cell<usize>,
}

impl FakeStore {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            device_id: "fake-device".to_string(),
            credentials: Vec::new(),
            key: None,
            unlocked: false,
            put_error: None,
            deny_touch: false,
            puts: Cell::new(0),
            code_calls: Cell::new(0),
            hmac_calls: Cell::new(0),
            validate_calls: Cell::new(0),
        }
    }

    pub fn with_ids(mut self, ids: &[&str]) -> Self {
        for id in ids {
            self.credentials.push(self.credential(id, OathType::Totp, false));
        }
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.key = Some(self.derive_key(password));
        self
    }

    pub fn credential(&self, id: &str, oath_type: OathType, touch: bool) -> Credential {
        Credential::new(&self.device_id, CredentialId::from(id), oath_type, touch)
    }
}

impl CredentialStore for FakeStore {
    fn version(&self) -> Version {
        self.version
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn locked(&self) -> bool {
        self.key.is_some() && !self.unlocked
    }

    fn derive_key(&self, password: &str) -> AccessKey {
        AccessKey::new(password.bytes().rev().collect())
    }

    fn validate(&mut self, key: &AccessKey) -> Result<(), StoreError> {
        self.validate_calls.set(self.validate_calls.get() + 1);
        match &self.key {
            Some(expected) if expected == key => {
                self.unlocked = true;
                Ok(())
            }
            Some(_) => Err(StoreError::WrongKey),
            None => Ok(()),
        }
    }

    fn set_key(&mut self, key: &AccessKey) -> Result<(), StoreError> {
        self.key = Some(key.clone());
        self.unlocked = true;
        Ok(())
    }

    fn unset_key(&mut self) -> Result<(), StoreError> {
        self.key = None;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.credentials.clear();
        self.key = None;
        Ok(())
    }

    fn list_credentials(&mut self) -> Result<Vec<Credential>, StoreError> {
        Ok(self.credentials.clone())
    }

    fn put_credential(
        &mut self,
        data: &CredentialData,
        touch_required: bool,
    ) -> Result<Credential, StoreError> {
        self.puts.set(self.puts.get() + 1);
        if let Some(e) = self.put_error.take() {
            return Err(e);
        }
        let credential =
            Credential::new(&self.device_id, data.id(), data.oath_type, touch_required);
        self.credentials.retain(|c| c.id != credential.id);
        self.credentials.push(credential.clone());
        Ok(credential)
    }

    fn delete_credential(&mut self, id: &CredentialId) -> Result<(), StoreError> {
        let before = self.credentials.len();
        self.credentials.retain(|c| &c.id != id);
        if self.credentials.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn calculate_all(
        &mut self,
        timestamp: u64,
    ) -> Result<Vec<(Credential, Option<Code>)>, StoreError> {
        Ok(self
            .credentials
            .iter()
            .map(|c| {
                let code = (c.oath_type == OathType::Totp && !c.touch_required)
                    .then(|| Code::new(c, timestamp, "000000".to_string()));
                (c.clone(), code)
            })
            .collect())
    }

    fn calculate_code(
        &mut self,
        credential: &Credential,
        timestamp: u64,
    ) -> Result<Code, StoreError> {
        self.code_calls.set(self.code_calls.get() + 1);
        if credential.touch_required && self.deny_touch {
            return Err(StoreError::SecurityConditionNotSatisfied);
        }
        Ok(Code::new(credential, timestamp, "123456".to_string()))
    }

    fn calculate(&mut self, id: &CredentialId, _challenge: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.hmac_calls.set(self.hmac_calls.get() + 1);
        let touch = self.credentials.iter().any(|c| &c.id == id && c.touch_required);
        if touch && self.deny_touch {
            return Err(StoreError::SecurityConditionNotSatisfied);
        }
        Ok(vec![0u8; 20])
    }
}

pub struct FakePrompter {
    pub answer: bool,
    pub passwords: Mutex<Vec<String>>,
    pub touches: AtomicUsize,
    pub confirms: AtomicUsize,
}

impl FakePrompter {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            passwords: Mutex::new(Vec::new()),
            touches: AtomicUsize::new(0),
            confirms: AtomicUsize::new(0),
        }
    }

    /// Queue passwords returned by `prompt_hidden`, first to last.
    pub fn with_passwords(self, passwords: &[&str]) -> Self {
        *self.passwords.lock().unwrap() = passwords.iter().rev().map(|p| p.to_string()).collect();
        self
    }

    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    pub fn confirms(&self) -> usize {
        self.confirms.load(Ordering::SeqCst)
    }
}

impl Prompter for FakePrompter {
    fn prompt_hidden(&self, _text: &str, _confirm: bool) -> Result<String, PromptError> {
        self.passwords.lock().unwrap().pop().ok_or(PromptError::Cancelled)
    }

    fn prompt(&self, text: &str) -> Result<String, PromptError> {
        self.prompt_hidden(text, false)
    }

    fn confirm(&self, _text: &str) -> Result<bool, PromptError> {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }

    fn touch_requested(&self) {
        self.touches.fetch_add(1, Ordering::SeqCst);
    }
}
