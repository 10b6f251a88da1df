pub struct UpPrompt {
    pub title: String,
    pub description: String,
}

pub fn touch_prompt(credential_id: &str) -> UpPrompt {
    UpPrompt {
        title: "oathkey".to_string(),
        description: format!(
            "Generate code\n\nCredential: {credential_id}\n\nPress OK to confirm presence, or Cancel to deny."
        ),
    }
}
