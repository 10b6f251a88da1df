//! Resolving a free-text query against stored credentials.

use crate::oath::Credential;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("No matching credential found.")]
    NoMatch,
    #[error("Multiple matches, please make the query more specific.\n\n{}", .0.join("\n"))]
    MultipleMatches(Vec<String>),
}

/// Credentials whose display id contains `query`, ignoring case.
///
/// An exact, case-sensitive match wins outright. Hidden credentials are
/// skipped unless `show_hidden`. Encounter order is kept.
pub fn search<'a, I>(credentials: I, query: &str, show_hidden: bool) -> Vec<&'a Credential>
where
    I: IntoIterator<Item = &'a Credential>,
{
    let needle = query.to_lowercase();
    let mut hits = Vec::new();
    for credential in credentials {
        if !show_hidden && credential.is_hidden() {
            continue;
        }
        let id = credential.display_id();
        if id == query {
            return vec![credential];
        }
        if id.to_lowercase().contains(&needle) {
            hits.push(credential);
        }
    }
    hits
}

/// Demand exactly one hit; otherwise report every matched id.
pub fn require_single<'a>(hits: &[&'a Credential]) -> Result<&'a Credential, MatchError> {
    match hits {
        [] => Err(MatchError::NoMatch),
        [single] => Ok(*single),
        many => {
            let mut ids: Vec<String> = many.iter().map(|c| c.display_id()).collect();
            ids.sort();
            Err(MatchError::MultipleMatches(ids))
        }
    }
}
