use std::collections::HashMap;
use tracing::debug;

/// Resolve a config value. A value starting with '$' names an environment variable
/// and is looked up in the environment snapshot; unresolved references yield `None`.
pub fn resolve_credential(value: &str, env: &HashMap<String, String>) -> Option<String> {
    match value.strip_prefix('$') {
        Some(var_name) => match env.get(var_name) {
            Some(resolved) if !resolved.is_empty() => {
                debug!(var = %var_name, "Resolved config value from environment");
                Some(resolved.clone())
            }
            _ => {
                debug!(var = %var_name, "Environment variable not set");
                None
            }
        },
        None if value.is_empty() => None,
        None => Some(value.to_string()),
    }
}

/// Redact sensitive values in a string. Secrets shorter than 4 characters are left
/// alone to avoid mangling unrelated text.
pub fn redact_credentials(text: &str, secrets: &[&str]) -> String {
    let mut result = text.to_string();
    for secret in secrets {
        if !secret.is_empty() && secret.len() >= 4 {
            result = result.replace(secret, "[REDACTED]");
        }
    }
    result
}
