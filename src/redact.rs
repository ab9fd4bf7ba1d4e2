//! Secret redaction for error messages and log lines.
//!
//! Upstream libraries happily echo credentials back in failure text (SSH
//! auth errors, URL parse errors with userinfo). Every message that leaves
//! the client layer passes through a [`Redactor`] first.

/// Replaces known secret values in outbound text by substring replacement.
#[derive(Clone, Default, Debug)]
pub struct Redactor {
    secrets: Vec<String>,
}

/// Placeholder substituted for each secret occurrence.
const PLACEHOLDER: &str = "***REDACTED***";

impl Redactor {
    /// Build a redactor from the secret values known to this process.
    /// Empty strings are ignored — replacing "" would corrupt the message.
    pub fn new<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let secrets = secrets
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();
        Self { secrets }
    }

    /// Replace every occurrence of every known secret in `text`.
    pub fn scrub(&self, text: &str) -> String {
        let mut out = text.to_string();
        for secret in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), PLACEHOLDER);
            }
        }
        out
    }
}

/// Mask a credential for logging: first character plus asterisks.
/// Short values are fully masked so their length leaks nothing useful.
pub fn mask(secret: &str) -> String {
    let len = secret.chars().count();
    if len == 0 {
        return "None".to_string();
    }
    if len <= 2 {
        return "*".repeat(len);
    }
    let first = secret.chars().next().unwrap();
    format!("{}{}", first, "*".repeat(len - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrub_replaces_password() {
        let r = Redactor::new(["s3cret"]);
        let msg = r.scrub("login failed for admin with password s3cret");
        assert!(!msg.contains("s3cret"));
        assert!(msg.contains("***REDACTED***"));
    }

    #[test]
    fn scrub_replaces_all_occurrences() {
        let r = Redactor::new(["tok"]);
        assert_eq!(
            r.scrub("tok and tok again"),
            "***REDACTED*** and ***REDACTED*** again"
        );
    }

    #[test]
    fn scrub_handles_multiple_secrets() {
        let r = Redactor::new(["alpha", "beta"]);
        let msg = r.scrub("alpha/beta");
        assert_eq!(msg, "***REDACTED***/***REDACTED***");
    }

    #[test]
    fn empty_secret_is_ignored() {
        let r = Redactor::new([""]);
        assert_eq!(r.scrub("untouched"), "untouched");
    }

    #[test]
    fn mask_keeps_first_char_only() {
        assert_eq!(mask("password"), "p*******");
    }

    #[test]
    fn mask_short_values_fully() {
        assert_eq!(mask("ab"), "**");
        assert_eq!(mask(""), "None");
    }
}
