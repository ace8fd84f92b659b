//! Deterministic identifier derivation.
//!
//! Every extracted secret is written under a name the downstream
//! infrastructure-as-code templates can reference directly. Names must be
//! stable across runs, syntactically valid identifiers, and unique across
//! entity kinds and secret roles.
//!
//! Machine identities (ids, GUIDs) are hashed. Human-assigned names are
//! sanitized so they stay recognizable. Each role then adds its own fixed
//! prefix and suffix.

use sha2::{Digest, Sha256};

/// Separator between the components of a compound hash key.
const KEY_SEPARATOR: &str = ":";

/// Lowercase hex SHA-256 of an identity.
pub fn hash_name(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Turn a display name into an identifier.
///
/// Lowercases, replaces every character outside `[A-Za-z0-9]` with `_`, and
/// prefixes `_` when the result would not start with a letter or underscore.
pub fn sanitize(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    let starts_ok = sanitized
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_ok {
        sanitized.insert(0, '_');
    }
    sanitized
}

fn hash_compound(parts: &[&str]) -> String {
    hash_name(&parts.join(KEY_SEPARATOR))
}

/// Sensitive variable from a project or library variable set.
pub fn variable_secret(id: &str) -> String {
    format!("variable_{}_sensitive_value", hash_name(id))
}

/// Plain value companion of a variable.
pub fn variable_value(id: &str) -> String {
    format!("variable_{}_value", hash_name(id))
}

/// Primary secret of an account (password, secret key, JSON key, token or passphrase).
pub fn account_secret(name: &str) -> String {
    format!("account_{}", sanitize(name))
}

/// Private key file of an SSH key pair account.
pub fn account_cert(name: &str) -> String {
    format!("account_{}_cert", sanitize(name))
}

pub fn tenant_variable_secret(id: &str) -> String {
    format!("tenantvariable_{}_sensitive_value", hash_name(id))
}

pub fn certificate_data(name: &str) -> String {
    format!("certificate_{}_data", sanitize(name))
}

pub fn certificate_password(name: &str) -> String {
    format!("certificate_{}_password", sanitize(name))
}

pub fn feed_password(name: &str) -> String {
    format!("feed_{}_password", sanitize(name))
}

pub fn feed_secret_key(name: &str) -> String {
    format!("feed_{}_secretkey", sanitize(name))
}

pub fn git_credential_secret(id: &str) -> String {
    format!("gitcredential_{}_sensitive_value", hash_name(id))
}

/// Sensitive default value of a step template parameter.
///
/// Hashes both ids: parameter ids are only unique within one template.
pub fn step_template_parameter(template_id: &str, parameter_id: &str) -> String {
    format!(
        "steptemplate_{}_sensitive_value",
        hash_compound(&[template_id, parameter_id])
    )
}

/// Sensitive property of a deployment process action.
pub fn step_property(owner_id: &str, action_id: &str, property: &str) -> String {
    format!(
        "action_{}_sensitive_value",
        hash_compound(&[owner_id, action_id, property])
    )
}

/// Sensitive-variables encryption password of a deployment target.
pub fn machine_secret(name: &str) -> String {
    format!("target_{}_sensitive_value", sanitize(name))
}

pub fn machine_proxy_password(name: &str) -> String {
    format!("machineproxy_{}_password", sanitize(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_ID_HASH: &str = "6cc41d5ec590ab78cccecf81ef167d418c309a4598e8e45fef78039f7d9aa9fe";

    #[test]
    fn test_hash_name_is_stable() {
        assert_eq!(hash_name("test-id"), TEST_ID_HASH);
        assert_eq!(hash_name("test-id"), hash_name("test-id"));
        assert_ne!(hash_name("test-id"), hash_name("test-id2"));
    }

    #[test]
    fn test_variable_names() {
        assert_eq!(
            variable_secret("test-id"),
            format!("variable_{}_sensitive_value", TEST_ID_HASH)
        );
        assert_eq!(variable_value("test-id"), format!("variable_{}_value", TEST_ID_HASH));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("My Account"), "my_account");
        assert_eq!(sanitize("AWS-Prod.Key"), "aws_prod_key");
        assert_eq!(sanitize("1st feed"), "_1st_feed");
        assert_eq!(sanitize("_private"), "_private");
        assert_eq!(sanitize("#tag"), "_tag");
        assert_eq!(sanitize("café"), "caf_");
        assert_eq!(sanitize(""), "_");
    }

    #[test]
    fn test_prefixes_separate_kinds() {
        let names = [
            account_secret("x"),
            account_cert("x"),
            certificate_data("x"),
            certificate_password("x"),
            feed_password("x"),
            feed_secret_key("x"),
            machine_secret("x"),
            machine_proxy_password("x"),
            variable_secret("x"),
            tenant_variable_secret("x"),
            git_credential_secret("x"),
        ];
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn test_compound_keys_hash_every_component() {
        let a = step_property("Projects-1", "action-1", "Password");
        assert_ne!(a, step_property("Projects-2", "action-1", "Password"));
        assert_ne!(a, step_property("Projects-1", "action-2", "Password"));
        assert_ne!(a, step_property("Projects-1", "action-1", "Token"));

        let t = step_template_parameter("template-1", "param-1");
        assert_ne!(t, step_template_parameter("template-2", "param-1"));
        assert_ne!(
            step_template_parameter("ab", "c"),
            step_template_parameter("a", "bc")
        );
    }
}
