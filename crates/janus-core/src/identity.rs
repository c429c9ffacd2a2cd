/// Federated identity keys for Janus.
///
/// A verified email maps to exactly one user document in the store's
/// `_users` database:
/// - Document id: `org.couchdb.user:<email>`
/// - Roles: a fixed set carrying the federated-identity marker
/// - The email is used verbatim (no case folding), so the id and the tenant
///   hash stay identical across logins

pub const USERS_DB: &str = "_users";
pub const USER_DOC_PREFIX: &str = "org.couchdb.user:";
pub const USER_DOC_TYPE: &str = "user";

/// Role stamped on every user the gateway provisions.
pub const FEDERATED_ROLE: &str = "browserid";

pub fn user_roles() -> Vec<String> {
    vec![FEDERATED_ROLE.to_string()]
}

pub fn user_doc_id(email: &str) -> String {
    let mut id = String::with_capacity(USER_DOC_PREFIX.len() + email.len());
    id.push_str(USER_DOC_PREFIX);
    id.push_str(email);
    id
}

/// Loose sanity check applied before an email is used as a key.
///
/// The trust service is the authority on the address itself; this only rejects
/// values that could not be a mailbox at all (empty, whitespace, no `@`).
pub fn is_plausible_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_is_namespaced_email() {
        assert_eq!(
            user_doc_id("alice@example.com"),
            "org.couchdb.user:alice@example.com"
        );
    }

    #[test]
    fn email_is_not_case_folded() {
        assert_ne!(user_doc_id("Alice@example.com"), user_doc_id("alice@example.com"));
    }

    #[test]
    fn plausible_email_checks() {
        assert!(is_plausible_email("alice@example.com"));
        assert!(!is_plausible_email(""));
        assert!(!is_plausible_email("alice"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("alice@"));
        assert!(!is_plausible_email("al ice@example.com"));
    }

    #[test]
    fn roles_carry_federated_marker() {
        assert!(user_roles().iter().any(|r| r == FEDERATED_ROLE));
    }
}
