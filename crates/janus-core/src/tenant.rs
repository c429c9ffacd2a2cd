//! Tenant database naming.
//!
//! Every (app, user) pair owns one database named
//! `<prefix><dev>_<app name>_<md5 hex of the user email>`. The name is a pure
//! function of the app record and the identity, so it is recomputed on every
//! login instead of being stored anywhere.
//!
//! The hash only has to be stable: changing it would orphan every existing
//! tenant database.

/// Length of the lowercase hex digest appended to tenant names.
pub const IDENTITY_HASH_LEN: usize = 32;

pub fn identity_hash(email: &str) -> String {
    format!("{:x}", md5::compute(email.as_bytes()))
}

/// Common prefix shared by all tenant databases of one app.
pub fn tenant_database_prefix(prefix: &str, dev: &str, app_name: &str) -> String {
    format!("{prefix}{dev}_{app_name}_")
}

pub fn tenant_database_name(prefix: &str, dev: &str, app_name: &str, email: &str) -> String {
    let mut name = tenant_database_prefix(prefix, dev, app_name);
    name.push_str(&identity_hash(email));
    name
}

fn is_identity_hash(s: &[u8]) -> bool {
    s.len() == IDENTITY_HASH_LEN && s.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Whether `db_name` is a tenant database of the given app.
///
/// The remainder after the app prefix must be exactly one identity hash, so an
/// app called `todo` does not claim the databases of an app called `todo_v2`.
pub fn is_tenant_database_of(db_name: &str, prefix: &str, dev: &str, app_name: &str) -> bool {
    let app_prefix = tenant_database_prefix(prefix, dev, app_name);
    match db_name.strip_prefix(app_prefix.as_str()) {
        Some(rest) => is_identity_hash(rest.as_bytes()),
        None => false,
    }
}

/// Whether `db_name` has the shape of a tenant database of any app under
/// `prefix`: `<prefix>..._<identity hash>`.
pub fn looks_like_tenant_database(db_name: &str, prefix: &str) -> bool {
    let Some(rest) = db_name.strip_prefix(prefix) else {
        return false;
    };
    let bytes = rest.as_bytes();
    if bytes.len() <= IDENTITY_HASH_LEN {
        return false;
    }
    let (head, hash) = bytes.split_at(bytes.len() - IDENTITY_HASH_LEN);
    head.len() > 1 && head.ends_with(b"_") && is_identity_hash(hash)
}

/// App names form the `_`-delimited middle segment of tenant names and may
/// not contain the delimiter, otherwise (`D1`, `a_b`) and (`D1_a`, `b`) would
/// share one tenant prefix.
pub fn is_valid_app_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('_')
}
