use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of the store credential generated for each federated user.
///
/// The secret is handed to the store once (which keeps only a derived key) and
/// kept on the user record so later logins can open native sessions. It is
/// generated exactly once per identity and never rotated.
pub const SECRET_LEN: usize = 48;

/// Generate a new credential secret from the thread-local CSPRNG.
pub fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect()
}
