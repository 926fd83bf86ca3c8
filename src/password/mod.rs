/*!
 * Password acquisition
 *
 * Passwords are either supplied by the caller or read from a
 * `PasswordSource`. An empty password means the private key is stored
 * unencrypted; only an absent password triggers a prompt.
 */

mod prompt;

pub use prompt::*;
