/*!
 * Key file persistence
 *
 * `KeyFileManager` writes generated key pairs as a `<path>.pub` public file
 * and a `<path>` private file, and imports them again. Every file is
 * replaced atomically through a temporary file in the same directory.
 */

pub mod atomic;
mod manager;

pub use atomic::{write_atomic, write_atomic_with};
pub use manager::KeyFileManager;

#[cfg(test)]
mod tests;
