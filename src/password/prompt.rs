use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::Path;

use zeroize::Zeroizing;

use crate::error::{error_codes, KeyError, KeyResult};
use crate::keys::KeyType;
use crate::utils;

/// Prompt issued for the second entry of a new password
pub const CONFIRM_PROMPT: &str = "Confirm: ";

/// Notice shown when the two entries of a new password differ
pub const MISMATCH_NOTICE: &str = "Mismatch; try again.";

/// Somewhere a password can be read from
pub trait PasswordSource {
    /// Read one password after showing `prompt`. Input must not be echoed.
    fn read_password(&mut self, prompt: &str) -> KeyResult<String>;

    /// Tell the user that the confirmation did not match
    fn notify_mismatch(&mut self) {
        log::debug!("password confirmation mismatch");
        let mut stderr = io::stderr();
        let _ = writeln!(stderr, "{}", MISMATCH_NOTICE);
    }
}

/// Reads passwords from the controlling terminal without echo
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordSource for TerminalPrompt {
    fn read_password(&mut self, prompt: &str) -> KeyResult<String> {
        Ok(rpassword::prompt_password(prompt)?)
    }
}

/// Answers prompts from a fixed queue of passwords.
///
/// Every prompt shown is recorded so callers can inspect what was asked.
#[derive(Debug, Default)]
pub struct ScriptedPasswords {
    answers: VecDeque<Zeroizing<String>>,
    prompts: Vec<String>,
    mismatches: usize,
}

impl ScriptedPasswords {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|answer| Zeroizing::new(answer.into()))
                .collect(),
            prompts: Vec::new(),
            mismatches: 0,
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn mismatches(&self) -> usize {
        self.mismatches
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl PasswordSource for ScriptedPasswords {
    fn read_password(&mut self, prompt: &str) -> KeyResult<String> {
        self.prompts.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer.as_str().to_owned()),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no scripted password left to answer the prompt",
            )
            .into()),
        }
    }

    fn notify_mismatch(&mut self) {
        self.mismatches += 1;
    }
}

/// Resolve the password for a key operation.
///
/// A `given` password (including the empty string) is used as-is. Otherwise
/// `source` is asked, and with `confirm` set the entry has to be repeated;
/// a mismatch restarts the pair, at most `max_attempts` times.
pub fn acquire_password<S: PasswordSource + ?Sized>(
    source: &mut S,
    given: Option<&str>,
    prompt: &str,
    confirm: bool,
    max_attempts: u32,
) -> KeyResult<Zeroizing<String>> {
    if let Some(password) = given {
        log::debug!("password was specified by the caller");
        return Ok(Zeroizing::new(password.to_string()));
    }

    if !confirm {
        return Ok(Zeroizing::new(source.read_password(prompt)?));
    }

    for _ in 0..max_attempts {
        let first = Zeroizing::new(source.read_password(prompt)?);
        let second = Zeroizing::new(source.read_password(CONFIRM_PROMPT)?);
        if utils::secure_compare(&first, &second) {
            return Ok(first);
        }
        source.notify_mismatch();
    }

    Err(KeyError::format_error(
        "password",
        "two matching entries",
        &format!("{} mismatched attempts", max_attempts),
        error_codes::PASSWORD_MISMATCH,
    ))
}

/// Prompt shown when a new key of `keytype` is about to be written to `path`
pub fn creation_prompt(keytype: KeyType, path: &Path) -> String {
    let name = utils::display_name(path);
    match keytype {
        KeyType::Rsa => format!("Enter a password for the encrypted RSA key ({}): ", name),
        _ => format!("Enter a password for the {} key ({}): ", keytype.label(), name),
    }
}

/// Prompt shown when a private key of `keytype` is read from `path`
pub fn import_prompt(keytype: KeyType, path: &Path) -> String {
    let name = utils::display_name(path);
    match keytype {
        KeyType::Rsa => format!("Enter a password for the encrypted RSA file ({}): ", name),
        _ => format!(
            "Enter a password for the encrypted {} key ({}): ",
            keytype.label(),
            name
        ),
    }
}
