use std::env;
use std::path::PathBuf;
use std::process;

use keysmith::prelude::*;
use keysmith::utils::relative_display;

const USAGE: &str = "usage: keysmith <rsa|ed25519|ecdsa> [filepath]";

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.len() > 2 {
        eprintln!("{}", USAGE);
        process::exit(2);
    }

    if let Err(e) = run(&args[0], args.get(1).map(PathBuf::from)) {
        eprintln!("Error: {}", e);
        eprintln!("{}", e.user_friendly_message());
        process::exit(1);
    }
}

fn run(keytype: &str, filepath: Option<PathBuf>) -> KeyResult<()> {
    let mut manager = KeyFileManager::new(Settings::default())?;
    let filepath = filepath.as_deref();

    let written = match keytype {
        "rsa" => manager.generate_and_write_rsa_keypair(filepath, None, None)?,
        "ed25519" => manager.generate_and_write_ed25519_keypair(filepath, None)?,
        "ecdsa" => manager.generate_and_write_ecdsa_keypair(filepath, None)?,
        other => {
            eprintln!("Unknown key type '{}'", other);
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    let cwd = env::current_dir()?;
    let public = keysmith::utils::public_key_path(&written);
    println!("Private key: {}", relative_display(&written, &cwd));
    println!("Public key:  {}", relative_display(&public, &cwd));
    Ok(())
}
