//! Prints an Argon2 hash for a password, for seeding the users table.
//!
//! Usage: `hash-password <password>` or the password on stdin.

use std::io::BufRead;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let password = match std::env::args().nth(1) {
        Some(p) => p,
        None => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        return Err("password must not be empty".into());
    }
    println!("{}", tablerest::hash_password(&password)?);
    Ok(())
}
