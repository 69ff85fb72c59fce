//! Print an argon2 hash of an admin PIN for `ADMIN_PIN_HASH`

use std::env;

use folio_server::{services::auth::hash_pin, validation::ADMIN_PIN};

fn main() {
    let pin = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-pin <PIN>");
        std::process::exit(1);
    });

    if !ADMIN_PIN.is_match(&pin) {
        eprintln!("PIN must be exactly 4 digits");
        std::process::exit(1);
    }

    match hash_pin(&pin) {
        Ok(hashed) => {
            println!("\nHash: {}\n", hashed);
            println!("# Paste this into your .env:");
            println!("ADMIN_PIN_HASH='{}'", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing PIN: {}", e);
            std::process::exit(1);
        }
    }
}
