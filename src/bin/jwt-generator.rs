//! Development CLI that mints RS256 tokens accepted by the gateway.
//!
//! The signing half of the gateway's verification config: point it at the
//! RSA private key whose public half is registered under the same `kid`.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Duration, Utc};
use clap::Parser;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "jwt-generator")]
#[command(about = "Generate RS256 JWTs for testing the gateway", long_about = None)]
struct Cli {
    /// User id stored in the `sub` claim.
    #[arg(long, default_value = "test-user-123")]
    user_id: String,

    /// User role (admin or user).
    #[arg(long, default_value = "user")]
    role: String,

    /// Path to the RSA private key (PEM).
    #[arg(long, default_value = ".keys/private_key.pem")]
    private_key: PathBuf,

    /// Key id stamped into the token header.
    #[arg(long)]
    kid: String,

    /// Token lifetime in seconds.
    #[arg(long, default_value_t = 900)]
    duration_secs: i64,

    /// Token issuer.
    #[arg(long, default_value = "api-gateway-dev")]
    issuer: String,
}

#[derive(Serialize)]
struct Claims {
    sub: String,
    role: String,
    iss: String,
    iat: i64,
    exp: i64,
}

fn run(cli: Cli) -> Result<String, String> {
    if cli.kid.is_empty() {
        return Err("kid cannot be empty".into());
    }
    if cli.user_id.is_empty() {
        return Err("user-id cannot be empty".into());
    }
    if cli.duration_secs <= 0 {
        return Err("duration must be positive".into());
    }
    if cli.role != "admin" && cli.role != "user" {
        return Err(format!("invalid role: {}", cli.role));
    }

    let pem = std::fs::read(&cli.private_key)
        .map_err(|e| format!("failed to read private key {}: {e}", cli.private_key.display()))?;
    let key = EncodingKey::from_rsa_pem(&pem)
        .map_err(|e| format!("failed to parse private key: {e}"))?;

    let now = Utc::now();
    let claims = Claims {
        sub: cli.user_id,
        role: cli.role,
        iss: cli.issuer,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(cli.duration_secs)).timestamp(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(cli.kid);

    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| format!("failed to sign token: {e}"))
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("Error: {message}");
            ExitCode::from(1)
        }
    }
}
