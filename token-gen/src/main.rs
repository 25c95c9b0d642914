use std::str::FromStr;

use clap::Parser;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Sign an HMAC JWT for calling the demo server locally.
///
/// - Claims start from `--claims` (a JSON object), then the flags below
///   override single fields
/// - `iat` is always now; `exp` is now + `--ttl` unless `--ttl 0`
/// - Outputs the token, and with `--quiet` nothing else
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Shared secret (same value as the server's JWT_SECRET)
    #[arg(long, env = "JWT_SECRET")]
    secret: String,

    /// Base claims as a JSON object, e.g. '{"role":"admin"}'
    #[arg(long, default_value = "{}")]
    claims: String,

    #[arg(long)]
    sub: Option<String>,

    #[arg(long)]
    aud: Option<String>,

    #[arg(long)]
    iss: Option<String>,

    /// Token id. Default: random UUID v4 (needed for targeted revocation).
    #[arg(long)]
    jti: Option<String>,

    /// Lifetime in seconds; 0 = no `exp` claim.
    #[arg(long, default_value_t = 3600)]
    ttl: i64,

    /// HS256, HS384 or HS512
    #[arg(long, default_value = "HS256")]
    alg: String,

    /// Print only the token (no extra lines)
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let algorithm = Algorithm::from_str(&args.alg)?;
    if !matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    ) {
        return Err(format!("unsupported algorithm {} (HS* only)", args.alg).into());
    }

    let mut claims: Map<String, Value> = match serde_json::from_str(&args.claims)? {
        Value::Object(map) => map,
        _ => return Err("--claims must be a JSON object".into()),
    };

    let iat = chrono::Utc::now().timestamp();
    let jti = args.jti.unwrap_or_else(|| Uuid::new_v4().to_string());

    claims.insert("iat".to_string(), iat.into());
    claims.insert("jti".to_string(), jti.clone().into());
    if args.ttl > 0 {
        claims.insert("exp".to_string(), (iat + args.ttl).into());
    }
    for (name, value) in [("sub", args.sub), ("aud", args.aud), ("iss", args.iss)] {
        if let Some(value) = value {
            claims.insert(name.to_string(), value.into());
        }
    }

    let token = encode(
        &Header::new(algorithm),
        &Value::Object(claims),
        &EncodingKey::from_secret(args.secret.as_bytes()),
    )?;

    if args.quiet {
        println!("{}", token);
        return Ok(());
    }

    println!("token: {}", token);
    println!("jti: {}", jti);
    println!("iat: {}", iat);
    if args.ttl > 0 {
        println!("exp: {}", iat + args.ttl);
    } else {
        println!("exp: (none)");
    }

    Ok(())
}
