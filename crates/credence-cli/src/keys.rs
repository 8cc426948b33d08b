//! # Key Subcommands
//!
//! - `credence keygen` writes a private key file and its public key.
//! - `credence did` prints the `did:key` for a public key or key file.
//!
//! Private key files use the same envelope as key custody,
//! `{"private_key": "<base64 32-byte seed>"}`. Public key files hold the
//! multibase (`z…`) encoding.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use clap::Args;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use credence_crypto::{did_from_public_key, Ed25519KeyPair, Ed25519PublicKey};

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
    /// File name prefix: writes `<prefix>.key` and `<prefix>.pub`.
    #[arg(long, default_value = "credence")]
    pub prefix: String,
}

#[derive(Args, Debug)]
pub struct DidArgs {
    /// Multibase public key, or a path to a `.pub` or `.key` file.
    #[arg(value_name = "PUBKEY_OR_FILE")]
    pub input: String,
}

#[derive(Serialize, Deserialize)]
struct KeyFile<S> {
    private_key: S,
}

pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let key = Ed25519KeyPair::generate().context("key generation failed")?;
    let did = did_from_public_key(&key.public_key())?;

    let key_path = args.output.join(format!("{}.key", args.prefix));
    let pub_path = args.output.join(format!("{}.pub", args.prefix));
    write_key_file(&key_path, &key)?;
    std::fs::write(&pub_path, key.public_key().to_multibase())
        .with_context(|| format!("failed to write {}", pub_path.display()))?;

    tracing::info!(%did, key = %key_path.display(), "generated key pair");
    println!("OK: generated Ed25519 key pair");
    println!("  Private key: {}", key_path.display());
    println!("  Public key:  {}", pub_path.display());
    println!("  DID:         {did}");
    Ok(0)
}

pub fn run_did(args: &DidArgs) -> Result<u8> {
    let public_key = public_key_from_input(&args.input)?;
    println!("{}", did_from_public_key(&public_key)?);
    Ok(0)
}

/// Write a private key envelope.
pub fn write_key_file(path: &Path, key: &Ed25519KeyPair) -> Result<()> {
    let seed = key.secret_bytes();
    let encoded = Zeroizing::new(BASE64.encode(&*seed));
    let rendered = Zeroizing::new(serde_json::to_string(&KeyFile {
        private_key: encoded.as_str(),
    })?);
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    // `mode` only applies on creation; tighten an existing file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict {}", path.display()))?;
    }
    file.write_all(rendered.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Read a private key envelope.
pub fn read_key_file(path: &Path) -> Result<Ed25519KeyPair> {
    let content = Zeroizing::new(
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read key file {}", path.display()))?,
    );
    let envelope: KeyFile<String> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a private key file", path.display()))?;
    let encoded = Zeroizing::new(envelope.private_key);
    let seed = Zeroizing::new(
        BASE64
            .decode(encoded.trim())
            .context("private_key is not valid base64")?,
    );
    Ok(Ed25519KeyPair::from_secret_slice(&seed)?)
}

/// Literal multibase key, public key file, or private key file.
fn public_key_from_input(input: &str) -> Result<Ed25519PublicKey> {
    let path = Path::new(input);
    if !path.is_file() {
        if !input.starts_with('z') {
            bail!("{input} is neither a file nor a multibase public key");
        }
        return Ok(Ed25519PublicKey::from_multibase(input)?);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let trimmed = content.trim();
    if trimmed.starts_with('{') {
        return Ok(read_key_file(path)?.public_key());
    }
    Ed25519PublicKey::from_multibase(trimmed)
        .with_context(|| format!("{} does not hold a multibase public key", path.display()))
}
