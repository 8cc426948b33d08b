//! # Document Subcommands
//!
//! - `credence sign` attaches an Ed25519 proof to an unsigned credential or
//!   presentation. The key must be the issuer's (credential) or the
//!   holder's (presentation).
//! - `credence verify` runs the full verifier offline. Signers are resolved
//!   by decoding their `did:key`; revocation comes from an optional list of
//!   revoked credential ids.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use credence_core::Timestamp;
use credence_vc::presentation::VERIFIABLE_PRESENTATION_TYPE;
use credence_vc::{
    CredentialTypeValue, DidKeyResolver, RevocationList, VerifiableCredential,
    VerifiablePresentation, Verifier,
};

use crate::keys::read_key_file;
use crate::read_json;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Private key file written by `credence keygen`.
    #[arg(long)]
    pub key: PathBuf,
    /// Proof `created` time (RFC 3339). Defaults to now.
    #[arg(long)]
    pub created: Option<String>,
    /// Write the signed document here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Unsigned credential or presentation JSON.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JSON file with an array of revoked credential ids.
    #[arg(long)]
    pub revoked: Option<PathBuf>,
    /// Evaluate validity periods at this time (RFC 3339). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
    /// Credential or presentation JSON.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let key = read_key_file(&args.key)?;
    let created = match &args.created {
        Some(raw) => Timestamp::parse(raw).context("invalid --created")?,
        None => Timestamp::now(),
    };
    let document = read_json(&args.file)?;

    let signed = if is_presentation(&document) {
        let mut vp: VerifiablePresentation =
            serde_json::from_value(document).context("not a verifiable presentation")?;
        vp.sign(&key, created)?;
        tracing::info!(holder = %vp.holder, "signed presentation");
        serde_json::to_value(&vp)?
    } else {
        let mut vc: VerifiableCredential =
            serde_json::from_value(document).context("not a verifiable credential")?;
        vc.sign(&key, created)?;
        tracing::info!(credential_id = %vc.id, issuer = %vc.issuer, "signed credential");
        serde_json::to_value(&vc)?
    };

    let rendered = serde_json::to_string_pretty(&signed)?;
    match &args.output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(0)
}

pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let now = match &args.at {
        Some(raw) => Timestamp::parse(raw).context("invalid --at")?,
        None => Timestamp::now(),
    };
    let revocations = match &args.revoked {
        Some(path) => read_revocation_list(path)?,
        None => RevocationList::default(),
    };
    let document = read_json(&args.file)?;

    let outcome = Verifier::new(&DidKeyResolver, &revocations)
        .at(now)
        .verify_document(&document);
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(if outcome.is_valid() { 0 } else { 1 })
}

fn is_presentation(document: &Value) -> bool {
    document
        .get("type")
        .cloned()
        .and_then(|t| serde_json::from_value::<CredentialTypeValue>(t).ok())
        .is_some_and(|t| t.contains(VERIFIABLE_PRESENTATION_TYPE))
}

fn read_revocation_list(path: &Path) -> Result<RevocationList> {
    let ids: Vec<String> = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("{} must be a JSON array of credential ids", path.display()))?;
    Ok(RevocationList::new(ids))
}
