//! Key, token, envelope, and checksum commands.

use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::json;

use sealshare_core::config::AppConfig;
use sealshare_core::error::AppError;
use sealshare_crypto::checksum::checksum_reader;
use sealshare_crypto::{KeyDeriver, PasswordEnvelope, PasswordHasher};
use sealshare_service::LinkService;

use crate::output::{self, OutputFormat};

/// Arguments for `token`
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Number of tokens to generate
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: usize,
}

/// Arguments for `hash-password`
#[derive(Debug, Args)]
pub struct HashPasswordArgs {
    /// Password to hash
    pub password: String,
}

/// Arguments for `derive-key`
#[derive(Debug, Args)]
pub struct DeriveKeyArgs {
    /// Password to derive from
    pub password: String,
    /// Hex-encoded salt; a fresh one is generated when omitted
    #[arg(long)]
    pub salt: Option<String>,
    /// Iteration count; defaults to crypto.pbkdf2_iterations
    #[arg(long)]
    pub iterations: Option<u32>,
}

/// Arguments for `encrypt`
#[derive(Debug, Args)]
pub struct EncryptArgs {
    /// Plaintext input file
    pub input: PathBuf,
    /// Envelope output file (JSON)
    #[arg(short, long)]
    pub output: PathBuf,
    /// Password to seal with
    #[arg(short, long)]
    pub password: String,
}

/// Arguments for `decrypt`
#[derive(Debug, Args)]
pub struct DecryptArgs {
    /// Envelope input file (JSON)
    pub input: PathBuf,
    /// Plaintext output file
    #[arg(short, long)]
    pub output: PathBuf,
    /// Password the envelope was sealed with
    #[arg(short, long)]
    pub password: String,
}

/// Arguments for `checksum`
#[derive(Debug, Args)]
pub struct ChecksumArgs {
    /// File to hash
    pub file: PathBuf,
}

/// Arguments for `verify-checksum`
#[derive(Debug, Args)]
pub struct VerifyChecksumArgs {
    /// File to verify
    pub file: PathBuf,
    /// Expected hex SHA-256 digest
    pub expected: String,
}

/// Print fresh link tokens.
pub fn token(args: &TokenArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let links = LinkService::from_config(&config.share);
    let tokens: Vec<String> = (0..args.count).map(|_| links.generate_token()).collect();
    match format {
        OutputFormat::Table => tokens.iter().for_each(|t| println!("{t}")),
        OutputFormat::Json => output::print_item(&tokens, format),
    }
    Ok(())
}

/// Print an Argon2id PHC hash of the password.
pub fn hash_password(args: &HashPasswordArgs) -> Result<(), AppError> {
    let hash = PasswordHasher::new().hash_password(&args.password)?;
    println!("{hash}");
    Ok(())
}

/// Print a derived key with its salt.
pub fn derive_key(
    args: &DeriveKeyArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let salt = args
        .salt
        .as_deref()
        .map(hex::decode)
        .transpose()
        .map_err(|e| AppError::validation(format!("Salt is not valid hex: {e}")))?;

    let deriver = KeyDeriver::new(
        args.iterations.unwrap_or(config.crypto.pbkdf2_iterations),
        config.crypto.salt_length,
    );
    let derived = deriver.derive(args.password.as_bytes(), salt.as_deref())?;

    let salt_hex = hex::encode(&derived.salt);
    let key_hex = hex::encode(derived.key.as_bytes());
    match format {
        OutputFormat::Table => {
            output::print_kv("Salt", &salt_hex);
            output::print_kv("Iterations", &derived.iterations.to_string());
            output::print_kv("Key", &key_hex);
        }
        OutputFormat::Json => output::print_item(
            &json!({ "salt": salt_hex, "iterations": derived.iterations, "key": key_hex }),
            format,
        ),
    }
    Ok(())
}

/// Seal a file into a JSON password envelope.
pub async fn encrypt(args: &EncryptArgs, config: &AppConfig) -> Result<(), AppError> {
    let data = tokio::fs::read(&args.input).await?;
    let deriver = KeyDeriver::from_config(&config.crypto);
    let envelope = sealshare_crypto::encrypt_with_password(&data, &args.password, &deriver)?;

    tokio::fs::write(&args.output, serde_json::to_vec_pretty(&envelope)?).await?;
    output::print_success(&format!(
        "Encrypted {} bytes to '{}'",
        data.len(),
        args.output.display()
    ));
    output::print_kv("Plaintext SHA-256", &sealshare_crypto::checksum(&data));
    Ok(())
}

/// Open a JSON password envelope.
pub async fn decrypt(args: &DecryptArgs) -> Result<(), AppError> {
    let raw = tokio::fs::read(&args.input).await?;
    let envelope: PasswordEnvelope = serde_json::from_slice(&raw)
        .map_err(|e| AppError::validation(format!("Not a password envelope: {e}")))?;
    let plaintext = sealshare_crypto::decrypt_with_password(&envelope, &args.password)?;

    tokio::fs::write(&args.output, &plaintext).await?;
    output::print_success(&format!(
        "Decrypted {} bytes to '{}'",
        plaintext.len(),
        args.output.display()
    ));
    Ok(())
}

/// Print a file's SHA-256.
pub async fn checksum(args: &ChecksumArgs) -> Result<(), AppError> {
    let digest = file_checksum(&args.file).await?;
    println!("{digest}  {}", args.file.display());
    Ok(())
}

/// Compare a file's SHA-256 with an expected digest.
pub async fn verify_checksum(args: &VerifyChecksumArgs) -> Result<(), AppError> {
    let digest = file_checksum(&args.file).await?;
    if digest.eq_ignore_ascii_case(args.expected.trim()) {
        output::print_success("Checksum matches");
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Checksum mismatch: expected {}, got {digest}",
            args.expected.trim()
        )))
    }
}

async fn file_checksum(path: &Path) -> Result<String, AppError> {
    let path = path.to_path_buf();
    let digest = tokio::task::spawn_blocking(move || {
        std::fs::File::open(&path).and_then(checksum_reader)
    })
    .await
    .map_err(|e| AppError::internal(format!("Checksum task failed: {e}")))??;
    Ok(digest)
}
