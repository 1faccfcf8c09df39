//! Signing secret for session tokens.
//!
//! Taken from the environment when set, otherwise generated once and kept
//! in an owner-only file under the platform data directory so tokens
//! survive restarts.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::{info, warn};

/// Variables consulted in order; the first non-blank value wins.
pub const SECRET_ENV_VARS: [&str; 2] = ["JWT_SECRET", "AUTH_SECRET"];

const GENERATED_SECRET_LEN: usize = 64;

/// Secret from `JWT_SECRET`, then `AUTH_SECRET`, then the persisted file.
pub fn resolve_jwt_secret() -> String {
    resolve_with(|name| std::env::var(name).ok(), &default_secret_file())
}

/// `<data dir>/sso/jwt-secret`, or `./sso/jwt-secret` without a data dir.
pub fn default_secret_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sso")
        .join("jwt-secret")
}

fn resolve_with(lookup: impl Fn(&str) -> Option<String>, file: &Path) -> String {
    let from_env = SECRET_ENV_VARS
        .iter()
        .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()));
    if let Some(secret) = from_env {
        return secret;
    }

    match load_or_generate(file) {
        Ok(secret) => secret,
        Err(e) => {
            warn!(
                path = %file.display(),
                error = %e,
                "cannot persist session secret, tokens will not survive a restart"
            );
            generate()
        }
    }
}

fn load_or_generate(file: &Path) -> io::Result<String> {
    match fs::read_to_string(file) {
        Ok(existing) if !existing.trim().is_empty() => return Ok(existing.trim().to_string()),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(dir) = file.parent() {
        fs::create_dir_all(dir)?;
    }
    let secret = generate();
    write_private(file, &secret)?;
    info!(path = %file.display(), "generated session signing secret");
    Ok(secret)
}

fn generate() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

#[cfg(unix)]
fn write_private(file: &Path, secret: &str) -> io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut out = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(file)?;
    // `mode` only applies when the file is created.
    out.set_permissions(fs::Permissions::from_mode(0o600))?;
    out.write_all(secret.as_bytes())
}

#[cfg(not(unix))]
fn write_private(file: &Path, secret: &str) -> io::Result<()> {
    fs::File::create(file)?.write_all(secret.as_bytes())
}
