use crate::utils::errors::{CertifyError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct AppPaths;
const PROGRAM_NAME: &str = "certifyme-rs";

impl AppPaths {
    /// Get the base data directory: ~/.local/share/certifyme-rs/
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|dir| dir.join(PROGRAM_NAME))
            .ok_or_else(|| {
                CertifyError::Config("Cannot determine local data directory".to_string())
            })
    }

    /// Get the config directory: ~/.config/certifyme-rs/
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(PROGRAM_NAME))
            .ok_or_else(|| CertifyError::Config("Cannot determine config directory".to_string()))
    }

    /// Get the server profile file: ~/.config/certifyme-rs/servers.yaml
    pub fn servers_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("servers.yaml"))
    }

    /// Get the handle cache directory: ~/.local/share/certifyme-rs/handles/
    pub fn handle_cache_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("handles"))
    }

    /// Expand a leading `~/` against the home directory
    pub fn expand_home(path: &str) -> Result<PathBuf> {
        match path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .ok_or_else(|| CertifyError::Config("Cannot determine home directory".to_string())),
            None => Ok(PathBuf::from(path)),
        }
    }

    /// Ensure a directory exists with proper permissions
    pub fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;

            // Cached handles belong to the invoking user only
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = fs::metadata(path)?.permissions();
                perms.set_mode(0o700);
                fs::set_permissions(path, perms)?;
            }
        }
        Ok(())
    }
}
