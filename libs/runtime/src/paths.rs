use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the server home directory.
///
/// - `None` (or an empty string upstream) maps to `<platform home>/<default_subdir>`.
/// - A leading `~` is expanded against the platform home.
/// - Relative paths are made absolute against the current working directory.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let platform_home = || dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home dir"));

    let resolved = match configured {
        None => platform_home()?.join(default_subdir),
        Some(raw) => {
            if raw == "~" {
                platform_home()?
            } else if let Some(rest) = raw.strip_prefix("~/") {
                platform_home()?.join(rest)
            } else {
                let p = Path::new(&raw);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    std::env::current_dir()
                        .context("cannot read current dir")?
                        .join(p)
                }
            }
        }
    };

    if create {
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("cannot create {}", resolved.display()))?;
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn absolute_path_is_kept() {
        let tmp = tempdir().unwrap();
        let p = tmp.path().join("qhome");
        let out = resolve_home_dir(Some(p.to_string_lossy().to_string()), ".questline", true)
            .unwrap();
        assert_eq!(out, p);
        assert!(out.exists());
    }

    #[test]
    fn tilde_is_expanded() {
        let out = resolve_home_dir(Some("~/.questline_tilde".into()), ".questline", false).unwrap();
        assert!(out.is_absolute());
        assert!(out.ends_with(".questline_tilde"));
    }
}
