use anyhow::Result;
use std::path::{Path, PathBuf};

/// Environment override for the log folder.
pub const LOG_DIR_ENV: &str = "AZSQL_DEPLOY_LOG_DIR";

const LOG_DIR_NAME: &str = "Deploy_Wizard_Log";

/// Folder the running executable lives in (falls back to the working directory).
pub fn resolve_deployment_folder() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(dir) = exe_path.parent() {
            return dir.to_path_buf();
        }
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Resolve (and create) the log folder.
///
/// Order: `AZSQL_DEPLOY_LOG_DIR`, then the per-user data directory, then next to the executable.
pub fn resolve_log_folder() -> Result<PathBuf> {
    let candidate = match std::env::var_os(LOG_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => match dirs::data_local_dir() {
            Some(base) => base.join("azure-sql-deploy").join(LOG_DIR_NAME),
            None => resolve_deployment_folder().join(LOG_DIR_NAME),
        },
    };
    std::fs::create_dir_all(&candidate)
        .map_err(|e| anyhow::anyhow!("Failed to create log folder {:?}: {}", candidate, e))?;
    Ok(candidate)
}

/// Where the generated notebook goes.
///
/// An explicit path wins; a directory gets `deploy-<database>.ipynb` inside it; otherwise the file is
/// written to `output_dir` (or the working directory).
pub fn resolve_notebook_path(
    explicit: Option<&Path>,
    output_dir: Option<&Path>,
    database_name: &str,
) -> PathBuf {
    let file_name = format!("deploy-{}.ipynb", sanitize_file_stem(database_name));
    match explicit {
        Some(p) if p.is_dir() => p.join(file_name),
        Some(p) => p.to_path_buf(),
        None => {
            let base = output_dir
                .map(Path::to_path_buf)
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or_else(|| PathBuf::from("."));
            base.join(file_name)
        }
    }
}

fn sanitize_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "azure-sql-db".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notebook_path_in_explicit_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_notebook_path(Some(dir.path()), None, "orders");
        assert_eq!(path, dir.path().join("deploy-orders.ipynb"));
    }

    #[test]
    fn explicit_file_path_is_kept() {
        let path = resolve_notebook_path(Some(Path::new("/tmp/out/my.ipynb")), None, "orders");
        assert_eq!(path, PathBuf::from("/tmp/out/my.ipynb"));
    }

    #[test]
    fn output_dir_used_when_no_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = resolve_notebook_path(None, Some(dir.path()), "sales db/2");
        assert_eq!(path, dir.path().join("deploy-sales_db_2.ipynb"));
    }

    #[test]
    fn empty_database_name_gets_default_stem() {
        assert_eq!(sanitize_file_stem("  "), "azure-sql-db");
    }
}
