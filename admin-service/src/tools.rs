//! PostgreSQL command-line tool orchestration.
//!
//! Thin wrappers around `pg_dump`, `pg_restore` and `psql`. The password is
//! handed to child processes through `PGPASSWORD`, never on the command line.

use std::path::Path;
use std::process::Output;

use common::config::DatabaseSettings;
use common::errors::{AppError, AppResult};
use tokio::process::Command;

/// Runs the PostgreSQL client utilities against the managed database.
pub struct PgTools {
    db: DatabaseSettings,
}

impl PgTools {
    pub fn new(db: DatabaseSettings) -> Self {
        Self { db }
    }

    /// Dumps the database (or a set of tables) in custom format to `target`.
    pub async fn dump(&self, target: &Path, tables: &[String]) -> AppResult<()> {
        let mut args = self.db.cli_args();
        args.extend(["-F".into(), "c".into(), "-f".into(), target.display().to_string()]);
        for table in tables {
            args.extend(["-t".into(), table.clone()]);
        }

        let output = self.run("pg_dump", &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(target = %target.display(), stderr = %stderr, "pg_dump 失败");
            return Err(AppError::ToolFailed(format!(
                "pg_dump exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Drops and recreates the public schema so the restore does not hit
    /// dependency errors (original --clean behavior, done up front).
    pub async fn reset_public_schema(&self) -> AppResult<()> {
        let statement = format!(
            "DROP SCHEMA IF EXISTS public CASCADE; CREATE SCHEMA public; \
             GRANT ALL ON SCHEMA public TO \"{}\"; GRANT ALL ON SCHEMA public TO public;",
            self.db.user
        );
        let mut args = self.db.cli_args();
        args.extend(["-v".into(), "ON_ERROR_STOP=1".into(), "-c".into(), statement]);

        let output = self.run("psql", &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let detail = if !stderr.is_empty() {
                stderr
            } else if !stdout.is_empty() {
                stdout
            } else {
                "unknown schema reset error".to_string()
            };
            return Err(AppError::ToolFailed(format!(
                "schema reset before restore failed: {}",
                detail
            )));
        }
        Ok(())
    }

    /// Restores the database from a custom-format dump.
    ///
    /// pg_restore reports through stderr even on success; lines are
    /// classified into warnings and errors, and the run only counts as
    /// failed when the exit status is non-zero and real errors were seen.
    /// Returns the collected warnings.
    pub async fn restore(&self, backup: &Path) -> AppResult<Vec<String>> {
        let mut args = self.db.cli_args();
        args.extend([
            "-v".into(),
            "--no-owner".into(),
            "--no-privileges".into(),
            backup.display().to_string(),
        ]);

        let output = self.run("pg_restore", &args).await?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        let (warnings, errors) = classify_restore_stderr(&stderr);

        if !output.status.success() && !errors.is_empty() {
            tracing::error!(backup = %backup.display(), errors = errors.len(), "pg_restore 失败");
            return Err(AppError::ToolFailed(errors.join("\n")));
        }
        Ok(warnings)
    }

    async fn run(&self, program: &str, args: &[String]) -> AppResult<Output> {
        tracing::debug!(program = program, "执行外部工具");
        Command::new(program)
            .args(args)
            .env("PGPASSWORD", &self.db.password)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    AppError::ToolMissing(format!(
                        "{} not found; install the postgresql-client package",
                        program
                    ))
                } else {
                    AppError::Io(e)
                }
            })
    }
}

/// Splits pg_restore stderr into warnings and errors.
///
/// Dumps taken from newer servers can reference configuration parameters the
/// target does not know (e.g. transaction_timeout); those complaints are
/// downgraded to warnings.
pub fn classify_restore_stderr(stderr: &str) -> (Vec<String>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();

        if lower.contains("unrecognized configuration parameter")
            && lower.contains("transaction_timeout")
        {
            warnings.push(line.to_string());
            continue;
        }
        if lower.starts_with("command was:") && lower.contains("transaction_timeout") {
            warnings.push(line.to_string());
            continue;
        }
        if lower.contains("warning:") {
            warnings.push(line.to_string());
            continue;
        }
        if lower.contains("error:") {
            errors.push(line.to_string());
        }
    }

    (warnings, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_timeout_is_a_warning() {
        let stderr = "\
pg_restore: error: could not execute query: ERROR:  unrecognized configuration parameter \"transaction_timeout\"
Command was: SET transaction_timeout = 0;
";
        let (warnings, errors) = classify_restore_stderr(stderr);
        assert_eq!(warnings.len(), 2);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_real_errors_are_kept() {
        let stderr = "\
pg_restore: warning: errors ignored on restore: 1
pg_restore: error: could not execute query: ERROR:  relation \"readers\" already exists
";
        let (warnings, errors) = classify_restore_stderr(stderr);
        assert_eq!(warnings.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("already exists"));
    }

    #[test]
    fn test_verbose_progress_lines_are_ignored() {
        let stderr = "\
pg_restore: creating TABLE \"public.readers\"
pg_restore: processing data for table \"public.readers\"
";
        let (warnings, errors) = classify_restore_stderr(stderr);
        assert!(warnings.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let (warnings, errors) = classify_restore_stderr("\n\n   \n");
        assert!(warnings.is_empty());
        assert!(errors.is_empty());
    }
}
