//! # Shell Completion Module
//!
//! Completion scripts for the `deepcut` binary, plus the playlist names the
//! scripts can offer for `discover`.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! deepcut completion bash > ~/.local/share/bash-completion/completions/deepcut
//!
//! # Generate zsh completions
//! deepcut completion zsh > ~/.config/zsh/completions/_deepcut
//! ```

use crate::db;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert CLI shell enum to clap_complete shell enum
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Playlist names stored in the database at `db_path`, sorted.
///
/// Completion must never fail loudly, so a missing or unreadable database
/// yields no names.
pub fn get_playlist_completions(db_path: &Path) -> Vec<String> {
    if !db_path.exists() {
        return Vec::new();
    }
    let playlists = db::connect(db_path).and_then(|conn| db::list_playlists(&conn));
    match playlists {
        Ok(playlists) => {
            let mut names: Vec<String> = playlists.into_iter().map(|p| p.playlist.name).collect();
            names.sort();
            names.dedup();
            names
        }
        Err(e) => {
            log::debug!("No playlist completions: {e:#}");
            Vec::new()
        }
    }
}

/// Print playlist names one per line, quoting names with whitespace.
pub fn print_playlist_completions(db_path: &Path) -> Result<()> {
    for name in get_playlist_completions(db_path) {
        if name.contains(char::is_whitespace) {
            println!("\"{}\"", name.replace('"', "\\\""));
        } else {
            println!("{name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogDump, PlaylistEntry};

    #[test]
    fn test_shell_conversion() {
        assert_eq!(
            shell_to_completion_shell(&crate::cli::Shell::Bash),
            CompletionShell::Bash
        );
        assert_eq!(
            shell_to_completion_shell(&crate::cli::Shell::Zsh),
            CompletionShell::Zsh
        );
    }

    #[test]
    fn test_playlist_completions_missing_db() {
        let dir = tempfile::tempdir().unwrap();
        assert!(get_playlist_completions(&dir.path().join("absent.db")).is_empty());
    }

    #[test]
    fn test_playlist_completions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let mut conn = db::init_database(&path, false).unwrap();
        let dump = CatalogDump {
            playlists: vec![
                PlaylistEntry { uri: "p:2".into(), name: "Zebra".into(), tracks: vec![] },
                PlaylistEntry { uri: "p:1".into(), name: "Late Night".into(), tracks: vec![] },
            ],
            ..CatalogDump::default()
        };
        db::import_dump(&mut conn, &dump).unwrap();
        assert_eq!(get_playlist_completions(&path), vec!["Late Night", "Zebra"]);
    }
}
