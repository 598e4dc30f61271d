use crate::api::handle::ResourceKind;
use crate::cli::args::CacheCommands;
use crate::storage::handles::{self, HandleCache};
use crate::utils::errors::Result;
use crate::utils::output::OutputFormat;
use crate::utils::paths::AppPaths;
use std::path::Path;

pub fn handle_cache_commands(command: &CacheCommands, server: &str, output: &OutputFormat) -> Result<()> {
    let cache_dir = AppPaths::handle_cache_dir()?;

    match command {
        CacheCommands::Show => show_cache(&cache_dir, output),
        CacheCommands::Clear { all } => clear_cache(&cache_dir, server, *all),
    }
}

fn show_cache(cache_dir: &Path, output: &OutputFormat) -> Result<()> {
    let entries = handles::list_cached(cache_dir)?;

    if entries.iter().all(|(_, cached)| cached.is_empty()) {
        eprintln!("No cached handles found");
        return Ok(());
    }

    let mut rows = vec![vec![
        "SERVER".to_string(),
        "KIND".to_string(),
        "ID".to_string(),
        "UPDATED".to_string(),
    ]];
    for (server, cached) in entries {
        let updated = cached
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        for kind in [ResourceKind::Folder, ResourceKind::Template, ResourceKind::Credential] {
            if let Some(id) = cached.get(kind) {
                rows.push(vec![
                    server.clone(),
                    kind.to_string(),
                    id.to_string(),
                    updated.clone(),
                ]);
            }
        }
    }

    output.print_table(&rows);
    Ok(())
}

fn clear_cache(cache_dir: &Path, server: &str, all: bool) -> Result<()> {
    if all {
        let cleared = handles::clear_all(cache_dir)?;
        eprintln!("Cleared handle cache for {cleared} servers");
    } else {
        let cache = HandleCache::open(cache_dir, server)?;
        cache.clear()?;
        eprintln!("Cleared handle cache for server: {server} ({})", cache.path().display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_single_server_keeps_others() {
        let tmp = tempfile::tempdir().unwrap();
        HandleCache::open(tmp.path(), "main")
            .unwrap()
            .record(ResourceKind::Template, "T1")
            .unwrap();
        HandleCache::open(tmp.path(), "us")
            .unwrap()
            .record(ResourceKind::Folder, "F1")
            .unwrap();

        clear_cache(tmp.path(), "main", false).unwrap();

        let remaining = handles::list_cached(tmp.path()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, "us");

        assert!(clear_cache(tmp.path(), "../us", false).is_err());
        assert_eq!(handles::list_cached(tmp.path()).unwrap().len(), 1);

        clear_cache(tmp.path(), "ignored", true).unwrap();
        assert!(handles::list_cached(tmp.path()).unwrap().is_empty());
    }
}
