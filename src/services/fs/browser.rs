use crate::core::config::RootDirectory;
use crate::core::errors::{Error, Result};
use crate::services::fs::resolver::PathResolver;
use crate::services::fs::view::{self, ViewQuery, ViewResult};
use crate::services::fs::{listing, search};

/// Read side of the service: directory views and recursive search.
#[derive(Debug, Clone)]
pub struct FileBrowser {
    resolver: PathResolver,
}

impl FileBrowser {
    pub fn new(root: &RootDirectory) -> Self {
        Self {
            resolver: PathResolver::new(root),
        }
    }

    /// Lists `path`, or searches below it when `term` is non-empty, and
    /// returns the requested page of the sorted result.
    pub fn browse(&self, path: &str, term: Option<&str>, query: &ViewQuery) -> Result<ViewResult> {
        query.validate()?;

        let dir = self.resolver.resolve(path)?;
        if !dir.is_dir() {
            return Err(Error::NotFound(path.to_string()));
        }

        let entries = match term.filter(|t| !t.is_empty()) {
            Some(term) => search::search(&dir, &term.to_lowercase()),
            None => listing::list_dir(&dir).map_err(|err| match err {
                Error::NotFound(_) => Error::NotFound(path.to_string()),
                other => other,
            })?,
        };
        view::build(entries, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> Result<(TempDir, FileBrowser)> {
        let base = TempDir::new()?;
        let root = base.path();
        fs::create_dir_all(root.join("Test").join("deeper"))?;
        fs::write(root.join("Test").join("test.txt"), "12345")?;
        fs::write(root.join("Test").join("deeper").join("LATEST.log"), "1")?;
        fs::write(root.join("top.bin"), "xy")?;
        let browser = FileBrowser::new(&RootDirectory::new(root)?);
        Ok((base, browser))
    }

    #[test]
    fn listing_marks_folders() -> Result<()> {
        let (_base, browser) = fixture()?;
        let query = ViewQuery {
            sort_by: "name".to_string(),
            ..ViewQuery::default()
        };
        let view = browser.browse("/", None, &query)?;
        let names: Vec<&str> = view.items.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["Test/", "top.bin"]);
        assert_eq!(view.file_count, 1);
        assert_eq!(view.folder_count, 1);
        assert_eq!(view.total_size, 2);
        Ok(())
    }

    #[test]
    fn search_is_case_insensitive_and_recursive() -> Result<()> {
        let (_base, browser) = fixture()?;
        let query = ViewQuery {
            sort_by: "unsorted".to_string(),
            ..ViewQuery::default()
        };
        let view = browser.browse("/", Some("TEST"), &query)?;
        let names: Vec<&str> = view.items.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["LATEST.log", "Test", "test.txt"]);
        assert_eq!(view.folder_count, 1);
        assert_eq!(view.file_count, 2);
        assert_eq!(view.total_size, 6);
        Ok(())
    }

    #[test]
    fn empty_search_term_lists() -> Result<()> {
        let (_base, browser) = fixture()?;
        let view = browser.browse("/Test", Some(""), &ViewQuery::default())?;
        assert_eq!(view.total_items, 2);
        Ok(())
    }

    #[test]
    fn rejects_bad_targets() -> Result<()> {
        let (_base, browser) = fixture()?;
        let query = ViewQuery::default();
        assert!(matches!(browser.browse("/../", None, &query), Err(Error::Confinement)));
        assert!(matches!(browser.browse("/top.bin", None, &query), Err(Error::NotFound(_))));
        assert!(matches!(browser.browse("/gone", None, &query), Err(Error::NotFound(p)) if p == "/gone"));

        let bad_size = ViewQuery {
            page_size: 0,
            ..ViewQuery::default()
        };
        assert!(matches!(browser.browse("/", None, &bad_size), Err(Error::InvalidArgument(_))));
        Ok(())
    }
}
