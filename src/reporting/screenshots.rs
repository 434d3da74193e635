use std::path::{Path, PathBuf};

use tracing::warn;

use crate::utils::fs::glob_in;

/// `<page>_<worker>.png`
pub fn screenshot_file_name(page: &str, worker_id: &str) -> String {
    format!("{}_{}.png", page, worker_id)
}

/// Screenshot for `page` in `dir`, named `<page>_<worker>.png`.
///
/// Names of longer pages such as `<page>_2_<worker>.png` also match the glob, so a
/// worker suffix without `_` is preferred; otherwise the first match in sorted order wins.
pub fn find_screenshot(dir: &Path, page: &str) -> Option<PathBuf> {
    let pattern = glob_in(dir, &format!("{}_*.png", glob::Pattern::escape(page)));
    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(page, error = %e, "Invalid screenshot pattern");
            return None;
        }
    };
    let matches: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
    let prefix = format!("{}_", page);
    matches
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(&prefix))
                .and_then(|n| n.strip_suffix(".png"))
                .is_some_and(|worker| !worker.contains('_'))
        })
        .or_else(|| matches.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_match_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ReportSection2_gw1.png"), b"b").unwrap();
        std::fs::write(dir.path().join("ReportSection2_gw0.png"), b"a").unwrap();
        std::fs::write(dir.path().join("ReportSection22_gw0.png"), b"x").unwrap();

        let found = find_screenshot(dir.path(), "ReportSection2").unwrap();
        assert_eq!(found.file_name().unwrap(), "ReportSection2_gw0.png");
        assert!(find_screenshot(dir.path(), "ReportSection3").is_none());
    }

    #[test]
    fn test_metacharacters_in_page_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Page[1]_master.png"), b"a").unwrap();
        std::fs::write(dir.path().join("Page1_master.png"), b"b").unwrap();
        let found = find_screenshot(dir.path(), "Page[1]").unwrap();
        assert_eq!(found.file_name().unwrap(), "Page[1]_master.png");
    }

    #[test]
    fn test_exact_page_preferred_over_longer_page() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ReportSection_2_gw0.png"), b"other").unwrap();
        std::fs::write(dir.path().join("ReportSection_gw1.png"), b"mine").unwrap();

        let found = find_screenshot(dir.path(), "ReportSection").unwrap();
        assert_eq!(found.file_name().unwrap(), "ReportSection_gw1.png");

        let longer = find_screenshot(dir.path(), "ReportSection_2").unwrap();
        assert_eq!(longer.file_name().unwrap(), "ReportSection_2_gw0.png");
    }

    #[test]
    fn test_directory_with_metacharacters() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("run[1]");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("Overview_master.png"), b"a").unwrap();

        let found = find_screenshot(&dir, "Overview").unwrap();
        assert_eq!(found, dir.join("Overview_master.png"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(screenshot_file_name("ReportSection", "gw2"), "ReportSection_gw2.png");
    }
}
