use std::path::{Path, PathBuf};

use crate::archive::{DirectoryRoot, RestoreMap};

/// Name of the live log file. Never trimmed.
pub const LIVE_LOG: &str = "kodi.log";

/// Name of the rotated log left over from the previous session
pub const OLD_LOG: &str = "kodi.old.log";

/// Texture cache database removed by a hard clean
pub const TEXTURE_DB: &str = "Textures13.db";

/// Concrete Kodi directories the policies operate on.
///
/// The core never builds these itself; they come from the config
/// (or tests) as opaque absolute paths.
#[derive(Debug, Clone, PartialEq)]
pub struct HostPaths {
    pub home: PathBuf,
    pub addons: PathBuf,
    pub userdata: PathBuf,
    pub temp: PathBuf,
    pub thumbnails: PathBuf,
    pub packages: PathBuf,
    pub log_dir: PathBuf,
    pub media: PathBuf,
    pub database: PathBuf,
}

impl HostPaths {
    /// Derive every directory from a Kodi home using the default layout
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let addons = home.join("addons");
        let userdata = home.join("userdata");
        let temp = home.join("temp");
        Self {
            thumbnails: userdata.join("Thumbnails"),
            packages: addons.join("packages"),
            database: userdata.join("Database"),
            log_dir: temp.clone(),
            media: home.join("media"),
            home,
            addons,
            userdata,
            temp,
        }
    }

    pub fn live_log(&self) -> PathBuf {
        self.log_dir.join(LIVE_LOG)
    }

    pub fn old_log(&self) -> PathBuf {
        self.log_dir.join(OLD_LOG)
    }

    pub fn texture_db(&self) -> PathBuf {
        self.database.join(TEXTURE_DB)
    }

    /// Roots written into a backup, in archive order
    pub fn backup_roots(&self) -> Vec<DirectoryRoot> {
        vec![
            DirectoryRoot::new("addons", &self.addons),
            DirectoryRoot::new("userdata", &self.userdata).exclude(userdata_excluded),
            DirectoryRoot::new("media", &self.media),
        ]
    }

    /// Directories that must exist after a restore even when empty
    pub fn backup_markers(&self) -> Vec<String> {
        vec!["userdata/Thumbnails/".to_string(), "media/".to_string()]
    }

    /// Where each top-level archive folder is restored to
    pub fn restore_map(&self) -> RestoreMap {
        RestoreMap::new(&self.home)
            .map("addons/", &self.addons)
            .map("userdata/", &self.userdata)
            .map("media/", &self.media)
    }
}

/// Thumbnails are regenerated by Kodi and the texture database
/// only indexes them, so neither belongs in a backup.
fn userdata_excluded(relative: &Path) -> bool {
    // Addon and skin data keep their own Thumbnails caches at any depth
    if relative.components().any(|c| c.as_os_str() == "Thumbnails") {
        return true;
    }
    let name = relative
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.starts_with("textures") && name.ends_with(".db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = HostPaths::from_home("/k");
        assert_eq!(paths.thumbnails, PathBuf::from("/k/userdata/Thumbnails"));
        assert_eq!(paths.packages, PathBuf::from("/k/addons/packages"));
        assert_eq!(paths.live_log(), PathBuf::from("/k/temp/kodi.log"));
        assert_eq!(paths.texture_db(), PathBuf::from("/k/userdata/Database/Textures13.db"));
    }

    #[test]
    fn test_userdata_exclusions() {
        assert!(userdata_excluded(Path::new("Thumbnails")));
        assert!(userdata_excluded(Path::new("Thumbnails/a/b.jpg")));
        assert!(userdata_excluded(Path::new("Database/Textures13.db")));
        assert!(userdata_excluded(Path::new("Database/TEXTURES99.DB")));
        assert!(!userdata_excluded(Path::new("Database/MyVideos131.db")));
        assert!(!userdata_excluded(Path::new("guisettings.xml")));
        assert!(userdata_excluded(Path::new("addon_data/Thumbnails/x.jpg")));
        assert!(userdata_excluded(Path::new("addon_data/skin.x/Thumbnails")));
        assert!(!userdata_excluded(Path::new("addon_data/skin.x/thumbnails.xml")));
    }
}
