//! Per-actor preferences: last active board and wallpaper.

use super::ids::BoardId;
use serde::{Deserialize, Serialize};

/// How many custom wallpaper URLs are remembered
pub const MAX_CUSTOM_WALLPAPERS: usize = 4;

/// The single preference record of the current actor (user or guest)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub last_active_board_id: Option<BoardId>,
    /// Preset name or URL of the selected wallpaper
    #[serde(default)]
    pub wallpaper: Option<String>,
    /// Most recent first
    #[serde(default)]
    pub custom_wallpapers: Vec<String>,
}

impl UserPreferences {
    /// Remember a custom wallpaper URL, newest first, bounded.
    pub fn add_custom_wallpaper(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.custom_wallpapers.retain(|u| u != &url);
        self.custom_wallpapers.insert(0, url);
        self.custom_wallpapers.truncate(MAX_CUSTOM_WALLPAPERS);
    }

    /// Forget a custom wallpaper; clears the selection if it was selected.
    pub fn remove_custom_wallpaper(&mut self, url: &str) -> bool {
        let before = self.custom_wallpapers.len();
        self.custom_wallpapers.retain(|u| u != url);
        if self.wallpaper.as_deref() == Some(url) {
            self.wallpaper = None;
        }
        self.custom_wallpapers.len() != before
    }

    /// Enforce the bound on records read from storage
    pub fn normalize(&mut self) {
        self.custom_wallpapers.truncate(MAX_CUSTOM_WALLPAPERS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_wallpapers_bounded() {
        let mut prefs = UserPreferences::default();
        for i in 0..6 {
            prefs.add_custom_wallpaper(format!("https://img/{i}.jpg"));
        }
        assert_eq!(prefs.custom_wallpapers.len(), MAX_CUSTOM_WALLPAPERS);
        assert_eq!(prefs.custom_wallpapers[0], "https://img/5.jpg");
        assert_eq!(prefs.custom_wallpapers[3], "https://img/2.jpg");
    }

    #[test]
    fn test_readding_moves_to_front() {
        let mut prefs = UserPreferences::default();
        prefs.add_custom_wallpaper("a");
        prefs.add_custom_wallpaper("b");
        prefs.add_custom_wallpaper("a");
        assert_eq!(prefs.custom_wallpapers, vec!["a", "b"]);
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut prefs = UserPreferences::default();
        prefs.add_custom_wallpaper("a");
        prefs.wallpaper = Some("a".into());
        assert!(prefs.remove_custom_wallpaper("a"));
        assert!(prefs.wallpaper.is_none());
        assert!(!prefs.remove_custom_wallpaper("a"));
    }

    #[test]
    fn test_wire_format() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"lastActiveBoardId": "b1"}"#).unwrap();
        assert_eq!(prefs.last_active_board_id, Some(BoardId::from_string("b1")));
        assert!(prefs.custom_wallpapers.is_empty());
    }
}
