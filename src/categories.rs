//! 分类映射与分类配置
//!
//! 收藏夹文件夹名 -> 页面分类ID 的映射，以及每个分类的显示配置
//! （名称、图标、颜色）。内置一份默认表，可通过JSON配置文件扩展或覆盖。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// 未知文件夹的默认分类
pub const DEFAULT_CATEGORY: &str = "others";
/// 没有显式配置时的图标
pub const DEFAULT_ICON: &str = "folder";
/// 没有显式配置时分类区块使用的颜色
pub const DEFAULT_SECTION_COLOR: &str = "blue";
/// 没有显式配置时导航链接使用的颜色
pub const DEFAULT_NAV_COLOR: &str = "gray";

const BUILTIN_FOLDERS: &[(&str, &str)] = &[
    ("我的收藏", "others"),
    ("AI与工具类", "ai"),
    ("学习与教育", "learning"),
    ("资源下载与搜索", "tools"),
    ("生活实用工具", "tools"),
    ("娱乐与兴趣", "entertainment"),
    ("文学与阅读", "entertainment"),
    ("开发与技术", "dev"),
    ("博客与教程", "dev"),
    ("系统与破解资源", "tools"),
    ("视频剪辑", "design"),
    ("其他/无法归类", "others"),
];

/// 单个分类的显示配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryConfig {
    pub id: String,
    /// 显示名称
    #[serde(default)]
    pub name: Option<String>,
    /// lucide 图标ID
    #[serde(default)]
    pub icon: Option<String>,
    /// tailwind 颜色 (如 purple, slate)
    #[serde(default)]
    pub color: Option<String>,
}

impl CategoryConfig {
    /// 只有ID、其余全部走默认值的配置
    pub fn fallback(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            icon: None,
            color: None,
        }
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => capitalize(&self.id),
        }
    }

    pub fn icon(&self) -> &str {
        self.icon.as_deref().unwrap_or(DEFAULT_ICON)
    }

    pub fn section_color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_SECTION_COLOR)
    }

    pub fn nav_color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_NAV_COLOR)
    }
}

/// 配置文件格式
///
/// ```json
/// {
///   "default_category": "others",
///   "folders": { "开发与技术": "dev" },
///   "categories": [ { "id": "dev", "name": "开发", "icon": "code", "color": "green" } ]
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryMapFile {
    #[serde(default)]
    pub default_category: Option<String>,
    #[serde(default)]
    pub folders: HashMap<String, String>,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

/// 文件夹映射 + 分类配置
#[derive(Debug, Clone)]
pub struct CategoryMap {
    default_category: String,
    folders: HashMap<String, String>,
    categories: HashMap<String, CategoryConfig>,
}

impl CategoryMap {
    /// 内置映射表
    pub fn builtin() -> Self {
        let folders = BUILTIN_FOLDERS
            .iter()
            .map(|(folder, id)| (folder.to_string(), id.to_string()))
            .collect();

        let mut categories = HashMap::new();
        for config in [
            CategoryConfig {
                id: "entertainment".to_string(),
                name: Some("娱乐兴趣".to_string()),
                icon: Some("gamepad-2".to_string()),
                color: Some("purple".to_string()),
            },
            CategoryConfig {
                id: "others".to_string(),
                name: Some("其他收藏".to_string()),
                icon: Some("folder-heart".to_string()),
                color: Some("slate".to_string()),
            },
        ] {
            categories.insert(config.id.clone(), config);
        }

        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
            folders,
            categories,
        }
    }

    /// 在内置表基础上合并配置文件；同名条目以文件为准
    pub fn with_overrides(mut self, file: CategoryMapFile) -> Self {
        if let Some(default_category) = file.default_category {
            self.default_category = default_category;
        }
        self.folders.extend(file.folders);
        for config in file.categories {
            self.categories.insert(config.id.clone(), config);
        }
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: CategoryMapFile =
            serde_json::from_str(json).context("Failed to parse category config")?;
        Ok(Self::builtin().with_overrides(file))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read category config {:?}", path))?;
        let map = Self::from_json(&content)?;
        info!("📋 Loaded category config from {:?}", path);
        Ok(map)
    }

    /// `--config` 可选：未指定时使用内置表
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// 文件夹名 -> 分类ID，未知文件夹归入默认分类
    pub fn resolve(&self, folder: &str) -> &str {
        match self.folders.get(folder.trim()) {
            Some(id) => id,
            None => {
                debug!("Folder {:?} not mapped, using {}", folder, self.default_category);
                &self.default_category
            }
        }
    }

    /// 分类配置；缺失时返回默认配置
    pub fn config(&self, id: &str) -> CategoryConfig {
        self.categories
            .get(id)
            .cloned()
            .unwrap_or_else(|| CategoryConfig::fallback(id))
    }

    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    /// 按文件夹名排序的映射，用于展示
    pub fn folder_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .folders
            .iter()
            .map(|(folder, id)| (folder.as_str(), id.as_str()))
            .collect();
        entries.sort();
        entries
    }

    pub fn print_summary(&self) {
        println!("\n📋 Folder mapping");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for (folder, id) in self.folder_entries() {
            let config = self.config(id);
            println!(
                "  • {} → {} ({}, icon: {}, color: {})",
                folder,
                id,
                config.display_name(),
                config.icon(),
                config.section_color()
            );
        }
        println!("  • <anything else> → {}", self.default_category);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::builtin()
    }
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_folders_resolve() {
        let map = CategoryMap::builtin();
        for (folder, id) in BUILTIN_FOLDERS {
            assert_eq!(map.resolve(folder), *id);
        }
    }

    #[test]
    fn test_unknown_folder_falls_back() {
        let map = CategoryMap::builtin();
        assert_eq!(map.resolve("未知分类"), "others");
        assert_eq!(map.resolve(""), "others");
    }

    #[test]
    fn test_config_defaults() {
        let map = CategoryMap::builtin();
        let tools = map.config("tools");
        assert_eq!(tools.display_name(), "Tools");
        assert_eq!(tools.icon(), "folder");
        assert_eq!(tools.section_color(), "blue");
        assert_eq!(tools.nav_color(), "gray");
    }

    #[test]
    fn test_config_explicit_entry() {
        let map = CategoryMap::builtin();
        let others = map.config("others");
        assert_eq!(others.display_name(), "其他收藏");
        assert_eq!(others.icon(), "folder-heart");
        assert_eq!(others.section_color(), "slate");
        assert_eq!(others.nav_color(), "slate");
    }

    #[test]
    fn test_json_overrides() {
        let json = r#"{
            "default_category": "misc",
            "folders": { "Rust": "dev", "视频剪辑": "video" },
            "categories": [ { "id": "dev", "name": "开发", "icon": "code" } ]
        }"#;
        let map = CategoryMap::from_json(json).unwrap();
        assert_eq!(map.resolve("Rust"), "dev");
        assert_eq!(map.resolve("视频剪辑"), "video");
        assert_eq!(map.resolve("AI与工具类"), "ai");
        assert_eq!(map.resolve("nowhere"), "misc");

        let dev = map.config("dev");
        assert_eq!(dev.display_name(), "开发");
        assert_eq!(dev.icon(), "code");
        assert_eq!(dev.section_color(), "blue");
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(CategoryMap::from_json("{ not json").is_err());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("learning"), "Learning");
        assert_eq!(capitalize(""), "");
    }
}
