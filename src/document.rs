//! 目标页面模型
//!
//! 页面作为一个字符串整体读入、原地插入、一次写回。插入点通过 [`Anchor`]
//! 定位，而不是在合并逻辑里到处散落子串查找。

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::MergeError;

/// 卡片网格容器的 class 前缀
pub const GRID_MARKER: &str = "class=\"grid";
/// 新分类区块插在这个元素之前
pub const SENTINEL_MARKER: &str = "<div id=\"no-results\"";

/// 页面中已知的插入点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor<'a> {
    /// 分类区块内第一个卡片网格的开始标签之后
    SectionGrid(&'a str),
    /// 指向某分类的导航链接的 `</a>` 之后
    NavLinkAfter(&'a str),
    /// `<div id="no-results"` 之前
    NoResultsSentinel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDocument {
    content: String,
}

impl TargetDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read target page {:?}", path))?;
        debug!("Loaded target page {:?} ({} bytes)", path, content.len());
        Ok(Self { content })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.content)
            .with_context(|| format!("Failed to write target page {:?}", path))?;
        Ok(())
    }

    /// 备份原文件，文件名带时间戳
    pub fn backup(path: &Path) -> Result<PathBuf> {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page.html".to_string());
        let backup_path = path.with_file_name(format!("{}.{}.backup", file_name, stamp));
        std::fs::copy(path, &backup_path)
            .with_context(|| format!("Failed to back up {:?}", path))?;
        info!("💾 Backup created: {:?}", backup_path);
        Ok(backup_path)
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }

    /// 原始子串检查（旧的首条URL去重策略使用）
    pub fn contains_text(&self, needle: &str) -> bool {
        self.content.contains(needle)
    }

    pub fn has_section(&self, category: &str) -> bool {
        self.find_section(category).is_some()
    }

    /// `id="<category>"` 的位置；前一个字符必须是空白，避免匹配到 `data-id=`
    pub fn find_section(&self, category: &str) -> Option<usize> {
        let marker = format!("id=\"{}\"", category);
        find_attribute(&self.content, &marker, 0)
    }

    /// 分区的结束位置：下一个同名标签且带 `id=` 的分区开头，没有则为文档末尾
    fn section_end(&self, section: usize) -> usize {
        let head = &self.content[..section];
        let tag: String = head
            .rfind('<')
            .map(|open| {
                head[open + 1..]
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect()
            })
            .unwrap_or_default();
        if tag.is_empty() {
            return self.content.len();
        }
        let next = format!("<{} id=\"", tag);
        find_from(&self.content, &next, section).unwrap_or(self.content.len())
    }

    /// 页面中所有 `<a href>` 指向的URL（实体已解码）
    pub fn linked_urls(&self) -> HashSet<String> {
        let html = Html::parse_document(&self.content);
        let mut urls = HashSet::new();
        if let Ok(selector) = Selector::parse("a[href]") {
            for element in html.select(&selector) {
                if let Some(href) = element.value().attr("href") {
                    urls.insert(href.to_string());
                }
            }
        }
        urls
    }

    /// 定位插入点，返回字节偏移
    pub fn locate(&self, anchor: Anchor<'_>) -> Result<usize, MergeError> {
        match anchor {
            Anchor::SectionGrid(category) => {
                let section = self
                    .find_section(category)
                    .ok_or_else(|| MergeError::SectionNotFound(category.to_string()))?;
                let end = self.section_end(section);
                let grid = find_from(&self.content[..end], GRID_MARKER, section)
                    .ok_or_else(|| MergeError::GridNotFound(category.to_string()))?;
                let tag_end = find_from(&self.content, ">", grid)
                    .ok_or_else(|| MergeError::GridTagUnterminated(category.to_string()))?;
                Ok(tag_end + 1)
            }
            Anchor::NavLinkAfter(category) => {
                let marker = format!("href=\"#{}\"", category);
                let link = find_attribute(&self.content, &marker, 0)
                    .ok_or_else(|| MergeError::NavAnchorNotFound(category.to_string()))?;
                let close = find_from(&self.content, "</a>", link)
                    .ok_or_else(|| MergeError::NavAnchorUnterminated(category.to_string()))?;
                Ok(close + "</a>".len())
            }
            Anchor::NoResultsSentinel => self
                .content
                .find(SENTINEL_MARKER)
                .ok_or(MergeError::SentinelNotFound),
        }
    }

    pub fn insert(&mut self, at: usize, fragment: &str) {
        self.content.insert_str(at, fragment);
    }

    /// 定位并插入，返回插入位置
    pub fn insert_at(&mut self, anchor: Anchor<'_>, fragment: &str) -> Result<usize, MergeError> {
        let at = self.locate(anchor)?;
        self.insert(at, fragment);
        debug!("Inserted {} bytes at {} ({:?})", fragment.len(), at, anchor);
        Ok(at)
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack[from..].find(needle).map(|pos| pos + from)
}

/// 查找属性文本，要求前面是空白（属性边界）
fn find_attribute(haystack: &str, attribute: &str, from: usize) -> Option<usize> {
    let mut start = from;
    while let Some(pos) = find_from(haystack, attribute, start) {
        let at_boundary = haystack[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_whitespace());
        if at_boundary {
            return Some(pos);
        }
        start = pos + attribute.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<nav>
    <a href="#ai" class="pill">AI</a>
    <a href="#tools" class="pill">工具</a>
</nav>
<div id="ai" class="mb-16">
    <div class="grid grid-cols-1 gap-4 card-grid">
        <a href="https://old.example/?a=1&amp;b=2">Old</a>
    </div>
</div>
<div data-id="tools"></div>
<div id="no-results" class="hidden"></div>
"##;

    #[test]
    fn test_find_section_respects_boundary() {
        let doc = TargetDocument::new(PAGE);
        assert!(doc.has_section("ai"));
        assert!(!doc.has_section("tools"));
        assert!(!doc.has_section("dev"));
    }

    #[test]
    fn test_locate_grid() {
        let doc = TargetDocument::new(PAGE);
        let at = doc.locate(Anchor::SectionGrid("ai")).unwrap();
        assert!(doc.as_str()[..at].ends_with("card-grid\">"));
    }

    #[test]
    fn test_locate_grid_missing() {
        let doc = TargetDocument::new("<div id=\"ai\"></div>");
        assert_eq!(
            doc.locate(Anchor::SectionGrid("ai")),
            Err(MergeError::GridNotFound("ai".to_string()))
        );
        let doc = TargetDocument::new("<div id=\"ai\"><div class=\"grid");
        assert_eq!(
            doc.locate(Anchor::SectionGrid("ai")),
            Err(MergeError::GridTagUnterminated("ai".to_string()))
        );
    }

    #[test]
    fn test_grid_of_next_section_not_borrowed() {
        let page = r#"<div id="ai" class="mb-16">
    <div class="list"></div>
</div>
<div id="tools" class="mb-16">
    <div class="grid grid-cols-1 gap-4 card-grid"></div>
</div>"#;
        let doc = TargetDocument::new(page);
        assert_eq!(
            doc.locate(Anchor::SectionGrid("ai")),
            Err(MergeError::GridNotFound("ai".to_string()))
        );
        let at = doc.locate(Anchor::SectionGrid("tools")).unwrap();
        assert!(at > doc.find_section("tools").unwrap());
    }

    #[test]
    fn test_locate_nav_link() {
        let doc = TargetDocument::new(PAGE);
        let at = doc.locate(Anchor::NavLinkAfter("tools")).unwrap();
        assert!(doc.as_str()[..at].ends_with("工具</a>"));
        assert_eq!(
            doc.locate(Anchor::NavLinkAfter("dev")),
            Err(MergeError::NavAnchorNotFound("dev".to_string()))
        );
    }

    #[test]
    fn test_locate_sentinel() {
        let doc = TargetDocument::new(PAGE);
        let at = doc.locate(Anchor::NoResultsSentinel).unwrap();
        assert!(doc.as_str()[at..].starts_with(SENTINEL_MARKER));
        let doc = TargetDocument::new("<body></body>");
        assert_eq!(doc.locate(Anchor::NoResultsSentinel), Err(MergeError::SentinelNotFound));
    }

    #[test]
    fn test_linked_urls_decoded() {
        let doc = TargetDocument::new(PAGE);
        let urls = doc.linked_urls();
        assert!(urls.contains("https://old.example/?a=1&b=2"));
        assert!(urls.contains("#tools"));
    }

    #[test]
    fn test_insert_at() {
        let mut doc = TargetDocument::new(PAGE);
        doc.insert_at(Anchor::NoResultsSentinel, "<p>new</p>").unwrap();
        assert!(doc.as_str().contains("<p>new</p><div id=\"no-results\""));
    }

    #[test]
    fn test_backup_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.html");
        std::fs::write(&path, PAGE).unwrap();

        let backup = TargetDocument::backup(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), PAGE);

        let mut doc = TargetDocument::load(&path).unwrap();
        doc.insert(0, "<!-- x -->");
        doc.save(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("<!-- x -->"));
    }
}
