//! NETSCAPE-Bookmark-file-1 导出解析
//!
//! 只识别顶层文件夹：`<DT><H3>名称</H3><DL><p> ... </DL><p>`。
//! 嵌套两层的书签不会被识别，格式不符的区域直接跳过，解析本身不会失败。

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::categories::CategoryMap;

/// 导入书签的默认描述
pub const IMPORT_DESCRIPTION: &str = "从收藏夹导入";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub url: String,
    pub title: String,
    pub desc: String,
}

impl Bookmark {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            desc: IMPORT_DESCRIPTION.to_string(),
        }
    }
}

/// 分类ID -> 书签列表；分类顺序为在导出文件中首次出现的顺序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryBuckets {
    buckets: Vec<(String, Vec<Bookmark>)>,
}

impl CategoryBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得（必要时创建）分类的书签列表
    pub fn bucket_mut(&mut self, category: &str) -> &mut Vec<Bookmark> {
        let index = match self.buckets.iter().position(|(id, _)| id == category) {
            Some(index) => index,
            None => {
                self.buckets.push((category.to_string(), Vec::new()));
                self.buckets.len() - 1
            }
        };
        &mut self.buckets[index].1
    }

    pub fn get(&self, category: &str) -> Option<&[Bookmark]> {
        self.buckets
            .iter()
            .find(|(id, _)| id == category)
            .map(|(_, items)| items.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Bookmark])> {
        self.buckets
            .iter()
            .map(|(id, items)| (id.as_str(), items.as_slice()))
    }

    pub fn categories(&self) -> Vec<&str> {
        self.buckets.iter().map(|(id, _)| id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_bookmarks(&self) -> usize {
        self.buckets.iter().map(|(_, items)| items.len()).sum()
    }
}

fn folder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<DT><H3[^>]*>(.*?)</H3>\s*<DL><p>(.*?)</DL><p>")
            .expect("folder pattern is valid")
    })
}

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)<DT><A HREF="(.*?)"[^>]*>(.*?)</A>"#).expect("link pattern is valid")
    })
}

/// 解析导出文件，按分类归档
pub fn parse_export(content: &str, categories: &CategoryMap) -> CategoryBuckets {
    let mut buckets = CategoryBuckets::new();

    for folder in folder_pattern().captures_iter(content) {
        let folder_name = decode_entities(&folder[1]);
        let body = &folder[2];
        let category = categories.resolve(&folder_name).to_string();

        // 空文件夹也保留分类键
        let bucket = buckets.bucket_mut(&category);
        let before = bucket.len();
        for link in link_pattern().captures_iter(body) {
            bucket.push(Bookmark::new(
                decode_entities(&link[1]),
                decode_entities(&link[2]),
            ));
        }

        debug!(
            "Folder {:?} → {} ({} links)",
            folder_name,
            category,
            bucket.len() - before
        );
    }

    buckets
}

/// 还原导出文件中的基本HTML实体；渲染时会重新转义
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// 映射表中的每个文件夹都归入对应分类
        #[test]
        fn prop_mapped_folder_lands_in_bucket(
            index in 0usize..12,
            slug in "[a-z]{1,10}",
            title in "[A-Za-z0-9 ]{1,20}",
        ) {
            let map = CategoryMap::builtin();
            let entries = map.folder_entries();
            let (folder, category) = entries[index % entries.len()];
            let url = format!("https://{}.example/", slug);
            let content = format!(
                "<DL><p>\n<DT><H3>{}</H3>\n<DL><p>\n<DT><A HREF=\"{}\">{}</A>\n</DL><p>\n</DL><p>\n",
                folder, url, title
            );

            let buckets = parse_export(&content, &map);
            let items = buckets.get(category).unwrap();
            prop_assert_eq!(items.len(), 1);
            prop_assert_eq!(&items[0].url, &url);
            prop_assert_eq!(&items[0].title, &title);
        }

        /// 未映射的文件夹全部归入 others
        #[test]
        fn prop_unmapped_folder_defaults(name in "zz[a-z]{1,10}") {
            let content = format!(
                "<DT><H3>{}</H3>\n<DL><p>\n<DT><A HREF=\"https://u.example\">U</A>\n</DL><p>\n",
                name
            );
            let buckets = parse_export(&content, &CategoryMap::builtin());
            prop_assert_eq!(buckets.categories(), vec!["others"]);
        }
    }
}
