//! 书签合并引擎
//!
//! 把解析出的分类书签并入手写的页面：已有分类直接插入卡片网格，
//! 新分类统一追加一次导航链接和一次区块。整个过程不是事务性的，
//! 某一步失败时已完成的插入会保留。

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::bookmarks::{parse_export, Bookmark, CategoryBuckets};
use crate::categories::CategoryMap;
use crate::document::{Anchor, TargetDocument};
use crate::error::MergeError;
use crate::render::{escape_html, render_cards, render_nav_link, render_section};

/// 去重策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DedupStrategy {
    /// 逐条检查：页面中已有链接的书签被丢弃
    #[default]
    PerItem,
    /// 只看分类第一条书签的URL，出现过就跳过整个分类
    FirstUrl,
}

#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub dedup: DedupStrategy,
    /// 新导航链接插在指向该分类的链接之后
    pub nav_anchor: String,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            dedup: DedupStrategy::PerItem,
            nav_anchor: "tools".to_string(),
        }
    }
}

/// 单个分类的合并结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// 内容已存在
    Skipped,
    /// 并入已有区块
    Merged { added: usize },
    /// 作为新区块插入
    Inserted { added: usize, nav_inserted: bool },
    /// 新区块插入失败（哨兵缺失）
    InsertionFailed { error: MergeError, nav_inserted: bool },
    /// 已有区块中找不到插入点
    Failed(MergeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryResult {
    pub category: String,
    /// 因重复被丢弃的书签数
    pub duplicates: usize,
    pub outcome: CategoryOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub results: Vec<CategoryResult>,
    pub new_categories: Vec<String>,
    pub nav_error: Option<MergeError>,
    pub section_error: Option<MergeError>,
}

impl MergeReport {
    pub fn outcome(&self, category: &str) -> Option<&CategoryOutcome> {
        self.results
            .iter()
            .find(|r| r.category == category)
            .map(|r| &r.outcome)
    }

    /// 实际写入页面的卡片数
    pub fn cards_added(&self) -> usize {
        self.results
            .iter()
            .map(|r| match r.outcome {
                CategoryOutcome::Merged { added } | CategoryOutcome::Inserted { added, .. } => added,
                _ => 0,
            })
            .sum()
    }

    pub fn has_changes(&self) -> bool {
        self.cards_added() > 0
            || self.results.iter().any(|r| {
                matches!(
                    r.outcome,
                    CategoryOutcome::InsertionFailed {
                        nav_inserted: true,
                        ..
                    }
                )
            })
    }

    pub fn has_warnings(&self) -> bool {
        self.nav_error.is_some()
            || self.section_error.is_some()
            || self
                .results
                .iter()
                .any(|r| matches!(r.outcome, CategoryOutcome::Failed(_)))
    }
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n📥 Bookmark Merge Report")?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n")?;

        for result in &self.results {
            let line = match &result.outcome {
                CategoryOutcome::Skipped => "⏭️  skipped (already present)".to_string(),
                CategoryOutcome::Merged { added } => format!("✅ merged {} cards", added),
                CategoryOutcome::Inserted { added, nav_inserted } => format!(
                    "🆕 new section with {} cards{}",
                    added,
                    if *nav_inserted { "" } else { " (no nav link)" }
                ),
                CategoryOutcome::InsertionFailed { error, .. } => {
                    format!("❌ new section not inserted: {}", error)
                }
                CategoryOutcome::Failed(error) => format!("❌ {}", error),
            };
            writeln!(f, "  • {}: {}", result.category, line)?;
            if result.duplicates > 0 {
                writeln!(f, "    {} duplicate bookmarks dropped", result.duplicates)?;
            }
        }

        if let Some(error) = &self.nav_error {
            writeln!(f, "\n⚠️  Navigation: {}", error)?;
        }
        if let Some(error) = &self.section_error {
            writeln!(f, "⚠️  Sections: {}", error)?;
        }

        writeln!(f, "\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "\n📊 Summary: {} cards added across {} categories ({} new)\n",
            self.cards_added(),
            self.results.len(),
            self.new_categories.len()
        )
    }
}

pub struct MergeEngine<'a> {
    categories: &'a CategoryMap,
    options: MergeOptions,
    progress: Option<ProgressBar>,
}

impl<'a> MergeEngine<'a> {
    pub fn new(categories: &'a CategoryMap, options: MergeOptions) -> Self {
        Self {
            categories,
            options,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// 合并所有分类，直接修改 `doc`
    pub fn merge(&self, doc: &mut TargetDocument, buckets: &CategoryBuckets) -> MergeReport {
        let mut report = MergeReport::default();
        let mut queued: Vec<(String, Vec<Bookmark>, usize)> = Vec::new();
        let mut known_urls = match self.options.dedup {
            DedupStrategy::PerItem => doc.linked_urls(),
            DedupStrategy::FirstUrl => HashSet::new(),
        };

        for (category, items) in buckets.iter() {
            if let Some(pb) = &self.progress {
                pb.set_message(category.to_string());
                pb.inc(1);
            }
            if items.is_empty() {
                debug!("Category {} has no bookmarks", category);
                continue;
            }

            let (fresh, duplicates) = match self.options.dedup {
                DedupStrategy::PerItem => select_new(items, &mut known_urls),
                DedupStrategy::FirstUrl => {
                    let first = &items[0].url;
                    if doc.contains_text(first) || doc.contains_text(&escape_html(first)) {
                        (Vec::new(), items.len())
                    } else {
                        (items.to_vec(), 0)
                    }
                }
            };

            if fresh.is_empty() {
                info!("⏭️  Skipping {}, content seems to be already present", category);
                report.results.push(CategoryResult {
                    category: category.to_string(),
                    duplicates,
                    outcome: CategoryOutcome::Skipped,
                });
                continue;
            }

            if doc.has_section(category) {
                info!("🔄 Merging {} cards into existing category: {}", fresh.len(), category);
                let cards = format!("\n{}", render_cards(&fresh));
                let outcome = match doc.insert_at(Anchor::SectionGrid(category), &cards) {
                    Ok(_) => CategoryOutcome::Merged { added: fresh.len() },
                    Err(e) => {
                        warn!("⚠️  Could not merge {}: {}", category, e);
                        CategoryOutcome::Failed(e)
                    }
                };
                report.results.push(CategoryResult {
                    category: category.to_string(),
                    duplicates,
                    outcome,
                });
            } else if !queued.iter().any(|(id, _, _)| id == category) {
                info!("🆕 New category found: {}", category);
                queued.push((category.to_string(), fresh, duplicates));
            }
        }

        if !queued.is_empty() {
            self.insert_new_sections(doc, queued, &mut report);
        }

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        report
    }

    fn insert_new_sections(
        &self,
        doc: &mut TargetDocument,
        queued: Vec<(String, Vec<Bookmark>, usize)>,
        report: &mut MergeReport,
    ) {
        let ids: Vec<&str> = queued.iter().map(|(id, _, _)| id.as_str()).collect();
        info!("📁 Adding new sections: {:?}", ids);

        let nav_html = queued
            .iter()
            .map(|(id, _, _)| render_nav_link(&self.categories.config(id)))
            .collect::<Vec<_>>()
            .join("\n");
        let nav_inserted = match doc.insert_at(Anchor::NavLinkAfter(&self.options.nav_anchor), &nav_html) {
            Ok(_) => true,
            Err(e) => {
                warn!("⚠️  Navigation links not inserted: {}", e);
                report.nav_error = Some(e);
                false
            }
        };

        let sections_html = queued
            .iter()
            .map(|(id, items, _)| render_section(&self.categories.config(id), items))
            .collect::<Vec<_>>()
            .join("\n");
        let section_result = doc.insert_at(Anchor::NoResultsSentinel, &format!("{}\n\n", sections_html));
        if let Err(e) = &section_result {
            warn!("⚠️  New sections not inserted: {}", e);
            report.section_error = Some(e.clone());
        }

        for (id, items, duplicates) in queued {
            let outcome = match &section_result {
                Ok(_) => CategoryOutcome::Inserted {
                    added: items.len(),
                    nav_inserted,
                },
                Err(e) => CategoryOutcome::InsertionFailed {
                    error: e.clone(),
                    nav_inserted,
                },
            };
            report.new_categories.push(id.clone());
            report.results.push(CategoryResult {
                category: id,
                duplicates,
                outcome,
            });
        }
    }
}

/// 丢弃已知URL；同一批次内的重复也一并丢弃
fn select_new(items: &[Bookmark], known_urls: &mut HashSet<String>) -> (Vec<Bookmark>, usize) {
    let mut fresh = Vec::new();
    let mut duplicates = 0;
    for item in items {
        if known_urls.insert(item.url.clone()) {
            fresh.push(item.clone());
        } else {
            debug!("Duplicate bookmark: {}", item.url);
            duplicates += 1;
        }
    }
    (fresh, duplicates)
}

/// 完整流程：读取导出文件和页面，合并，备份并写回
pub fn merge_files(
    source: &Path,
    target: &Path,
    categories: &CategoryMap,
    options: MergeOptions,
    dry_run: bool,
    backup: bool,
) -> Result<MergeReport> {
    info!("📖 Parsing bookmarks from {:?}", source);
    let export = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read bookmark export {:?}", source))?;
    let buckets = parse_export(&export, categories);
    info!(
        "✅ Parsed {} bookmarks in {} categories",
        buckets.total_bookmarks(),
        buckets.len()
    );

    info!("📄 Reading target page {:?}", target);
    let mut doc = TargetDocument::load(target)?;

    let progress = crate::progress::create_bookmark_progress_bar(buckets.len() as u64, "merging");
    let report = MergeEngine::new(categories, options)
        .with_progress(progress)
        .merge(&mut doc, &buckets);

    if dry_run {
        info!("🏃 Dry run mode - target page left untouched");
        return Ok(report);
    }

    if !report.has_changes() {
        info!("✅ Nothing new to write");
        return Ok(report);
    }

    if backup {
        TargetDocument::backup(target)?;
    }
    info!("💾 Writing updated page");
    doc.save(target)?;

    Ok(report)
}
