//! HTML fragments for cards, sections and navigation links.
//!
//! Every interpolated value goes through [`escape_html`]; the page is
//! hand-authored so fragments keep its exact indentation.

use crate::bookmarks::Bookmark;
use crate::categories::CategoryConfig;

/// Escape text for use inside element content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A single bookmark card.
pub fn render_card(item: &Bookmark) -> String {
    format!(
        r#"
                    <a href="{url}" target="_blank" rel="noopener" class="group relative bg-white dark:bg-slate-900 p-5 rounded-2xl shadow-sm hover:shadow-xl transition-all duration-300 border border-slate-200 dark:border-slate-800 hover:-translate-y-1">
                        <div class="flex items-start justify-between mb-4">
                            <div class="p-3 bg-slate-50 dark:bg-slate-800 rounded-xl group-hover:bg-blue-600 group-hover:text-white transition-colors duration-300 text-slate-600 dark:text-slate-400">
                                <i data-lucide="bookmark" class="w-6 h-6"></i>
                            </div>
                            <i data-lucide="external-link" class="w-4 h-4 text-slate-400 group-hover:text-blue-500 transition-colors"></i>
                        </div>
                        <h3 class="text-lg font-bold mb-2 group-hover:text-blue-600 dark:group-hover:text-blue-400 transition-colors break-words">{title}</h3>
                        <p class="text-slate-500 dark:text-slate-400 text-sm line-clamp-2">
                            {desc}
                        </p>
                    </a>"#,
        url = escape_html(&item.url),
        title = escape_html(&item.title),
        desc = escape_html(&item.desc),
    )
}

/// Cards joined the way they are spliced into an existing grid.
pub fn render_cards(items: &[Bookmark]) -> String {
    items.iter().map(render_card).collect::<Vec<_>>().join("\n")
}

/// A complete category section: header plus card grid.
pub fn render_section(category: &CategoryConfig, items: &[Bookmark]) -> String {
    let id = escape_html(&category.id);
    let name = escape_html(&category.display_name());
    let icon = escape_html(category.icon());
    let color = escape_html(category.section_color());

    format!(
        r#"
            <!-- {name} Section -->
            <div id="{id}" class="mb-16 scroll-mt-32">
                <div class="flex items-center mb-8 border-b border-slate-200 dark:border-slate-800 pb-4">
                    <div class="p-2 bg-{color}-100 dark:bg-{color}-900/30 rounded-lg mr-4">
                        <i data-lucide="{icon}" class="w-6 h-6 text-{color}-600 dark:text-{color}-400"></i>
                    </div>
                    <h2 class="text-2xl font-bold text-slate-900 dark:text-white">{name}</h2>
                </div>

                <div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 xl:grid-cols-4 gap-4 card-grid">
{cards}
                </div>
            </div>"#,
        cards = render_cards(items),
    )
}

/// A pill link in the category navigation bar.
pub fn render_nav_link(category: &CategoryConfig) -> String {
    let id = escape_html(&category.id);
    let name = escape_html(&category.display_name());
    let color = escape_html(category.nav_color());

    format!(
        r##"
                    <a href="#{id}" class="px-4 py-2 rounded-full text-sm font-medium whitespace-nowrap bg-white dark:bg-slate-900 border border-slate-200 dark:border-slate-800 text-slate-600 dark:text-slate-400 hover:border-{color}-500 hover:text-{color}-600 dark:hover:text-{color}-400 transition-all shadow-sm">
                        {name}
                    </a>"##
    )
}

/// Standalone grid used by `preview`, tagged `imported-<id>`.
pub fn render_preview_grid(category_id: &str, items: &[Bookmark]) -> String {
    let mut out = format!(
        "<div class=\"grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 xl:grid-cols-4 gap-4 card-grid\" id=\"imported-{}\">\n",
        escape_html(category_id)
    );
    for item in items {
        out.push_str(&render_card(item));
        out.push('\n');
    }
    out.push_str("</div>");
    out
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// 相同输入渲染结果完全一致
        #[test]
        fn prop_card_is_pure(url in "https://[a-z]{1,12}\\.com/[a-z0-9&<>\"']{0,12}", title in ".{0,30}") {
            let item = Bookmark::new(url, title);
            prop_assert_eq!(render_card(&item), render_card(&item.clone()));
        }

        /// 转义后不再含有原始的尖括号和引号
        #[test]
        fn prop_escape_removes_specials(text in ".{0,40}") {
            let escaped = escape_html(&text);
            prop_assert!(!escaped.contains('<'));
            prop_assert!(!escaped.contains('>'));
            prop_assert!(!escaped.contains('"'));
            prop_assert!(!escaped.contains('\''));
        }
    }
}
