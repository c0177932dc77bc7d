//! Listing search / filter / sort / pagination / 列表搜索、过滤、排序与分页

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{FileCategory, FileEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindFilter {
    #[default]
    All,
    Files,
    Folders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Size,
    Modified,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Listing options sent by the dashboard / 列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// Case-insensitive name keyword / 名称关键字
    pub keyword: Option<String>,
    pub kind: KindFilter,
    pub category: Option<FileCategory>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// 1-based page, 0 or absent means page 1 / 页码
    pub page: Option<usize>,
    /// Absent or 0 means no paging / 每页数量
    pub per_page: Option<usize>,
}

pub const MAX_PER_PAGE: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub content: Vec<FileEntry>,
    /// Matches before paging / 分页前总数
    pub total: usize,
    pub folder_count: usize,
    pub file_count: usize,
    pub page: usize,
    pub per_page: usize,
}

impl ListQuery {
    pub fn matches(&self, entry: &FileEntry) -> bool {
        match self.kind {
            KindFilter::Files if entry.is_folder() => return false,
            KindFilter::Folders if !entry.is_folder() => return false,
            _ => {}
        }

        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }

        match self.keyword.as_deref().map(str::trim) {
            Some(keyword) if !keyword.is_empty() => {
                entry.name.to_lowercase().contains(&keyword.to_lowercase())
            }
            _ => true,
        }
    }

    /// Filter, sort and page a listing / 过滤、排序并分页
    pub fn apply(&self, entries: Vec<FileEntry>) -> ListResult {
        let mut content: Vec<FileEntry> = entries.into_iter().filter(|e| self.matches(e)).collect();
        sort_entries(&mut content, self.sort_by, self.sort_order);

        let total = content.len();
        let folder_count = content.iter().filter(|e| e.is_folder()).count();
        let file_count = total - folder_count;

        let per_page = match self.per_page {
            Some(n) if n > 0 => n.min(MAX_PER_PAGE),
            _ => total.max(1),
        };
        let page = self.page.unwrap_or(1).max(1);
        let content = content
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        ListResult {
            content,
            total,
            folder_count,
            file_count,
            page,
            per_page,
        }
    }
}

/// 排序：目录始终在前，然后按指定字段排序
pub fn sort_entries(entries: &mut [FileEntry], field: SortField, order: SortOrder) {
    entries.sort_by(|a, b| {
        match (a.is_folder(), b.is_folder()) {
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }

        let cmp = match field {
            SortField::Name => natord::compare_ignore_case(&a.name, &b.name),
            SortField::Size => a.size.cmp(&b.size),
            SortField::Modified => a.last_modified.cmp(&b.last_modified),
            SortField::Type => a.extension.cmp(&b.extension),
        };
        // ties fall back to the name so the order is stable across requests
        let cmp = cmp.then_with(|| natord::compare(&a.name, &b.name));

        match order {
            SortOrder::Asc => cmp,
            SortOrder::Desc => cmp.reverse(),
        }
    });
}
