use serde::Serialize;

pub const MAX_LIMIT: i64 = 50;

/// Built from the raw `page`/`limit` query fields each filter struct
/// declares itself; `serde_urlencoded` cannot route numeric parameters
/// through a flattened struct, so this is never deserialized directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        let limit = self.limit();
        PageMeta {
            current: self.page(),
            pages: (total + limit - 1) / limit,
            total,
            limit,
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct PageMeta {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);

        let p = Pagination {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_LIMIT);
    }

    #[test]
    fn page_count_rounds_up() {
        let p = Pagination {
            page: Some(2),
            limit: Some(10),
        };
        assert_eq!(p.offset(), 10);
        let meta = p.meta(25);
        assert_eq!(
            meta,
            PageMeta {
                current: 2,
                pages: 3,
                total: 25,
                limit: 10
            }
        );
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let meta = Pagination::default().meta(0);
        assert_eq!(meta.pages, 0);
    }
}
