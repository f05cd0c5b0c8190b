/// Clamp raw `page`/`limit` query values to sane bounds.
pub fn validate_pagination(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    (page, limit)
}

/// Paginated result wrapper
#[derive(Debug)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = ((total as f64) / (limit.max(1) as f64)).ceil() as u32;
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }

    /// Cut one page out of a fully loaded list.
    pub fn from_vec(all: Vec<T>, page: u32, limit: u32) -> Self {
        let total = all.len() as u64;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
        let items = all.into_iter().skip(skip).take(limit as usize).collect();
        Self::new(items, total, page, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_bounds() {
        assert_eq!(validate_pagination(None, None), (1, 20));
        assert_eq!(validate_pagination(Some(0), Some(500)), (1, 100));
    }

    #[test]
    fn slices_pages() {
        let page = PaginatedResult::from_vec((1..=45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);

        let empty = PaginatedResult::from_vec(Vec::<i32>::new(), 1, 20);
        assert!(empty.items.is_empty());
        assert_eq!(empty.total_pages, 0);
    }
}
