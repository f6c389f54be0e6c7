pub mod assessments;
pub mod dashboard;
pub mod payments;
pub mod profile;

/// Paging parameters shared by the list endpoints.
#[derive(Clone, Debug)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
    pub order_by: String,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            order_by: "desc".to_string(),
        }
    }
}

impl PageQuery {
    pub fn to_query_string(&self) -> String {
        format!(
            "page={}&limit={}&orderBy={}",
            self.page, self.limit, self.order_by
        )
    }
}
