use actix_web::HttpResponse;
use serde::Serialize;

/// Envelope for every successful API response.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Pagination { page, limit, total, total_pages }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        ApiResponse { success: true, data: Some(data), message: None, pagination: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse { success: true, data: None, message: Some(message.into()), pagination: None }
    }
}

pub fn ok<T: Serialize>(body: ApiResponse<T>) -> HttpResponse {
    HttpResponse::Ok().json(body)
}

pub fn created<T: Serialize>(body: ApiResponse<T>) -> HttpResponse {
    HttpResponse::Created().json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 10, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 10, 10).total_pages, 1);
        assert_eq!(Pagination::new(2, 10, 11).total_pages, 2);
    }

    #[test]
    fn empty_parts_are_omitted() {
        let v = serde_json::to_value(ApiResponse::message("Status deleted")).unwrap();
        assert_eq!(v, json!({ "success": true, "message": "Status deleted" }));

        let v = serde_json::to_value(
            ApiResponse::data(vec![1, 2]).with_pagination(Pagination::new(1, 2, 5)),
        )
        .unwrap();
        assert_eq!(v["pagination"]["totalPages"], json!(3));
        assert!(v.get("message").is_none());
    }
}
