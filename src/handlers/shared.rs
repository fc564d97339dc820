use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

/// Envelope shared by every JSON response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: Option<T>, message: &str) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.to_string()),
        }
    }

    // 200 with data
    pub fn ok(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self::success(data))
    }

    // 201 with data
    pub fn created(data: T) -> HttpResponse {
        HttpResponse::Created().json(Self::success(data))
    }
}

impl ApiResponse<()> {
    pub fn error(message: &str) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }

    pub fn message(message: &str) -> HttpResponse {
        HttpResponse::Ok().json(Self::success_with_message(None, message))
    }
}
