//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::WidgetView;

/// API response structure for intent endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub widget: WidgetView,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, widget: WidgetView) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            widget,
        }
    }

    /// Create a response for an accepted intent
    pub fn applied(message: String, widget: WidgetView) -> Self {
        Self::new("applied".to_string(), message, widget)
    }

    /// Create a response for a silently rejected intent
    pub fn ignored(message: String, widget: WidgetView) -> Self {
        Self::new("ignored".to_string(), message, widget)
    }
}

/// Status response with widget state and server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub widget: WidgetView,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: "0.1.0".to_string(),
        }
    }
}
