//! ArcGIS feature-service response types / ArcGIS 查询响应结构

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature<T> {
    pub attributes: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcGisError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

/// `/query?f=json` body. Errors come back with HTTP 200 and an `error` object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse<T> {
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<T>>,
    #[serde(default)]
    pub error: Option<ArcGisError>,
    #[serde(rename = "exceededTransferLimit", default)]
    pub exceeded_transfer_limit: bool,
}

/// Decode a query body into attribute records, keeping service order / 解析查询结果
pub fn decode_features<T>(body: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let response: QueryResponse<T> = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        let message = if error.details.is_empty() {
            error.message
        } else {
            format!("{} ({})", error.message, error.details.join("; "))
        };
        return Err(SearchError::Api { code: error.code, message });
    }

    if response.exceeded_transfer_limit {
        tracing::debug!("NCES query hit the service transfer limit; results are partial");
    }

    Ok(response.features.into_iter().map(|f| f.attributes).collect())
}
