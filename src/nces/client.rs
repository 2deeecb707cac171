use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use super::types::decode_features;
use crate::config::NcesConfig;
use crate::error::{Result, SearchError};
use crate::models::{DistrictAttributes, Entity, SchoolAttributes};
use crate::search::{FetchGate, SearchSource};

/// Quote a value for an ArcGIS SQL `where` clause / 转义 SQL 字面量
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Make user text match literally inside a `LIKE` pattern / 转义 LIKE 通配符
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escape_literal(&escaped)
}

fn name_filter(keyword: &str) -> String {
    format!("UPPER(NAME) LIKE UPPER('%{}%') ESCAPE '\\'", escape_like(keyword))
}

pub fn district_where(keyword: &str) -> String {
    name_filter(keyword)
}

/// Empty keyword lists every school of the district / 关键词为空时列出学区内全部学校
pub fn school_where(keyword: &str, district_id: &str) -> String {
    let mut clause = format!("LEAID = '{}'", escape_literal(district_id));
    if !keyword.is_empty() {
        clause.push_str(" AND ");
        clause.push_str(&name_filter(keyword));
    }
    clause
}

pub fn query_url(base: &str, where_clause: &str) -> Result<Url> {
    Url::parse_with_params(
        base,
        &[
            ("where", where_clause),
            ("outFields", "*"),
            ("returnGeometry", "false"),
            ("f", "json"),
        ],
    )
    .map_err(|e| SearchError::Config(format!("invalid query url {:?}: {}", base, e)))
}

/// NCES EDGE feature-service client / NCES 要素服务客户端
pub struct NcesClient {
    config: NcesConfig,
    client: Client,
}

impl NcesClient {
    pub fn new(config: NcesConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { config, client })
    }

    async fn query<T>(&self, base: &str, where_clause: &str) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = query_url(base, where_clause)?;
        tracing::debug!("NCES query: {}", where_clause);

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = resp.text().await?;
        decode_features(&body)
    }

    pub async fn search_districts(&self, keyword: &str) -> Result<Vec<DistrictAttributes>> {
        self.query(&self.config.district_url, &district_where(keyword)).await
    }

    pub async fn search_schools(&self, keyword: &str, district_id: &str) -> Result<Vec<SchoolAttributes>> {
        self.query(&self.config.school_url, &school_where(keyword, district_id)).await
    }
}

/// District field source / 学区搜索源
pub struct DistrictSearch {
    client: Arc<NcesClient>,
}

impl DistrictSearch {
    pub fn new(client: Arc<NcesClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchSource for DistrictSearch {
    fn name(&self) -> &str {
        "district"
    }

    fn gate(&self) -> FetchGate {
        FetchGate::NonEmptyKeyword
    }

    async fn fetch(&self, keyword: &str, _dependency: Option<&str>) -> Result<Vec<Entity>> {
        let districts = self.client.search_districts(keyword).await?;
        Ok(districts.into_iter().map(Entity::from).collect())
    }
}

/// School field source, scoped to the selected district / 学校搜索源
pub struct SchoolSearch {
    client: Arc<NcesClient>,
}

impl SchoolSearch {
    pub fn new(client: Arc<NcesClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchSource for SchoolSearch {
    fn name(&self) -> &str {
        "school"
    }

    fn gate(&self) -> FetchGate {
        FetchGate::Dependency
    }

    async fn fetch(&self, keyword: &str, dependency: Option<&str>) -> Result<Vec<Entity>> {
        let Some(district_id) = dependency else {
            return Ok(Vec::new());
        };
        let schools = self.client.search_schools(keyword, district_id).await?;
        Ok(schools.into_iter().map(Entity::from).collect())
    }
}
