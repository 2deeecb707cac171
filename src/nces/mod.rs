//! NCES EDGE search API / NCES 学区与学校查询
//!
//! 支持：
//! - School district name search / 学区名称搜索
//! - School search within one district (empty keyword lists all) / 学区内学校搜索
//!
//! 设计原则：
//! - Only provides the two queries; debouncing and ordering are the controllers' job

mod client;
mod types;

pub use client::{
    district_where, escape_like, escape_literal, query_url, school_where, DistrictSearch, NcesClient,
    SchoolSearch,
};
pub use types::{decode_features, ArcGisError, Feature, QueryResponse};

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::search::{ControllerOptions, SchoolFinder};

/// Build the district → school finder backed by NCES / 创建基于 NCES 的级联搜索
pub fn finder_from_config(config: &AppConfig) -> Result<SchoolFinder<DistrictSearch, SchoolSearch>> {
    let client = Arc::new(NcesClient::new(config.nces.clone())?);
    Ok(SchoolFinder::new(
        DistrictSearch::new(client.clone()),
        SchoolSearch::new(client),
        ControllerOptions::from(&config.search),
    ))
}
