//! Domain records shared by the controllers and the NCES client / 领域数据结构

use serde::{Deserialize, Serialize};

/// A searchable record: identifier plus display label / 可搜索实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub label: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// `{value, label}` pair handed to the presentation layer / 下拉选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl From<&Entity> for SelectOption {
    fn from(entity: &Entity) -> Self {
        Self {
            value: entity.id.clone(),
            label: entity.label.clone(),
        }
    }
}

impl From<SelectOption> for Entity {
    fn from(option: SelectOption) -> Self {
        Self {
            id: option.value,
            label: option.label,
        }
    }
}

/// School district feature attributes (NCES EDGE) / 学区要素属性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistrictAttributes {
    #[serde(rename = "LEAID")]
    pub leaid: String,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "STATEFP", default)]
    pub state_fips: Option<String>,
}

impl From<DistrictAttributes> for Entity {
    fn from(district: DistrictAttributes) -> Self {
        Entity::new(district.leaid, district.name)
    }
}

/// Public school feature attributes (NCES EDGE) / 学校要素属性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolAttributes {
    #[serde(rename = "FID")]
    pub fid: i64,
    /// Missing for some features / 部分要素缺失名称
    #[serde(rename = "NAME", default)]
    pub name: Option<String>,
    #[serde(rename = "NCESSCH", default)]
    pub ncessch: Option<String>,
    #[serde(rename = "LEAID", default)]
    pub leaid: Option<String>,
    #[serde(rename = "CITY", default)]
    pub city: Option<String>,
    #[serde(rename = "STATE", default)]
    pub state: Option<String>,
}

impl From<SchoolAttributes> for Entity {
    fn from(school: SchoolAttributes) -> Self {
        Entity::new(school.fid.to_string(), school.name.unwrap_or_default())
    }
}
