use serde::{Deserialize, Serialize};

/// 候选人资料
///
/// 由调用方提供，流程中只读
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub skills: Vec<String>,
    pub experience_years: u32,
    pub previous_roles: Vec<String>,
    pub education: Vec<String>,
    pub certifications: Vec<String>,
    pub domains: Vec<String>,
    pub key_achievements: Vec<String>,
    pub technologies: Vec<String>,
}
