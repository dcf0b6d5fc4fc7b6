use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generation::PipelineError;

pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 120;

pub const INTERVIEWER_KEY: &str = "interviewer";
pub const INTERVIEWEE_KEY: &str = "interviewee";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewTopic {
    #[serde(rename = "Software Engineering")]
    SoftwareEngineering,
    #[serde(rename = "Product Management")]
    ProductManagement,
    #[serde(rename = "Data Science")]
    DataScience,
    #[serde(rename = "Frontend Engineering")]
    FrontendEngineering,
    #[serde(rename = "Backend Engineering")]
    BackendEngineering,
    #[serde(rename = "DevOps Engineering")]
    DevOpsEngineering,
    #[serde(rename = "Mobile Development")]
    MobileDevelopment,
    #[serde(rename = "Machine Learning")]
    MachineLearning,
}

impl InterviewTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoftwareEngineering => "Software Engineering",
            Self::ProductManagement => "Product Management",
            Self::DataScience => "Data Science",
            Self::FrontendEngineering => "Frontend Engineering",
            Self::BackendEngineering => "Backend Engineering",
            Self::DevOpsEngineering => "DevOps Engineering",
            Self::MobileDevelopment => "Mobile Development",
            Self::MachineLearning => "Machine Learning",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DifficultyLevel {
    Junior,
    #[default]
    MidLevel,
    Senior,
    Staff,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::MidLevel => "mid-level",
            Self::Senior => "senior",
            Self::Staff => "staff",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompanyType {
    #[default]
    Startup,
    BigTech,
    Enterprise,
    Consulting,
}

impl CompanyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::BigTech => "big-tech",
            Self::Enterprise => "enterprise",
            Self::Consulting => "consulting",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(InterviewTopic, DifficultyLevel, CompanyType);

fn default_duration() -> u32 {
    45
}

fn default_focus_areas() -> Vec<String> {
    vec!["technical".to_string(), "behavioral".to_string()]
}

/// Parameters for one synthetic interview. Never mutated after deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: InterviewTopic,
    #[serde(default)]
    pub difficulty: DifficultyLevel,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub company_type: CompanyType,
    #[serde(default = "default_focus_areas")]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub interviewer_name: Option<String>,
    #[serde(default)]
    pub interviewee_name: Option<String>,
}

impl GenerationRequest {
    pub fn new(topic: InterviewTopic) -> Self {
        Self {
            topic,
            difficulty: DifficultyLevel::default(),
            duration_minutes: default_duration(),
            company_type: CompanyType::default(),
            focus_areas: default_focus_areas(),
            interviewer_name: None,
            interviewee_name: None,
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration_minutes) {
            return Err(PipelineError::Validation(format!(
                "duration_minutes must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES}, got {}",
                self.duration_minutes
            )));
        }
        for (field, name) in [
            ("interviewer_name", &self.interviewer_name),
            ("interviewee_name", &self.interviewee_name),
        ] {
            if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
                return Err(PipelineError::Validation(format!(
                    "{field} cannot be blank when provided"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Interviewer,
    Interviewee,
}

impl Speaker {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            INTERVIEWER_KEY => Some(Self::Interviewer),
            INTERVIEWEE_KEY => Some(Self::Interviewee),
            _ => None,
        }
    }
}

/// One utterance. `timestamp` is `MM:SS`; ordering within a chapter is the model's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub duration_minutes: u32,
    pub description: String,
    pub exchanges: Vec<Exchange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub role: String,
    pub company: Option<String>,
}

/// A complete interview conversation.
///
/// `participants` always holds exactly the `interviewer` and `interviewee` keys and
/// `chapters` is never empty; the interpreter refuses to build one otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub topic: String,
    pub difficulty: String,
    pub total_duration_minutes: u32,
    pub participants: BTreeMap<String, Participant>,
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// Title-cases every alphabetic run: `"mid-level"` becomes `"Mid-Level"`.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_minimal_json() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"topic": "Data Science"}"#).unwrap();
        assert_eq!(request.topic, InterviewTopic::DataScience);
        assert_eq!(request.difficulty, DifficultyLevel::MidLevel);
        assert_eq!(request.duration_minutes, 45);
        assert_eq!(request.company_type, CompanyType::Startup);
        assert_eq!(request.focus_areas, vec!["technical", "behavioral"]);
        assert!(request.interviewer_name.is_none());
    }

    #[test]
    fn test_enum_wire_names() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{"topic": "DevOps Engineering", "difficulty": "mid-level", "company_type": "big-tech"}"#,
        )
        .unwrap();
        assert_eq!(request.topic.as_str(), "DevOps Engineering");
        assert_eq!(request.company_type, CompanyType::BigTech);
        assert_eq!(
            serde_json::to_value(DifficultyLevel::MidLevel).unwrap(),
            "mid-level"
        );
    }

    #[test]
    fn test_unknown_topic_rejected() {
        let result: Result<GenerationRequest, _> =
            serde_json::from_str(r#"{"topic": "Underwater Basket Weaving"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_duration_bounds() {
        let mut request = GenerationRequest::new(InterviewTopic::SoftwareEngineering);
        request.duration_minutes = 15;
        assert!(request.validate().is_ok());
        request.duration_minutes = 120;
        assert!(request.validate().is_ok());
        request.duration_minutes = 14;
        assert!(matches!(
            request.validate(),
            Err(PipelineError::Validation(_))
        ));
        request.duration_minutes = 121;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_blank_supplied_name_rejected() {
        let mut request = GenerationRequest::new(InterviewTopic::SoftwareEngineering);
        request.interviewee_name = Some("   ".to_string());
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_speaker_parse_is_case_insensitive() {
        assert_eq!(Speaker::parse("Interviewer"), Some(Speaker::Interviewer));
        assert_eq!(Speaker::parse(" interviewee "), Some(Speaker::Interviewee));
        assert_eq!(Speaker::parse("narrator"), None);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("mid-level"), "Mid-Level");
        assert_eq!(title_case("big-tech"), "Big-Tech");
        assert_eq!(title_case("senior"), "Senior");
    }
}
