use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of the evaluation document and their criteria, in display order.
/// Keys are the exact JSON keys the model is asked to produce.
pub const CATEGORIES: [(&str, &[&str]); 3] = [
    ("Demographic Diversity", &["URM", "Minority", "Female"]),
    ("Geographic Diversity", &["EA", "SO", "CE", "WE", "FO"]),
    (
        "Seniority/Career Phase",
        &["professor", "associate professor", "assistant professor"],
    ),
];

/// Actual percentages of a slate, one free-form string per criterion
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Ratios {
    pub urm: String,
    pub minority: String,
    pub female: String,
    pub ea: String,
    pub so: String,
    pub ce: String,
    pub we: String,
    pub fo: String,
    pub professor: String,
    pub associate_professor: String,
    pub assistant_professor: String,
}

impl Ratios {
    /// Ratios paired with the criterion key used in the prompt, in prompt order
    pub fn labeled(&self) -> [(&'static str, &str); 11] {
        [
            ("URM", self.urm.as_str()),
            ("Minority", self.minority.as_str()),
            ("Female", self.female.as_str()),
            ("EA", self.ea.as_str()),
            ("SO", self.so.as_str()),
            ("CE", self.ce.as_str()),
            ("WE", self.we.as_str()),
            ("FO", self.fo.as_str()),
            ("professor", self.professor.as_str()),
            ("associate professor", self.associate_professor.as_str()),
            ("assistant professor", self.assistant_professor.as_str()),
        ]
    }
}

/// Everything needed for one evaluation request
#[derive(Debug, Clone, PartialEq)]
pub struct DiversityInput {
    pub ratios: Ratios,
    /// Narrative describing plans for deviations from the ideal ratios
    pub workflow: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered turns of one evaluation conversation.
///
/// Starts as `[system, user]` and only ever grows by an assistant/user pair
/// per repair.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![
                ChatMessage::new(Role::System, system),
                ChatMessage::new(Role::User, user),
            ],
        }
    }

    /// Record a rejected reply followed by the corrective instruction
    pub fn push_repair(&mut self, rejected: impl Into<String>, correction: impl Into<String>) {
        self.messages.push(ChatMessage::new(Role::Assistant, rejected));
        self.messages.push(ChatMessage::new(Role::User, correction));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Sentiment the model attaches to a criterion's plan of action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Healthy,
    Positive,
    Negative,
}

impl Sentiment {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "healthy" => Some(Sentiment::Healthy),
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    /// Rating the model is instructed to give for this sentiment
    pub fn rating(self) -> f64 {
        match self {
            Sentiment::Healthy => 3.0,
            Sentiment::Positive => 2.0,
            Sentiment::Negative => 1.0,
        }
    }
}

/// Assessment of a single criterion
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CriterionResult {
    #[serde(rename = "plan of action", default)]
    pub plan_of_action: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rating: Option<f64>,
}

impl CriterionResult {
    /// True when both sentiment and rating are present but disagree with the
    /// Healthy=3 / Positive=2 / Negative=1 mapping
    pub fn rating_disagrees_with_sentiment(&self) -> bool {
        let expected = self.sentiment.as_deref().and_then(Sentiment::parse);
        match (expected, self.rating) {
            (Some(sentiment), Some(rating)) => (sentiment.rating() - rating).abs() > f64::EPSILON,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DemographicDiversity {
    #[serde(rename = "URM")]
    pub urm: CriterionResult,
    #[serde(rename = "Minority")]
    pub minority: CriterionResult,
    #[serde(rename = "Female")]
    pub female: CriterionResult,
    #[serde(rename = "Average Rating", default, deserialize_with = "lenient_rating")]
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeographicDiversity {
    #[serde(rename = "EA")]
    pub ea: CriterionResult,
    #[serde(rename = "SO")]
    pub so: CriterionResult,
    #[serde(rename = "CE")]
    pub ce: CriterionResult,
    #[serde(rename = "WE")]
    pub we: CriterionResult,
    #[serde(rename = "FO")]
    pub fo: CriterionResult,
    #[serde(rename = "Average Rating", default, deserialize_with = "lenient_rating")]
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeniorityCareerPhase {
    pub professor: CriterionResult,
    #[serde(rename = "associate professor")]
    pub associate_professor: CriterionResult,
    #[serde(rename = "assistant professor")]
    pub assistant_professor: CriterionResult,
    #[serde(rename = "Average Rating", default, deserialize_with = "lenient_rating")]
    pub average_rating: Option<f64>,
}

/// Document the completion service must return for a slate
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SlateEvaluation {
    #[serde(rename = "Demographic Diversity")]
    pub demographic: DemographicDiversity,
    #[serde(rename = "Geographic Diversity")]
    pub geographic: GeographicDiversity,
    #[serde(rename = "Seniority/Career Phase")]
    pub seniority: SeniorityCareerPhase,
    #[serde(rename = "Overall Rating", default, deserialize_with = "lenient_rating")]
    pub overall_rating: Option<f64>,
    #[serde(rename = "Summary", default)]
    pub summary: Option<String>,
}

impl SlateEvaluation {
    /// Every criterion with its JSON key, in display order
    pub fn criteria(&self) -> [(&'static str, &CriterionResult); 11] {
        [
            ("URM", &self.demographic.urm),
            ("Minority", &self.demographic.minority),
            ("Female", &self.demographic.female),
            ("EA", &self.geographic.ea),
            ("SO", &self.geographic.so),
            ("CE", &self.geographic.ce),
            ("WE", &self.geographic.we),
            ("FO", &self.geographic.fo),
            ("professor", &self.seniority.professor),
            ("associate professor", &self.seniority.associate_professor),
            ("assistant professor", &self.seniority.assistant_professor),
        ]
    }
}

/// Accepts a number, a numeric string or null. Anything else, including an
/// empty string, is a schema mismatch.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(text)) => match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Some(n)),
            _ => Err(de::Error::custom(format!("rating `{}` is not a number", text))),
        },
    }
}

/// The 27 display values of an evaluation, in fixed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatDisplayResult(Vec<Value>);

impl FlatDisplayResult {
    pub const LEN: usize = 27;

    pub(crate) fn new(values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), Self::LEN);
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

/// Flattened result for one slate of a run file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlateReport {
    pub title: String,
    pub values: FlatDisplayResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(sentiment: Option<&str>, rating: Option<f64>) -> CriterionResult {
        CriterionResult {
            plan_of_action: None,
            sentiment: sentiment.map(str::to_string),
            rating,
        }
    }

    #[test]
    fn test_conversation_starts_with_system_and_user() {
        let conversation = Conversation::new("system", "user");
        assert_eq!(conversation.len(), 2);
        assert!(!conversation.is_empty());
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.messages()[1].role, Role::User);
    }

    #[test]
    fn test_push_repair_appends_assistant_then_user() {
        let mut conversation = Conversation::new("system", "user");
        conversation.push_repair("{bad", "please fix");

        assert_eq!(conversation.len(), 4);
        assert_eq!(conversation.messages()[2], ChatMessage::new(Role::Assistant, "{bad"));
        assert_eq!(conversation.messages()[3], ChatMessage::new(Role::User, "please fix"));
    }

    #[test]
    fn test_sentiment_parse_is_case_insensitive() {
        assert_eq!(Sentiment::parse(" healthy "), Some(Sentiment::Healthy));
        assert_eq!(Sentiment::parse("POSITIVE"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse("Negative"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse("neutral"), None);
    }

    #[test]
    fn test_rating_disagrees_with_sentiment() {
        assert!(!criterion(Some("Healthy"), Some(3.0)).rating_disagrees_with_sentiment());
        assert!(criterion(Some("Negative"), Some(2.0)).rating_disagrees_with_sentiment());
        assert!(!criterion(None, Some(2.0)).rating_disagrees_with_sentiment());
        assert!(!criterion(Some("Positive"), None).rating_disagrees_with_sentiment());
    }

    #[test]
    fn test_criterion_accepts_numeric_string_rating() {
        let parsed: CriterionResult =
            serde_json::from_str(r#"{"plan of action": "x", "sentiment": "Positive", "rating": "2"}"#)
                .unwrap();
        assert_eq!(parsed.rating, Some(2.0));
        assert_eq!(parsed.plan_of_action.as_deref(), Some("x"));
    }

    #[test]
    fn test_criterion_missing_leaves_default_to_none() {
        let parsed: CriterionResult = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, CriterionResult::default());
    }

    #[test]
    fn test_criterion_rejects_empty_rating_string() {
        let parsed = serde_json::from_str::<CriterionResult>(r#"{"rating": ""}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_ratios_labeled_order() {
        let ratios = Ratios {
            urm: "1".into(),
            minority: "2".into(),
            female: "3".into(),
            ea: "4".into(),
            so: "5".into(),
            ce: "6".into(),
            we: "7".into(),
            fo: "8".into(),
            professor: "9".into(),
            associate_professor: "10".into(),
            assistant_professor: "11".into(),
        };
        let labeled = ratios.labeled();
        assert_eq!(labeled[0], ("URM", "1"));
        assert_eq!(labeled[9], ("associate professor", "10"));
        assert_eq!(labeled[10], ("assistant professor", "11"));
    }
}
