use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const MAX_RATING: f64 = 5.0;
pub const MAX_RESPONSE_RATE: f64 = 100.0;

/// Trims and lower-cases a skill name. Blank input is not a tag.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().to_lowercase();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

pub fn normalize_tags<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|s| normalize_tag(s.as_ref()))
        .collect()
}

// ---------------------------------------------------------------------------
// 寬鬆反序列化：欄位缺失、為 null 或型別錯誤時回到預設值
// ---------------------------------------------------------------------------

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn tag_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = or_default(deserializer)?;
    Ok(normalize_tags(raw))
}

fn text_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = or_default(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn proficiency_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Proficiency>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, serde_json::Value> = or_default(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(tag, level)| {
            let tag = normalize_tag(&tag)?;
            let level = level.as_str().and_then(Proficiency::parse)?;
            Some((tag, level))
        })
        .collect())
}

fn badge_set<'de, D>(deserializer: D) -> Result<BTreeSet<Badge>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = or_default(deserializer)?;
    Ok(raw.iter().filter_map(|b| Badge::parse(b)).collect())
}

fn badge<'de, D>(deserializer: D) -> Result<Badge, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Badge::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unknown badge '{}'", raw)))
}

fn rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(MAX_RATING))
}

fn response_rate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(MAX_RESPONSE_RATE))
}

/// Accepts RFC 3339 as well as the naive ISO timestamps older documents carry.
fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let Some(text) = value.as_str() else {
        return Ok(DateTime::<Utc>::default());
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }
    Ok(NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .unwrap_or_default())
}

fn default_rating() -> f64 {
    MAX_RATING
}

fn default_response_rate() -> f64 {
    MAX_RESPONSE_RATE
}

fn default_level() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Expert,
}

impl Proficiency {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "beginner" => Some(Proficiency::Beginner),
            "intermediate" => Some(Proficiency::Intermediate),
            "expert" => Some(Proficiency::Expert),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Availability {
    #[default]
    Available,
    Busy,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl SwapStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SwapStatus::Rejected | SwapStatus::Completed)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SwapStatus::Pending => "Pending",
            SwapStatus::Accepted => "Accepted",
            SwapStatus::Rejected => "Rejected",
            SwapStatus::Completed => "Completed",
        };
        f.write_str(label)
    }
}

/// Swap-count milestones. Ordered by threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Badge {
    #[serde(rename = "First Swap", alias = "🎉 First Swap")]
    FirstSwap,
    #[serde(rename = "Active Learner", alias = "⭐ Active Learner")]
    ActiveLearner,
    #[serde(rename = "Expert Swapper", alias = "🏆 Expert Swapper")]
    ExpertSwapper,
}

impl Badge {
    pub const ALL: [Badge; 3] = [Badge::FirstSwap, Badge::ActiveLearner, Badge::ExpertSwapper];

    pub fn threshold(self) -> u32 {
        match self {
            Badge::FirstSwap => 1,
            Badge::ActiveLearner => 5,
            Badge::ExpertSwapper => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Badge::FirstSwap => "First Swap",
            Badge::ActiveLearner => "Active Learner",
            Badge::ExpertSwapper => "Expert Swapper",
        }
    }

    /// Matches the label with or without a leading emoji, or the milestone
    /// keys older achievement logs used.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw {
            "first_swap" => return Some(Badge::FirstSwap),
            "5_swaps" => return Some(Badge::ActiveLearner),
            "10_swaps" => return Some(Badge::ExpertSwapper),
            _ => {}
        }
        Badge::ALL
            .into_iter()
            .find(|badge| raw == badge.label() || raw.ends_with(&format!(" {}", badge.label())))
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default, deserialize_with = "or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "or_default")]
    pub email: String,
    #[serde(default, deserialize_with = "or_default")]
    pub bio: String,
    #[serde(default, deserialize_with = "or_default")]
    pub location: String,
    #[serde(default, deserialize_with = "text_set")]
    pub interests: BTreeSet<String>,
    #[serde(default, deserialize_with = "tag_set")]
    pub skills_offered: BTreeSet<String>,
    #[serde(default, deserialize_with = "tag_set")]
    pub skills_wanted: BTreeSet<String>,
    #[serde(default, deserialize_with = "proficiency_map")]
    pub proficiency: BTreeMap<String, Proficiency>,
    #[serde(default = "default_rating", deserialize_with = "rating")]
    pub rating: f64,
    #[serde(default, deserialize_with = "or_default")]
    pub swaps_completed: u32,
    #[serde(default, deserialize_with = "or_default")]
    pub endorsements_received: u32,
    #[serde(default, deserialize_with = "badge_set")]
    pub badges: BTreeSet<Badge>,
    /// Cached; experience points are authoritative.
    #[serde(default = "default_level", deserialize_with = "or_default")]
    pub level: u32,
    #[serde(default, deserialize_with = "or_default")]
    pub experience_points: u64,
    #[serde(default = "default_response_rate", deserialize_with = "response_rate")]
    pub response_rate: f64,
    #[serde(default, deserialize_with = "or_default")]
    pub availability: Availability,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp")]
    pub last_active: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            bio: String::new(),
            location: String::new(),
            interests: BTreeSet::new(),
            skills_offered: BTreeSet::new(),
            skills_wanted: BTreeSet::new(),
            proficiency: BTreeMap::new(),
            rating: MAX_RATING,
            swaps_completed: 0,
            endorsements_received: 0,
            badges: BTreeSet::new(),
            level: 1,
            experience_points: 0,
            response_rate: MAX_RESPONSE_RATE,
            availability: Availability::Available,
            created_at: now,
            last_active: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    pub fn located_in(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests.extend(
            interests
                .into_iter()
                .map(|s| s.into().trim().to_string())
                .filter(|s| !s.is_empty()),
        );
        self
    }

    /// Adds an offered skill, optionally with a self-declared level.
    pub fn offering(mut self, skill: &str, level: Option<Proficiency>) -> Self {
        if let Some(tag) = normalize_tag(skill) {
            if let Some(level) = level {
                self.proficiency.insert(tag.clone(), level);
            }
            self.skills_offered.insert(tag);
        }
        self
    }

    pub fn wanting(mut self, skill: &str) -> Self {
        if let Some(tag) = normalize_tag(skill) {
            self.skills_wanted.insert(tag);
        }
        self
    }

    pub fn proficiency_for(&self, tag: &str) -> Option<Proficiency> {
        self.proficiency.get(tag).copied()
    }

    /// Restores the record invariants after it arrived from outside.
    pub fn normalize(&mut self) {
        self.skills_offered = normalize_tags(&self.skills_offered);
        self.skills_wanted = normalize_tags(&self.skills_wanted);
        let offered = &self.skills_offered;
        self.proficiency = std::mem::take(&mut self.proficiency)
            .into_iter()
            .filter_map(|(tag, level)| normalize_tag(&tag).map(|tag| (tag, level)))
            .filter(|(tag, _)| offered.contains(tag))
            .collect();
        self.rating = clamp_or(self.rating, 0.0, MAX_RATING, MAX_RATING);
        self.response_rate = clamp_or(self.response_rate, 0.0, MAX_RESPONSE_RATE, MAX_RESPONSE_RATE);
    }
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    #[serde(default, deserialize_with = "or_default")]
    pub skill_offered: String,
    #[serde(default, deserialize_with = "or_default")]
    pub skill_wanted: String,
    #[serde(default, deserialize_with = "or_default")]
    pub message: String,
    #[serde(default, deserialize_with = "or_default")]
    pub priority: Priority,
    pub status: SwapStatus,
    #[serde(default, deserialize_with = "or_default")]
    pub viewed: bool,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endorsement {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    #[serde(default, deserialize_with = "or_default")]
    pub skill: String,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Log entry written when a user earns a badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub user_id: String,
    #[serde(alias = "type", deserialize_with = "badge")]
    pub badge: Badge,
    #[serde(default, deserialize_with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// The shared document: every collection the directory reads and rewrites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub requests: Vec<SwapRequest>,
    #[serde(default)]
    pub endorsements: Vec<Endorsement>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    /// Kept verbatim; nothing here interprets messages.
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

impl Document {
    pub fn normalize(&mut self) {
        for user in &mut self.users {
            user.normalize();
        }
    }

    pub fn user(&self, id: &str) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn request(&self, id: &str) -> Option<&SwapRequest> {
        self.requests.iter().find(|r| r.id == id)
    }
}
