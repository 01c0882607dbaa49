use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const PDF_MIME: &str = "application/pdf";
const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// Where the bytes of a picked file live until the upload needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    Loaded(Vec<u8>),
    OnDisk(PathBuf),
}

/// A file picked by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub name: String,
    pub size: u64,
    pub media_type: String,
    pub contents: FileContents,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            media_type: media_type.into(),
            contents: FileContents::Loaded(bytes),
        }
    }

    /// Describes a file on disk from its metadata only, declaring its media
    /// type from the extension the same way a browser file picker does.
    /// Nothing is read until [`UploadCandidate::read_bytes`].
    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        let name = path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("cv.pdf")
            .to_string();

        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("failed to inspect file {}", path.display()))?;
        if !metadata.is_file() {
            anyhow::bail!("{} is not a regular file", path.display());
        }

        Ok(Self {
            name,
            size: metadata.len(),
            media_type: media_type_for_path(path).to_string(),
            contents: FileContents::OnDisk(path.to_path_buf()),
        })
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.contents, FileContents::Loaded(_))
    }

    pub async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match &self.contents {
            FileContents::Loaded(bytes) => Ok(bytes.clone()),
            FileContents::OnDisk(path) => tokio::fs::read(path).await,
        }
    }
}

pub fn media_type_for_path(path: &Path) -> &'static str {
    match path.extension().and_then(|v| v.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MIME,
        _ => OCTET_STREAM_MIME,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub data: AnalysisResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub match_result: MatchResult,
    #[serde(default)]
    pub recommendations: Recommendations,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub total_score: f64,
    pub breakdown: Breakdown,
    #[serde(default)]
    pub skills_found: SkillGroups,
    #[serde(default)]
    pub skills_missing: SkillGroups,
    #[serde(default)]
    pub total_found: u32,
    #[serde(default)]
    pub total_required: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breakdown {
    pub skills: SkillsScore,
    pub experience: ExperienceScore,
    pub context: ContextScore,
}

/// Per-category `details`: usually an object, but the service sends a
/// plain sentence when it has nothing to measure (e.g. an offer with no
/// technical requirements).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreDetails<T> {
    Fields(T),
    Note(String),
}

impl<T> ScoreDetails<T> {
    pub fn fields(&self) -> Option<&T> {
        match self {
            ScoreDetails::Fields(fields) => Some(fields),
            ScoreDetails::Note(_) => None,
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            ScoreDetails::Fields(_) => None,
            ScoreDetails::Note(note) => Some(note),
        }
    }
}

impl<T: Default> Default for ScoreDetails<T> {
    fn default() -> Self {
        ScoreDetails::Fields(T::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsScore {
    pub score: f64,
    #[serde(default)]
    pub details: ScoreDetails<SkillsDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillsDetails {
    #[serde(default)]
    pub found: u32,
    #[serde(default)]
    pub required: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceScore {
    pub score: f64,
    #[serde(default)]
    pub details: ScoreDetails<ExperienceDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceDetails {
    #[serde(rename = "match", default)]
    pub match_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextScore {
    pub score: f64,
    #[serde(default)]
    pub details: ScoreDetails<ContextDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextDetails {
    #[serde(default)]
    pub dominant: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub critical: Option<Vec<String>>,
    #[serde(default)]
    pub improvements: Option<Vec<String>>,
    #[serde(default)]
    pub strengths: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillGroup {
    pub category: String,
    pub skills: Vec<String>,
}

/// Category -> skill labels, kept in the order the service sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillGroups(Vec<SkillGroup>);

impl SkillGroups {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillGroup> {
        self.0.iter()
    }
}

impl FromIterator<(String, Vec<String>)> for SkillGroups {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(category, skills)| SkillGroup { category, skills })
                .collect(),
        )
    }
}

impl Serialize for SkillGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for group in &self.0 {
            map.serialize_entry(&group.category, &group.skills)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SkillGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = SkillGroups;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to skill labels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((category, skills)) = access.next_entry::<String, Vec<String>>()? {
                    groups.push(SkillGroup { category, skills });
                }
                Ok(SkillGroups(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// Body of the service root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSettings {
    pub service_url: String,
    pub api_prefix: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            api_prefix: "/api".to_string(),
        }
    }
}
