use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::models::{
    AnalysisResult, Breakdown, MatchResult, Recommendations, ScoreDetails, SkillGroups,
};

pub const GAUGE_CIRCUMFERENCE: f64 = 565.48;
pub const SUCCESS_COLOR: &str = "#4caf50";
pub const WARNING_COLOR: &str = "#ff9800";
pub const DANGER_COLOR: &str = "#f44336";

pub const GAUGE_ANIMATION_DELAY: Duration = Duration::from_millis(100);
pub const SCROLL_DELAY: Duration = Duration::from_millis(300);

pub const EXCELLENT_MATCH: &str = "Excellent match! The profile fits this offer very well.";
pub const GOOD_MATCH: &str = "Good match. Meets most of the important requirements.";
pub const MODERATE_MATCH: &str = "Moderate match. Consider strengthening some key areas.";
pub const LOW_MATCH: &str =
    "Low match. This offer requires skills you have not developed yet.";

pub const NO_SKILLS_FOUND: &str = "No technical skill matches were found";
pub const NO_SKILLS_MISSING: &str = "You have all the required skills!";

const SKILLS_WEIGHT: &str = "60%";
const EXPERIENCE_WEIGHT: &str = "30%";
const CONTEXT_WEIGHT: &str = "10%";

static CATEGORY_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("programming_languages", "Programming Languages"),
        ("frameworks_backend", "Backend Frameworks"),
        ("frameworks_frontend", "Frontend Frameworks"),
        ("mobile_development", "Mobile Development"),
        ("databases", "Databases"),
        ("cloud_platforms", "Cloud Platforms"),
        ("devops_tools", "DevOps Tools"),
        ("version_control", "Version Control"),
        ("testing", "Testing"),
        ("data_science_ml", "Data Science/ML"),
        ("other_tools", "Other Tools"),
    ])
});

static WORD_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w").unwrap());

/// Everything the dashboard displays for one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub results_visible: bool,
    pub gauge: ScoreGauge,
    pub breakdown: BreakdownView,
    pub skills: SkillsPanel,
    pub recommendations: RecommendationsView,
    pub effects: Vec<ScheduledEffect>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreGauge {
    pub value_text: String,
    pub stroke_offset: f64,
    pub stroke_color: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownView {
    pub skills: BreakdownBar,
    pub experience: BreakdownBar,
    pub context: BreakdownBar,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownBar {
    pub label: &'static str,
    pub score_text: String,
    /// Bar width in percent.
    pub width: f64,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillsPanel {
    pub found_count: u32,
    pub missing_count: u32,
    pub found: SkillList,
    pub missing: SkillList,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SkillList {
    Empty { message: &'static str },
    Groups { groups: Vec<SkillGroupView> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillGroupView {
    pub label: String,
    pub tags: Vec<SkillTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Found,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillTag {
    pub text: String,
    pub kind: TagKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationsView {
    pub critical: RecommendationGroup,
    pub improvements: RecommendationGroup,
    pub strengths: RecommendationGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecommendationGroup {
    pub visible: bool,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DeferredEffect {
    /// Lets the gauge transition animate from its previous offset.
    SetGaugeOffset(f64),
    ScrollIntoView,
}

/// An effect to apply once `delay` has elapsed since rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduledEffect {
    pub delay: Duration,
    pub effect: DeferredEffect,
}

/// Host side of the results dashboard.
pub trait DashboardSurface {
    fn present(&mut self, result: &AnalysisResult, dashboard: &Dashboard);
    fn apply_effect(&mut self, effect: DeferredEffect);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResultsRenderer;

impl ResultsRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, result: &AnalysisResult) -> Dashboard {
        let match_result = &result.match_result;
        let gauge = render_score(match_result.total_score);

        let effects = vec![
            ScheduledEffect {
                delay: GAUGE_ANIMATION_DELAY,
                effect: DeferredEffect::SetGaugeOffset(gauge.stroke_offset),
            },
            ScheduledEffect {
                delay: SCROLL_DELAY,
                effect: DeferredEffect::ScrollIntoView,
            },
        ];

        Dashboard {
            results_visible: true,
            gauge,
            breakdown: render_breakdown(&match_result.breakdown),
            skills: render_skills(match_result),
            recommendations: render_recommendations(&result.recommendations),
            effects,
        }
    }
}

/// Applies the scheduled effects in delay order, sleeping between them.
pub async fn run_effects<S: DashboardSurface>(surface: &mut S, effects: &[ScheduledEffect]) {
    let mut ordered = effects.to_vec();
    ordered.sort_by_key(|scheduled| scheduled.delay);

    let mut elapsed = Duration::ZERO;
    for scheduled in ordered {
        if scheduled.delay > elapsed {
            tokio::time::sleep(scheduled.delay - elapsed).await;
            elapsed = scheduled.delay;
        }
        surface.apply_effect(scheduled.effect);
    }
}

fn render_score(score: f64) -> ScoreGauge {
    ScoreGauge {
        value_text: format!("{}%", format_number(score)),
        stroke_offset: gauge_offset(score),
        stroke_color: score_color(score),
        description: score_description(score),
    }
}

pub fn gauge_offset(score: f64) -> f64 {
    GAUGE_CIRCUMFERENCE - (score / 100.0) * GAUGE_CIRCUMFERENCE
}

pub fn score_color(score: f64) -> &'static str {
    if score >= 70.0 {
        SUCCESS_COLOR
    } else if score >= 40.0 {
        WARNING_COLOR
    } else {
        DANGER_COLOR
    }
}

pub fn score_description(score: f64) -> &'static str {
    if score >= 80.0 {
        EXCELLENT_MATCH
    } else if score >= 60.0 {
        GOOD_MATCH
    } else if score >= 40.0 {
        MODERATE_MATCH
    } else {
        LOW_MATCH
    }
}

fn render_breakdown(breakdown: &Breakdown) -> BreakdownView {
    let skills = &breakdown.skills;
    let experience = &breakdown.experience;
    let context = &breakdown.context;

    BreakdownView {
        skills: bar(
            "Skills",
            skills.score,
            caption(&skills.details, SKILLS_WEIGHT, |d| {
                format!("Found: {}/{}", d.found, d.required)
            }),
        ),
        experience: bar(
            "Experience",
            experience.score,
            caption(&experience.details, EXPERIENCE_WEIGHT, |d| {
                d.match_level
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .unwrap_or("Evaluated")
                    .to_string()
            }),
        ),
        context: bar(
            "Context",
            context.score,
            caption(&context.details, CONTEXT_WEIGHT, |d| {
                format!("Dominant: {}", d.dominant.as_deref().unwrap_or("Unknown"))
            }),
        ),
    }
}

// A sentence sent in place of the details object is shown as-is.
fn caption<T>(
    details: &ScoreDetails<T>,
    weight: &str,
    describe: impl FnOnce(&T) -> String,
) -> String {
    let text = match details {
        ScoreDetails::Fields(fields) => describe(fields),
        ScoreDetails::Note(note) => note.clone(),
    };
    format!("{text} | Weight: {weight}")
}

fn bar(label: &'static str, score: f64, detail: String) -> BreakdownBar {
    BreakdownBar {
        label,
        score_text: format!("{}%", format_number(score)),
        width: score,
        detail,
    }
}

fn render_skills(match_result: &MatchResult) -> SkillsPanel {
    SkillsPanel {
        found_count: match_result.total_found,
        missing_count: match_result
            .total_required
            .saturating_sub(match_result.total_found),
        found: skill_list(&match_result.skills_found, TagKind::Found, NO_SKILLS_FOUND),
        missing: skill_list(
            &match_result.skills_missing,
            TagKind::Missing,
            NO_SKILLS_MISSING,
        ),
    }
}

fn skill_list(groups: &SkillGroups, kind: TagKind, empty_message: &'static str) -> SkillList {
    if groups.is_empty() {
        return SkillList::Empty {
            message: empty_message,
        };
    }

    SkillList::Groups {
        groups: groups
            .iter()
            .map(|group| SkillGroupView {
                label: format_category_name(&group.category),
                tags: group
                    .skills
                    .iter()
                    .map(|skill| SkillTag {
                        text: skill.clone(),
                        kind,
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn render_recommendations(recommendations: &Recommendations) -> RecommendationsView {
    RecommendationsView {
        critical: recommendation_group(recommendations.critical.as_deref()),
        improvements: recommendation_group(recommendations.improvements.as_deref()),
        strengths: recommendation_group(recommendations.strengths.as_deref()),
    }
}

fn recommendation_group(items: Option<&[String]>) -> RecommendationGroup {
    match items {
        Some(items) if !items.is_empty() => RecommendationGroup {
            visible: true,
            items: items.to_vec(),
        },
        _ => RecommendationGroup::default(),
    }
}

pub fn format_category_name(category: &str) -> String {
    if let Some(label) = CATEGORY_LABELS.get(category) {
        return (*label).to_string();
    }

    let spaced = category.replace('_', " ");
    WORD_START_RE
        .replace_all(&spaced, |caps: &regex::Captures| caps[0].to_uppercase())
        .into_owned()
}

/// Scores print without a trailing ".0" (85.0 -> "85", 72.5 -> "72.5").
pub fn format_number(value: f64) -> String {
    format!("{value}")
}
