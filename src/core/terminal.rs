use std::fmt::Write as _;
use std::io::{self, Stderr, Stdout, Write};

use super::form::FormView;
use super::models::AnalysisResult;
use super::render::{
    BreakdownBar, Dashboard, DashboardSurface, DeferredEffect, RecommendationGroup, SkillList,
};

const BAR_CELLS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Dashboard,
    Json,
}

/// Terminal implementation of the form and dashboard views.
pub struct TerminalHost<W: Write, E: Write> {
    out: W,
    err: E,
    mode: OutputMode,
    submit_enabled: bool,
    submit_label: String,
    file_info: Option<String>,
}

impl TerminalHost<Stdout, Stderr> {
    pub fn stdio(mode: OutputMode) -> Self {
        Self::new(io::stdout(), io::stderr(), mode)
    }
}

impl<W: Write, E: Write> TerminalHost<W, E> {
    pub fn new(out: W, err: E, mode: OutputMode) -> Self {
        Self {
            out,
            err,
            mode,
            submit_enabled: false,
            submit_label: String::new(),
            file_info: None,
        }
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn submit_label(&self) -> &str {
        &self.submit_label
    }

    pub fn file_info(&self) -> Option<&str> {
        self.file_info.as_deref()
    }

    pub fn into_writers(self) -> (W, E) {
        (self.out, self.err)
    }

    fn write_out(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!(error = %err, "failed to write to terminal");
        }
    }

    fn write_err(&mut self, text: &str) {
        if let Err(err) = self.err.write_all(text.as_bytes()).and_then(|_| self.err.flush()) {
            tracing::warn!(error = %err, "failed to write to terminal");
        }
    }
}

impl<W: Write, E: Write> FormView for TerminalHost<W, E> {
    fn alert(&mut self, message: &str) {
        self.write_err(&format!("{message}\n"));
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn set_submit_label(&mut self, label: &str) {
        tracing::debug!(label, "submit label");
        self.submit_label = label.to_string();
    }

    fn show_file_info(&mut self, text: &str) {
        self.file_info = Some(text.to_string());
        if self.mode == OutputMode::Dashboard {
            self.write_err(&format!("CV: {text}\n"));
        }
    }

    fn set_drop_zone_active(&mut self, _active: bool) {}

    fn open_file_picker(&mut self) {
        self.write_err("Pass the CV with --cv <file.pdf>\n");
    }
}

impl<W: Write, E: Write> DashboardSurface for TerminalHost<W, E> {
    fn present(&mut self, result: &AnalysisResult, dashboard: &Dashboard) {
        let text = match self.mode {
            OutputMode::Dashboard => format_dashboard(dashboard),
            OutputMode::Json => match serde_json::to_string_pretty(result) {
                Ok(json) => format!("{json}\n"),
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize analysis result");
                    return;
                }
            },
        };
        self.write_out(&text);
    }

    fn apply_effect(&mut self, effect: DeferredEffect) {
        // output is already in view; nothing animates
        tracing::trace!(?effect, "deferred effect applied");
    }
}

pub fn format_dashboard(dashboard: &Dashboard) -> String {
    let mut text = String::new();
    let gauge = &dashboard.gauge;

    let _ = writeln!(text, "Compatibility: {}", gauge.value_text);
    let _ = writeln!(text, "{}", gauge.description);
    let _ = writeln!(text);

    let _ = writeln!(text, "Breakdown");
    for bar in [
        &dashboard.breakdown.skills,
        &dashboard.breakdown.experience,
        &dashboard.breakdown.context,
    ] {
        write_bar(&mut text, bar);
    }
    let _ = writeln!(text);

    let skills = &dashboard.skills;
    let _ = writeln!(text, "Skills found ({})", skills.found_count);
    write_skill_list(&mut text, &skills.found);
    let _ = writeln!(text, "Skills missing ({})", skills.missing_count);
    write_skill_list(&mut text, &skills.missing);

    let recommendations = &dashboard.recommendations;
    write_recommendations(&mut text, "Critical", &recommendations.critical);
    write_recommendations(&mut text, "Improvements", &recommendations.improvements);
    write_recommendations(&mut text, "Strengths", &recommendations.strengths);

    text
}

fn write_bar(text: &mut String, bar: &BreakdownBar) {
    let _ = writeln!(
        text,
        "  {:<11}{:>6}  {}  {}",
        bar.label,
        bar.score_text,
        bar_glyphs(bar.width),
        bar.detail
    );
}

fn bar_glyphs(width: f64) -> String {
    let filled = ((width.clamp(0.0, 100.0) / 100.0) * BAR_CELLS as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_CELLS - filled))
}

fn write_skill_list(text: &mut String, list: &SkillList) {
    match list {
        SkillList::Empty { message } => {
            let _ = writeln!(text, "  {message}");
        }
        SkillList::Groups { groups } => {
            for group in groups {
                let tags: Vec<&str> = group.tags.iter().map(|tag| tag.text.as_str()).collect();
                let _ = writeln!(text, "  {}: {}", group.label, tags.join(", "));
            }
        }
    }
}

fn write_recommendations(text: &mut String, title: &str, group: &RecommendationGroup) {
    if !group.visible {
        return;
    }

    let _ = writeln!(text);
    let _ = writeln!(text, "{title}");
    for item in &group.items {
        let _ = writeln!(text, "  - {item}");
    }
}
