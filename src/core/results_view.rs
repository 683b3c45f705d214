//! Text rendering of an [`AnalysisResult`].
//!
//! Everything here is a pure function of the result and the current animation
//! frame; the caller decides when to redraw.

use std::fmt::Write as _;

use super::models::AnalysisResult;
use super::score::{classify, ScoreRing};

pub const NO_MATCHED_SKILLS: &str = "No skills detected";
pub const NO_MISSING_SKILLS: &str = "All common skills covered!";
pub const NO_SUGGESTIONS: &str = "No suggestions available at this time.";

const BAR_WIDTH: usize = 20;
const RING_WIDTH: usize = 20;
const SECTION_COLUMNS: usize = 4;

/// One animation frame of the results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub displayed_score: u8,
    /// Breakdown bars stay empty until the animation has been triggered.
    pub revealed: bool,
}

impl Frame {
    pub fn settled(result: &AnalysisResult) -> Self {
        Self {
            displayed_score: result.ats_score,
            revealed: true,
        }
    }
}

pub fn render_results(result: &AnalysisResult, frame: Frame) -> String {
    let mut out = String::new();
    let info = classify(result.ats_score);

    let _ = writeln!(out, "Your ATS Analysis");
    let _ = writeln!(out, "=================");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} ATS Score: {}/100 ({})",
        info.icon,
        result.ats_score,
        info.tier.color()
    );
    let _ = writeln!(out, "   {}", info.message);
    let _ = writeln!(out);
    let _ = writeln!(out, "   {}", ScoreRing::new(frame.displayed_score).gauge(RING_WIDTH));
    let _ = writeln!(out);

    for (label, value) in result.score_breakdown.categories() {
        let shown = if frame.revealed { value } else { 0 };
        let _ = writeln!(out, "   {label:<22}{} {value:>3}%", bar(shown, BAR_WIDTH));
    }
    let _ = writeln!(out);

    write_chips(
        &mut out,
        "Matched Skills",
        &result.matched_skills,
        NO_MATCHED_SKILLS,
    );
    write_chips(
        &mut out,
        "Missing Skills",
        &result.missing_skills,
        NO_MISSING_SKILLS,
    );

    let _ = writeln!(out, "AI-Powered Suggestions");
    if result.suggestions.is_empty() {
        let _ = writeln!(out, "   {NO_SUGGESTIONS}");
    } else {
        for (index, suggestion) in result.suggestions.iter().enumerate() {
            let _ = writeln!(out, "   {}. {suggestion}", index + 1);
        }
    }
    let _ = writeln!(out);

    if !result.sections_detected.is_empty() {
        let _ = writeln!(out, "Resume Sections Detected");
        let cells: Vec<String> = result
            .sections_detected
            .iter()
            .map(|(section, detected)| {
                let mark = if *detected { '✓' } else { '✗' };
                format!("{mark} {}", capitalize(section))
            })
            .collect();
        for row in cells.chunks(SECTION_COLUMNS) {
            let line = row
                .iter()
                .map(|cell| format!("{cell:<18}"))
                .collect::<String>();
            let _ = writeln!(out, "   {}", line.trim_end());
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "[reset] Analyze Another Resume");
    out
}

fn write_chips(out: &mut String, heading: &str, skills: &[String], placeholder: &str) {
    let _ = writeln!(out, "{heading} ({})", skills.len());
    if skills.is_empty() {
        let _ = writeln!(out, "   {placeholder}");
    } else {
        let chips = skills
            .iter()
            .map(|skill| format!("[{skill}]"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "   {chips}");
    }
    let _ = writeln!(out);
}

fn bar(percent: u8, width: usize) -> String {
    let filled = (usize::from(percent.min(100)) * width + 50) / 100;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
