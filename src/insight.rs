//! Highlight sentences derived from yield stats.
//!
//! Text comes from a fixed per-locale template table; `{code}` and `{rate}`
//! are the only placeholders.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::yields::ProductYieldStat;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ko" | "korean" => Ok(Locale::Ko),
            other => Err(format!("Unsupported locale '{other}' (expected en or ko)")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => f.write_str("en"),
            Locale::Ko => f.write_str("ko"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InsightTemplates {
    pub top_yield: &'static str,
    pub top_defect: &'static str,
}

const ENGLISH: InsightTemplates = InsightTemplates {
    top_yield: "{code} has the highest yield at {rate}%.",
    top_defect: "{code} has the highest defect rate at {rate}%.",
};

const KOREAN: InsightTemplates = InsightTemplates {
    top_yield: "수율이 가장 높은 제품은 {code}({rate}%)입니다.",
    top_defect: "불량률이 가장 높은 제품은 {code}({rate}%)입니다.",
};

impl Locale {
    pub fn templates(&self) -> InsightTemplates {
        match self {
            Locale::En => ENGLISH,
            Locale::Ko => KOREAN,
        }
    }
}

fn fill(template: &str, code: &str, rate: f64) -> String {
    template
        .replace("{code}", code)
        .replace("{rate}", &format!("{rate:.1}"))
}

/// First stat holding the maximal value of `metric`.
fn first_max(stats: &[ProductYieldStat], metric: fn(&ProductYieldStat) -> f64) -> Option<&ProductYieldStat> {
    let mut best: Option<&ProductYieldStat> = None;
    for stat in stats {
        if best.is_none_or(|current| metric(stat) > metric(current)) {
            best = Some(stat);
        }
    }
    best
}

/// Names the top-yield and the top-defect product. Empty input gives an
/// empty string.
pub fn summarize_insights(stats: &[ProductYieldStat], locale: Locale) -> String {
    let templates = locale.templates();
    let mut sentences = Vec::with_capacity(2);
    if let Some(top) = first_max(stats, |s| s.yield_rate) {
        sentences.push(fill(templates.top_yield, &top.product_code, top.yield_rate));
    }
    if let Some(worst) = first_max(stats, |s| s.defect_rate) {
        sentences.push(fill(templates.top_defect, &worst.product_code, worst.defect_rate));
    }
    sentences.join(" ")
}
