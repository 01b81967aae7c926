//! crates/outbreak_core/src/prompt.rs
//!
//! Builds the outbreak-analysis request sent to the text-generation service.
//! The model's answer is never parsed here; callers forward it verbatim.

use crate::aggregator::WindowSummary;

pub const ANALYST_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const OUTBREAK_TEMPLATE: &str = r#"Consider an area (ZIP code {zip}) with a population of {population} where {symptom_summary}.
These counts were collected over {window_note}.
Details about the ZIP code area: {zip_metadata}.

Based on these symptoms, which real-life diseases might be prevalent in this area?
If the number of reported symptoms is not significant compared to the population, report no disease.

Respond with a single JSON object in exactly this shape:
{
  "possibleDiseases": ["common cold", "influenza"],
  "severity": {"common cold": "mild", "influenza": "moderate"},
  "safetyGuidelines": ["<3 sentence safety guideline for each possible disease>"],
  "amountInfected": {"common cold": 14, "influenza": 53},
  "percentageReported": {percentage_reported},
  "populationDensity": "<short description>",
{symptom_fields}
  "zipCode": "{zip}",
  "population": {population},
  "ageDistribution": {"0-18": 5487, "19-35": 9765, "36-60": 16542, "61+": 2894},
  "vaccinationStatus": {"fullyVaccinated": 16234, "partiallyVaccinated": 12456, "notVaccinated": 10032},
  "comorbidities": {"diabetes": 2654, "hypertension": 4762, "respiratoryConditions": 2375}
}
Estimate "ageDistribution", "vaccinationStatus" and "comorbidities" for this population using exactly the keys shown.
Each severity is one of low, mild, moderate, severe, critical.
Every disease in "possibleDiseases" must appear as a key in "severity" and "amountInfected".
If no disease is likely, use ["none"] for "possibleDiseases" and empty objects elsewhere."#;

/// Everything the prompt needs to describe one ZIP code.
#[derive(Debug, Clone)]
pub struct OutbreakContext<'a> {
    pub zip: &'a str,
    pub population: u64,
    pub summary: &'a WindowSummary,
    /// Free-form "HEADER = value" description of the ZIP area.
    pub zip_metadata: &'a str,
}

/// Renders the user message for an outbreak analysis request.
pub fn build_outbreak_prompt(ctx: &OutbreakContext<'_>) -> String {
    let population = ctx.population.to_string();

    let symptom_summary = ctx
        .summary
        .totals
        .iter()
        .map(|(symptom, count)| format!("{} out of {} people have {}", count, population, symptom))
        .collect::<Vec<_>>()
        .join(", ");

    let symptom_fields = ctx
        .summary
        .totals
        .iter()
        .map(|(symptom, count)| format!("  \"{}\": {},", symptom, count))
        .collect::<Vec<_>>()
        .join("\n");

    // Average symptom reports per reporting day, relative to the population.
    let (window_note, percentage_reported) = match ctx.summary.entries_included {
        0 => ("no reporting days: no reports were received recently".to_string(), "0".to_string()),
        days => {
            let per_day = ctx.summary.totals.total() as f64 / days as f64;
            (
                format!("{} reporting day(s)", days),
                format!("{:.4}", per_day / ctx.population.max(1) as f64),
            )
        }
    };

    fill(
        OUTBREAK_TEMPLATE,
        &[
            ("zip", ctx.zip),
            ("population", population.as_str()),
            ("symptom_summary", symptom_summary.as_str()),
            ("window_note", window_note.as_str()),
            ("zip_metadata", ctx.zip_metadata),
            ("percentage_reported", percentage_reported.as_str()),
            ("symptom_fields", symptom_fields.as_str()),
        ],
    )
}

/// Replaces each `{name}` placeholder in one pass. Inserted values are never
/// scanned again, and braces that do not name a placeholder are kept as is.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let placeholder = values.iter().find(|(name, _)| {
            tail[1..]
                .strip_prefix(*name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
