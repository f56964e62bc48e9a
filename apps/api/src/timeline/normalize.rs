//! Loose-to-strict coercion for generator payloads.
//!
//! The plan generator speaks prompt-shaped JSON, not a schema: list fields
//! arrive as arrays, comma strings, or bulleted text; durations as day
//! counts, week counts, or strings like "2 weeks". Everything in this module
//! is total. Malformed fields degrade to defaults instead of erroring, so a
//! sloppy payload still yields a usable plan.

use serde_json::Value;

use crate::models::plan::Phase;

/// Average weeks per month used for the plan-length estimate.
pub const WEEKS_PER_MONTH: f64 = 4.33;

/// Markers stripped from the front of list items ("- Python", "• SQL").
const BULLET_MARKERS: &[char] = &['-', '•', '–', '—', '*', '▸', '→', '✓', '✔'];

/// Keys checked, in order, for the phase array in a generator payload.
const PHASE_LIST_KEYS: &[&str] = &["plan", "timeline"];

/// Keys checked, in order, for the Mermaid chart text.
const MERMAID_KEYS: &[&str] = &["mermaid_code", "mermaid_chart", "mermaid"];

// ────────────────────────────────────────────────────────────────────────────
// List normalizer
// ────────────────────────────────────────────────────────────────────────────

/// Coerces any JSON value into a clean list of strings.
///
/// Falsy inputs (null, "", 0, false) yield an empty list; the `0 → []` case
/// is inherited wire behavior and intentional. Arrays keep their order with
/// each element stringified and trimmed. A single string is split on line
/// breaks, or on commas when only one non-empty line remains, with leading
/// bullet markers stripped from each piece.
pub fn normalize_list(value: &Value) -> Vec<String> {
    if !is_truthy(value) {
        return Vec::new();
    }

    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| stringify(item).trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        Value::String(text) => split_text_list(text),
        other => {
            let item = stringify(other).trim().to_string();
            if item.is_empty() {
                Vec::new()
            } else {
                vec![item]
            }
        }
    }
}

/// JavaScript-style truthiness over JSON values.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of a JSON value: strings verbatim, scalars via their JSON
/// text, null as empty (so it drops out of lists).
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn split_text_list(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    // A single line is treated as a comma-separated list.
    let pieces: Vec<&str> = if lines.len() == 1 {
        lines[0].split(',').collect()
    } else {
        lines
    };

    pieces
        .into_iter()
        .map(strip_bullet)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(piece: &str) -> &str {
    piece
        .trim_start_matches(|c: char| c.is_whitespace() || BULLET_MARKERS.contains(&c))
        .trim_end()
}

// ────────────────────────────────────────────────────────────────────────────
// Phase normalizer
// ────────────────────────────────────────────────────────────────────────────

/// Coerces one raw phase object into a strict [`Phase`].
///
/// Field lookups are precedence tables: the first present, usable key wins.
/// `position` is the phase's index in the payload array and is authoritative
/// for `order`; any `order` key in the raw object is ignored.
pub fn normalize_phase(raw: &Value, position: usize) -> Phase {
    let title = first_string(raw, &["title", "name"])
        .unwrap_or_else(|| format!("Phase {}", position + 1));
    let description = first_string(raw, &["description", "details"]).unwrap_or_default();

    let duration_days = resolve_duration_days(raw);
    let duration_weeks = match duration_days {
        Some(days) => Some((days / 7.0).round()),
        None => numeric_field(raw, "duration_weeks"),
    };

    Phase {
        title,
        description,
        duration_days,
        duration_weeks,
        order: (position + 1) as i64,
        completed: raw.get("completed").map(is_truthy).unwrap_or(false),
        completed_at: None,
        skills: list_field(raw, &["skills", "skill_list"]),
        projects: list_field(raw, &["projects", "project_list"]),
        milestones: list_field(raw, &["milestones", "milestone_list"]),
    }
}

/// First non-empty string under any of `keys`.
fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        raw.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn list_field(raw: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| raw.get(key))
        .find(|v| is_truthy(v))
        .map(normalize_list)
        .unwrap_or_default()
}

/// Numbers pass through; numeric strings parse; anything else is absent.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn numeric_field(raw: &Value, key: &str) -> Option<f64> {
    raw.get(key).and_then(coerce_number)
}

/// Duration precedence: explicit day count, then week count times seven,
/// then a "<int> weeks" style string under `duration`.
fn resolve_duration_days(raw: &Value) -> Option<f64> {
    if let Some(days) = numeric_field(raw, "duration_days") {
        return Some(days);
    }
    if let Some(weeks) = numeric_field(raw, "duration_weeks") {
        return Some(weeks * 7.0);
    }
    raw.get("duration")
        .and_then(Value::as_str)
        .and_then(parse_duration_text)
}

/// Accepts "<int> weeks", "<int>week", "<int> wk", "<int>w" (any case,
/// optional space) and returns the day count.
fn parse_duration_text(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    let digits_end = text.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let (number, unit) = text.split_at(digits_end);
    let weeks: f64 = number.parse().ok()?;
    matches!(unit.trim_start(), "weeks" | "week" | "wk" | "w").then_some(weeks * 7.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Payload helpers
// ────────────────────────────────────────────────────────────────────────────

/// Pulls the phase array out of a generator payload and normalizes it.
/// A payload without a usable array yields an empty plan, not an error.
pub fn extract_phases(payload: &Value) -> Vec<Phase> {
    PHASE_LIST_KEYS
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(position, item)| normalize_phase(item, position))
                .collect()
        })
        .unwrap_or_default()
}

pub fn extract_mermaid(payload: &Value) -> Option<String> {
    MERMAID_KEYS
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Rounded month estimate from the phases' week totals, falling back to the
/// requested timeframe when the plan came back empty.
pub fn approx_months(phases: &[Phase], timeframe_months: i64) -> i64 {
    if phases.is_empty() {
        return timeframe_months;
    }
    let total_weeks: f64 = phases.iter().map(|p| p.duration_weeks.unwrap_or(0.0)).sum();
    (total_weeks / WEEKS_PER_MONTH).round() as i64
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── list normalizer ──

    #[test]
    fn test_comma_string_splits_into_items() {
        assert_eq!(
            normalize_list(&json!("Python, SQL, Docker")),
            vec!["Python", "SQL", "Docker"]
        );
    }

    #[test]
    fn test_bulleted_lines_split_and_strip_markers() {
        assert_eq!(
            normalize_list(&json!("- Python\n- SQL")),
            vec!["Python", "SQL"]
        );
    }

    #[test]
    fn test_mixed_bullet_markers() {
        assert_eq!(
            normalize_list(&json!("• Rust\n→ Go\n✓ C")),
            vec!["Rust", "Go", "C"]
        );
    }

    #[test]
    fn test_multiline_input_does_not_comma_split() {
        assert_eq!(
            normalize_list(&json!("Python, SQL\nDocker")),
            vec!["Python, SQL", "Docker"]
        );
    }

    #[test]
    fn test_single_plain_string() {
        assert_eq!(normalize_list(&json!("Kubernetes")), vec!["Kubernetes"]);
    }

    #[test]
    fn test_falsy_inputs_yield_empty() {
        assert!(normalize_list(&json!(null)).is_empty());
        assert!(normalize_list(&json!("")).is_empty());
        assert!(normalize_list(&json!(0)).is_empty());
        assert!(normalize_list(&json!(false)).is_empty());
    }

    #[test]
    fn test_array_elements_stringified_and_trimmed() {
        assert_eq!(
            normalize_list(&json!(["  Python  ", 5, true, "", null])),
            vec!["Python", "5", "true"]
        );
    }

    #[test]
    fn test_array_order_preserved() {
        assert_eq!(
            normalize_list(&json!(["c", "a", "b"])),
            vec!["c", "a", "b"]
        );
    }

    #[test]
    fn test_scalar_number_becomes_single_item() {
        assert_eq!(normalize_list(&json!(42)), vec!["42"]);
    }

    #[test]
    fn test_object_becomes_its_json_text() {
        assert_eq!(normalize_list(&json!({"a": 1})), vec![r#"{"a":1}"#]);
    }

    #[test]
    fn test_normalize_list_is_idempotent() {
        let inputs = [
            json!("Python, SQL, Docker"),
            json!("- Python\n- SQL"),
            json!(["a", " b ", "c"]),
        ];
        for input in inputs {
            let once = normalize_list(&input);
            let twice = normalize_list(&json!(once));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_hyphenated_words_survive() {
        assert_eq!(
            normalize_list(&json!("well-known, state-of-the-art")),
            vec!["well-known", "state-of-the-art"]
        );
    }

    // ── phase normalizer ──

    #[test]
    fn test_full_phase_normalizes() {
        let raw = json!({
            "title": "Foundations",
            "description": "Core concepts",
            "duration_days": 10,
            "skills": "Python, SQL",
            "projects": ["CLI tool"],
            "milestones": "- Ship v1"
        });
        let phase = normalize_phase(&raw, 0);
        assert_eq!(phase.title, "Foundations");
        assert_eq!(phase.description, "Core concepts");
        assert_eq!(phase.duration_days, Some(10.0));
        assert_eq!(phase.duration_weeks, Some(1.0));
        assert_eq!(phase.order, 1);
        assert!(!phase.completed);
        assert!(phase.completed_at.is_none());
        assert_eq!(phase.skills, vec!["Python", "SQL"]);
        assert_eq!(phase.projects, vec!["CLI tool"]);
        assert_eq!(phase.milestones, vec!["Ship v1"]);
    }

    #[test]
    fn test_empty_phase_gets_positional_title() {
        let phase = normalize_phase(&json!({}), 2);
        assert_eq!(phase.title, "Phase 3");
        assert_eq!(phase.description, "");
        assert_eq!(phase.order, 3);
        assert!(phase.duration_days.is_none());
        assert!(phase.duration_weeks.is_none());
        assert!(phase.skills.is_empty());
    }

    #[test]
    fn test_title_falls_back_to_name() {
        let phase = normalize_phase(&json!({"name": "Ramp up"}), 0);
        assert_eq!(phase.title, "Ramp up");
    }

    #[test]
    fn test_title_key_outranks_name_key() {
        let phase = normalize_phase(&json!({"title": "A", "name": "B"}), 0);
        assert_eq!(phase.title, "A");
    }

    #[test]
    fn test_description_falls_back_to_details() {
        let phase = normalize_phase(&json!({"details": "Deep dive"}), 0);
        assert_eq!(phase.description, "Deep dive");
    }

    #[test]
    fn test_duration_days_outranks_duration_weeks() {
        let phase = normalize_phase(&json!({"duration_days": 10, "duration_weeks": 99}), 0);
        assert_eq!(phase.duration_days, Some(10.0));
        assert_eq!(phase.duration_weeks, Some(1.0));
    }

    #[test]
    fn test_duration_weeks_expands_to_days() {
        let phase = normalize_phase(&json!({"duration_weeks": 2}), 0);
        assert_eq!(phase.duration_days, Some(14.0));
        assert_eq!(phase.duration_weeks, Some(2.0));
    }

    #[test]
    fn test_duration_text_two_weeks() {
        let phase = normalize_phase(&json!({"duration": "2 weeks"}), 0);
        assert_eq!(phase.duration_days, Some(14.0));
        assert_eq!(phase.duration_weeks, Some(2.0));
    }

    #[test]
    fn test_duration_text_compact_forms() {
        assert_eq!(parse_duration_text("3w"), Some(21.0));
        assert_eq!(parse_duration_text("4 WK"), Some(28.0));
        assert_eq!(parse_duration_text("1 week"), Some(7.0));
    }

    #[test]
    fn test_duration_text_rejects_other_units() {
        assert_eq!(parse_duration_text("14 days"), None);
        assert_eq!(parse_duration_text("weeks"), None);
        assert_eq!(parse_duration_text("3"), None);
        assert_eq!(parse_duration_text(""), None);
    }

    #[test]
    fn test_numeric_strings_coerce() {
        let phase = normalize_phase(&json!({"duration_days": "21"}), 0);
        assert_eq!(phase.duration_days, Some(21.0));
        assert_eq!(phase.duration_weeks, Some(3.0));
    }

    #[test]
    fn test_unparseable_duration_string_degrades() {
        let phase = normalize_phase(&json!({"duration_days": "soon", "duration_weeks": 2}), 0);
        // The junk day count falls through to the week rule.
        assert_eq!(phase.duration_days, Some(14.0));
        assert_eq!(phase.duration_weeks, Some(2.0));
    }

    #[test]
    fn test_fractional_weeks_round_half_up() {
        let phase = normalize_phase(&json!({"duration_days": 17.5}), 0);
        assert_eq!(phase.duration_weeks, Some(3.0));
    }

    #[test]
    fn test_order_ignores_raw_order_key() {
        let phase = normalize_phase(&json!({"order": 99}), 4);
        assert_eq!(phase.order, 5);
    }

    #[test]
    fn test_completed_coerces_truthiness() {
        assert!(normalize_phase(&json!({"completed": true}), 0).completed);
        assert!(normalize_phase(&json!({"completed": "yes"}), 0).completed);
        assert!(normalize_phase(&json!({"completed": 1}), 0).completed);
        assert!(!normalize_phase(&json!({"completed": 0}), 0).completed);
        assert!(!normalize_phase(&json!({"completed": false}), 0).completed);
        assert!(!normalize_phase(&json!({}), 0).completed);
    }

    #[test]
    fn test_skill_list_alias() {
        let phase = normalize_phase(&json!({"skill_list": "Go, Rust"}), 0);
        assert_eq!(phase.skills, vec!["Go", "Rust"]);
    }

    // ── payload helpers ──

    #[test]
    fn test_extract_phases_orders_are_dense() {
        let payload = json!({"plan": [{}, {}, {}, {}]});
        let phases = extract_phases(&payload);
        let orders: Vec<i64> = phases.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_extract_phases_timeline_key() {
        let payload = json!({"timeline": [{"title": "Start"}]});
        let phases = extract_phases(&payload);
        assert_eq!(phases.len(), 1);
        assert_eq!(phases[0].title, "Start");
    }

    #[test]
    fn test_extract_phases_skips_non_array_plan() {
        let payload = json!({"plan": "not a list", "timeline": [{}]});
        assert_eq!(extract_phases(&payload).len(), 1);
    }

    #[test]
    fn test_extract_phases_missing_yields_empty() {
        assert!(extract_phases(&json!({"advice": "study"})).is_empty());
    }

    #[test]
    fn test_extract_mermaid_precedence() {
        let payload = json!({"mermaid_chart": "graph LR", "mermaid": "x"});
        assert_eq!(extract_mermaid(&payload).as_deref(), Some("graph LR"));
        let payload = json!({"mermaid_code": "graph TD", "mermaid_chart": "y"});
        assert_eq!(extract_mermaid(&payload).as_deref(), Some("graph TD"));
        assert_eq!(extract_mermaid(&json!({})), None);
    }

    // ── summary metrics ──

    fn phase_with_weeks(weeks: f64, order: i64) -> Phase {
        Phase {
            title: format!("Phase {order}"),
            description: String::new(),
            duration_days: Some(weeks * 7.0),
            duration_weeks: Some(weeks),
            order,
            completed: false,
            completed_at: None,
            skills: vec![],
            projects: vec![],
            milestones: vec![],
        }
    }

    #[test]
    fn test_approx_months_rounds_week_total() {
        // 13 weeks / 4.33 ≈ 3.002 → 3
        let phases = vec![phase_with_weeks(6.0, 1), phase_with_weeks(7.0, 2)];
        assert_eq!(approx_months(&phases, 12), 3);
    }

    #[test]
    fn test_approx_months_counts_missing_weeks_as_zero() {
        let mut phases = vec![phase_with_weeks(9.0, 1)];
        phases.push(Phase {
            duration_weeks: None,
            ..phase_with_weeks(0.0, 2)
        });
        assert_eq!(approx_months(&phases, 12), 2);
    }

    #[test]
    fn test_approx_months_empty_plan_falls_back_to_timeframe() {
        assert_eq!(approx_months(&[], 12), 12);
    }
}
