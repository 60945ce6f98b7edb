//! render_json.rs: report JSON renderer.
//!
//! Key order follows struct layout; the output is compact and newline-terminated.

use serde_json::{json, Value};

use crate::{PlanView, ReportError, VoteResults};

/// Results alone.
pub fn render_results_json(results: &VoteResults) -> Result<String, ReportError> {
    finish(serde_json::to_value(results))
}

/// Plan alone.
pub fn render_plan_json(plan: &PlanView) -> Result<String, ReportError> {
    finish(serde_json::to_value(plan))
}

/// `{ "results": ..., "plan": ... }`; `plan` is omitted when absent.
pub fn render_report_json(results: &VoteResults, plan: Option<&PlanView>) -> Result<String, ReportError> {
    let results = serde_json::to_value(results).map_err(|e| ReportError::Serialize(e.to_string()))?;
    let mut root = json!({ "results": results });
    if let (Some(p), Value::Object(map)) = (plan, &mut root) {
        let p = serde_json::to_value(p).map_err(|e| ReportError::Serialize(e.to_string()))?;
        map.insert("plan".into(), p);
    }
    finish(Ok(root))
}

fn finish(v: serde_json::Result<Value>) -> Result<String, ReportError> {
    let v = v.map_err(|e| ReportError::Serialize(e.to_string()))?;
    let mut s = serde_json::to_string(&v).map_err(|e| ReportError::Serialize(e.to_string()))?;
    s.push('\n');
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CategoryResults, PlanDay, ResultRow};
    use assert_json_diff::assert_json_eq;

    fn results() -> VoteResults {
        VoteResults {
            total_ballots: 3,
            categories: vec![CategoryResults {
                category: "meat",
                title: "Meat Options",
                rows: vec![ResultRow {
                    id: "burger_combo".into(),
                    name: "Burger Combo".into(),
                    display_name: "Burger".into(),
                    votes: 3,
                }],
            }],
        }
    }

    #[test]
    fn results_use_camel_case() {
        let s = render_results_json(&results()).unwrap();
        assert!(s.ends_with('\n'));
        let v: Value = serde_json::from_str(&s).unwrap();
        assert_json_eq!(
            v,
            json!({
                "totalBallots": 3,
                "categories": [{
                    "category": "meat",
                    "title": "Meat Options",
                    "rows": [{"id": "burger_combo", "name": "Burger Combo", "displayName": "Burger", "votes": 3}]
                }]
            })
        );
    }

    #[test]
    fn report_includes_plan_when_given() {
        let plan = PlanView {
            days: vec![PlanDay { day: "Friday", meal: "Leftovers".into(), planned: false }],
            generated_at: None,
        };
        let with: Value = serde_json::from_str(&render_report_json(&results(), Some(&plan)).unwrap()).unwrap();
        let without: Value = serde_json::from_str(&render_report_json(&results(), None).unwrap()).unwrap();
        assert_eq!(with["plan"]["days"][0]["meal"], "Leftovers");
        assert!(without.get("plan").is_none());
    }
}
