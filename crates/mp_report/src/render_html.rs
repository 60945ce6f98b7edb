// crates/mp_report/src/render_html.rs
//
// Deterministic, offline HTML renderer. Section order: plan (when given), then
// one table per category, then the ballot total. Every text field is escaped.

use std::fmt::Write as _;

use crate::{PlanView, VoteResults};

/// Escape text for HTML (minimal, deterministic).
fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

// ------------------------- HTML builder -------------------------

pub struct HtmlBuilder {
    buf: String,
}

impl Default for HtmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlBuilder {
    pub fn new() -> Self {
        Self { buf: String::with_capacity(8 * 1024) }
    }

    /// Start document with a minimal, asset-free head.
    pub fn start(&mut self, title: &str) {
        let _ = write!(
            self.buf,
            "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
             <title>{}</title>\
             <style>\
             body{{font-family:system-ui,sans-serif;margin:24px;}}\
             table{{border-collapse:collapse;margin-bottom:16px}}\
             td,th{{padding:4px 8px;border-bottom:1px solid #ddd;text-align:left}}\
             .leftovers{{opacity:0.6;font-style:italic}}\
             </style></head><body><h1>{}</h1>",
            esc(title),
            esc(title)
        );
    }

    pub fn finish(mut self) -> String {
        self.buf.push_str("</body></html>");
        self.buf
    }

    pub fn section_plan(&mut self, plan: &PlanView) {
        self.buf.push_str("<h2>Weekly Meal Plan</h2><table>");
        for d in &plan.days {
            let class = if d.planned { "" } else { " class=\"leftovers\"" };
            let _ = write!(self.buf, "<tr><th>{}</th><td{}>{}</td></tr>", esc(d.day), class, esc(&d.meal));
        }
        self.buf.push_str("</table>");
        if let Some(at) = &plan.generated_at {
            let _ = write!(self.buf, "<p>Generated {}</p>", esc(at));
        }
    }

    pub fn section_results(&mut self, results: &VoteResults) {
        self.buf.push_str("<h2>Vote Results</h2>");
        for c in &results.categories {
            let _ = write!(self.buf, "<h3>{}</h3>", esc(c.title));
            if c.rows.is_empty() {
                self.buf.push_str("<p>No options offered.</p>");
                continue;
            }
            self.buf.push_str("<table><tr><th>Option</th><th>Votes</th></tr>");
            for r in &c.rows {
                let _ = write!(self.buf, "<tr><td>{}</td><td>{}</td></tr>", esc(&r.display_name), r.votes);
            }
            self.buf.push_str("</table>");
        }
        let _ = write!(self.buf, "<p>Total ballots: {}</p>", results.total_ballots);
    }
}

/// Full page: optional plan, then the results tables.
pub fn render_report_html(results: &VoteResults, plan: Option<&PlanView>) -> String {
    let mut h = HtmlBuilder::new();
    h.start("Menu Planner");
    if let Some(p) = plan {
        h.section_plan(p);
    }
    h.section_results(results);
    h.finish()
}

/// Plan only.
pub fn render_plan_html(plan: &PlanView) -> String {
    let mut h = HtmlBuilder::new();
    h.start("Menu Planner");
    h.section_plan(plan);
    h.finish()
}
