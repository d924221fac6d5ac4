//! Serialization of a [`StructuredDocument`] into the compact markup handed to
//! the language model.
//!
//! Text is written verbatim. Budget estimates are calibrated against this exact
//! output, so any change to the layout changes every downstream unit count.

use super::document::{DataTable, GrowthTable, Section, StructuredDocument};

impl StructuredDocument {
    pub fn render(&self) -> String {
        let mut out = String::from("<html><body>");

        if let Some(title) = &self.title {
            push_wrapped(&mut out, "h1", title);
        }

        if let Some(ratios) = &self.key_ratios {
            out.push_str("<h2>Key Ratios</h2><ul>");
            for ratio in ratios {
                out.push_str("<li>");
                out.push_str(&ratio.name);
                out.push_str(": ");
                out.push_str(&ratio.value);
                out.push_str("</li>");
            }
            out.push_str("</ul>");
        }

        if let Some(about) = &self.about {
            out.push_str("<h2>About</h2>");
            push_wrapped(&mut out, "p", about);
        }

        if self.pros.is_some() || self.cons.is_some() {
            out.push_str("<h2>Analysis</h2>");
            if let Some(pros) = &self.pros {
                push_list(&mut out, "Pros", pros);
            }
            if let Some(cons) = &self.cons {
                push_list(&mut out, "Cons", cons);
            }
        }

        for section in &self.sections {
            render_section(&mut out, section);
        }

        out.push_str("</body></html>");
        out
    }
}

fn render_section(out: &mut String, section: &Section) {
    if let Some(title) = &section.title {
        push_wrapped(out, "h2", title);
    }

    for table in &section.tables {
        render_data_table(out, table);
    }

    if !section.growth_tables.is_empty() {
        out.push_str("<h3>Growth Metrics</h3>");
        for table in &section.growth_tables {
            render_growth_table(out, table);
        }
    }
}

fn render_data_table(out: &mut String, table: &DataTable) {
    out.push_str("<table>");
    if let Some(headers) = &table.headers {
        out.push_str("<thead><tr>");
        for header in headers {
            push_wrapped(out, "th", header);
        }
        out.push_str("</tr></thead>");

        if let Some(rows) = &table.rows {
            out.push_str("<tbody>");
            for row in rows {
                out.push_str("<tr>");
                for cell in row {
                    push_wrapped(out, "td", cell);
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody>");
        }
    }
    out.push_str("</table>");
}

fn render_growth_table(out: &mut String, table: &GrowthTable) {
    out.push_str("<table>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            push_wrapped(out, "td", cell);
        }
        out.push_str("</tr>");
    }
    out.push_str("</table>");
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    push_wrapped(out, "h3", heading);
    out.push_str("<ul>");
    for item in items {
        push_wrapped(out, "li", item);
    }
    out.push_str("</ul>");
}

fn push_wrapped(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(text);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
