//! HTML fragment for the campaign email body.

use crate::campaign::CampaignRow;

/// Body sent when no campaign was created on the report day.
pub const NO_CAMPAIGNS_HTML: &str = "<p>No campaigns created today.</p>";

const TABLE_OPEN: &str = concat!(
    "<h2>Campaign Report for Today</h2>\n",
    "<table border=\"1\" cellpadding=\"5\" cellspacing=\"0\" ",
    "style=\"border-collapse: collapse; font-family: Arial, sans-serif;\">\n",
    "  <thead>\n",
    "    <tr style=\"background-color: #f2f2f2;\">\n",
    "      <th>Name</th>\n",
    "      <th>Status</th>\n",
    "      <th>Created At (UTC)</th>\n",
    "    </tr>\n",
    "  </thead>\n",
    "  <tbody>\n",
);

const TABLE_CLOSE: &str = "  </tbody>\n</table>\n";

/// Renders campaign rows as an HTML table. Cell text is escaped.
pub fn campaign_html(rows: &[CampaignRow]) -> String {
    if rows.is_empty() {
        return NO_CAMPAIGNS_HTML.to_string();
    }
    let mut html = String::from(TABLE_OPEN);
    for row in rows {
        html.push_str("    <tr>\n");
        for cell in [&row.name, &row.status, &row.created_at] {
            html.push_str("      <td>");
            html.push_str(&escape(cell));
            html.push_str("</td>\n");
        }
        html.push_str("    </tr>\n");
    }
    html.push_str(TABLE_CLOSE);
    html
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
