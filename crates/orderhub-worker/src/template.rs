//! Message template renderer.
//!
//! Templates use `{{name}}` placeholders. A line containing a placeholder
//! whose value is empty or missing is removed entirely, so optional fields
//! (comment, address for pickup orders) leave no dangling label. [`render`]
//! HTML-escapes values (`&`, `<`, `>`); markup in the template itself is
//! trusted. [`render_raw`] substitutes values verbatim for plain-text messages.
//! Rendering is pure: the same template and values always give the same bytes.

use std::collections::BTreeMap;

/// Sent when a template renders to nothing.
pub const DEFAULT_MESSAGE: &str = "New notification";

/// Built-in template for `new_order` alerts.
pub const DEFAULT_NEW_ORDER_TEMPLATE: &str = "\
<b>🆕 New order #{{order_number}}</b>
City: {{city}}
Branch: {{branch}}
Customer: {{customer_name}}
Phone: {{customer_phone}}
Type: {{delivery_type}}
Address: {{delivery_address}}
Payment: {{payment_method}}

{{items}}

Bonus used: {{bonus_used}}
Total: <b>{{total}}</b>
Comment: {{comment}}";

/// Built-in template for `status_change` alerts.
pub const DEFAULT_STATUS_CHANGE_TEMPLATE: &str = "\
<b>Order #{{order_number}}</b>
Previous status: {{old_status_label}}
Status: <b>{{status_label}}</b>
City: {{city}}
Customer: {{customer_name}}";

/// Render `template` with `values`, HTML-escaping each value.
pub fn render(template: &str, values: &BTreeMap<String, String>) -> String {
    render_with(template, values, true)
}

/// Render `template` with `values` inserted as-is.
pub fn render_raw(template: &str, values: &BTreeMap<String, String>) -> String {
    render_with(template, values, false)
}

fn render_with(template: &str, values: &BTreeMap<String, String>, escape: bool) -> String {
    let normalized = template.replace("\r\n", "\n");

    let kept: Vec<String> = normalized
        .split('\n')
        .filter(|line| {
            !tokens(line)
                .iter()
                .any(|t| is_blank(values.get(t.key).map(String::as_str)))
        })
        .map(|line| substitute(line, values, escape).trim_end().to_string())
        .collect();

    let text = collapse_blank_lines(&kept.join("\n"));
    let text = text.trim();
    if text.is_empty() {
        DEFAULT_MESSAGE.to_string()
    } else {
        text.to_string()
    }
}

/// Render a configured template, falling back to `default` when none is set.
pub fn render_or_default(
    configured: Option<&str>,
    default: &str,
    values: &BTreeMap<String, String>,
) -> String {
    let template = configured.filter(|t| !t.trim().is_empty()).unwrap_or(default);
    render(template, values)
}

/// Escape the characters Telegram's HTML mode treats as markup.
fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

struct Token<'a> {
    start: usize,
    end: usize,
    key: &'a str,
}

/// Placeholder tokens in one line. `{{ name }}` is accepted; anything that is
/// not an identifier stays literal text.
fn tokens(line: &str) -> Vec<Token<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some(open) = line[cursor..].find("{{") {
        let start = cursor + open;
        let Some(close) = line[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + close + 2;
        let key = line[start + 2..end - 2].trim();
        if !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            found.push(Token { start, end, key });
            cursor = end;
        } else {
            cursor = start + 2;
        }
    }
    found
}

fn substitute(line: &str, values: &BTreeMap<String, String>, escape: bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for token in tokens(line) {
        out.push_str(&line[last..token.start]);
        match values.get(token.key) {
            Some(value) if escape => out.push_str(&escape_html(value)),
            Some(value) => out.push_str(value),
            None => {}
        }
        last = token.end;
    }
    out.push_str(&line[last..]);
    out
}

/// Collapse runs of three or more newlines to exactly two.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_placeholder_drops_line() {
        let out = render("A: {{a}}\nB: {{b}}\n", &values(&[("a", ""), ("b", "x")]));
        assert_eq!(out, "B: x");
    }

    #[test]
    fn test_values_escaped_once() {
        let vals = values(&[("name", "Ann & <Bob>")]);
        assert_eq!(render("<b>{{name}}</b>", &vals), "<b>Ann &amp; &lt;Bob&gt;</b>");
        assert_eq!(render_raw("Hi {{name}}", &vals), "Hi Ann & <Bob>");
    }

    #[test]
    fn test_missing_placeholder_drops_line() {
        let out = render("Order {{n}}\nComment: {{comment}}", &values(&[("n", "7")]));
        assert_eq!(out, "Order 7");
    }

    #[test]
    fn test_whitespace_value_counts_as_empty() {
        let out = render("A: {{a}}\nB", &values(&[("a", "   ")]));
        assert_eq!(out, "B");
    }

    #[test]
    fn test_values_escaped_template_markup_kept() {
        let out = render(
            "<b>{{name}}</b>",
            &values(&[("name", "Tom & <Jerry>")]),
        );
        assert_eq!(out, "<b>Tom &amp; &lt;Jerry&gt;</b>");
    }

    #[test]
    fn test_quotes_not_escaped() {
        let out = render("{{q}}", &values(&[("q", "\"hi\" 'there'")]));
        assert_eq!(out, "\"hi\" 'there'");
    }

    #[test]
    fn test_newline_collapse() {
        let template = "Top\n\n{{a}}\n\n{{b}}\n\n\n\nBottom";
        let out = render(template, &values(&[]));
        assert_eq!(out, "Top\n\nBottom");
        assert!(!out.contains("\n\n\n"));
    }

    #[test]
    fn test_crlf_normalized() {
        let out = render("A: {{a}}\r\nB: {{b}}\r\n", &values(&[("a", "1"), ("b", "")]));
        assert_eq!(out, "A: 1");
    }

    #[test]
    fn test_empty_result_falls_back() {
        assert_eq!(render("{{a}}", &values(&[])), DEFAULT_MESSAGE);
        assert_eq!(render("   \n\n", &values(&[])), DEFAULT_MESSAGE);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let vals = values(&[("order_number", "A-1"), ("total", "100"), ("comment", "")]);
        let first = render(DEFAULT_NEW_ORDER_TEMPLATE, &vals);
        let second = render(DEFAULT_NEW_ORDER_TEMPLATE, &vals);
        assert_eq!(first, second);
        assert!(!first.contains("Comment"));
    }

    #[test]
    fn test_non_identifier_braces_left_alone() {
        let out = render("{{ not a key }} {{x}}", &values(&[("x", "1")]));
        assert_eq!(out, "{{ not a key }} 1");
    }

    #[test]
    fn test_multiline_value_kept() {
        let out = render("Items:\n{{items}}", &values(&[("items", "• A\n• B")]));
        assert_eq!(out, "Items:\n• A\n• B");
    }

    #[test]
    fn test_configured_template_preferred() {
        let vals = values(&[("n", "5")]);
        assert_eq!(render_or_default(Some("#{{n}}"), "default", &vals), "#5");
        assert_eq!(render_or_default(Some("  "), "D{{n}}", &vals), "D5");
        assert_eq!(render_or_default(None, "D{{n}}", &vals), "D5");
    }
}
