use std::collections::HashMap;

use tera::{Context, Tera};

use crate::document::QuoteDocument;
use crate::ExportError;

const QUOTE_TEMPLATE: &str = "quote.html";

/// Register custom Tera filters used by quote templates.
///
/// - `money`: whole currency units with thousands separators, e.g. `16330 | money` -> `$16,330`
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("money", tera_money_filter);
}

fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64))
            .unwrap_or(0),
        tera::Value::Null => 0,
        other => return Err(tera::Error::msg(format!("money filter expects a number, got {other}"))),
    };
    Ok(tera::Value::String(format_money(amount)))
}

/// `$16,330` style.
pub fn format_money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[derive(Clone, Debug)]
pub struct QuoteRenderer {
    tera: Tera,
}

impl QuoteRenderer {
    /// Renderer backed by the template compiled into this crate.
    pub fn embedded() -> Result<Self, ExportError> {
        let mut tera = Tera::default();
        register_template_filters(&mut tera);
        tera.add_raw_template(QUOTE_TEMPLATE, include_str!("../templates/quote.html.tera"))
            .map_err(|error| ExportError::Template(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render_html(&self, document: &QuoteDocument) -> Result<String, ExportError> {
        let mut context = Context::new();
        context.insert("doc", document);
        self.tera
            .render(QUOTE_TEMPLATE, &context)
            .map_err(|error| ExportError::Template(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::format_money;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(format_money(16_330), "$16,330");
        assert_eq!(format_money(100), "$100");
        assert_eq!(format_money(-1_680), "-$1,680");
        assert_eq!(format_money(1_000_000), "$1,000,000");
    }
}
