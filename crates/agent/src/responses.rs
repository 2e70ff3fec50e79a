//! Canned agent replies. Nothing here is generated; every string is fixed text
//! with at most a few substitutions.

use salesdesk_core::domain::customer::CustomerRequirements;
use salesdesk_core::domain::product::ServerProduct;
use salesdesk_core::domain::quote::Quote;

pub const GREETING: &str = "Hi there! I'm your HPE server advisor. Tell me a little about what you're \
looking for and I'll help you find the right ProLiant configuration.";

pub const LEAD_PROMPT: &str = "Great! I'd love to help you find the right server solution. First, let \
me collect some basic information so I can provide personalized recommendations.";

pub const LEAD_REPROMPT: &str =
    "Please fill in your name, company and email in the form so I can tailor my recommendations.";

pub const APPROVAL_ACK: &str = "Excellent choice! Let me generate a customized quote for you right away.";

pub const ESCALATION: &str = "I'm connecting you with our sales support team. Please hold on while I \
transfer your conversation...";

pub const QUOTE_IN_PROGRESS: &str =
    "Your quote is being prepared now. It will be ready in just a moment.";

pub const COMPLETED: &str = "Your quote has already been delivered. Start a new chat if you'd like to \
explore another configuration.";

pub fn lead_acknowledgement(name: &str) -> String {
    format!(
        "Thanks {name}! Now, let's talk about your server requirements. What type of workloads are you \
planning to run?"
    )
}

/// `$16,330` style: whole units with thousands separators.
pub fn format_price(amount: i64) -> String {
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

pub fn recommendation_summary(products: &[ServerProduct], requirements: &CustomerRequirements) -> String {
    let mut reply = String::from("Based on your requirements, I recommend these HPE ProLiant servers:\n");
    for product in products {
        reply.push_str(&format!(
            "\n- **{}**: {} (starting at {})",
            product.model,
            product.description,
            format_price(product.base_price())
        ));
    }
    if let Some(question) = requirements.follow_up_questions.first() {
        reply.push_str(&format!("\n\n{question}"));
    }
    reply.push_str("\n\nWould you like me to generate a quote for these servers?");
    reply
}

pub fn follow_up_answer(products: &[ServerProduct]) -> String {
    let models: Vec<&str> = products.iter().map(|product| product.model.as_str()).collect();
    if models.is_empty() {
        return "Happy to help with any questions. Say \"generate quote\" when you're ready.".to_string();
    }
    format!(
        "Good question. The {} can be tailored with additional memory, storage and networking options. \
Say \"generate quote\" whenever you're ready to proceed.",
        models.join(" and ")
    )
}

pub fn quote_delivery(quote: &Quote) -> String {
    format!(
        "Your quote {} has been generated and will be sent to your email shortly. Total: {}. I've also \
assigned you to {}, one of our senior account executives, who will follow up within 24 hours.",
        quote.id,
        format_price(quote.pricing.total),
        quote.assigned_ae.name
    )
}

#[cfg(test)]
mod tests {
    use salesdesk_core::cpq::catalog::Catalog;
    use salesdesk_core::domain::customer::CustomerRequirements;

    use super::{format_price, recommendation_summary};

    #[test]
    fn prices_use_thousands_separators() {
        assert_eq!(format_price(16_330), "$16,330");
        assert_eq!(format_price(1_450), "$1,450");
        assert_eq!(format_price(999), "$999");
        assert_eq!(format_price(1_234_567), "$1,234,567");
        assert_eq!(format_price(0), "$0");
    }

    #[test]
    fn recommendation_summary_lists_each_product() {
        let catalog = Catalog::builtin().expect("catalog");
        let summary = recommendation_summary(&catalog.products()[..2], &CustomerRequirements::default());

        assert!(summary.contains("HPE ProLiant DL380 Gen11"));
        assert!(summary.contains("$8,400"));
        assert!(summary.ends_with("generate a quote for these servers?"));
    }
}
