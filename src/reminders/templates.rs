//! Reminder message templates.
//!
//! Templates are plain text with `{name}` placeholders drawn from a closed set.
//! Rendering is a single left-to-right pass: substituted text is never scanned
//! again, and anything in braces that is not a known placeholder is copied
//! through untouched.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::arrangement::Arrangement;
use crate::calendar::format_day_month_year;
use crate::config::{AgentProfile, MessageTemplate, ReminderSettings};
use crate::decimal::Money;
use crate::errors::{ArrangementError, Result};
use crate::instalments::ledger;

const TITLES: [&str; 6] = ["Mr", "Mrs", "Ms", "Miss", "Mx", "Dr"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Greeting,
    RefLine,
    CustomerName,
    Amount,
    Date,
    Time,
    Signature,
    AgentName,
    AgentTitle,
    ContactInfo,
}

impl Placeholder {
    pub const ALL: [Placeholder; 10] = [
        Placeholder::Greeting,
        Placeholder::RefLine,
        Placeholder::CustomerName,
        Placeholder::Amount,
        Placeholder::Date,
        Placeholder::Time,
        Placeholder::Signature,
        Placeholder::AgentName,
        Placeholder::AgentTitle,
        Placeholder::ContactInfo,
    ];

    /// name as written between the braces
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Greeting => "greeting",
            Placeholder::RefLine => "refLine",
            Placeholder::CustomerName => "customerName",
            Placeholder::Amount => "amount",
            Placeholder::Date => "date",
            Placeholder::Time => "time",
            Placeholder::Signature => "signature",
            Placeholder::AgentName => "agentName",
            Placeholder::AgentTitle => "agentTitle",
            Placeholder::ContactInfo => "contactInfo",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }
}

/// the values a template is rendered against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub customer_name: Option<String>,
    pub case_reference: Option<String>,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub scheduled_time: Option<String>,
    pub agent: AgentProfile,
}

impl RenderContext {
    /// context for the arrangement's current obligation
    pub fn for_arrangement(arrangement: &Arrangement, agent: &AgentProfile) -> Self {
        Self {
            customer_name: arrangement.customer_name.clone(),
            case_reference: arrangement.case_reference.clone(),
            amount: ledger::current_amount(arrangement),
            due_date: ledger::due_date(arrangement),
            scheduled_time: arrangement.scheduled_time.clone(),
            agent: agent.clone(),
        }
    }

    /// sample data used to preview a template
    pub fn sample(agent: &AgentProfile) -> Self {
        Self {
            customer_name: Some("Mrs Jane Doe".to_string()),
            case_reference: Some("CASE-001".to_string()),
            amount: Money::from_minor(12_500),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or_default(),
            scheduled_time: Some("14:00".to_string()),
            agent: agent.clone(),
        }
    }

    fn value(&self, placeholder: Placeholder) -> String {
        match placeholder {
            Placeholder::Greeting => greeting_for(self.customer_name.as_deref()),
            Placeholder::RefLine => reference_line(self.case_reference.as_deref()),
            Placeholder::CustomerName => self.customer_name.clone().unwrap_or_default(),
            Placeholder::Amount => self.amount.to_string(),
            Placeholder::Date => format_day_month_year(self.due_date),
            Placeholder::Time => time_suffix(self.scheduled_time.as_deref()),
            Placeholder::Signature => self.agent.signature.clone(),
            Placeholder::AgentName => self.agent.name.clone(),
            Placeholder::AgentTitle => self.agent.title.clone(),
            Placeholder::ContactInfo => self.agent.contact_info.clone().unwrap_or_default(),
        }
    }
}

/// brace-delimited tokens in `template`, as (byte start, byte end, name)
fn tokens(template: &str) -> impl Iterator<Item = (usize, usize, &str)> + '_ {
    let mut cursor = 0;
    std::iter::from_fn(move || {
        while let Some(open) = template[cursor..].find('{').map(|i| cursor + i) {
            let rest = &template[open + 1..];
            let close = rest.find(|c| c == '}' || c == '{').map(|i| open + 1 + i)?;
            if template[close..].starts_with('}') {
                cursor = close + 1;
                return Some((open, close + 1, &template[open + 1..close]));
            }
            // nested '{': restart the scan from the inner brace
            cursor = close;
        }
        None
    })
}

/// substitute every known placeholder in one pass
pub fn render(template: &str, context: &RenderContext) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut copied = 0;

    for (start, end, name) in tokens(template) {
        if let Some(placeholder) = Placeholder::from_token(name) {
            out.push_str(&template[copied..start]);
            out.push_str(&context.value(placeholder));
            copied = end;
        }
    }

    out.push_str(&template[copied..]);
    out
}

/// `{names}` in the template that will be left as literal text
pub fn unknown_placeholders(template: &str) -> Vec<String> {
    let mut unknown: Vec<String> = Vec::new();
    for (_, _, name) in tokens(template) {
        let looks_like_placeholder =
            !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if looks_like_placeholder
            && Placeholder::from_token(name).is_none()
            && !unknown.iter().any(|u| u == name)
        {
            unknown.push(name.to_string());
        }
    }
    unknown
}

/// "Dear Mr Smith,\n\n" for a titled name, "Dear <name>,\n\n" otherwise
pub fn greeting_for(customer_name: Option<&str>) -> String {
    let name = customer_name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return String::new();
    }

    let words: Vec<&str> = name.split_whitespace().collect();
    let title = words.first().and_then(|first| {
        let bare = first.trim_end_matches('.');
        TITLES.iter().find(|t| t.eq_ignore_ascii_case(bare))
    });

    match (title, words.last()) {
        (Some(title), Some(surname)) if words.len() > 1 => format!("Dear {} {},\n\n", title, surname),
        _ => format!("Dear {},\n\n", words.join(" ")),
    }
}

pub fn reference_line(case_reference: Option<&str>) -> String {
    match case_reference.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reference) => format!("Ref: {}\n\n", reference),
        None => String::new(),
    }
}

fn time_suffix(time: Option<&str>) -> String {
    match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(time) => format!(" {}", time),
        None => String::new(),
    }
}

/// rendered sample of a template plus any placeholders it misspells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePreview {
    pub body: String,
    pub unknown_placeholders: Vec<String>,
}

pub fn preview(template: &MessageTemplate, agent: &AgentProfile) -> TemplatePreview {
    TemplatePreview {
        body: render(&template.template, &RenderContext::sample(agent)),
        unknown_placeholders: unknown_placeholders(&template.template),
    }
}

/// a message ready for the delivery collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedMessage {
    pub phone_number: String,
    pub template_id: String,
    pub body: String,
}

/// renders the active template for an arrangement
pub struct MessageComposer<'a> {
    settings: &'a ReminderSettings,
}

impl<'a> MessageComposer<'a> {
    pub fn new(settings: &'a ReminderSettings) -> Self {
        Self { settings }
    }

    pub fn compose(&self, arrangement: &Arrangement) -> Result<ComposedMessage> {
        if !self.settings.global_enabled || !self.settings.sms_enabled {
            return Err(ArrangementError::DeliveryDisabled);
        }

        let phone_number = arrangement
            .phone_number
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ArrangementError::validation("the arrangement has no phone number"))?;

        let template = self.settings.message_templates.active();
        let context = RenderContext::for_arrangement(arrangement, &self.settings.agent_profile);

        Ok(ComposedMessage {
            phone_number: phone_number.to_string(),
            template_id: template.id,
            body: render(&template.template, &context),
        })
    }
}

fn builtin(id: &str, name: &str, template: &str) -> MessageTemplate {
    let variables = Placeholder::ALL
        .iter()
        .map(Placeholder::token)
        .filter(|token| template.contains(&format!("{{{}}}", token)))
        .map(str::to_string)
        .collect();

    MessageTemplate {
        id: id.to_string(),
        name: name.to_string(),
        template: template.to_string(),
        variables,
    }
}

/// the built-in template set
pub fn default_templates() -> Vec<MessageTemplate> {
    vec![
        builtin(
            "standard",
            "Standard reminder",
            "{greeting}{refLine}This is a reminder that your payment of £{amount} is due on {date}{time}.\n\n{signature}",
        ),
        builtin(
            "friendly",
            "Friendly reminder",
            "{greeting}Just a quick note that £{amount} is due on {date}{time}. Thank you for keeping to the arrangement.\n\n{agentName}",
        ),
        builtin(
            "formal",
            "Formal notice",
            "{greeting}{refLine}Under the agreed arrangement a payment of £{amount} falls due on {date}{time}. Please ensure funds are available.\n\n{signature}\n{contactInfo}",
        ),
    ]
}
