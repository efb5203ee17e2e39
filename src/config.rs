use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::errors::{ArrangementError, Result};
use crate::instalments::SplitRounding;
use crate::reminders::templates::default_templates;

/// engine-wide options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub split_rounding: SplitRounding,
    /// first day of the week used for dashboard week boundaries
    pub week_starts_on: Weekday,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            split_rounding: SplitRounding::Uniform,
            week_starts_on: Weekday::Mon,
        }
    }
}

impl EngineConfig {
    /// plans whose instalments always sum to the exact balance
    pub fn exact_split() -> Self {
        Self {
            split_rounding: SplitRounding::FinalAbsorbsRemainder,
            ..Self::default()
        }
    }
}

/// per-user reminder policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReminderSettings {
    pub global_enabled: bool,
    pub sms_enabled: bool,
    pub customizable_schedule: CustomizableSchedule,
    pub agent_profile: AgentProfile,
    pub message_templates: MessageTemplates,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            global_enabled: true,
            sms_enabled: true,
            customizable_schedule: CustomizableSchedule::default(),
            agent_profile: AgentProfile::default(),
            message_templates: MessageTemplates::default(),
        }
    }
}

/// which days before the due date a reminder fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomizableSchedule {
    pub three_day_reminder: bool,
    pub one_day_reminder: bool,
    pub day_of_reminder: bool,
    pub custom_days: Vec<u32>,
}

impl Default for CustomizableSchedule {
    fn default() -> Self {
        Self {
            three_day_reminder: true,
            one_day_reminder: true,
            day_of_reminder: true,
            custom_days: Vec::new(),
        }
    }
}

impl CustomizableSchedule {
    /// distinct offsets in days before the due date, largest first
    pub fn offsets(&self) -> Vec<u32> {
        let mut offsets: Vec<u32> = [
            (self.three_day_reminder, 3),
            (self.one_day_reminder, 1),
            (self.day_of_reminder, 0),
        ]
        .into_iter()
        .filter_map(|(enabled, days)| enabled.then_some(days))
        .chain(self.custom_days.iter().copied())
        .collect();

        offsets.sort_unstable_by(|a, b| b.cmp(a));
        offsets.dedup();
        offsets
    }
}

/// agent details substituted into messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentProfile {
    pub name: String,
    pub title: String,
    pub signature: String,
    pub contact_info: Option<String>,
}

/// one named message template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplate {
    pub id: String,
    pub name: String,
    pub template: String,
    /// documentation for template authors, not checked when rendering
    #[serde(default)]
    pub variables: Vec<String>,
}

/// the user's templates and which one is active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageTemplates {
    pub templates: Vec<MessageTemplate>,
    pub active_template_id: Option<String>,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        let templates = default_templates();
        let active_template_id = templates.first().map(|t| t.id.clone());
        Self {
            templates,
            active_template_id,
        }
    }
}

impl MessageTemplates {
    /// the active template, else the first one, else the first built-in
    pub fn active(&self) -> MessageTemplate {
        let by_id = self
            .active_template_id
            .as_deref()
            .and_then(|id| self.templates.iter().find(|t| t.id == id));

        match by_id.or_else(|| self.templates.first()) {
            Some(template) => template.clone(),
            None => {
                let mut builtin = default_templates();
                builtin.remove(0)
            }
        }
    }

    /// the user's templates, or the built-in set when none are stored
    pub fn available(&self) -> Vec<MessageTemplate> {
        if self.templates.is_empty() {
            default_templates()
        } else {
            self.templates.clone()
        }
    }
}

impl ReminderSettings {
    /// load settings from their persisted json form
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: ReminderSettings =
            serde_json::from_str(json).map_err(|e| ArrangementError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ArrangementError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    /// reject settings that cannot be rendered consistently
    pub fn validate(&self) -> Result<()> {
        let templates = &self.message_templates.templates;

        for (i, template) in templates.iter().enumerate() {
            if template.id.trim().is_empty() {
                return Err(ArrangementError::InvalidConfiguration {
                    message: format!("template {} has no id", i + 1),
                });
            }
            if templates[..i].iter().any(|t| t.id == template.id) {
                return Err(ArrangementError::InvalidConfiguration {
                    message: format!("duplicate template id {:?}", template.id),
                });
            }
        }

        Ok(())
    }

    /// settings with no reminders at all
    pub fn disabled() -> Self {
        Self {
            global_enabled: false,
            sms_enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_merge_and_dedupe() {
        let schedule = CustomizableSchedule {
            three_day_reminder: true,
            one_day_reminder: false,
            day_of_reminder: true,
            custom_days: vec![7, 3, 14],
        };
        assert_eq!(schedule.offsets(), vec![14, 7, 3, 0]);

        let none = CustomizableSchedule {
            three_day_reminder: false,
            one_day_reminder: false,
            day_of_reminder: false,
            custom_days: vec![],
        };
        assert!(none.offsets().is_empty());
    }

    #[test]
    fn test_active_template_fallbacks() {
        let mut templates = MessageTemplates::default();
        let first_builtin = templates.templates[0].id.clone();

        templates.active_template_id = Some(templates.templates[1].id.clone());
        assert_eq!(templates.active().id, templates.templates[1].id);

        templates.active_template_id = Some("missing".to_string());
        assert_eq!(templates.active().id, first_builtin);

        let empty = MessageTemplates {
            templates: vec![],
            active_template_id: Some("missing".to_string()),
        };
        assert_eq!(empty.active().id, first_builtin);
        assert!(!empty.available().is_empty());
    }

    #[test]
    fn test_settings_from_persisted_json() {
        let json = r#"{
            "globalEnabled": true,
            "smsEnabled": false,
            "customizableSchedule": {
                "threeDayReminder": true,
                "oneDayReminder": true,
                "dayOfReminder": false,
                "customDays": [7]
            },
            "agentProfile": {
                "name": "Sam Carter",
                "title": "Enforcement Agent",
                "signature": "Sam Carter\nEnforcement Agent"
            },
            "messageTemplates": {
                "templates": [
                    {"id": "short", "name": "Short", "template": "{amount} due {date}"}
                ],
                "activeTemplateId": "short"
            }
        }"#;

        let settings = ReminderSettings::from_json(json).unwrap();
        assert!(!settings.sms_enabled);
        assert_eq!(settings.customizable_schedule.offsets(), vec![7, 3, 1]);
        assert_eq!(settings.agent_profile.contact_info, None);
        assert_eq!(settings.message_templates.active().id, "short");
        assert!(settings.message_templates.active().variables.is_empty());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings = ReminderSettings::from_json("{}").unwrap();
        assert_eq!(settings, ReminderSettings::default());
    }

    #[test]
    fn test_rejects_bad_settings() {
        assert!(matches!(
            ReminderSettings::from_json("not json"),
            Err(ArrangementError::InvalidConfiguration { .. })
        ));

        let duplicate = r#"{"messageTemplates": {"templates": [
            {"id": "a", "name": "A", "template": "x"},
            {"id": "a", "name": "B", "template": "y"}
        ]}}"#;
        assert!(ReminderSettings::from_json(duplicate).is_err());
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = ReminderSettings::default();
        let json = settings.to_json_pretty().unwrap();
        assert!(json.contains("\"globalEnabled\": true"));
        assert_eq!(ReminderSettings::from_json(&json).unwrap(), settings);
    }
}
