use std::sync::Arc;

use minijinja::{context, Environment};
use url::Url;

use crate::contract::model::{Assignment, Quest};
use crate::domain::error::DomainError;
use crate::domain::token::TokenSigner;

const DEFAULT_GLYPH: &str = "✨";

const TEXT_TEMPLATE: &str = "quest.txt";
const HTML_TEMPLATE: &str = "quest.html";

const TEXT_BODY: &str = "Hi {{ name }},

Your quest for today is ready.

{{ glyph }} {{ title }}
{% if description %}{{ description }}
{% endif %}
About {{ minutes }} min · {{ xp }} XP

{{ action_label }}: {{ action_url }}

See you out there!";

const HTML_BODY: &str = r#"<p>Hi {{ name }},</p>
<p>Your quest for today is ready.</p>
<h2>{{ glyph }} {{ title }}</h2>
{% if description %}<p>{{ description }}</p>
{% endif %}<p>About {{ minutes }} min &middot; {{ xp }} XP</p>
<p><a href="{{ action_url }}">{{ action_label }}</a></p>
<p>See you out there!</p>"#;

/// Subject and bodies for one quest notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub fn category_glyph(category: &str) -> &'static str {
    match category.trim().to_ascii_lowercase().as_str() {
        "cleanup" => "🧹",
        "environment" | "nature" => "🌳",
        "volunteering" | "volunteer" => "🤝",
        "community" => "🏘️",
        "kindness" => "💛",
        "wellness" | "health" => "💪",
        "education" | "learning" => "📚",
        "transportation" | "transit" => "🚲",
        "civic" => "🏛️",
        "safety" => "🦺",
        "food" => "🥕",
        _ => DEFAULT_GLYPH,
    }
}

/// Template set for quest mail. The `.html` template auto-escapes.
fn templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(TEXT_TEMPLATE, TEXT_BODY)?;
    env.add_template(HTML_TEMPLATE, HTML_BODY)?;
    Ok(env)
}

/// Builds quest emails. Quests without proof requirements get a signed
/// one-click completion link, the rest link to the app.
pub struct NotificationComposer {
    signer: Arc<TokenSigner>,
    app_base_url: Url,
}

impl NotificationComposer {
    pub fn new(signer: Arc<TokenSigner>, app_base_url: Url) -> Self {
        Self {
            signer,
            app_base_url,
        }
    }

    pub fn compose(
        &self,
        quest: &Quest,
        recipient_name: &str,
        assignment: &Assignment,
    ) -> Result<EmailContent, DomainError> {
        let glyph = category_glyph(&quest.category);
        let name = match recipient_name.trim() {
            "" => "there",
            n => n,
        };

        let (action_label, action_url) = if quest.proof_type.allows_one_click() {
            let url = self
                .signer
                .build_confirm_url(assignment.id, assignment.user_id)?;
            ("Mark it done", url)
        } else {
            ("Open Questline to complete it", self.app_base_url.clone())
        };

        let ctx = context! {
            name,
            glyph,
            title => &quest.title,
            description => quest.description.trim(),
            minutes => quest.estimated_minutes,
            xp => quest.xp_reward,
            action_label,
            action_url => action_url.as_str(),
        };

        let env = templates().map_err(template_error)?;
        let render = |name: &str| {
            env.get_template(name)
                .and_then(|t| t.render(&ctx))
                .map_err(template_error)
        };

        Ok(EmailContent {
            subject: format!("{glyph} Today's quest: {}", quest.title),
            text: render(TEXT_TEMPLATE)?,
            html: render(HTML_TEMPLATE)?,
        })
    }
}

fn template_error(e: minijinja::Error) -> DomainError {
    DomainError::configuration(format!("email template: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{AssignmentStatus, ProofType};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn composer(secret: Option<&str>) -> NotificationComposer {
        let base = Url::parse("https://questline.test").unwrap();
        let signer = Arc::new(TokenSigner::new(secret, base.clone(), "/api/quests/confirm"));
        NotificationComposer::new(signer, base)
    }

    fn quest(proof_type: ProofType, category: &str) -> Quest {
        Quest {
            id: Uuid::new_v4(),
            title: "Pick up <5> pieces of litter".into(),
            description: "Grab a bag & go.".into(),
            category: category.into(),
            xp_reward: 40,
            estimated_minutes: 15,
            proof_type,
            is_daily: true,
            weight: 1,
            active: true,
            created_at: Utc::now(),
        }
    }

    fn assignment(quest: &Quest) -> Assignment {
        Assignment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            quest_id: quest.id,
            assigned_date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            status: AssignmentStatus::Assigned,
            proof_payload: None,
            completed_at: None,
            emailed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn one_click_quests_carry_signed_link() {
        let q = quest(ProofType::SelfReport, "cleanup");
        let a = assignment(&q);
        let email = composer(Some("k")).compose(&q, "Ana", &a).unwrap();

        assert!(email.subject.starts_with("🧹"));
        assert!(email.subject.contains(&q.title));
        assert!(email.text.contains("Hi Ana,"));
        assert!(email.text.contains("/api/quests/confirm?assignmentId="));
        assert!(email.text.contains(&a.user_id.to_string()));
        assert!(email.text.contains("15 min"));
        assert!(email.text.contains("40 XP"));
    }

    #[test]
    fn photo_quests_link_to_the_app() {
        let q = quest(ProofType::Photo, "environment");
        let email = composer(Some("k")).compose(&q, "Ana", &assignment(&q)).unwrap();
        assert!(!email.text.contains("token="));
        assert!(email.text.contains("https://questline.test/"));
    }

    #[test]
    fn unknown_category_uses_default_glyph() {
        assert_eq!(category_glyph("interpretive dance"), DEFAULT_GLYPH);
        assert_eq!(category_glyph("Cleanup"), "🧹");
    }

    #[test]
    fn html_body_escapes_quest_text() {
        let q = quest(ProofType::CheckIn, "community");
        let email = composer(None).compose(&q, "<b>", &assignment(&q)).unwrap();
        assert!(email.html.contains("Pick up &lt;5&gt; pieces"));
        assert!(email.html.contains("Grab a bag &amp; go."));
        assert!(email.html.contains("Hi &lt;b&gt;,"));
    }

    #[test]
    fn markup_in_quest_text_is_escaped_in_html_only() {
        let mut q = quest(ProofType::SelfReport, "civic");
        q.title = "<script>alert(1)</script>".into();
        q.description = "Say \"hi\" to 'everyone'".into();
        let email = composer(Some("k")).compose(&q, "Ana", &assignment(&q)).unwrap();

        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("\"hi\""));
        assert!(email.text.contains("🏛️ <script>alert(1)</script>"));
        assert!(email.text.contains("Say \"hi\" to 'everyone'"));
        assert!(email.html.contains("<a href=\""));
    }

    #[test]
    fn blank_description_and_name_are_tidied() {
        let mut q = quest(ProofType::Photo, "food");
        q.description = "   ".into();
        let email = composer(None).compose(&q, " ", &assignment(&q)).unwrap();

        assert!(email.text.starts_with("Hi there,\n\nYour quest for today is ready."));
        assert!(email.text.contains("🥕 Pick up <5> pieces of litter\n\nAbout 15 min"));
        assert!(email.text.ends_with("See you out there!"));
        assert_eq!(email.html.matches("<p>").count(), 5);
    }

    #[test]
    fn one_click_without_secret_is_configuration_error() {
        let q = quest(ProofType::None, "community");
        let err = composer(None).compose(&q, "Ana", &assignment(&q)).unwrap_err();
        assert!(err.is_fatal());
    }
}
