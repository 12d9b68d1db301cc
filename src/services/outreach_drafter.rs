//! Outreach drafting backed by the generation provider.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::time::Duration;

use super::provider_guard::with_timeout;
use super::response_decoder::decode_json;
use crate::domain::errors::DomainResult;
use crate::domain::models::{Lead, OutreachDraft, Strategy, TriggerEvent};
use crate::domain::ports::{GenerationProvider, OutreachDrafter};

/// Token budget for one email.
pub const OUTREACH_MAX_TOKENS: u32 = 500;

/// System prompt asking for a JSON subject/body pair.
pub const OUTREACH_SYSTEM_PROMPT: &str = "\
You are a senior SDR writing a timely, context-aware outreach email.

A competitor has just experienced an outage or major issue. You need to draft a \
short, empathetic email to a potential customer who may be affected.

Rules:
- Keep it under 150 words
- Be empathetic, not predatory
- Reference the specific event
- Offer a concrete next step (demo, call, migration guide)

Respond ONLY with valid JSON:
{
  \"subject\": \"<email subject line>\",
  \"body\": \"<full email body>\"
}
No explanation outside the JSON.";

/// User prompt for one outreach email.
pub fn build_outreach_prompt(lead: &Lead, event: &TriggerEvent, strategy: &Strategy) -> String {
    let company = json!({
        "name": lead.name,
        "domain": lead.domain,
        "tech_stack": lead.tech_stack,
        "employees": lead.employees,
        "funding": lead.funding_stage,
    });
    let pretty = |v: &serde_json::Value| serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string());
    let event_json = serde_json::to_value(event).unwrap_or_default();

    format!(
        "Trigger event: {}\n\nTarget company: {}\n\nOur product ICP: {}\nOur keywords: {}",
        pretty(&event_json),
        pretty(&company),
        strategy.icp,
        strategy.keywords.join(", ")
    )
}

/// Outreach drafter backed by a generation provider.
pub struct GenerativeOutreachDrafter {
    generator: Arc<dyn GenerationProvider>,
    timeout: Duration,
}

impl GenerativeOutreachDrafter {
    /// Drafter bounding each call by `timeout`.
    pub fn new(generator: Arc<dyn GenerationProvider>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }
}

#[async_trait]
impl OutreachDrafter for GenerativeOutreachDrafter {
    fn name(&self) -> &'static str {
        "generative-outreach"
    }

    async fn draft(&self, lead: &Lead, event: &TriggerEvent, strategy: &Strategy) -> DomainResult<OutreachDraft> {
        let prompt = build_outreach_prompt(lead, event, strategy);
        let raw = with_timeout(
            self.generator.name(),
            self.timeout,
            self.generator
                .complete(OUTREACH_SYSTEM_PROMPT, &prompt, OUTREACH_MAX_TOKENS),
        )
        .await?;
        decode_json(&raw, "outreach JSON {subject, body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockReply, ScriptedGenerator};
    use crate::domain::errors::DomainError;
    use crate::domain::models::StrategyDraft;

    fn strategy() -> Strategy {
        Strategy::from_draft(
            1,
            "Managed Postgres",
            StrategyDraft::new("Teams on DigitalOcean droplets").with_keywords(["droplet", "outage"]),
            None,
        )
    }

    #[tokio::test]
    async fn test_draft_decodes_fenced_email() {
        let generator = Arc::new(ScriptedGenerator::new().with_default(MockReply::success(
            "```json\n{\"subject\": \"Sorry about today\", \"body\": \"Hi there\"}\n```",
        )));
        let drafter = GenerativeOutreachDrafter::new(generator.clone(), Duration::from_secs(5));
        let lead = Lead::new("acme.io", "Acme").with_tech_stack(["DigitalOcean"]);
        let event = TriggerEvent::new("critical_outage", "DigitalOcean");

        let draft = drafter.draft(&lead, &event, &strategy()).await.unwrap();
        assert_eq!(draft.subject, "Sorry about today");

        let calls = generator.calls().await;
        assert_eq!(calls[0].max_tokens, OUTREACH_MAX_TOKENS);
        assert!(calls[0].user_prompt.contains("\"competitor\": \"DigitalOcean\""));
        assert!(calls[0].user_prompt.contains("\"domain\": \"acme.io\""));
        assert!(calls[0].user_prompt.contains("Our product ICP: Teams on DigitalOcean droplets"));
        assert!(calls[0].user_prompt.ends_with("Our keywords: droplet, outage"));
    }

    #[tokio::test]
    async fn test_non_json_reply_is_malformed() {
        let generator = Arc::new(ScriptedGenerator::new().with_default(MockReply::success("Dear customer")));
        let drafter = GenerativeOutreachDrafter::new(generator, Duration::from_secs(5));
        let err = drafter
            .draft(
                &Lead::new("a.io", "A"),
                &TriggerEvent::new("outage", "Heroku"),
                &strategy(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::MalformedResponse(_)));
    }
}
