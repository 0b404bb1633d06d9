//! Prompt templates for the analysis engines.
//!
//! Templates are plain strings with `{placeholder}` slots. `{content}` always
//! receives the (truncated) source text; other slots are template specific.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("static regex"));

/// Default character budget for interpolated source text.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 20_000;

/// Contract risk analysis (Shield).
pub const CONTRACT_RISK_PROMPT: &str = r#"You are a senior contracts attorney who protects independent freelancers. Review the contract below and identify every clause that exposes the freelancer to risk: payment terms, intellectual property transfer, liability and indemnity, termination, non-compete, scope and revisions.

Respond with ONLY a JSON object of this exact shape:
{
  "risk_score": <integer 0-100, where 100 is most dangerous>,
  "summary": "<2-3 sentence plain-language summary>",
  "payment_terms": "<payment terms as written, or Not specified>",
  "clauses": [
    {
      "title": "<short clause name>",
      "quoted_text": "<exact text quoted from the contract>",
      "risk": "High" | "Medium" | "Low",
      "explanation": "<why this matters to the freelancer>",
      "suggested_fix": "<replacement wording to propose>"
    }
  ],
  "negotiation_email": "<a short, polite email to the client proposing the fixes>"
}

Contract:
{content}"#;

/// Negotiation email drafting from a stored analysis (Shield).
pub const NEGOTIATION_EMAIL_PROMPT: &str = r#"You are a freelancer's negotiation assistant. Using the contract review below, draft an email to the client asking for the changes marked High or Medium risk. Write in a {tone} tone. Be specific about each requested change and keep the relationship warm.

Respond with ONLY a JSON object of this exact shape:
{
  "subject": "<email subject line>",
  "body": "<email body, plain text>"
}

Contract review:
{content}"#;

/// Scope creep check of a client message against the agreed scope (Shield).
pub const SCOPE_CREEP_PROMPT: &str = r#"You are a project manager guarding a freelancer against unpaid extra work. Compare the client's message with the agreed contract scope and decide whether the request goes beyond it.

Agreed scope:
{scope}

Respond with ONLY a JSON object of this exact shape:
{
  "is_scope_creep": true | false,
  "confidence": <integer 0-100>,
  "explanation": "<what is outside the agreed scope, or why it is covered>",
  "suggested_reply": "<a friendly reply that quotes a change order if needed>"
}

Client message:
{content}"#;

/// Client sentiment radar (Radar).
pub const CLIENT_SENTIMENT_PROMPT: &str = r#"You are an account manager reading a freelancer's notes about their clients. For each client listed, judge how the relationship is going based on tone, payment behaviour and responsiveness.

Respond with ONLY a JSON object of this exact shape:
{
  "clients": [
    {
      "client_id": "<id exactly as given in the notes>",
      "name": "<client name>",
      "sentiment_score": <integer 0-100, where 100 is delighted>,
      "status": "Happy" | "Neutral" | "AtRisk",
      "signals": ["<short evidence quoted or paraphrased from the notes>"],
      "recommended_action": "<one concrete next step>"
    }
  ]
}

Client notes:
{content}"#;

/// Portfolio and lead asset mining (Magnet).
pub const ASSET_MINING_PROMPT: &str = r#"You are a marketing strategist for an independent freelancer. Mine the material below for reusable marketing assets: case studies, testimonial quotes, portfolio items and social posts.

Respond with ONLY a JSON object of this exact shape:
{
  "assets": [
    {
      "title": "<asset title>",
      "kind": "CaseStudy" | "Testimonial" | "PortfolioItem" | "SocialPost",
      "summary": "<what the asset says and who it is for>",
      "source_quote": "<supporting text quoted from the material>"
    }
  ]
}

Material:
{content}"#;

/// R&D tax credit audit (financial analysis).
pub const RND_CREDIT_AUDIT_PROMPT: &str = r#"You are a tax advisor specialising in research and development credits for sole traders. Review the work log below and identify activities that could qualify as R&D: technical uncertainty, systematic experimentation, and new knowledge.

Respond with ONLY a JSON object of this exact shape:
{
  "eligible": true | false,
  "estimated_credit": <number, in the freelancer's currency>,
  "qualifying_activities": [
    {
      "activity": "<activity>",
      "rationale": "<why it qualifies>",
      "estimated_hours": <number>
    }
  ],
  "summary": "<short overall assessment>"
}

Work log:
{content}"#;

/// Domain template used to build a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    ContractRisk,
    NegotiationEmail,
    ScopeCreep,
    ClientSentiment,
    AssetMining,
    RndCreditAudit,
}

impl PromptTemplate {
    pub fn all() -> &'static [PromptTemplate] {
        &[
            Self::ContractRisk,
            Self::NegotiationEmail,
            Self::ScopeCreep,
            Self::ClientSentiment,
            Self::AssetMining,
            Self::RndCreditAudit,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContractRisk => "contract_risk",
            Self::NegotiationEmail => "negotiation_email",
            Self::ScopeCreep => "scope_creep",
            Self::ClientSentiment => "client_sentiment",
            Self::AssetMining => "asset_mining",
            Self::RndCreditAudit => "rnd_credit_audit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
    }

    /// The raw template text.
    pub fn text(&self) -> &'static str {
        match self {
            Self::ContractRisk => CONTRACT_RISK_PROMPT,
            Self::NegotiationEmail => NEGOTIATION_EMAIL_PROMPT,
            Self::ScopeCreep => SCOPE_CREEP_PROMPT,
            Self::ClientSentiment => CLIENT_SENTIMENT_PROMPT,
            Self::AssetMining => ASSET_MINING_PROMPT,
            Self::RndCreditAudit => RND_CREDIT_AUDIT_PROMPT,
        }
    }
}

/// Truncate to at most `max_chars` characters without splitting one.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Renders templates with bounded source text.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    max_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTENT_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Render a template with the source text only.
    pub fn build(&self, template: PromptTemplate, text: &str) -> String {
        self.build_with(template, text, &[])
    }

    /// Render a template with extra `{name}` variables.
    ///
    /// Rendering is a single pass over the template text, so neither the
    /// document nor a variable value is ever scanned for placeholders.
    /// Unknown slots are left as written.
    pub fn build_with(&self, template: PromptTemplate, text: &str, vars: &[(&str, &str)]) -> String {
        let content = truncate_chars(text, self.max_chars);
        PLACEHOLDER
            .replace_all(template.text(), |caps: &Captures| {
                let name = &caps[1];
                if name == "content" {
                    return content.to_string();
                }
                vars.iter()
                    .find(|(var, _)| *var == name)
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}
