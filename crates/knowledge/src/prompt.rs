//! Sales prompt generation
//!
//! Renders the system prompt used for every session, either from structured
//! company info or from the built-in default. Both end with the entity
//! tracking block that the response parser depends on.

use chrono::{Local, NaiveDateTime};

use sales_agent_llm::ENTITY_MARKER;

use crate::company::CompanyInfo;

/// Entity tracking instructions appended to every sales prompt
fn entity_tracking_block() -> String {
    format!(
        r#"After each response, include entity tracking in this format:
{ENTITY_MARKER}
{{
    "entities": {{
        "name": "identified name or null",
        "email": "identified email or null",
        "company_name": "identified company or null",
        "requirements": ["requirement1", "requirement2"],
        "meeting_date": "identified date or null",
        "meeting_time": "identified time or null",
        "industry": "identified industry or null"
    }}
}}"#
    )
}

fn date_guidance(now: NaiveDateTime) -> String {
    format!(
        "Consider today's date as {} and time as {}.\nIf the user gives a relative day like \"tomorrow\", \"day after tomorrow\", \"next <day>\" or \"this <day>\", resolve it from today's date and record it in DD-MM-YYYY format.",
        now.format("%d-%m-%Y"),
        now.format("%I:%M %p"),
    )
}

fn format_services(info: &CompanyInfo) -> String {
    info.services
        .iter()
        .map(|s| format!("- {}: {}", s.name, s.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_points(points: &[String]) -> String {
    points
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a sales prompt from structured company information
pub fn build_sales_prompt(info: &CompanyInfo) -> String {
    build_sales_prompt_at(info, Local::now().naive_local())
}

/// Build a sales prompt with an explicit clock (exposed for tests)
pub fn build_sales_prompt_at(info: &CompanyInfo, now: NaiveDateTime) -> String {
    format!(
        r#"You are an outbound AI sales agent for {company}.
You've already introduced yourself at the start of the call, so don't introduce yourself again, and don't open with "Hello" or "Hi".
Your role is to understand client needs and guide them toward our solutions.

Available Services:
{services}

Industries We Serve: {industries}

Key Points:
{points}

Objectives:
- Gather client information (email, name, company name)
- Understand requirements
- Match with services
- Try to schedule a consultation
- Do not talk about prices unless the client asks

Conversation Flow:
- Focus on understanding the client's business and challenges
- Present relevant solutions
- Schedule a consultation meeting
- Once all necessary information is gathered, confirm the meeting date and time, and ask if the client has other questions or if the call can be ended

Strict Guidelines:
- Keep responses under 3 sentences
- Focus on business challenges
- Guide toward consultation
- No technical details unless asked
- Keep pitching the services even if the client shows disinterest
- For end call requests, ask "Would you like to end our conversation?" and only end if confirmed

{tracking}
{dates}"#,
        company = info.company_name,
        services = format_services(info),
        industries = info.industries_served.join(", "),
        points = format_points(&info.unique_selling_points),
        tracking = entity_tracking_block(),
        dates = date_guidance(now),
    )
}

/// Default sales prompt used before any knowledge document is uploaded
pub fn default_sales_prompt() -> String {
    let info = CompanyInfo {
        company_name: "Toshal Infotech".to_string(),
        company_description: "Technology consulting company".to_string(),
        services: [
            ("Custom Software Development", "Building tailored software solutions for businesses"),
            ("Web Development", "Creating modern, responsive websites and web applications"),
            ("Mobile App Development", "Developing iOS and Android applications"),
            ("Cloud Solutions", "Cloud migration, hosting, and infrastructure management"),
            ("Digital Transformation", "Helping businesses modernize their digital processes"),
            ("IT Consulting", "Strategic technology planning and implementation"),
        ]
        .iter()
        .map(|(name, description)| crate::company::ServiceInfo {
            name: name.to_string(),
            description: description.to_string(),
            pricing: serde_json::Value::Null,
        })
        .collect(),
        industries_served: [
            "Healthcare",
            "Finance",
            "Education",
            "Retail",
            "Manufacturing",
            "Technology",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        unique_selling_points: [
            "Over 10 years of industry experience",
            "Dedicated project managers for each client",
            "Agile development methodology",
            "24/7 support",
            "Strong focus on security and scalability",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    };

    build_sales_prompt(&info)
}
