//! Prompt constants for fit scoring.

/// System prompt for fit scoring. Enforces JSON-only output.
pub const FIT_SCORE_SYSTEM: &str =
    "You are an experienced technical recruiter who scores how well a candidate fits a job posting. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Fit scoring prompt template. Replace `{profile}`, `{posting}`, `{demand}` and
/// `{untrusted}` before sending.
pub const FIT_SCORE_PROMPT_TEMPLATE: &str = r#"Score how well this candidate fits the job posting.

CANDIDATE PROFILE:
{profile}

SKILL DEMAND (most requested skills across recent postings, with trend):
{demand}

{untrusted}

JOB POSTING:
{posting}

Return a JSON object with this EXACT schema (no extra fields):
{
  "overall": 0-100,
  "skill_match": 0-100,
  "experience_match": 0-100,
  "seniority_match": 0-100,
  "title_match": 0-100,
  "industry_match": 0-100,
  "location_match": 0-100,
  "reasoning": "two or three sentences",
  "matched_skills": ["skills the candidate has that the posting asks for"],
  "missing_skills": ["skills the posting asks for that the candidate lacks"],
  "recommendations": ["concrete advice for applying"],
  "strengths": ["why the candidate fits"],
  "concerns": ["why the candidate may not fit"]
}

Scoring rules:
- title_match must be 15 or lower when the posting is a different line of work from the candidate's preferred titles.
- overall weights: skills 30%, experience 20%, seniority 10%, title 30%, industry 5%, location 5%.
- Weigh rising skills from the demand list slightly higher when the candidate has them.
"#;
