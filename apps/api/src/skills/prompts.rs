//! Prompt constants for skill extraction.

pub const SKILL_EXTRACTION_SYSTEM: &str =
    "You extract technical and professional skills from job postings into a fixed taxonomy. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Replace `{categories}`, `{untrusted}` and `{posting}` before sending.
pub const SKILL_EXTRACTION_PROMPT_TEMPLATE: &str = r#"List every skill this job posting asks for.

Allowed categories (use these exact spellings):
{categories}

{untrusted}

JOB POSTING:
{posting}

Return a JSON object with this EXACT schema:
{
  "skills": [
    {
      "name": "canonical skill name, e.g. PostgreSQL",
      "category": "one of the allowed categories",
      "subcategory": "optional finer grouping or null",
      "is_required": true,
      "proficiency_level": "beginner | intermediate | advanced | expert | null",
      "years_required": null,
      "aliases": ["other spellings used in the posting, e.g. Postgres"]
    }
  ]
}

Rules:
- One entry per distinct skill. Do not invent skills the posting does not mention.
- is_required is false for "nice to have", "bonus" or "preferred" items.
"#;
