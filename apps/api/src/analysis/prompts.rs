// Analysis prompt template and the substitution that fills it.
// The template has exactly two slots: {resume} and {jd}. Every other brace is literal.

use crate::analysis::models::{AnalysisPrompt, ExtractedText, JobDescription};

pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an elite Applicant Tracking System (ATS) expert with deep specialization in technical recruitment for fields including software engineering, data science, machine learning, data analysis, big data engineering, cloud computing, and IT roles. You have 15+ years of experience in technical recruiting for top tech companies.

Analyze the provided resume against the job description with extreme precision and provide:

1. A percentage match score between the resume and job description. Be realistic but fair - most candidates don't exceed 85% match.
2. A detailed, categorized list of important keywords/skills from the job description missing in the resume.
   Categorize them as: Technical Skills, Soft Skills, Experience, Education/Certifications.
3. A compelling professional summary of the candidate's profile.
4. 3-5 specific, actionable recommendations to improve the resume for this particular job.
5. 2-3 strengths of the resume relative to the job description.
6. A brief explanation of why certain skills/experiences are particularly valuable for this role.

Resume:
{resume}

Job Description:
{jd}

Return your analysis in the following JSON format only:
{
    "JD Match": "XX%",
    "MissingKeywords": {
        "Technical Skills": ["skill1", "skill2", ...],
        "Soft Skills": ["skill1", "skill2", ...],
        "Experience": ["exp1", "exp2", ...],
        "Education/Certifications": ["cert1", "cert2", ...]
    },
    "Profile Summary": "Compelling summary of the candidate's profile",
    "Improvement Suggestions": ["suggestion1", "suggestion2", "suggestion3", ...],
    "Resume Strengths": ["strength1", "strength2", ...],
    "Key Role Requirements": "Brief explanation of the most critical skills for this role"
}

Be thorough but ensure you maintain valid JSON format. Do not add any text before or after the JSON object. Focus on practical, actionable insights that would genuinely help the candidate."#;

/// Builds the analysis prompt for one resume/JD pair. Pure and deterministic.
pub fn build_prompt(resume: &ExtractedText, jd: &JobDescription) -> AnalysisPrompt {
    let rendered = render_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[("resume", resume.as_str()), ("jd", jd.as_str())],
    );
    AnalysisPrompt::new(rendered)
}

/// Single-pass `{name}` substitution.
///
/// Only the template is scanned: a `{` that does not open a known slot is copied through
/// unchanged, and substituted values are appended verbatim without being rescanned.
pub fn render_template(template: &str, slots: &[(&str, &str)]) -> String {
    let extra: usize = slots.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open..];
        let slot = slots.iter().find(|(name, _)| {
            after
                .strip_prefix('{')
                .and_then(|s| s.strip_prefix(*name))
                .is_some_and(|s| s.starts_with('}'))
        });
        match slot {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume(text: &str) -> ExtractedText {
        ExtractedText::new(text.to_string()).unwrap()
    }

    fn jd(text: &str) -> JobDescription {
        JobDescription::new(text).unwrap()
    }

    #[test]
    fn test_prompt_contains_both_inputs_in_order() {
        let prompt = build_prompt(
            &resume("Python, SQL, 3 years experience"),
            &jd("Requires Python, SQL, AWS"),
        );
        let text = prompt.as_str();
        let r = text.find("Python, SQL, 3 years experience").unwrap();
        let j = text.find("Requires Python, SQL, AWS").unwrap();
        assert!(r < j);
        assert!(!text.contains("{resume}"));
        assert!(!text.contains("{jd}"));
    }

    #[test]
    fn test_template_embeds_persona_guidance_and_schema() {
        let text = build_prompt(&resume("r"), &jd("j")).as_str().to_string();
        assert!(text.contains("Applicant Tracking System (ATS) expert"));
        assert!(text.contains("most candidates don't exceed 85% match"));
        for key in [
            "\"JD Match\"",
            "\"MissingKeywords\"",
            "\"Technical Skills\"",
            "\"Soft Skills\"",
            "\"Experience\"",
            "\"Education/Certifications\"",
            "\"Profile Summary\"",
            "\"Improvement Suggestions\"",
            "\"Resume Strengths\"",
            "\"Key Role Requirements\"",
        ] {
            assert!(text.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_template_has_exactly_two_slots() {
        assert_eq!(ANALYSIS_PROMPT_TEMPLATE.matches("{resume}").count(), 1);
        assert_eq!(ANALYSIS_PROMPT_TEMPLATE.matches("{jd}").count(), 1);
    }

    #[test]
    fn test_braces_in_user_text_are_kept_verbatim() {
        let prompt = build_prompt(
            &resume("Built {jd} templating and fn main() { println!(\"{}\") }"),
            &jd("Knows {resume} and {{ handlebars }}"),
        );
        let text = prompt.as_str();
        assert!(text.contains("Built {jd} templating and fn main() { println!(\"{}\") }"));
        assert!(text.contains("Knows {resume} and {{ handlebars }}"));
        assert_eq!(text.matches("Knows {resume}").count(), 1);
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = build_prompt(&resume("same"), &jd("same jd"));
        let b = build_prompt(&resume("same"), &jd("same jd"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_template_copies_unknown_braces() {
        let out = render_template("{a} {b} {  } {a", &[("a", "1")]);
        assert_eq!(out, "1 {b} {  } {a");
    }
}
