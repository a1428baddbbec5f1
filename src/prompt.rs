//! Prompt construction for answer generation and question confirmation.

use crate::context::{AnswerStyle, Profile};

/// Builds the system prompt from the candidate profile.
///
/// Layout is fixed: instruction block, style directives, then each static
/// context block only if non-empty, then a closing reinforcement line.
pub fn build_system_prompt(profile: &Profile) -> String {
    let mut prompt = String::from(
        "You are an expert interview assistant helping a software engineer in a live interview. \
         Your goal is to provide accurate, helpful, and natural-sounding answers that demonstrate \
         technical competence.\n\n\
         CRITICAL INSTRUCTIONS:\n\
         1. Answer as if YOU are the candidate being interviewed\n\
         2. Use first person (\"I\", \"my\", \"me\") when discussing experience\n\
         3. Keep answers natural and conversational\n\
         4. Show confidence without being arrogant\n\
         5. Include specific examples when possible\n\
         6. Demonstrate problem-solving thinking process\n\n\
         ANSWER STYLE: ",
    );
    prompt.push_str(profile.answer_style.as_str());

    match profile.answer_style {
        AnswerStyle::Concise => {
            prompt.push_str(
                "\n- Keep answers under 30 seconds when spoken\n\
                 - Focus on key points only\n\
                 - Be direct and clear",
            );
        }
        AnswerStyle::Detailed => {
            prompt.push_str(
                "\n- Provide comprehensive explanations\n\
                 - Include examples and edge cases\n\
                 - Walk through your thinking process",
            );
        }
        AnswerStyle::Bullet => {
            prompt.push_str(
                "\n- Structure answers in clear bullet points\n\
                 - Each point should be concise but complete\n\
                 - Use bullet points for better clarity",
            );
        }
    }

    if !profile.job_description.is_empty() {
        prompt.push_str("\n\nJOB CONTEXT:\n");
        prompt.push_str(&profile.job_description);
    }
    if !profile.resume.is_empty() {
        prompt.push_str("\n\nYOUR BACKGROUND:\n");
        prompt.push_str(&profile.resume);
    }
    if !profile.experience.is_empty() {
        prompt.push_str("\n\nRELEVANT EXPERIENCE:\n");
        prompt.push_str(&profile.experience);
    }
    if !profile.specialization.is_empty() {
        prompt.push_str("\n\nSPECIALIZATION:\n");
        prompt.push_str(&profile.specialization);
    }

    prompt.push_str(
        "\n\nTECHNICAL FOCUS AREAS:\n\
         - Data Structures & Algorithms\n\
         - System Design & Architecture\n\
         - Code Optimization & Best Practices\n\
         - Problem-Solving Methodology\n\
         - Technology Stack Expertise\n\
         - Project Management & Collaboration\n\n\
         Remember: You're in a live interview. Answer naturally as the candidate would.",
    );

    prompt
}

/// Builds the per-question user message.
pub fn format_question_prompt(question: &str, style: AnswerStyle) -> String {
    let mut prompt = format!(
        "Interview Question: \"{}\"\n\n\
         Please provide a {} answer that:\n\
         1. Directly addresses the question\n\
         2. Shows your technical expertise\n\
         3. Demonstrates your thought process\n\
         4. Sounds natural and confident",
        question,
        style.as_str()
    );

    if style == AnswerStyle::Bullet {
        prompt.push_str("\n5. Uses clear bullet points for structure");
    }

    prompt
}

/// Builds the yes/no confirmation prompt for question detection.
pub fn format_confirmation_prompt(text: &str) -> String {
    format!(
        "Analyze the following text and determine if it's a question that requires an answer \
         in an interview context.\n\n\
         Consider:\n\
         - Direct questions (starting with question words)\n\
         - Implied questions or requests for information\n\
         - Technical challenges or coding problems\n\
         - Requests to explain concepts\n\
         - Scenario-based questions\n\n\
         Text: \"{}\"\n\n\
         Respond with only \"YES\" if it's a question requiring an answer, or \"NO\" if it's not.",
        text
    )
}

/// System message for the confirmation call.
pub const CONFIRMATION_SYSTEM_PROMPT: &str =
    "You are an expert at identifying questions in interview contexts. Be very precise and concise.";
