// src/session/render.rs
//
// Pure text rendering for the taking and review views. No mutation, no
// network; given the same input these always produce the same lines.

use std::fmt::Write;

use crate::models::question::PublicQuestion;
use crate::models::response::QuizResult;
use crate::session::answers::AnswerValue;

/// `M:SS`, the countdown format shown next to the quiz title.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Shown while the result is absent (still loading, or the deep link did
/// not resolve).
pub fn render_pending() -> String {
    "Results not available yet.\n".to_string()
}

/// One question as presented during the quiz, with the participant's
/// current answer marked. A selectable question that arrived without
/// options degrades to an inline notice instead of failing the session.
pub fn render_question(question: &PublicQuestion, current: Option<&AnswerValue>) -> String {
    let mut out = String::new();
    let required = if question.is_required { " *" } else { "" };
    let _ = writeln!(out, "{}{}", question.question_text, required);
    let _ = writeln!(out, "({} points)", question.points);

    if question.question_type.is_selectable() {
        if question.options.is_empty() {
            let _ = writeln!(out, "  [no options available for this question]");
            return out;
        }
        for (i, option) in question.options.iter().enumerate() {
            let marker = match current {
                Some(AnswerValue::Selected(id)) if *id == option.id => "x",
                _ => " ",
            };
            let _ = writeln!(out, "  [{}] {}. {}", marker, i + 1, option.option_text);
        }
    } else {
        match current {
            Some(AnswerValue::Text(text)) => {
                let _ = writeln!(out, "  Your answer: {}", text);
            }
            _ => {
                let _ = writeln!(out, "  (type your answer)");
            }
        }
    }
    out
}

/// The full review view for a server-computed result: summary header plus
/// one block per graded question. The correct answer is shown only against
/// wrong answers, and only when the server supplied its text.
pub fn render_result(result: &QuizResult) -> String {
    let mut out = String::new();

    let headline = if result.is_passed {
        "Congratulations!"
    } else {
        "Quiz completed"
    };
    let _ = writeln!(out, "{} — {}", headline, result.quiz_title);
    let _ = writeln!(out, "Participant: {}", result.participant_name);
    let _ = writeln!(
        out,
        "Correct answers: {}/{}",
        result.correct_answers_count, result.total_questions_count
    );
    let _ = writeln!(
        out,
        "Score: {}/{} ({}%)",
        result.score,
        result.total_points,
        result.percentage.round() as i64
    );
    let _ = writeln!(
        out,
        "Status: {}",
        if result.is_passed { "PASSED" } else { "NOT PASSED" }
    );
    if result.attempt_number > 1 {
        let _ = writeln!(out, "Attempt #{}", result.attempt_number);
    }
    if let Some(submitted_at) = result.submitted_at {
        let _ = writeln!(out, "Submitted at {}", submitted_at.format("%Y-%m-%d %H:%M UTC"));
    }

    if result.answers.is_empty() {
        return out;
    }

    let _ = writeln!(out, "\nReview:");
    for (i, answer) in result.answers.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", i + 1, answer.question_text);

        let own = answer
            .selected_option_text
            .as_deref()
            .or(answer.text_answer.as_deref())
            .unwrap_or("(no answer)");
        let _ = writeln!(out, "     Your answer: {}", own);

        if answer.is_correct {
            let _ = writeln!(out, "     Correct (+{} points)", answer.points_earned);
        } else {
            let _ = writeln!(out, "     Incorrect");
            if let Some(correct) = answer.correct_option_text.as_deref() {
                if !correct.is_empty() {
                    let _ = writeln!(out, "     Correct answer: {}", correct);
                }
            }
        }

        if let Some(explanation) = answer.explanation.as_deref() {
            if !explanation.is_empty() {
                let _ = writeln!(out, "     Explanation: {}", explanation);
            }
        }
    }
    out
}
