// src/bin/take.rs
//
// Terminal quiz-taking client: fetches a quiz from a running quizdeck
// service, drives one session through the answer sheet / navigator / timer
// machinery and renders the graded result.

use std::error::Error;
use std::sync::Arc;

use quizdeck::models::quiz;
use quizdeck::session::render::{format_clock, render_pending, render_question, render_result};
use quizdeck::session::{
    AnswerValue, HttpQuizBackend, ParticipantInfo, QuizBackend, QuizTimer, SessionError,
    SessionHandle, SessionPhase, SubmitTrigger,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use url::Url;

fn usage() -> ! {
    eprintln!("usage: take [BASE_URL] QUIZ_ID");
    std::process::exit(2);
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn prompt(
    lines: &mut Lines<BufReader<Stdin>>,
    text: &str,
) -> Result<String, Box<dyn Error>> {
    use std::io::Write;
    print!("{}", text);
    std::io::stdout().flush()?;
    let line = lines.next_line().await?.ok_or("stdin closed")?;
    Ok(line)
}

async fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (base, quiz_id) = match args.as_slice() {
        [id] => ("http://127.0.0.1:3000".to_string(), id.clone()),
        [base, id] => (base.clone(), id.clone()),
        _ => usage(),
    };
    let quiz_id: i64 = quiz_id.parse().map_err(|_| "QUIZ_ID must be a number")?;

    let backend = Arc::new(HttpQuizBackend::new(Url::parse(&base)?));

    // A failed fetch is terminal for the session: report and leave.
    let detail = backend.fetch_quiz(quiz_id).await?;

    println!("{}", detail.title);
    if !detail.description.is_empty() {
        println!("{}", detail.description);
    }
    let limit_display = if quiz::is_unlimited(detail.time_limit) {
        "Unlimited".to_string()
    } else {
        format!("{} min", detail.time_limit)
    };
    println!(
        "{} questions, {} points. Time limit: {}. Pass mark: {}%.",
        detail.total_questions, detail.total_points, limit_display, detail.passing_score
    );
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let info = loop {
        let name = prompt(&mut lines, "Your name: ").await?;
        let email = prompt(&mut lines, "Your email: ").await?;
        match ParticipantInfo::new(&name, &email) {
            Ok(info) => break info,
            Err(e) => println!("{}", e),
        }
    };

    let time_limit = detail.time_limit;
    let handle = SessionHandle::new(detail, backend);
    handle.with(|s| s.start(info))?;
    let timer = QuizTimer::start(time_limit, handle.clone());

    loop {
        match handle.with(|s| s.phase()) {
            SessionPhase::Submitted => break,
            SessionPhase::TimeExpired => {
                println!("Time is up. Press s to send your answers.");
            }
            _ => {}
        }

        let (view, is_last, number, answered, total) = handle.with(|s| {
            let view = match s.current_question().cloned() {
                Some(q) => render_question(&q, s.answer(q.id)),
                None => "This quiz has no questions.\n".to_string(),
            };
            let nav = s.navigator();
            (
                view,
                nav.is_last(),
                nav.current_index() + 1,
                s.answered_count(),
                nav.question_count(),
            )
        });

        if let Some(timer) = &timer {
            println!("Time left: {}", format_clock(timer.remaining()));
        }
        println!("Question {}/{} ({} answered)", number, total, answered);
        print!("{}", view);

        let forward = if is_last { "s=submit" } else { "n=next" };
        let line = prompt(
            &mut lines,
            &format!("[{}  p=back  j N=jump  s=submit  q=quit] > ", forward),
        )
        .await?;
        let input = line.trim();

        match input {
            "" => continue,
            "q" => {
                if let Some(timer) = &timer {
                    timer.stop();
                }
                println!("Session abandoned.");
                return Ok(());
            }
            "n" => handle.with(|s| s.navigator_mut().next()),
            "p" => handle.with(|s| s.navigator_mut().previous()),
            "s" => match handle.submit(SubmitTrigger::Manual).await {
                Ok(_) => break,
                Err(SessionError::MissingRequired(ids)) => {
                    println!("Answer the required questions first: {:?}", ids);
                }
                Err(SessionError::AlreadySubmitting) | Err(SessionError::AlreadySubmitted) => {}
                Err(e) => println!("Submission failed: {}. Try again.", e),
            },
            other => {
                if let Some(rest) = other.strip_prefix("j ") {
                    match rest.trim().parse::<i64>() {
                        // 1-based on screen, 0-based inside.
                        Ok(n) => handle.with(|s| s.navigator_mut().jump_to(n - 1)),
                        Err(_) => println!("jump needs a question number"),
                    }
                } else {
                    record_answer(&handle, other);
                }
            }
        }
        println!();
    }

    if let Some(timer) = &timer {
        timer.stop();
    }

    match handle.with(|s| s.result().cloned()) {
        Some(result) => print!("{}", render_result(&result)),
        None => print!("{}", render_pending()),
    }
    Ok(())
}

/// Interprets free input as an answer to the current question: an option
/// number for selectable types, the literal text otherwise.
fn record_answer(handle: &SessionHandle, input: &str) {
    let outcome = handle.with(|s| {
        let Some(question) = s.current_question().cloned() else {
            return Ok(false);
        };
        if question.question_type.is_selectable() {
            match input.parse::<usize>() {
                Ok(n) if n >= 1 && n <= question.options.len() => {
                    let option_id = question.options[n - 1].id;
                    s.set_answer(question.id, AnswerValue::Selected(option_id))
                        .map(|_| true)
                }
                _ => Ok(false),
            }
        } else {
            s.set_answer(question.id, AnswerValue::Text(input.to_string()))
                .map(|_| true)
        }
    });

    match outcome {
        Ok(true) => {}
        Ok(false) => println!("Pick an option by number."),
        Err(e) => println!("{}", e),
    }
}
