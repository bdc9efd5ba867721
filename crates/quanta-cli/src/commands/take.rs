//! The `quanta take` command: an interactive exam in the terminal.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use quanta_core::model::{QuestionType, COUNT_PRESETS};
use quanta_core::{Answer, Difficulty, ExamSession, Question, QuizParams, SessionStatus};

const HELP: &str = "Type an answer and press enter. Commands: :n next, :p previous, :g <n> go to, :e explain, :q finish";

pub async fn execute(
    subject: String,
    count: Option<u32>,
    difficulty: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, service) = super::connect(config_path.as_deref())?;

    let count = count.unwrap_or(config.default_count);
    if !COUNT_PRESETS.contains(&count) {
        tracing::warn!(count, presets = ?COUNT_PRESETS, "question count is not a preset");
    }
    let difficulty = match difficulty {
        Some(d) => d
            .parse::<Difficulty>()
            .map_err(|e| anyhow::anyhow!("{e}; choose one of:\n{}", difficulty_choices()))?,
        None => config.default_difficulty,
    };

    let params = QuizParams::new(subject, count, difficulty);
    params.validate().map_err(anyhow::Error::msg)?;

    let session = ExamSession::new(service);
    eprintln!(
        "Generating {} {} question(s) on {}...",
        params.count,
        params.difficulty.label(),
        params.subject
    );
    session.init_exam(&params).await;

    if session.status() == SessionStatus::Failed {
        let failure = session
            .last_error()
            .map(|f| f.message)
            .unwrap_or_else(|| "quiz generation failed".into());
        anyhow::bail!(failure);
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_attempt(&session, &mut stdin.lock(), &mut stdout.lock()).await?;

    session.check_all_answers().await;
    print_summary(&session);
    Ok(())
}

/// Drive one attempt from line-oriented input until `:q` or end of input.
pub async fn run_attempt<R: BufRead, W: Write>(
    session: &ExamSession,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    if session.is_empty() {
        writeln!(out, "The service returned no questions.")?;
        return Ok(());
    }

    writeln!(out, "{HELP}")?;
    let mut line = String::new();

    while let Some(question) = session.current_question() {
        render_question(session, &question, out)?;
        write!(out, "> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line).context("failed to read input")? == 0 {
            break;
        }
        let entry = line.trim();

        match entry {
            "" => continue,
            ":q" => break,
            ":n" => {
                if session.is_last() {
                    writeln!(out, "Already at the last question.")?;
                }
                session.next_question();
            }
            ":p" => {
                if session.is_first() {
                    writeln!(out, "Already at the first question.")?;
                }
                session.previous_question();
            }
            ":e" => match session.explain_current().await {
                Some(explanation) => writeln!(out, "{}", render_explanation(&explanation))?,
                None => writeln!(out, "No explanation available.")?,
            },
            cmd if cmd.starts_with(":g") => {
                let target = cmd[2..].trim().parse::<usize>().ok();
                let moved = target
                    .and_then(|n| n.checked_sub(1))
                    .is_some_and(|index| session.jump_to(index));
                if !moved {
                    writeln!(out, "No such question: {}", cmd[2..].trim())?;
                }
            }
            cmd if cmd.starts_with(':') => writeln!(out, "Unknown command {cmd}. {HELP}")?,
            raw => {
                session.set_answer(question.id.clone(), parse_answer(question.kind(), raw));
                match session.check_current_answer().await {
                    Some(result) => {
                        let verdict = if result.correct { "Correct!" } else { "Incorrect." };
                        writeln!(out, "{verdict}")?;
                        if let Some(explanation) = &result.explanation {
                            writeln!(out, "  {explanation}")?;
                        }
                    }
                    None => writeln!(out, "Answer saved, but it could not be checked right now.")?,
                }
                if session.is_last() {
                    writeln!(out, "That was the last question. Type :q to finish.")?;
                } else {
                    session.next_question();
                }
            }
        }
    }

    Ok(())
}

fn render_question<W: Write>(session: &ExamSession, question: &Question, out: &mut W) -> Result<()> {
    let kind = question
        .kind()
        .map(|k| k.label())
        .unwrap_or("Question");
    writeln!(
        out,
        "\n[{}/{}] {kind}: {}",
        session.position() + 1,
        session.len(),
        question.content().unwrap_or("(no content)")
    )?;
    for option in question.options() {
        writeln!(out, "  {}. {}", option.label, option.text)?;
    }
    if let Some(answer) = session.answer(&question.id) {
        let mark = match session.result(&question.id) {
            Some(r) if r.correct => " (correct)",
            Some(_) => " (incorrect)",
            None => "",
        };
        writeln!(out, "  your answer: {answer}{mark}")?;
    }
    Ok(())
}

fn render_explanation(explanation: &Value) -> String {
    match explanation {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("explanation") {
            Some(Value::String(text)) => text.clone(),
            _ => explanation.to_string(),
        },
        other => other.to_string(),
    }
}

fn difficulty_choices() -> String {
    Difficulty::ALL
        .iter()
        .map(|d| format!("  {d} ({}): {}", d.label(), d.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Interpret a typed line according to the question type.
pub fn parse_answer(kind: Option<QuestionType>, raw: &str) -> Answer {
    let raw = raw.trim();
    match kind {
        Some(QuestionType::SingleChoice) => Answer::Text(raw.to_uppercase()),
        Some(QuestionType::MultipleChoice) => Answer::Choices(
            raw.split([',', ' '])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_uppercase)
                .collect(),
        ),
        Some(QuestionType::TrueFalse) => match raw.to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" => Answer::Flag(true),
            "f" | "false" | "n" | "no" => Answer::Flag(false),
            _ => Answer::Text(raw.to_string()),
        },
        _ => Answer::Text(raw.to_string()),
    }
}

fn print_summary(session: &ExamSession) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Answer", "Result"]);

    for (i, question) in session.questions().iter().enumerate() {
        let answer = session
            .answer(&question.id)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".into());
        let result = match session.result(&question.id) {
            Some(r) if r.correct => "correct",
            Some(_) => "incorrect",
            None if session.answer(&question.id).is_some() => "unchecked",
            None => "-",
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&question.id),
            Cell::new(answer),
            Cell::new(result),
        ]);
    }

    let summary = session.summary();
    eprintln!("\n{table}");
    eprintln!(
        "Answered {}/{}, correct {}/{} ({:.1}%)",
        summary.answered,
        summary.total,
        summary.correct,
        summary.checked,
        summary.accuracy() * 100.0
    );
}
