//! Terminal study screen.
//! Shows one due card at a time, reveals the answer, and records the learner's rating
//! before moving on to the next card.

use anyhow::Result;
use flashcards_app::database::SqliteStore;
use flashcards_app::database::db::get_flashcard;
use flashcards_app::error::ReviewError;
use flashcards_app::models::{AnswerButton, LearnerId, StudySession};
use log::warn;
use std::io::{BufRead, Write};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StudySummary {
    pub reviewed: usize,
    pub lapses: usize,
    pub quit_early: bool,
}

/// Maps an answer to a quality: a button shortcut or a raw 0-5 digit.
/// Out-of-range numbers are passed through so the scheduler can reject them.
fn parse_answer(input: &str) -> Option<i64> {
    AnswerButton::from_key(input)
        .map(|button| button.quality().value() as i64)
        .or_else(|| input.trim().parse().ok())
}

/// Reads one line; `None` on end of input.
fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub fn run_study(
    session: &StudySession<SqliteStore>,
    learner_id: LearnerId,
    deck_name: &str,
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<StudySummary> {
    let cards = session.start_session(learner_id, deck_name)?;
    let mut summary = StudySummary::default();

    if cards.is_empty() {
        writeln!(output, "Nothing to review in '{}'.", deck_name)?;
        return Ok(summary);
    }

    let prompt = format!(
        "[h] {}  [n] {}  [e] {}  (or 0-5, q to quit): ",
        AnswerButton::Hard.label(),
        AnswerButton::Normal.label(),
        AnswerButton::Easy.label()
    );

    'cards: for (position, &card_id) in cards.iter().enumerate() {
        let Some(card) = session.store().with_conn(|conn| get_flashcard(card_id, conn))? else {
            warn!("Card {} disappeared during the session", card_id);
            continue;
        };

        writeln!(output, "[{}/{}] {}", position + 1, cards.len(), card.term)?;
        write!(output, "Press Enter to show the answer")?;
        output.flush()?;
        if read_line(&mut input)?.is_none() {
            summary.quit_early = true;
            break;
        }
        writeln!(output, "  -> {}", card.definition)?;

        loop {
            write!(output, "{}", prompt)?;
            output.flush()?;
            let Some(answer) = read_line(&mut input)? else {
                summary.quit_early = true;
                break 'cards;
            };
            if answer.eq_ignore_ascii_case("q") {
                summary.quit_early = true;
                break 'cards;
            }
            let Some(quality) = parse_answer(&answer) else {
                writeln!(output, "Unrecognized answer '{}'.", answer)?;
                continue;
            };

            match session.submit_review(learner_id, card_id, quality) {
                Ok(state) => {
                    summary.reviewed += 1;
                    if state.repetition_count == 0 {
                        summary.lapses += 1;
                    }
                    writeln!(output, "Next review in {} day(s).", state.interval_days)?;
                    break;
                }
                Err(ReviewError::InvalidQuality(err)) => {
                    writeln!(output, "{}.", err)?;
                }
                Err(ReviewError::Store(err)) => {
                    // The answer was not recorded; stay on this card.
                    writeln!(output, "Could not save your answer ({}). Please answer again.", err)?;
                }
            }
        }
    }

    writeln!(
        output,
        "Reviewed {} card(s), {} to repeat tomorrow.",
        summary.reviewed, summary.lapses
    )?;
    if summary.quit_early {
        writeln!(output, "Unanswered cards stay due.")?;
    }
    Ok(summary)
}
