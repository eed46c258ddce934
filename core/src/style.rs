use std::collections::HashMap;

use colored::{Color, ColoredString, Colorize};
use crossterm::terminal;
use once_cell::sync::Lazy;

use crate::testing::{CompileVerdict, RunPhaseReport, RunReport, RunVerdict, UnitReport};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

pub fn is_truecolor_supported() -> bool {
    static SUPPORTED: Lazy<bool> = Lazy::new(|| {
        matches!(
            std::env::var("COLORTERM").as_deref(),
            Ok("truecolor") | Ok("24bit")
        )
    });
    *SUPPORTED
}

pub trait ColorTheme {
    fn color(&self) -> Color;
}

impl ColorTheme for RunVerdict {
    fn color(&self) -> Color {
        use RunVerdict::*;
        if !self::is_truecolor_supported() {
            return match self {
                Running => Color::BrightBlack,
                Accepted => Color::Green,
                WrongAnswer => Color::Yellow,
                TimeLimitExceeded | CheckerTimeLimitExceeded => Color::Red,
                RuntimeError | CheckerRuntimeError => Color::Magenta,
            };
        }

        match self {
            Running => Color::TrueColor {
                r: 128,
                g: 128,
                b: 128,
            },
            Accepted => Color::TrueColor {
                r: 30,
                g: 180,
                b: 40,
            },
            WrongAnswer => Color::TrueColor {
                r: 210,
                g: 138,
                b: 4,
            },
            TimeLimitExceeded | CheckerTimeLimitExceeded => Color::TrueColor {
                r: 220,
                g: 42,
                b: 42,
            },
            RuntimeError | CheckerRuntimeError => Color::TrueColor {
                r: 171,
                g: 40,
                b: 200,
            },
        }
    }
}

impl ColorTheme for CompileVerdict {
    fn color(&self) -> Color {
        use CompileVerdict::*;
        match self {
            Compiling => Color::BrightBlack,
            Success => Color::Green,
            CompilationError => Color::Red,
        }
    }
}

pub fn verdict_icon(verdict: RunVerdict) -> ColoredString {
    let fg = if is_truecolor_supported() {
        Color::TrueColor {
            r: 255,
            g: 255,
            b: 255,
        }
    } else {
        Color::BrightBlack
    };
    format!(" {} ", verdict)
        .on_color(verdict.color())
        .bold()
        .color(fg)
}

/// Compile progress cell line, one colored letter per artifact
/// (`m` = main, `c` = checker).
pub fn compile_bracket_line(verdicts: &[CompileVerdict]) -> String {
    const NAMES: [char; 2] = ['m', 'c'];
    let cells: Vec<String> = verdicts
        .iter()
        .zip(NAMES)
        .map(|(v, name)| name.to_string().color(v.color()).bold().to_string())
        .collect();
    format!("[{}]", cells.join(" "))
}

/// Run progress cell line, one colored digit per unit.
pub fn run_bracket_line(verdicts: &[RunVerdict], unit_ids: &[String]) -> String {
    let cells: Vec<String> = verdicts
        .iter()
        .zip(unit_ids)
        .map(|(v, id)| {
            unit_bracket_char(id)
                .to_string()
                .color(v.color())
                .bold()
                .to_string()
        })
        .collect();
    format!("[{}]", cells.join(" "))
}

/// The last digit of the testcase part of a display id, so `12` and `12-3`
/// both render as `2`.
pub(crate) fn unit_bracket_char(display_id: &str) -> char {
    let testcase_part = display_id.split('-').next().unwrap_or(display_id);
    testcase_part.chars().last().unwrap_or('?')
}

pub fn print_run_report(report: &RunReport) {
    match &report.run {
        None => {
            let failed = report.compile.failed_artifacts().join(", ");
            println!(
                "{}",
                format!("compilation error in {}", failed).bright_red().bold()
            );
        }
        Some(run) => {
            for unit in &run.units {
                print_unit_report(unit);
            }
            print_run_summary(run);
        }
    }
    println!("took {:.3}s", report.elapsed.as_secs_f64());
}

fn print_unit_report(unit: &UnitReport) {
    let mut header = format!(
        "{}{}",
        format!("testcase {}: ", unit.display_id).bright_yellow().bold(),
        unit.verdict.to_string().color(unit.verdict.color()).bold(),
    );
    if unit.verdict == RunVerdict::WrongAnswer {
        header = format!("{}{}", header, format!(": {}", unit.wrong_answer_reason).cyan());
    }
    println!("{}", header);

    match unit.verdict {
        RunVerdict::WrongAnswer => {
            print_io_section("[input]", &unit.input);
            print_io_section("[stdout]", &unit.actual_output);
            print_io_section("[truth-answer]", &unit.expected_output);
        }
        RunVerdict::RuntimeError | RunVerdict::TimeLimitExceeded => {
            print_io_section("[input]", &unit.input);
        }
        _ => (),
    }
}

pub fn print_io_section(title: &str, entire_str: &str) {
    const THIN_LINE: &str = "─";
    let (cols, _) = terminal::size().unwrap_or((40, 40));

    println!(
        "{}{}",
        title.cyan().bold(),
        THIN_LINE
            .repeat((cols as usize).saturating_sub(title.len() + 1))
            .bright_black(),
    );

    let lines: Vec<&str> = entire_str.lines().collect();
    if lines.is_empty() {
        println!("{}", "<EMPTY>".magenta().dimmed());
        return;
    }
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_end();
        print!("{}", trimmed);

        let num_trailing_whitespace = line.len() - trimmed.len();
        if num_trailing_whitespace > 0 {
            print!(
                "{}{}",
                " ".repeat(num_trailing_whitespace).on_red(),
                "(Trailing whitespace)".bright_red().bold()
            );
        }

        let is_last_line = i + 1 == lines.len();
        if is_last_line && !entire_str.ends_with('\n') {
            print!("{}", " Missing new line ".on_yellow().black().bold());
        }

        println!();
    }
}

pub fn print_run_summary(run: &RunPhaseReport) {
    let bar = "-".repeat(5);
    print!("{} ", bar);

    let count: HashMap<RunVerdict, usize> =
        run.units.iter().fold(HashMap::new(), |mut count, u| {
            *count.entry(u.verdict).or_default() += 1;
            count
        });

    let num_total = run.units.len();
    let num_passed = *count.get(&RunVerdict::Accepted).unwrap_or(&0);
    let num_failed = num_total - num_passed;

    if num_passed == num_total {
        let msg = format!("All {} tests passed ✨", num_total);
        print!("{}", msg.green());
    } else {
        let summary_msg = if num_passed > 0 {
            format!("{}/{} tests failed 💣", num_failed, num_total)
        } else {
            format!("All {} tests failed 💀", num_total)
        };

        let detail_msg = count
            .iter()
            .filter(|(&verdict, _)| verdict != RunVerdict::Accepted)
            .map(|(&verdict, &cnt)| {
                format!(
                    "{}{}{}",
                    self::verdict_icon(verdict),
                    "x".dimmed(),
                    cnt.to_string().bold().bright_white(),
                )
            })
            .collect::<Vec<String>>()
            .join(", ");

        print!("{} ({})", summary_msg.bright_red(), detail_msg);
    }

    println!(" {}", bar);
}
