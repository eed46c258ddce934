pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use colored::Colorize as _;
use error::*;
use tokio::process::Command;

use crate::config::{self, Config};
use crate::interactive::{self, ShellEditor};
use crate::storage::{ProblemDir, ProblemMeta};
use crate::style::{self, ColorTheme as _};
use crate::testing::{
    Artifact, Checker, CompileVerdict, IoFile, ProgressSink, RunReport, Runner, TestCase,
    TestCaseKind, TestCaseMode, TestCaseSet,
};

pub fn init_repository(dir: impl AsRef<Path>) -> Result<()> {
    let path = dir.as_ref().join(Config::FILENAME);
    ensure!(!path.exists(), "'{}' already exists", path.to_string_lossy());
    fsutil::write_with_mkdir(&path, Config::example_toml())
        .context("Failed to init cpj repository")?;
    Ok(())
}

/// Creates a problem dir from already-scraped testcases: the main template,
/// the stored samples with their automatic multitest split, and the
/// metadata file.
pub async fn new_problem(
    dir: impl AsRef<Path>,
    name: &str,
    time_limit_secs: f64,
    checker: char,
    samples: &[(String, String)],
) -> Result<ProblemDir> {
    let problem = ProblemDir::new(dir.as_ref());
    ensure!(
        !problem.exists(),
        "Problem already initialized in {}",
        dir.as_ref().to_string_lossy()
    );
    fsutil::mkdir_all(problem.dir())?;

    let main = problem.main_template_filepath();
    if !main.is_file() {
        fsutil::write(&main, config::template_main_cpp())?;
    }
    if checker == 'c' && !problem.checker_source().is_file() {
        fsutil::write(problem.checker_source(), config::template_checker_cpp())?;
    }

    let store = problem.store();
    let (set, splits) = TestCaseSet::ingest_scraped(samples, &store).await?;

    let meta = ProblemMeta {
        name: name.to_owned(),
        time_limit_secs,
        checker,
        mode: TestCaseMode::One,
        testcases: set.kinds(),
        fetched_at: Local::now(),
    };
    problem.checker(&meta)?; // rejects unknown discriminants
    problem.save_meta(&meta)?;

    let num_split = splits.iter().filter(|s| s.both()).count();
    println!(
        "Saved {} testcases ({} with multitests split)",
        set.len(),
        num_split
    );
    Ok(problem)
}

/// Reads `1.in`/`1.out`, `2.in`/`2.out`, ... from a local dir, standing in
/// for the scraper.
pub fn read_samples_dir(dir: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let dir = dir.as_ref();
    let mut samples = Vec::new();
    for id in 1.. {
        let input = dir.join(format!("{}.in", id));
        let output = dir.join(format!("{}.out", id));
        if !input.is_file() {
            break;
        }
        samples.push((fsutil::read_to_string(&input)?, fsutil::read_to_string(&output)?));
    }
    ensure!(
        !samples.is_empty(),
        "No samples found in {} (expected 1.in/1.out, 2.in/2.out, ...)",
        dir.to_string_lossy()
    );
    Ok(samples)
}

fn load_testcases(problem: &ProblemDir) -> Result<(ProblemMeta, TestCaseSet)> {
    let meta = problem.load_meta()?;
    let set = TestCaseSet::from_kinds(&meta.testcases);
    Ok((meta, set))
}

fn find_candidate(dir: &Path, cfg: &Config) -> Result<Artifact> {
    let source = fsutil::find_most_recently_modified_file(dir, &cfg.test.include)
        .with_context(|| {
            format!(
                "Cannot find the candidate source (glob '{}')",
                cfg.test.include.as_str()
            )
        })?;
    Ok(Artifact::new("main", source))
}

/// Judges the problem's testcases with the persisted checker and mode
/// (overridable). The caller renders the returned report.
pub async fn do_judge(
    problem: &ProblemDir,
    cfg: &Config,
    mode_override: Option<TestCaseMode>,
    time_limit_override: Option<f64>,
    sink: &dyn ProgressSink,
) -> Result<RunReport> {
    let (meta, set) = load_testcases(problem)?;
    ensure!(!set.is_empty(), "No testcases saved for this problem");
    let store = problem.store();

    let mut mode = mode_override.unwrap_or(meta.mode);
    if mode == TestCaseMode::Multiple && !set.check_multitest_mode(&store).await? {
        log::warn!("multitests are not split correctly, using entire testcases instead");
        mode = TestCaseMode::One;
    }

    let checker = problem.checker(&meta)?;
    let candidate = find_candidate(problem.dir(), cfg)?;
    let time_limit =
        Duration::from_secs_f64(time_limit_override.unwrap_or(meta.time_limit_secs));

    let runner = Runner::new(cfg.compiler.clone(), checker, time_limit).shell(&cfg.test.shell);
    let report = runner.run(&set, mode, candidate, &store, sink).await?;
    Ok(report)
}

/// Compiles the candidate and, only on success, hands the binary to the
/// configured interactive terminal. Works in any dir holding a candidate
/// source, problem metadata or not.
pub async fn do_custom_invocation(dir: &Path, cfg: &Config) -> Result<()> {
    let candidate = find_candidate(dir, cfg)?;
    let runner = Runner::new(
        cfg.compiler.clone(),
        Checker::Tokens,
        cfg.test.time_limit(),
    )
    .shell(&cfg.test.shell);

    let start = Instant::now();
    let verdict = runner.custom_invocation(&candidate).await?;
    println!(
        "compile {}: {} [{:.3}s]",
        candidate.name,
        verdict.to_string().color(verdict.color()).bold(),
        start.elapsed().as_secs_f64(),
    );
    if verdict != CompileVerdict::Success {
        return Ok(());
    }

    let cmd = cfg.terminal.launch_command(&candidate.binary)?;
    log::info!("Launching: {}", cmd);
    Command::new(&cfg.test.shell)
        .args(["-c", &cmd])
        .spawn()
        .with_context(|| format!("Failed to launch terminal with '{}'", cmd))?;
    Ok(())
}

/// Appends a user testcase, opening the editor for its input and output.
pub async fn do_add_testcase(problem: &ProblemDir, cfg: &Config) -> Result<usize> {
    let (mut meta, mut set) = load_testcases(problem)?;
    let store = problem.store();

    let id = set.add(TestCaseKind::UserAdded, "", "", &store).await?;
    let handles = set.get(id).expect("just added").entire_handles().clone();
    for (io, handle) in [
        (IoFile::Input, &handles.input),
        (IoFile::Output, &handles.output),
    ] {
        println!("editing {} of the new testcase {}", io, id);
        interactive::edit_file(&cfg.editor, &cfg.test.shell, &store.filepath(handle)).await?;
    }

    meta.testcases = set.kinds();
    problem.save_meta(&meta)?;
    Ok(id)
}

/// Removes a non-scraped testcase after confirmation. Returns whether the
/// testcase was actually removed.
pub async fn do_remove_testcase(problem: &ProblemDir, id: usize) -> Result<bool> {
    let (mut meta, mut set) = load_testcases(problem)?;
    let testcase = set
        .get(id)
        .with_context(|| format!("No testcase with id {}", id))?;
    ensure!(
        !testcase.is_scraped(),
        "Testcase {} was scraped and cannot be deleted",
        id
    );

    if !interactive::confirm_remove_testcase(id) {
        return Ok(false);
    }
    set.remove(id, &problem.store()).await?;
    meta.testcases = set.kinds();
    problem.save_meta(&meta)?;
    Ok(true)
}

pub async fn do_view_testcases(problem: &ProblemDir, ids: &[usize]) -> Result<()> {
    let (_, set) = load_testcases(problem)?;
    let store = problem.store();

    let targets: Vec<&TestCase> = if ids.is_empty() {
        set.iter().collect()
    } else {
        ids.iter()
            .map(|&id| {
                set.get(id)
                    .with_context(|| format!("No testcase with id {}", id))
            })
            .collect::<Result<_>>()?
    };

    for testcase in targets {
        let (input, output) = testcase.entire_io(&store).await?;
        println!("{}", format!("testcase {}", testcase.display_id()).bold());
        style::print_io_section("[input]", &input);
        style::print_io_section("[truth-answer]", &output);
    }
    Ok(())
}

/// Hands multitest files to the editor, per file, re-validating after each
/// edit. `necessary_only` skips files that are already split correctly.
pub async fn do_edit_multitests(
    problem: &ProblemDir,
    cfg: &Config,
    testcase_id: Option<usize>,
    io_filter: Option<IoFile>,
    necessary_only: bool,
) -> Result<()> {
    let (meta, set) = load_testcases(problem)?;
    let store = problem.store();
    let editor = ShellEditor::new(cfg.editor.clone(), cfg.test.shell.clone(), problem.store());

    for testcase in set.iter() {
        if !testcase.is_scraped() {
            continue;
        }
        if testcase_id.is_some_and(|id| testcase.id() != id) {
            continue;
        }
        for io in [IoFile::Input, IoFile::Output] {
            if io_filter.is_some_and(|f| f != io) {
                continue;
            }
            let valid = testcase.check_multitest_file(io, &store).await?;
            if necessary_only && valid {
                continue;
            }
            if !interactive::confirm_edit_multitest(testcase.id(), io, valid) {
                continue;
            }
            let now_valid = testcase.edit_multitest_file(io, &editor, &store).await?;
            println!(
                "multitest {} of testcase {}: {}",
                io,
                testcase.id(),
                if now_valid {
                    "split correctly".green()
                } else {
                    "not split correctly".bright_red()
                }
            );
        }
    }

    if meta.mode == TestCaseMode::Multiple && !set.check_multitest_mode(&store).await? {
        let mut meta = meta;
        meta.mode = TestCaseMode::One;
        problem.save_meta(&meta)?;
        println!("edited multitests unsuccessfully, using the entire testcases mode instead");
    }
    Ok(())
}

/// Persists the testcase mode. MULTIPLE requires every scraped testcase to
/// pass its multitest check. Returns whether the mode was applied.
pub async fn do_set_mode(problem: &ProblemDir, mode: TestCaseMode) -> Result<bool> {
    let (mut meta, set) = load_testcases(problem)?;

    if mode == TestCaseMode::Multiple && !set.check_multitest_mode(&problem.store()).await? {
        println!("set testcase mode to multitests unsuccessfully, using entire testcases instead");
        return Ok(false);
    }
    meta.mode = mode;
    problem.save_meta(&meta)?;
    println!("set testcase mode to {} successfully", mode);
    Ok(true)
}

/// Persists the checker discriminant, writing the checker template for a
/// fresh custom checker.
pub fn do_set_checker(problem: &ProblemDir, discriminant: char) -> Result<()> {
    let mut meta = problem.load_meta()?;
    meta.checker = discriminant;
    problem.checker(&meta)?; // rejects unknown discriminants

    if discriminant == 'c' && !problem.checker_source().is_file() {
        fsutil::write(problem.checker_source(), config::template_checker_cpp())?;
    }
    problem.save_meta(&meta)?;
    Ok(())
}

/// Resolves the problem dir for commands run from inside it.
pub fn problem_dir_here(cur_dir: impl Into<PathBuf>) -> Result<ProblemDir> {
    let problem = ProblemDir::new(cur_dir);
    ensure!(
        problem.exists(),
        "Not a problem dir: '{}' is missing",
        crate::storage::PROBLEM_METADATA_FILENAME
    );
    Ok(problem)
}
