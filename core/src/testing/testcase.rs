use anyhow::Context as _;
use async_trait::async_trait;
use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::storage::{ContentHandle, ContentStore};

/// Fixed instructional header of multitest files. Exactly seven lines; the
/// file continues with one blank line and then the blank-line-separated
/// groups.
pub const MULTITEST_HEADER: &str = "\
/* MULTITESTS
Blank lines separate groups; no blank lines within a group.
Input file: group 1 is the subtest count T,
groups 2..T+1 are the individual subtest inputs.
Output file: T groups, one per subtest, in order.
Keep the tokens identical to the entire testcase.
*/
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TestCaseKind {
    Scraped,
    UserAdded,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TestCaseMode {
    One,
    Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IoFile {
    Input,
    Output,
}

/// Owned pair of content handles for one testcase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoPair {
    pub input: ContentHandle,
    pub output: ContentHandle,
}

impl IoPair {
    /// Handles of the entire testcase with the given id.
    pub fn entire(id: usize) -> Self {
        Self {
            input: ContentHandle::new(format!("{}.in", id)),
            output: ContentHandle::new(format!("{}.out", id)),
        }
    }

    /// Handles of the multitest decomposition of testcase `id`.
    pub fn multitest(id: usize) -> Self {
        Self {
            input: ContentHandle::new(format!("{}.multi.in", id)),
            output: ContentHandle::new(format!("{}.multi.out", id)),
        }
    }

    pub fn get(&self, io: IoFile) -> &ContentHandle {
        match io {
            IoFile::Input => &self.input,
            IoFile::Output => &self.output,
        }
    }
}

/// One flattened judging item: what the candidate reads, and what its
/// output is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunUnit {
    pub display_id: String,
    pub input: String,
    pub expected_output: String,
}

/// Text-editor collaborator: opens the content behind a handle and blocks
/// until the user is done.
#[async_trait]
pub trait MultitestEditor {
    async fn edit(&self, handle: &ContentHandle) -> anyhow::Result<()>;
}

/// Per-file result of the automatic split heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultitestSplit {
    pub input: bool,
    pub output: bool,
}

impl MultitestSplit {
    pub fn both(self) -> bool {
        self.input && self.output
    }
}

/// One testcase: its entire content, and (for scraped testcases) a
/// best-effort decomposition into independently judgeable subtests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    id: usize,
    kind: TestCaseKind,
    entire: IoPair,
    multitest: Option<IoPair>,
}

impl TestCase {
    pub fn new(id: usize, kind: TestCaseKind, entire: IoPair, multitest: Option<IoPair>) -> Self {
        assert_eq!(
            kind == TestCaseKind::Scraped,
            multitest.is_some(),
            "multitest io must be present exactly for scraped testcases"
        );
        Self {
            id,
            kind,
            entire,
            multitest,
        }
    }

    /// Builds a testcase with the conventional `{id}.in` / `{id}.out`
    /// (and `{id}.multi.*` for scraped ones) handle keys.
    pub fn with_conventional_handles(id: usize, kind: TestCaseKind) -> Self {
        let multitest = (kind == TestCaseKind::Scraped).then(|| IoPair::multitest(id));
        Self::new(id, kind, IoPair::entire(id), multitest)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kind(&self) -> TestCaseKind {
        self.kind
    }

    pub fn is_scraped(&self) -> bool {
        self.kind == TestCaseKind::Scraped
    }

    pub fn display_id(&self) -> String {
        self.id.to_string()
    }

    pub fn entire_handles(&self) -> &IoPair {
        &self.entire
    }

    pub fn multitest_handles(&self) -> Option<&IoPair> {
        self.multitest.as_ref()
    }

    pub async fn entire_io(&self, store: &dyn ContentStore) -> anyhow::Result<(String, String)> {
        let input = store.read(&self.entire.input).await?;
        let output = store.read(&self.entire.output).await?;
        Ok((input, output))
    }

    /// Validity of one multitest file against the entire testcase.
    pub async fn check_multitest_file(
        &self,
        io: IoFile,
        store: &dyn ContentStore,
    ) -> anyhow::Result<bool> {
        let mt = self.multitest_or_panic();
        let entire_input = store.read(&self.entire.input).await?;
        let entire = match io {
            IoFile::Input => entire_input.clone(),
            IoFile::Output => store.read(&self.entire.output).await?,
        };
        let multi = store.read(mt.get(io)).await?;
        Ok(multitest_file_is_valid(io, &multi, &entire, &entire_input))
    }

    /// Full validity check of the multitest decomposition.
    pub async fn check_multitests(&self, store: &dyn ContentStore) -> anyhow::Result<bool> {
        Ok(self.check_multitest_file(IoFile::Input, store).await?
            && self.check_multitest_file(IoFile::Output, store).await?)
    }

    /// Whether MULTIPLE mode may be requested for this testcase.
    pub async fn check_multitest_mode(&self, store: &dyn ContentStore) -> anyhow::Result<bool> {
        if !self.is_scraped() {
            return Ok(true);
        }
        self.check_multitests(store).await
    }

    /// Flattens this testcase into run units.
    ///
    /// MULTIPLE mode on a scraped testcase requires a passing multitest
    /// validity check; callers must pre-validate with
    /// `check_multitest_mode()`.
    pub async fn get_testcases(
        &self,
        mode: TestCaseMode,
        store: &dyn ContentStore,
    ) -> anyhow::Result<Vec<RunUnit>> {
        let mt = match (mode, &self.multitest) {
            (TestCaseMode::One, _) | (TestCaseMode::Multiple, None) => {
                let (input, expected_output) = self.entire_io(store).await?;
                return Ok(vec![RunUnit {
                    display_id: self.display_id(),
                    input,
                    expected_output,
                }]);
            }
            (TestCaseMode::Multiple, Some(mt)) => mt,
        };

        assert!(
            self.check_multitests(store).await?,
            "BUG: MULTIPLE mode requested for testcase {} without a passing multitest check",
            self.id
        );

        let multi_input = store.read(&mt.input).await?;
        let multi_output = store.read(&mt.output).await?;
        let in_groups = parse_groups(strip_header(&multi_input).expect("validated above"));
        let out_groups = parse_groups(strip_header(&multi_output).expect("validated above"));
        debug_assert_eq!(in_groups.len(), out_groups.len() + 1);

        let units = in_groups[1..]
            .iter()
            .zip(&out_groups)
            .enumerate()
            .map(|(i, (input, output))| RunUnit {
                display_id: format!("{}-{}", self.id, i + 1),
                // the candidate sees a single-test-shaped input
                input: format!("1\n{}", input),
                expected_output: output.clone(),
            })
            .collect();
        Ok(units)
    }

    /// Best-effort automatic split, run once right after ingestion. Always
    /// writes both multitest files (seeding them verbatim when a heuristic
    /// fails) and reports the resulting per-file validity.
    pub async fn split_multitests(
        &self,
        store: &dyn ContentStore,
    ) -> anyhow::Result<MultitestSplit> {
        let mt = self.multitest_or_panic();
        let entire_input = store.read(&self.entire.input).await?;
        let entire_output = store.read(&self.entire.output).await?;
        let t = leading_count(&entire_input);

        let input_file = match t.and_then(|t| split_one_line_input(&entire_input, t)) {
            Some(groups) => format_multitest_file(&groups),
            None => format_multitest_file(&[entire_input.clone()]),
        };
        store.write(&mt.input, &input_file).await?;

        let out_groups = t.and_then(|t| {
            split_one_line(&entire_output, t).or_else(|| split_yes_no(&entire_output, t))
        });
        let output_file = match out_groups {
            Some(groups) => format_multitest_file(&groups),
            None => format_multitest_file(&[entire_output.clone()]),
        };
        store.write(&mt.output, &output_file).await?;

        Ok(MultitestSplit {
            input: self.check_multitest_file(IoFile::Input, store).await?,
            output: self.check_multitest_file(IoFile::Output, store).await?,
        })
    }

    /// Hands one multitest file to the editor collaborator, then
    /// re-validates it.
    pub async fn edit_multitest_file(
        &self,
        io: IoFile,
        editor: &dyn MultitestEditor,
        store: &dyn ContentStore,
    ) -> anyhow::Result<bool> {
        let mt = self.multitest_or_panic();
        editor.edit(mt.get(io)).await?;
        self.check_multitest_file(io, store).await
    }

    /// Deletes all owned content. Scraped testcases cannot be deleted;
    /// callers must check the kind first.
    pub async fn delete(self, store: &dyn ContentStore) -> anyhow::Result<()> {
        assert!(
            !self.is_scraped(),
            "BUG: tried to delete scraped testcase {}",
            self.id
        );
        store.remove(&self.entire.input).await?;
        store.remove(&self.entire.output).await?;
        Ok(())
    }

    fn multitest_or_panic(&self) -> &IoPair {
        self.multitest
            .as_ref()
            .unwrap_or_else(|| panic!("BUG: testcase {} has no multitest io", self.id))
    }
}

/// Ordered testcases of one problem. Ids always equal the 1-based position
/// and scraped testcases occupy a stable prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCaseSet {
    testcases: Vec<TestCase>,
}

impl TestCaseSet {
    pub fn new(testcases: Vec<TestCase>) -> Self {
        for (i, t) in testcases.iter().enumerate() {
            assert_eq!(t.id(), i + 1, "testcase ids must equal 1-based positions");
        }
        for pair in testcases.windows(2) {
            assert!(
                pair[1].is_scraped() <= pair[0].is_scraped(),
                "scraped testcases must form a prefix"
            );
        }
        Self { testcases }
    }

    /// Offline reconstruction from persisted testcase kinds.
    pub fn from_kinds(kinds: &[TestCaseKind]) -> Self {
        let testcases = kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| TestCase::with_conventional_handles(i + 1, kind))
            .collect();
        Self::new(testcases)
    }

    /// Online initialization: stores the scraped (input, output) pairs and
    /// runs the split heuristics on each. Heuristic failures never block
    /// ingestion; the per-testcase split results are returned for
    /// reporting.
    pub async fn ingest_scraped(
        io_pairs: &[(String, String)],
        store: &dyn ContentStore,
    ) -> anyhow::Result<(Self, Vec<MultitestSplit>)> {
        let mut testcases = Vec::with_capacity(io_pairs.len());
        let mut splits = Vec::with_capacity(io_pairs.len());
        for (i, (input, output)) in io_pairs.iter().enumerate() {
            let testcase = TestCase::with_conventional_handles(i + 1, TestCaseKind::Scraped);
            let handles = testcase.entire_handles();
            store
                .write(&handles.input, &ensure_trailing_newline(input))
                .await?;
            store
                .write(&handles.output, &ensure_trailing_newline(output))
                .await?;
            splits.push(testcase.split_multitests(store).await?);
            testcases.push(testcase);
        }
        Ok((Self::new(testcases), splits))
    }

    pub fn len(&self) -> usize {
        self.testcases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.testcases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestCase> {
        self.testcases.iter()
    }

    pub fn get(&self, id: usize) -> Option<&TestCase> {
        self.testcases.get(id.checked_sub(1)?)
    }

    pub fn kinds(&self) -> Vec<TestCaseKind> {
        self.testcases.iter().map(TestCase::kind).collect()
    }

    /// Appends a new non-scraped testcase and stores its content. Returns
    /// the assigned id.
    pub async fn add(
        &mut self,
        kind: TestCaseKind,
        input: &str,
        output: &str,
        store: &dyn ContentStore,
    ) -> anyhow::Result<usize> {
        assert_ne!(
            kind,
            TestCaseKind::Scraped,
            "scraped testcases exist only from problem initialization"
        );
        let id = self.testcases.len() + 1;
        let testcase = TestCase::with_conventional_handles(id, kind);
        let handles = testcase.entire_handles();
        store
            .write(&handles.input, &ensure_trailing_newline(input))
            .await?;
        store
            .write(&handles.output, &ensure_trailing_newline(output))
            .await?;
        self.testcases.push(testcase);
        Ok(id)
    }

    /// Removes a non-scraped testcase, deleting its content and renumbering
    /// the testcases after it (all non-scraped) so ids stay equal to the
    /// 1-based positions.
    pub async fn remove(&mut self, id: usize, store: &dyn ContentStore) -> anyhow::Result<()> {
        let idx = id
            .checked_sub(1)
            .filter(|&i| i < self.testcases.len())
            .with_context(|| format!("No testcase with id {}", id))?;

        let removed = self.testcases.remove(idx);
        removed.delete(store).await?;

        for j in idx..self.testcases.len() {
            let old = self.testcases[j].clone();
            let new_id = j + 1;
            let renumbered = TestCase::with_conventional_handles(new_id, old.kind());

            for (from, to) in [
                (&old.entire_handles().input, &renumbered.entire_handles().input),
                (
                    &old.entire_handles().output,
                    &renumbered.entire_handles().output,
                ),
            ] {
                let content = store.read(from).await?;
                store.write(to, &content).await?;
                store.remove(from).await?;
            }
            self.testcases[j] = renumbered;
        }
        Ok(())
    }

    /// Flattens the whole set into an ordered run-unit list.
    pub async fn run_units(
        &self,
        mode: TestCaseMode,
        store: &dyn ContentStore,
    ) -> anyhow::Result<Vec<RunUnit>> {
        let mut units = Vec::with_capacity(self.testcases.len());
        for testcase in &self.testcases {
            units.extend(testcase.get_testcases(mode, store).await?);
        }
        Ok(units)
    }

    /// Whether MULTIPLE mode may be requested for the whole set.
    pub async fn check_multitest_mode(&self, store: &dyn ContentStore) -> anyhow::Result<bool> {
        for testcase in &self.testcases {
            if !testcase.check_multitest_mode(store).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

pub(crate) fn ensure_trailing_newline(s: &str) -> String {
    if s.is_empty() || s.ends_with('\n') {
        s.to_owned()
    } else {
        format!("{}\n", s)
    }
}

/// Strips the fixed header and its following blank line.
fn strip_header(content: &str) -> Option<&str> {
    content.strip_prefix(MULTITEST_HEADER)?.strip_prefix('\n')
}

fn tokens_match(a: &str, b: &str) -> bool {
    a.split_whitespace().eq(b.split_whitespace())
}

/// Parses the leading count line: the first line must consist of digits
/// only.
fn leading_count(content: &str) -> Option<usize> {
    let line = content.lines().next()?;
    if !regex_is_match!(r"^[0-9]+$", line) {
        return None;
    }
    line.parse().ok()
}

/// Splits a multitest file body into groups. Every group's content keeps
/// its trailing newline; groups are separated by exactly one blank line.
fn parse_groups(body: &str) -> Vec<String> {
    body.split("\n\n")
        .map(|g| ensure_trailing_newline(g))
        .collect()
}

fn format_multitest_file(groups: &[String]) -> String {
    format!("{}\n{}", MULTITEST_HEADER, groups.join("\n"))
}

fn multitest_file_is_valid(io: IoFile, multi: &str, entire: &str, entire_input: &str) -> bool {
    let Some(body) = strip_header(multi) else {
        return false;
    };
    // guards against stale or corrupted edits
    if !tokens_match(body, entire) {
        return false;
    }
    let Some(t) = leading_count(entire_input) else {
        return false;
    };
    if t == 0 || body.contains("\n\n\n") {
        return false;
    }

    let separators = body.matches("\n\n").count();
    match io {
        IoFile::Input => leading_count(body).is_some() && separators == t,
        IoFile::Output => separators == t - 1,
    }
}

/// One-line input heuristic: after the count line, one line per subtest.
fn split_one_line_input(entire_input: &str, t: usize) -> Option<Vec<String>> {
    let mut lines = entire_input.lines();
    let count_line = lines.next()?;
    let rest: Vec<&str> = lines.collect();
    if rest.len() != t {
        return None;
    }
    let mut groups = vec![format!("{}\n", count_line)];
    groups.extend(rest.iter().map(|line| format!("{}\n", line)));
    Some(groups)
}

/// One-line output heuristic: each line is one subtest's full output.
fn split_one_line(entire_output: &str, t: usize) -> Option<Vec<String>> {
    let lines: Vec<&str> = entire_output.lines().collect();
    if lines.len() != t {
        return None;
    }
    Some(lines.iter().map(|line| format!("{}\n", line)).collect())
}

/// Yes/no output heuristic: a new group starts at every line that is
/// case-insensitively "yes" or "no"; the first line must qualify.
fn split_yes_no(entire_output: &str, t: usize) -> Option<Vec<String>> {
    let is_yes_no =
        |line: &str| line.eq_ignore_ascii_case("yes") || line.eq_ignore_ascii_case("no");

    let mut groups: Vec<String> = Vec::new();
    for line in entire_output.lines() {
        if is_yes_no(line) {
            groups.push(format!("{}\n", line));
        } else {
            let current = groups.last_mut()?;
            current.push_str(line);
            current.push('\n');
        }
    }
    (groups.len() == t).then_some(groups)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::MemStore;
    use maplit::hashmap;

    async fn scraped_single(input: &str, output: &str) -> (TestCaseSet, MultitestSplit, MemStore) {
        let store = MemStore::new();
        let (set, splits) =
            TestCaseSet::ingest_scraped(&[(input.to_owned(), output.to_owned())], &store)
                .await
                .unwrap();
        (set, splits[0], store)
    }

    #[tokio::test]
    async fn one_line_heuristic_splits_input_and_output() {
        let (set, split, store) = scraped_single("3\n1\n2\n3\n", "a\nb\nc\n").await;
        assert_eq!(
            split,
            MultitestSplit {
                input: true,
                output: true
            }
        );

        let units = set
            .run_units(TestCaseMode::Multiple, &store)
            .await
            .unwrap();
        assert_eq!(units.len(), 3);
        assert_eq!(
            units[0],
            RunUnit {
                display_id: "1-1".to_owned(),
                input: "1\n1\n".to_owned(),
                expected_output: "a\n".to_owned(),
            }
        );
        assert_eq!(units[1].display_id, "1-2");
        assert_eq!(units[1].input, "1\n2\n");
        assert_eq!(units[1].expected_output, "b\n");
        assert_eq!(units[2].display_id, "1-3");
        assert_eq!(units[2].input, "1\n3\n");
        assert_eq!(units[2].expected_output, "c\n");
    }

    #[tokio::test]
    async fn yes_no_heuristic_groups_output_lines() {
        let (set, split, store) = scraped_single("2\na\nb\n", "YES\n1\nNO\nNO\n2\n").await;
        assert_eq!(
            split,
            MultitestSplit {
                input: true,
                output: true
            }
        );

        let units = set
            .run_units(TestCaseMode::Multiple, &store)
            .await
            .unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].expected_output, "YES\n1\n");
        assert_eq!(units[1].expected_output, "NO\nNO\n2\n");
    }

    #[test]
    fn yes_no_split_requires_leading_yes_no() {
        assert_eq!(split_yes_no("1\nYES\n", 2), None);
        assert_eq!(
            split_yes_no("YES\n1\nNO\nNO\n2\n", 2),
            Some(vec!["YES\n1\n".to_owned(), "NO\nNO\n2\n".to_owned()])
        );
        // group count must match T
        assert_eq!(split_yes_no("YES\nNO\n", 3), None);
    }

    #[tokio::test]
    async fn failed_heuristics_seed_verbatim_and_invalid() {
        // two output lines per subtest and nothing yes/no-shaped
        let (set, split, store) = scraped_single("2\na\nb\n", "x\ny\nz\nw\n").await;
        assert!(split.input);
        assert!(!split.output);
        assert!(!set.check_multitest_mode(&store).await.unwrap());

        // the seeded output is the entire output under the header
        let testcase = set.get(1).unwrap();
        let seeded = store
            .read(&testcase.multitest_handles().unwrap().output)
            .await
            .unwrap();
        assert_eq!(
            seeded,
            format!("{}\n{}", MULTITEST_HEADER, "x\ny\nz\nw\n")
        );
    }

    #[tokio::test]
    #[should_panic(expected = "MULTIPLE mode requested")]
    async fn multiple_mode_on_unvalidated_testcase_is_a_bug() {
        let (set, _, store) = scraped_single("2\na\nb\n", "x\ny\nz\nw\n").await;
        let _ = set.run_units(TestCaseMode::Multiple, &store).await;
    }

    #[tokio::test]
    async fn one_mode_ignores_the_multitest_decomposition() {
        let (set, _, store) = scraped_single("3\n1\n2\n3\n", "a\nb\nc\n").await;
        let units = set.run_units(TestCaseMode::One, &store).await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].display_id, "1");
        assert_eq!(units[0].input, "3\n1\n2\n3\n");
        assert_eq!(units[0].expected_output, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn validity_check_is_idempotent() {
        let (set, _, store) = scraped_single("3\n1\n2\n3\n", "a\nb\nc\n").await;
        let testcase = set.get(1).unwrap();
        let first = testcase.check_multitest_mode(&store).await.unwrap();
        let second = testcase.check_multitest_mode(&store).await.unwrap();
        assert_eq!(first, second);
        assert!(first);
    }

    #[tokio::test]
    async fn multiple_mode_roundtrips_the_entire_content() {
        let (set, _, store) = scraped_single("3\n10 20\n30 40\n50 60\n", "a\nb\nc\n").await;
        let one = &set.run_units(TestCaseMode::One, &store).await.unwrap()[0];
        let multiple = set
            .run_units(TestCaseMode::Multiple, &store)
            .await
            .unwrap();

        let joined_outputs: String = multiple
            .iter()
            .map(|u| u.expected_output.as_str())
            .collect();
        assert_eq!(joined_outputs, one.expected_output);

        // inputs, minus the injected count line, reproduce the entire
        // input minus its count line
        let joined_inputs: String = multiple
            .iter()
            .map(|u| u.input.strip_prefix("1\n").unwrap())
            .collect();
        assert_eq!(joined_inputs, one.input.strip_prefix("3\n").unwrap());
    }

    #[tokio::test]
    async fn edits_breaking_the_token_stream_invalidate_the_file() {
        let (set, _, store) = scraped_single("2\n1\n2\n", "a\nb\n").await;
        let testcase = set.get(1).unwrap();
        assert!(testcase.check_multitests(&store).await.unwrap());

        let output_handle = &testcase.multitest_handles().unwrap().output;

        // token drift
        store
            .write(
                output_handle,
                &format!("{}\na\n\nDRIFTED\n", MULTITEST_HEADER),
            )
            .await
            .unwrap();
        assert!(!testcase
            .check_multitest_file(IoFile::Output, &store)
            .await
            .unwrap());

        // missing header
        store.write(output_handle, "a\n\nb\n").await.unwrap();
        assert!(!testcase
            .check_multitest_file(IoFile::Output, &store)
            .await
            .unwrap());

        // triple newline run
        store
            .write(output_handle, &format!("{}\na\n\n\nb\n", MULTITEST_HEADER))
            .await
            .unwrap();
        assert!(!testcase
            .check_multitest_file(IoFile::Output, &store)
            .await
            .unwrap());

        // wrong separator count (both groups merged)
        store
            .write(output_handle, &format!("{}\na\nb\n", MULTITEST_HEADER))
            .await
            .unwrap();
        assert!(!testcase
            .check_multitest_file(IoFile::Output, &store)
            .await
            .unwrap());

        // restored
        store
            .write(output_handle, &format!("{}\na\n\nb\n", MULTITEST_HEADER))
            .await
            .unwrap();
        assert!(testcase
            .check_multitest_file(IoFile::Output, &store)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn non_scraped_testcases_always_allow_multitest_mode() {
        let store = MemStore::from_entries(hashmap! {
            "1.in".to_owned() => "5\n".to_owned(),
            "1.out".to_owned() => "25\n".to_owned(),
        });
        let set = TestCaseSet::from_kinds(&[TestCaseKind::UserAdded]);
        assert!(set.check_multitest_mode(&store).await.unwrap());

        // MULTIPLE degrades to the entire testcase
        let units = set
            .run_units(TestCaseMode::Multiple, &store)
            .await
            .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].display_id, "1");
    }

    #[tokio::test]
    async fn add_and_remove_renumber_the_suffix() {
        let store = MemStore::new();
        let (mut set, _) = TestCaseSet::ingest_scraped(
            &[("1\nx\n".to_owned(), "y\n".to_owned())],
            &store,
        )
        .await
        .unwrap();

        set.add(TestCaseKind::UserAdded, "a", "b", &store)
            .await
            .unwrap();
        set.add(TestCaseKind::UserAdded, "c", "d", &store)
            .await
            .unwrap();
        assert_eq!(
            set.kinds(),
            vec![
                TestCaseKind::Scraped,
                TestCaseKind::UserAdded,
                TestCaseKind::UserAdded
            ]
        );

        set.remove(2, &store).await.unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(2).unwrap().kind(), TestCaseKind::UserAdded);

        // the former testcase 3 now lives behind the id-2 handles
        let (input, output) = set.get(2).unwrap().entire_io(&store).await.unwrap();
        assert_eq!(input, "c\n");
        assert_eq!(output, "d\n");
        assert!(!store.contains(&ContentHandle::new("3.in")));
        assert!(!store.contains(&ContentHandle::new("3.out")));
    }

    #[tokio::test]
    #[should_panic(expected = "scraped testcase")]
    async fn removing_a_scraped_testcase_is_a_bug() {
        let store = MemStore::new();
        let (mut set, _) =
            TestCaseSet::ingest_scraped(&[("1\nx\n".to_owned(), "y\n".to_owned())], &store)
                .await
                .unwrap();
        let _ = set.remove(1, &store).await;
    }

    #[test]
    fn header_is_seven_lines_plus_trailing_newline() {
        assert_eq!(MULTITEST_HEADER.lines().count(), 7);
        assert!(MULTITEST_HEADER.ends_with('\n'));
    }

    #[test]
    fn leading_count_requires_all_digits() {
        assert_eq!(leading_count("3\n1 2 3\n"), Some(3));
        assert_eq!(leading_count("12\n"), Some(12));
        assert_eq!(leading_count("3 4\n"), None);
        assert_eq!(leading_count("t\n1\n"), None);
        assert_eq!(leading_count(""), None);
    }
}
