//! Element-set text parser.
//!
//! Scans raw text one line at a time and yields candidate records from named
//! (name + two element lines) or bare (two element lines) groups. A line that
//! cannot start a group is dropped and counted as skipped; the scan then
//! resumes at the next line, so a malformed group never absorbs a neighbour.
//!
//! Groups whose prefixes match but whose lines fail the structural checks
//! (column count, checksum, matching catalog numbers) are yielded as
//! [`ParseRejection`]s rather than dropped silently.

use std::collections::VecDeque;
use std::iter::Enumerate;

use orbitwatch_core::{ElementPair, Error};
use tracing::debug;

/// Column count of a well-formed element line.
pub const ELEMENT_LINE_LEN: usize = 69;

/// A structurally valid element group, not yet checked by a propagator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub name: String,
    pub elements: ElementPair,
    /// 1-based line number of the first element line.
    pub line_number: usize,
}

/// A group that looked like an element set but failed structural checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRejection {
    pub name: String,
    pub line_number: usize,
    pub reason: String,
}

impl From<ParseRejection> for Error {
    fn from(r: ParseRejection) -> Self {
        Error::Parse(format!("{} (line {}): {}", r.name, r.line_number, r.reason))
    }
}

/// Lazy, single-pass parser over element-set text.
pub struct ElementSetParser<'a, I>
where
    I: Iterator<Item = &'a str>,
{
    lines: Enumerate<I>,
    window: VecDeque<(usize, &'a str)>,
    skipped: usize,
    rejected: usize,
}

impl<'a> ElementSetParser<'a, std::str::Lines<'a>> {
    pub fn new(text: &'a str) -> Self {
        Self::from_lines(text.lines())
    }
}

impl<'a, I> ElementSetParser<'a, I>
where
    I: Iterator<Item = &'a str>,
{
    pub fn from_lines(lines: I) -> Self {
        Self {
            lines: lines.enumerate(),
            window: VecDeque::with_capacity(3),
            skipped: 0,
            rejected: 0,
        }
    }

    /// Lines dropped because they could not start a group.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// Groups yielded as [`ParseRejection`] so far.
    pub fn rejected_groups(&self) -> usize {
        self.rejected
    }

    fn fill(&mut self) {
        while self.window.len() < 3 {
            match self.lines.next() {
                Some((idx, raw)) => {
                    let line = raw.trim();
                    if !line.is_empty() {
                        self.window.push_back((idx + 1, line));
                    }
                }
                None => break,
            }
        }
    }

    fn take_group(&mut self, named: bool) -> Result<CandidateRecord, ParseRejection> {
        let name_line = if named {
            self.window.pop_front().map(|(_, l)| l)
        } else {
            None
        };
        let (line_number, line1) = self.window.pop_front().unwrap_or_default();
        let (_, line2) = self.window.pop_front().unwrap_or_default();

        let elements = ElementPair::new(line1, line2);
        let name = name_line
            .map(clean_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                format!("Object-{}", elements.catalog_number().unwrap_or("unknown"))
            });

        match check_structure(line1, line2) {
            Ok(()) => Ok(CandidateRecord {
                name,
                elements,
                line_number,
            }),
            Err(reason) => {
                self.rejected += 1;
                debug!("Rejected {} at line {}: {}", name, line_number, reason);
                Err(ParseRejection {
                    name,
                    line_number,
                    reason,
                })
            }
        }
    }
}

impl<'a, I> Iterator for ElementSetParser<'a, I>
where
    I: Iterator<Item = &'a str>,
{
    type Item = Result<CandidateRecord, ParseRejection>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.fill();
            // A single trailing line can never complete a group.
            if self.window.len() < 2 {
                return None;
            }

            let first = self.window[0].1;
            let second = self.window[1].1;

            if is_line1(first) && is_line2(second) {
                return Some(self.take_group(false));
            }

            if let Some(&(_, third)) = self.window.get(2) {
                if !is_element_line(first) && is_line1(second) && is_line2(third) {
                    return Some(self.take_group(true));
                }
            }

            if let Some((line_number, _)) = self.window.pop_front() {
                self.skipped += 1;
                debug!("Skipping line {}: does not start an element group", line_number);
            }
        }
    }
}

fn is_line1(line: &str) -> bool {
    line.starts_with("1 ")
}

fn is_line2(line: &str) -> bool {
    line.starts_with("2 ")
}

fn is_element_line(line: &str) -> bool {
    is_line1(line) || is_line2(line)
}

/// Three-line feeds sometimes prefix the name with `"0 "`.
fn clean_name(line: &str) -> String {
    line.strip_prefix("0 ").unwrap_or(line).trim().to_string()
}

/// Modulo-10 checksum over the first 68 columns: digits count their value,
/// minus signs count one, everything else counts zero.
pub fn element_checksum(line: &str) -> u8 {
    let sum: u32 = line
        .bytes()
        .take(ELEMENT_LINE_LEN - 1)
        .map(|b| match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

fn check_line(line: &str, which: u8) -> Result<(), String> {
    if !line.is_ascii() {
        return Err(format!("line {} contains non-ASCII characters", which));
    }
    if line.len() != ELEMENT_LINE_LEN {
        return Err(format!(
            "line {} has {} columns, expected {}",
            which,
            line.len(),
            ELEMENT_LINE_LEN
        ));
    }
    let declared = line.as_bytes()[ELEMENT_LINE_LEN - 1];
    if !declared.is_ascii_digit() {
        return Err(format!("line {} has no checksum digit", which));
    }
    let expected = element_checksum(line);
    if declared - b'0' != expected {
        return Err(format!(
            "line {} checksum {} does not match computed {}",
            which,
            declared - b'0',
            expected
        ));
    }
    Ok(())
}

fn check_structure(line1: &str, line2: &str) -> Result<(), String> {
    check_line(line1, 1)?;
    check_line(line2, 2)?;
    let (a, b) = (line1[2..7].trim(), line2[2..7].trim());
    if a != b {
        return Err(format!("catalog numbers differ: {} vs {}", a, b));
    }
    Ok(())
}
