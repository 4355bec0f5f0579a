// ABOUTME: Heading-sectioned release-notes extraction: tokenizer plus section state machine.
// ABOUTME: Date headings open sections, feature headings open announcements, other blocks form descriptions.

//! Sectioned release-notes extraction.
//!
//! A release-notes page is a flat run of block-level siblings. The tokenizer
//! classifies each sibling into a [`Block`]; [`SectionMachine`] then walks the
//! blocks with three states:
//!
//! - `NoSection`: before the first date heading. Everything is dropped.
//! - `InDateSection`: after a date heading, before its first feature heading.
//!   Content here belongs to no announcement and is dropped.
//! - `InFeature`: after a feature heading. Content accumulates into the
//!   description until the next feature heading, date heading or end.
//!
//! A date-level heading whose text is not a date is classified as content,
//! so it never opens or closes a section.

use std::collections::HashSet;

use chrono::NaiveDate;
use ego_tree::NodeId;
use scraper::{ElementRef, Html};

use crate::date_parse::parse_heading_date;

/// Heading tags that delimit date sections and announcements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLayout {
    pub date_tag: String,
    pub feature_tag: String,
}

impl Default for SectionLayout {
    fn default() -> Self {
        Self {
            date_tag: "h2".to_string(),
            feature_tag: "h3".to_string(),
        }
    }
}

/// One block-level sibling, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Date-level heading whose text parsed as a date.
    DateHeading(NaiveDate),
    /// Feature-level heading with its trimmed text.
    FeatureHeading(String),
    /// Any other block, with its text fragments trimmed and space-joined.
    Content(String),
}

/// An announcement before it is tied to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub release_date: NaiveDate,
    pub feature_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionState {
    NoSection,
    InDateSection {
        date: NaiveDate,
    },
    InFeature {
        date: NaiveDate,
        title: String,
        parts: Vec<String>,
    },
}

/// Walks a block stream and emits announcements in document order.
#[derive(Debug)]
pub struct SectionMachine {
    state: SectionState,
    out: Vec<Announcement>,
}

impl Default for SectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionMachine {
    pub fn new() -> Self {
        Self {
            state: SectionState::NoSection,
            out: Vec::new(),
        }
    }

    pub fn state(&self) -> &SectionState {
        &self.state
    }

    /// Announcements completed so far.
    pub fn completed(&self) -> &[Announcement] {
        &self.out
    }

    pub fn push(&mut self, block: Block) {
        let state = std::mem::replace(&mut self.state, SectionState::NoSection);
        self.state = match (state, block) {
            (state, Block::DateHeading(date)) => {
                self.close(state);
                SectionState::InDateSection { date }
            }
            (SectionState::NoSection, Block::FeatureHeading(_)) => SectionState::NoSection,
            (SectionState::InDateSection { date }, Block::FeatureHeading(title)) => {
                SectionState::InFeature {
                    date,
                    title,
                    parts: Vec::new(),
                }
            }
            (SectionState::InFeature { date, title: prev, parts }, Block::FeatureHeading(title)) => {
                self.emit(date, prev, parts);
                SectionState::InFeature {
                    date,
                    title,
                    parts: Vec::new(),
                }
            }
            (
                SectionState::InFeature {
                    date,
                    title,
                    mut parts,
                },
                Block::Content(text),
            ) => {
                if !text.is_empty() {
                    parts.push(text);
                }
                SectionState::InFeature { date, title, parts }
            }
            (state, Block::Content(_)) => state,
        };
    }

    /// Closes any open announcement and returns everything emitted.
    pub fn finish(mut self) -> Vec<Announcement> {
        let state = std::mem::replace(&mut self.state, SectionState::NoSection);
        self.close(state);
        self.out
    }

    fn close(&mut self, state: SectionState) {
        if let SectionState::InFeature { date, title, parts } = state {
            self.emit(date, title, parts);
        }
    }

    fn emit(&mut self, date: NaiveDate, title: String, parts: Vec<String>) {
        self.out.push(Announcement {
            release_date: date,
            feature_name: title,
            description: parts.join(" ").trim().to_string(),
        });
    }
}

/// Runs the state machine over a block stream.
pub fn sections_from_blocks<I>(blocks: I) -> Vec<Announcement>
where
    I: IntoIterator<Item = Block>,
{
    let mut machine = SectionMachine::new();
    for block in blocks {
        machine.push(block);
    }
    machine.finish()
}

/// Splits a document into sibling runs, one per distinct parent of a
/// date-level heading, each classified into blocks. Runs are in document order.
pub fn tokenize(html: &str, layout: &SectionLayout) -> Vec<Vec<Block>> {
    let doc = Html::parse_document(html);
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut runs = Vec::new();

    for node in doc.tree.root().descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if !el.value().name().eq_ignore_ascii_case(&layout.date_tag) {
            continue;
        }
        let Some(parent) = node.parent() else {
            continue;
        };
        if !seen.insert(parent.id()) {
            continue;
        }
        let run: Vec<Block> = parent
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| classify(child, layout))
            .collect();
        runs.push(run);
    }

    runs
}

/// Extracts announcements from a whole page. Each sibling run is walked
/// independently, so a section never spans two containers.
pub fn extract_announcements(html: &str, layout: &SectionLayout) -> Vec<Announcement> {
    tokenize(html, layout)
        .into_iter()
        .flat_map(sections_from_blocks)
        .collect()
}

fn classify(el: ElementRef, layout: &SectionLayout) -> Block {
    let name = el.value().name();
    if name.eq_ignore_ascii_case(&layout.date_tag) {
        let text = heading_text(el);
        match parse_heading_date(&text) {
            Some(date) => Block::DateHeading(date),
            None => Block::Content(block_text(el)),
        }
    } else if name.eq_ignore_ascii_case(&layout.feature_tag) {
        Block::FeatureHeading(heading_text(el))
    } else {
        Block::Content(block_text(el))
    }
}

fn heading_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn block_text(el: ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
