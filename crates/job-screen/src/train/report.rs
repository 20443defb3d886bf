use std::{fs, io, path::PathBuf};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Classification,
    wordcloud::{Palette, SvgWordCloud, word_frequencies},
};

/// Number of terms kept per class; enough for a full word cloud.
const TOP_TERMS: usize = 100;
const TOP_CATEGORIES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerClass<T> {
    pub real: T,
    pub fake: T,
}

impl<T> PerClass<T> {
    pub fn get(&self, class: Classification) -> &T {
        match class {
            Classification::Real => &self.real,
            Classification::Fake => &self.fake,
        }
    }
}

/// Descriptive statistics of a labeled corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveReport {
    pub class_counts: PerClass<usize>,
    /// Most frequent non-stop-words per class.
    pub top_terms: PerClass<Vec<(String, usize)>>,
    /// Most frequent categories (e.g. industries) per class.
    pub top_categories: PerClass<Vec<(String, usize)>>,
}

fn top_categories<'a>(categories: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: AHashMap<&str, usize> = AHashMap::new();
    for category in categories {
        *counts.entry(category).or_insert(0) += 1;
    }
    let mut counts = counts
        .into_iter()
        .map(|(c, n)| (c.to_owned(), n))
        .collect::<Vec<_>>();
    counts.sort_by(|(a_name, a), (b_name, b)| b.cmp(a).then_with(|| a_name.cmp(b_name)));
    counts.truncate(TOP_CATEGORIES);
    counts
}

impl DescriptiveReport {
    /// Build the report from cleaned texts, labels and optional categories,
    /// all indexed by row.
    #[must_use]
    pub fn build(
        cleaned: &[String],
        labels: &[Classification],
        categories: &[Option<String>],
    ) -> Self {
        let per_class = |class: Classification| {
            let rows = labels
                .iter()
                .enumerate()
                .filter(move |(_, label)| **label == class)
                .map(|(idx, _)| idx);

            let text = rows
                .clone()
                .map(|idx| cleaned[idx].as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let mut terms = word_frequencies(&text);
            terms.truncate(TOP_TERMS);

            let categories =
                top_categories(rows.clone().filter_map(|idx| categories[idx].as_deref()));
            (rows.count(), terms, categories)
        };

        let (real_count, real_terms, real_categories) = per_class(Classification::Real);
        let (fake_count, fake_terms, fake_categories) = per_class(Classification::Fake);

        Self {
            class_counts: PerClass {
                real: real_count,
                fake: fake_count,
            },
            top_terms: PerClass {
                real: real_terms,
                fake: fake_terms,
            },
            top_categories: PerClass {
                real: real_categories,
                fake: fake_categories,
            },
        }
    }
}

/// Receives the descriptive report at the end of a training run.
pub trait ReportSink {
    fn publish(&self, report: &DescriptiveReport) -> io::Result<()>;
}

/// Writes `training_report.json` and one SVG word cloud per class into a
/// directory.
#[derive(Debug, Clone)]
pub struct FileReportSink {
    dir: PathBuf,
}

impl FileReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for FileReportSink {
    fn publish(&self, report: &DescriptiveReport) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_vec_pretty(report).map_err(io::Error::other)?;
        fs::write(self.dir.join("training_report.json"), json)?;

        for (class, palette, name) in [
            (Classification::Real, Palette::Viridis, "wordcloud_real.svg"),
            (Classification::Fake, Palette::Reds, "wordcloud_fake.svg"),
        ] {
            let cloud = SvgWordCloud::default().with_palette(palette);
            if let Some(svg) = cloud.render_frequencies(report.top_terms.get(class)) {
                fs::write(self.dir.join(name), svg)?;
            }
        }
        info!(dir = %self.dir.display(), "Training report written");
        Ok(())
    }
}
