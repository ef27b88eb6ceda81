//! Weighted per-field fusion of metadata candidates into one consolidated
//! record.
//!
//! Generalized from the teacher's `lookup/merge.rs` `merge_field`
//! agree/conflict grouping: instead of "do all sources agree", each
//! candidate source carries a fixed weight and the highest
//! `weight * confidence` value wins, with an agreement bonus for
//! corroborating candidates.

use chrono::Datelike;

use super::types::{BookMetadata, ConsolidatedMetadata, FieldCandidate};
use crate::text::{self, NameDictionary};

fn source_weight(source: &str) -> f64 {
    match source {
        "HierarchicalMetadataJson" => 2.0,
        "ID3Tags" => 1.0,
        "FilenameParser" => 0.6,
        s if s.contains("Folder") => 0.4,
        _ => 0.5,
    }
}

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

struct StringCandidate<'a> {
    value: &'a str,
    confidence: f64,
    source: &'a str,
}

/// Resolves one string field across candidates: best = argmax(weight *
/// confidence), tie broken by longest value; agreement bonus added for
/// each other candidate equivalent to the winner.
fn resolve_string_field(candidates: &[StringCandidate<'_>]) -> Option<FieldCandidate<String>> {
    let scored: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.value.trim().is_empty())
        .map(|(i, c)| (i, source_weight(c.source) * c.confidence))
        .collect();

    let &(best_idx, best_score) = scored.iter().max_by(|(ia, sa), (ib, sb)| {
        sa.partial_cmp(sb)
            .unwrap()
            .then_with(|| candidates[*ia].value.len().cmp(&candidates[*ib].value.len()))
    })?;

    let best = &candidates[best_idx];
    let agreeing = scored
        .iter()
        .filter(|(i, _)| text::are_equivalent(candidates[*i].value, best.value))
        .count();

    let confidence = (best_score + 0.1 * (agreeing as f64 - 1.0).max(0.0)).min(1.0);

    Some(FieldCandidate {
        value: best.value.to_string(),
        confidence,
        source: best.source.to_string(),
    })
}

struct YearCandidate<'a> {
    value: u32,
    confidence: f64,
    source: &'a str,
}

fn resolve_year_field(candidates: &[YearCandidate<'_>]) -> Option<FieldCandidate<u32>> {
    let max_year = (current_year() + 1) as u32;
    let scored: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| (1900..=max_year).contains(&c.value))
        .map(|(i, c)| (i, source_weight(c.source) * c.confidence))
        .collect();

    let &(best_idx, best_score) = scored
        .iter()
        .max_by(|(_, sa), (_, sb)| sa.partial_cmp(sb).unwrap())?;

    let best = &candidates[best_idx];
    let agreeing = scored.iter().filter(|(i, _)| candidates[*i].value == best.value).count();
    let confidence = (best_score + 0.1 * (agreeing as f64 - 1.0).max(0.0)).min(1.0);

    Some(FieldCandidate {
        value: best.value,
        confidence,
        source: best.source.to_string(),
    })
}

/// Fuses a priority-ordered list of `BookMetadata` candidates (caller
/// orders them hierarchical sidecar > folder hierarchy > ID3 > filename,
/// though the fusion itself is weight-driven and order-independent)
/// into one consolidated record.
pub struct MetadataConsolidator {
    dictionary: Option<NameDictionary>,
}

impl MetadataConsolidator {
    pub fn new(dictionary: Option<NameDictionary>) -> Self {
        Self { dictionary }
    }

    fn resolve_name(&self, field: Option<FieldCandidate<String>>) -> Option<FieldCandidate<String>> {
        field.map(|mut c| {
            c.value = text::canonicalize_whitespace(&crate::text::fix_czech_encoding(&c.value));
            if let Some(dict) = &self.dictionary {
                c.value = dict.lookup(&c.value);
            }
            c
        })
    }

    pub fn consolidate(&self, candidates: &[BookMetadata]) -> ConsolidatedMetadata {
        let string_field = |get: fn(&BookMetadata) -> Option<&str>| -> Vec<StringCandidate<'_>> {
            candidates
                .iter()
                .filter_map(|c| {
                    get(c).map(|v| StringCandidate {
                        value: v,
                        confidence: c.confidence,
                        source: c.source.as_str(),
                    })
                })
                .collect()
        };

        let title_candidates = string_field(|c| Some(c.title.as_str()).filter(|t| !t.is_empty()));
        let author_candidates = string_field(|c| c.author.as_deref());
        let series_candidates = string_field(|c| c.series.as_deref());
        let series_number_candidates = string_field(|c| c.series_number.as_deref());
        let narrator_candidates = string_field(|c| c.narrator.as_deref());
        let genre_candidates = string_field(|c| c.genre.as_deref());
        let description_candidates = string_field(|c| c.description.as_deref());

        let year_candidates: Vec<YearCandidate<'_>> = candidates
            .iter()
            .filter_map(|c| {
                c.year.map(|y| YearCandidate {
                    value: y,
                    confidence: c.confidence,
                    source: c.source.as_str(),
                })
            })
            .collect();

        let disc_number = candidates
            .iter()
            .filter(|c| c.disc_number.is_some())
            .max_by(|a, b| source_weight(&a.source).partial_cmp(&source_weight(&b.source)).unwrap())
            .map(|c| FieldCandidate {
                value: c.disc_number.unwrap(),
                confidence: c.confidence,
                source: c.source.clone(),
            });

        let title = resolve_string_field(&title_candidates);
        let author = self.resolve_name(resolve_string_field(&author_candidates));
        let narrator = self.resolve_name(resolve_string_field(&narrator_candidates));
        let series = resolve_string_field(&series_candidates);
        let series_number = resolve_string_field(&series_number_candidates);
        let genre = resolve_string_field(&genre_candidates);
        let description = resolve_string_field(&description_candidates);
        let year = resolve_year_field(&year_candidates);

        let mut sources: Vec<String> = Vec::new();
        for s in [
            title.as_ref().map(|c| c.source.clone()),
            author.as_ref().map(|c| c.source.clone()),
            series.as_ref().map(|c| c.source.clone()),
            series_number.as_ref().map(|c| c.source.clone()),
            narrator.as_ref().map(|c| c.source.clone()),
            year.as_ref().map(|c| c.source.clone()),
            genre.as_ref().map(|c| c.source.clone()),
            description.as_ref().map(|c| c.source.clone()),
        ]
        .into_iter()
        .flatten()
        {
            if !sources.contains(&s) {
                sources.push(s);
            }
        }

        let field_confidences = [
            (title.as_ref().map(|c| c.confidence), 0.30),
            (author.as_ref().map(|c| c.confidence), 0.25),
            (series.as_ref().map(|c| c.confidence), 0.15),
            (series_number.as_ref().map(|c| c.confidence), 0.10),
            (narrator.as_ref().map(|c| c.confidence), 0.10),
            (year.as_ref().map(|c| c.confidence), 0.05),
            (genre.as_ref().map(|c| c.confidence), 0.03),
            (description.as_ref().map(|c| c.confidence), 0.02),
        ];

        let (weight_sum, weighted_confidence) =
            field_confidences
                .into_iter()
                .fold((0.0, 0.0), |(ws, wc), (confidence, w)| match confidence {
                    Some(c) if c > 0.0 => (ws + w, wc + w * c),
                    _ => (ws, wc),
                });

        let overall_confidence = if weight_sum > 0.0 { weighted_confidence / weight_sum } else { 0.0 };

        ConsolidatedMetadata {
            title,
            author,
            series,
            series_number,
            narrator,
            year,
            disc_number,
            genre,
            description,
            overall_confidence,
            sources,
        }
    }
}
