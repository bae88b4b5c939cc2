//! A small from-scratch BM25 implementation: tokenize, build a document-frequency
//! table over the corpus, then score each document against a query.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

const K1: f32 = 1.5;
const B: f32 = 0.75;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+").expect("static pattern is valid"))
}

fn tokenize(text: &str) -> Vec<String> {
    token_regex().find_iter(&text.to_lowercase()).map(|m| m.as_str().to_owned()).collect()
}

/// Score every document in `corpus` against `query` using BM25 (k1 = 1.5, b = 0.75).
/// Returns one score per input document, in the same order; documents sharing no term
/// with the query score `0.0`.
#[must_use]
pub fn score_all(query: &str, corpus: &[&str]) -> Vec<f32> {
    if corpus.is_empty() {
        return Vec::new();
    }

    let query_terms = tokenize(query);
    if query_terms.is_empty() {
        return vec![0.0; corpus.len()];
    }

    let tokenized: Vec<Vec<String>> = corpus.iter().map(|d| tokenize(d)).collect();
    let doc_lengths: Vec<usize> = tokenized.iter().map(Vec::len).collect();
    #[allow(clippy::cast_precision_loss)]
    let avg_doc_len = if doc_lengths.is_empty() {
        0.0
    } else {
        doc_lengths.iter().sum::<usize>() as f32 / doc_lengths.len() as f32
    };

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for terms in &tokenized {
        let mut seen = std::collections::HashSet::new();
        for term in terms {
            if seen.insert(term.as_str()) {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let n = tokenized.len() as f32;
    let idf = |term: &str| -> f32 {
        let df = document_frequency.get(term).copied().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let df = df as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    };

    tokenized
        .iter()
        .zip(&doc_lengths)
        .map(|(terms, &len)| {
            let mut term_counts: HashMap<&str, usize> = HashMap::new();
            for term in terms {
                *term_counts.entry(term.as_str()).or_insert(0) += 1;
            }
            #[allow(clippy::cast_precision_loss)]
            let len = len as f32;
            query_terms
                .iter()
                .map(|q| {
                    let freq = term_counts.get(q.as_str()).copied().unwrap_or(0);
                    if freq == 0 {
                        return 0.0;
                    }
                    #[allow(clippy::cast_precision_loss)]
                    let freq = freq as f32;
                    let numerator = freq * (K1 + 1.0);
                    let denominator = freq + K1 * (1.0 - B + B * len / avg_doc_len.max(1.0));
                    idf(q) * numerator / denominator
                })
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_outscores_unrelated_document() {
        let corpus = ["the quick brown fox", "completely unrelated text"];
        let scores = score_all("quick fox", &corpus);
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn empty_query_scores_everything_zero() {
        let corpus = ["some text"];
        assert_eq!(score_all("", &corpus), vec![0.0]);
    }

    #[test]
    fn empty_corpus_returns_empty() {
        assert!(score_all("query", &[]).is_empty());
    }
}
