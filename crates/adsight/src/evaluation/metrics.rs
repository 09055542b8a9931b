//! Text overlap metrics
//!
//! - ROUGE-1: clipped unigram overlap F-measure
//! - ROUGE-L: longest common subsequence F-measure
//! - Token F1: overlap of lowercase whitespace token sets
//!
//! ROUGE tokens are lowercased, split on anything outside `[a-z0-9]` and
//! stemmed with the English Snowball stemmer when longer than three characters.

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

static STEMMER: Lazy<Stemmer> = Lazy::new(|| Stemmer::create(Algorithm::English));

/// Scores for one output/reference pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairScores {
  pub rouge1: f64,
  pub rouge_l: f64,
  pub f1: f64,
}

impl PairScores {
  pub fn compute(output: &str, reference: &str) -> Self {
    let output_tokens = rouge_tokens(output);
    let reference_tokens = rouge_tokens(reference);

    Self {
      rouge1: rouge1(&output_tokens, &reference_tokens),
      rouge_l: rouge_l(&output_tokens, &reference_tokens),
      f1: token_f1(output, reference),
    }
  }
}

/// Tokenize the way ROUGE scoring expects
pub fn rouge_tokens(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
    .filter(|token| !token.is_empty())
    .map(|token| {
      if token.len() > 3 {
        STEMMER.stem(token).into_owned()
      } else {
        token.to_string()
      }
    })
    .collect()
}

/// ROUGE-1 F-measure over pre-tokenized text
pub fn rouge1(output: &[String], reference: &[String]) -> f64 {
  if output.is_empty() || reference.is_empty() {
    return 0.0;
  }

  let output_counts = counts(output);
  let reference_counts = counts(reference);
  let overlap: usize = output_counts
    .iter()
    .map(|(token, &n)| n.min(reference_counts.get(token).copied().unwrap_or(0)))
    .sum();

  f_measure(overlap, output.len(), reference.len())
}

/// ROUGE-L F-measure over pre-tokenized text
pub fn rouge_l(output: &[String], reference: &[String]) -> f64 {
  if output.is_empty() || reference.is_empty() {
    return 0.0;
  }
  f_measure(lcs_length(output, reference), output.len(), reference.len())
}

/// Token-set F1 on lowercase whitespace-split text
pub fn token_f1(output: &str, reference: &str) -> f64 {
  let output_lower = output.to_lowercase();
  let reference_lower = reference.to_lowercase();
  let output_set: HashSet<&str> = output_lower.split_whitespace().collect();
  let reference_set: HashSet<&str> = reference_lower.split_whitespace().collect();

  if output_set.is_empty() || reference_set.is_empty() {
    return 0.0;
  }

  let common = output_set.intersection(&reference_set).count();
  f_measure(common, output_set.len(), reference_set.len())
}

fn counts(tokens: &[String]) -> HashMap<&str, usize> {
  let mut counts = HashMap::new();
  for token in tokens {
    *counts.entry(token.as_str()).or_insert(0) += 1;
  }
  counts
}

fn f_measure(overlap: usize, output_len: usize, reference_len: usize) -> f64 {
  let precision = overlap as f64 / output_len as f64;
  let recall = overlap as f64 / reference_len as f64;
  if precision + recall == 0.0 {
    0.0
  } else {
    2.0 * precision * recall / (precision + recall)
  }
}

/// Longest common subsequence length, two-row dynamic programming
fn lcs_length(a: &[String], b: &[String]) -> usize {
  let mut previous = vec![0usize; b.len() + 1];
  let mut current = vec![0usize; b.len() + 1];

  for token_a in a {
    for (j, token_b) in b.iter().enumerate() {
      current[j + 1] = if token_a == token_b {
        previous[j] + 1
      } else {
        previous[j + 1].max(current[j])
      };
    }
    std::mem::swap(&mut previous, &mut current);
  }

  previous[b.len()]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
  }

  #[test]
  fn test_token_f1_partial_overlap() {
    // P = 2/3, R = 2/4
    let f1 = token_f1("increase ad spend", "increase your ad spend");
    assert!(close(f1, 0.571), "got {f1}");
  }

  #[test]
  fn test_token_f1_is_case_insensitive_and_set_based() {
    assert!(close(token_f1("Spend spend SPEND", "spend"), 1.0));
    assert_eq!(token_f1("", "spend"), 0.0);
    assert_eq!(token_f1("spend", "   "), 0.0);
    assert_eq!(token_f1("alpha", "beta"), 0.0);
  }

  #[test]
  fn test_identical_text_scores_one() {
    let text = "Use carousel ads for e-commerce campaigns";
    let scores = PairScores::compute(text, text);
    assert!(close(scores.rouge1, 1.0));
    assert!(close(scores.rouge_l, 1.0));
    assert!(close(scores.f1, 1.0));
  }

  #[test]
  fn test_rouge_uses_stems() {
    let scores = PairScores::compute("increasing budgets", "increase budget");
    assert!(close(scores.rouge1, 1.0), "got {}", scores.rouge1);
    assert_eq!(scores.f1, 0.0);
  }

  #[test]
  fn test_stems_follow_snowball_english() {
    // Snowball exception list; the original Porter stemmer yields "dy"
    assert_eq!(rouge_tokens("dying"), vec!["die"]);
  }

  #[test]
  fn test_rouge_tokens_split_on_punctuation() {
    assert_eq!(rouge_tokens("E-commerce, CTR!"), vec!["e", "commerc", "ctr"]);
  }

  #[test]
  fn test_rouge_l_respects_order() {
    let output = rouge_tokens("cat the sat");
    let reference = rouge_tokens("the cat sat");
    assert!(close(rouge1(&output, &reference), 1.0));
    // LCS of 2
    assert!(close(rouge_l(&output, &reference), 2.0 / 3.0));
  }

  #[test]
  fn test_rouge1_clips_repeated_tokens() {
    let output = rouge_tokens("ads ads ads");
    let reference = rouge_tokens("ads");
    // overlap 1: P = 1/3, R = 1
    assert!(close(rouge1(&output, &reference), 0.5));
  }

  #[test]
  fn test_lcs_length() {
    let a: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    let b: Vec<String> = ["a", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
    assert_eq!(lcs_length(&a, &b), 3);
    assert_eq!(lcs_length(&a, &[]), 0);
  }

  #[test]
  fn test_empty_side_scores_zero() {
    let scores = PairScores::compute("", "reference text");
    assert_eq!(scores, PairScores { rouge1: 0.0, rouge_l: 0.0, f1: 0.0 });
  }
}
