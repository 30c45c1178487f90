//! Okapi BM25 scoring over a tokenized corpus.

use std::collections::HashMap;

pub const DEFAULT_K1: f64 = 1.5;
pub const DEFAULT_B: f64 = 0.75;

/// Inverted index with BM25 weights, rebuilt whole on every corpus change.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    k1: f64,
    b: f64,
    avg_len: f64,
    doc_lens: Vec<usize>,
    /// term -> (document index, term frequency)
    postings: HashMap<String, Vec<(usize, u32)>>,
    idf: HashMap<String, f64>,
}

impl Bm25Index {
    pub fn new(corpus: &[Vec<String>]) -> Self {
        Self::with_params(corpus, DEFAULT_K1, DEFAULT_B)
    }

    fn with_params(corpus: &[Vec<String>], k1: f64, b: f64) -> Self {
        let mut postings: HashMap<String, Vec<(usize, u32)>> = HashMap::new();
        let mut doc_lens = Vec::with_capacity(corpus.len());

        for (idx, tokens) in corpus.iter().enumerate() {
            doc_lens.push(tokens.len());
            let mut freqs: HashMap<&str, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token.as_str()).or_default() += 1;
            }
            for (term, freq) in freqs {
                postings.entry(term.to_string()).or_default().push((idx, freq));
            }
        }

        let total: usize = doc_lens.iter().sum();
        let avg_len = if total == 0 {
            1.0
        } else {
            total as f64 / corpus.len() as f64
        };

        let n = corpus.len() as f64;
        let idf = postings
            .iter()
            .map(|(term, docs)| {
                let df = docs.len() as f64;
                (term.clone(), (1.0 + (n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        Self {
            k1,
            b,
            avg_len,
            doc_lens,
            postings,
            idf,
        }
    }

    /// Score every document against the query, in corpus order.
    ///
    /// Repeated query terms count once per occurrence.
    pub fn scores(&self, query: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_lens.len()];
        for term in query {
            let (Some(docs), Some(idf)) = (self.postings.get(term), self.idf.get(term)) else {
                continue;
            };
            for &(idx, freq) in docs {
                let tf = f64::from(freq);
                let norm = 1.0 - self.b + self.b * self.doc_lens[idx] as f64 / self.avg_len;
                scores[idx] += idf * tf * (self.k1 + 1.0) / (tf + self.k1 * norm);
            }
        }
        scores
    }

    /// Indices of the `k` best documents, best first.
    ///
    /// Equal scores keep corpus order.
    pub fn top_k(&self, query: &[String], k: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.scores(query).into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        ranked
    }
}
