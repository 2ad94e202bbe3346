//! Aligns two labeled-amount lists whose vocabularies never quite agree
//! (billing-summary names vs. management-report himoku). Matching is
//! greedy and one-shot per left-hand entry, with no backtracking and no
//! global assignment. That is a deliberate simplicity trade-off; the
//! output is deterministic and complete, not optimal.

/// Placeholder label for an entry with no counterpart on the other side.
pub const NO_COUNTERPART: &str = "該当なし";

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledAmount {
    pub label: String,
    pub amount: i64,
}

impl LabeledAmount {
    pub fn new(label: &str, amount: i64) -> Self {
        LabeledAmount { label: label.to_string(), amount }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MismatchRow {
    pub label_a: String,
    pub amount_a: i64,
    pub label_b: String,
    pub amount_b: i64,
}

impl MismatchRow {
    pub fn is_discrepancy(&self) -> bool {
        self.amount_a != self.amount_b
    }
}

/// Pairs every entry of `list_a` with its most similar unused entry of
/// `list_b` at or above `cutoff` (first-best wins on equal similarity).
/// The result carries one row per `list_a` entry plus one per leftover
/// `list_b` entry, so nothing is silently dropped; callers filter with
/// [`MismatchRow::is_discrepancy`] for display.
pub fn match_labeled_amounts(
    list_a: &[LabeledAmount],
    list_b: &[LabeledAmount],
    cutoff: f32,
) -> Vec<MismatchRow> {
    let mut used = vec![false; list_b.len()];
    let mut rows = Vec::with_capacity(list_a.len());

    for a in list_a {
        let mut best: Option<(usize, f32)> = None;
        for (i, b) in list_b.iter().enumerate() {
            if used[i] {
                continue;
            }
            let score = similarity(&a.label, &b.label);
            if score < cutoff {
                continue;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        match best {
            Some((i, _)) => {
                used[i] = true;
                rows.push(MismatchRow {
                    label_a: a.label.clone(),
                    amount_a: a.amount,
                    label_b: list_b[i].label.clone(),
                    amount_b: list_b[i].amount,
                });
            }
            None => rows.push(MismatchRow {
                label_a: a.label.clone(),
                amount_a: a.amount,
                label_b: NO_COUNTERPART.to_string(),
                amount_b: 0,
            }),
        }
    }

    for (i, b) in list_b.iter().enumerate() {
        if !used[i] {
            rows.push(MismatchRow {
                label_a: NO_COUNTERPART.to_string(),
                amount_a: 0,
                label_b: b.label.clone(),
                amount_b: b.amount,
            });
        }
    }

    rows
}

/// Similarity in [0.0, 1.0]: 1 − edit distance / longer length, over
/// chars rather than bytes so multi-byte himoku names score sanely.
fn similarity(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(&a, &b) as f32 / max_len as f32)
}

/// Two-row Levenshtein over char slices.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    let (a, b) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let (m, n) = (a.len(), b.len());
    if m == 0 {
        return n;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}
