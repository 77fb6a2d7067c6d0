//! Ranking of held-out candidates and ranking-quality metrics

use serde::{Deserialize, Serialize};

/// Status label written for approved candidates
pub const APPROVED_LABEL: &str = "Aprovado";
/// Status label written for everyone else
pub const REJECTED_LABEL: &str = "Reprovado";

/// Scores closer than this are one tie group
const TIE_TOLERANCE: f64 = 1e-12;

pub fn status_label(approved: u8) -> &'static str {
    if approved == 1 {
        APPROVED_LABEL
    } else {
        REJECTED_LABEL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub candidate_id: String,
    /// Position in the original input table; breaks probability ties
    pub row: usize,
    pub approval_probability: f64,
    /// Ground truth, 0 or 1
    pub approved: u8,
}

impl RankedCandidate {
    pub fn status(&self) -> &'static str {
        status_label(self.approved)
    }
}

/// Sort by descending probability, ties by ascending original row
pub fn rank_candidates(mut candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    candidates.sort_by(|a, b| {
        b.approval_probability
            .total_cmp(&a.approval_probability)
            .then(a.row.cmp(&b.row))
    });
    candidates
}

/// Share of approved candidates among the first `k`.
/// `None` unless `1 <= k <= ranked.len()`.
pub fn precision_at_k(ranked: &[RankedCandidate], k: usize) -> Option<f64> {
    if k == 0 || k > ranked.len() {
        return None;
    }
    let hits = ranked[..k].iter().filter(|c| c.approved == 1).count();
    Some(hits as f64 / k as f64)
}

/// Precision@k for k = 1..=max_k (clamped to the list length)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionCurve {
    pub ks: Vec<usize>,
    pub precision: Vec<f64>,
    /// Approval rate over the whole list; what a random ordering scores
    pub base_rate: f64,
}

impl PrecisionCurve {
    pub fn at(&self, k: usize) -> Option<f64> {
        k.checked_sub(1).and_then(|i| self.precision.get(i).copied())
    }
}

pub fn precision_curve(ranked: &[RankedCandidate], max_k: usize) -> PrecisionCurve {
    let max_k = max_k.min(ranked.len());
    let mut ks = Vec::with_capacity(max_k);
    let mut precision = Vec::with_capacity(max_k);
    let mut hits = 0usize;
    for (i, candidate) in ranked.iter().take(max_k).enumerate() {
        hits += candidate.approved as usize;
        ks.push(i + 1);
        precision.push(hits as f64 / (i + 1) as f64);
    }

    let base_rate = if ranked.is_empty() {
        0.0
    } else {
        ranked.iter().filter(|c| c.approved == 1).count() as f64 / ranked.len() as f64
    };

    PrecisionCurve {
        ks,
        precision,
        base_rate,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub false_positive_rate: Vec<f64>,
    pub true_positive_rate: Vec<f64>,
    /// Score cut-off of each point; the first one lies above every score
    pub thresholds: Vec<f64>,
    pub auc: f64,
}

/// ROC points at every distinct score, from the strictest threshold down.
/// `None` when `labels` hold a single class, lengths differ or a score is not finite.
pub fn roc_curve(labels: &[u8], scores: &[f64]) -> Option<RocCurve> {
    if labels.len() != scores.len() || !scores.iter().all(|s| s.is_finite()) {
        return None;
    }
    let positives = labels.iter().filter(|&&y| y == 1).count() as f64;
    let negatives = labels.len() as f64 - positives;
    if positives == 0.0 || negatives == 0.0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![scores[order[0]] + 1.0];
    let mut tp = 0.0;
    let mut fp = 0.0;
    for (pos, &i) in order.iter().enumerate() {
        if labels[i] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let group_ends = order
            .get(pos + 1)
            .map_or(true, |&next| (scores[next] - scores[i]).abs() > TIE_TOLERANCE);
        if group_ends {
            fpr.push(fp / negatives);
            tpr.push(tp / positives);
            thresholds.push(scores[i]);
        }
    }

    let auc = fpr
        .windows(2)
        .zip(tpr.windows(2))
        .map(|(x, y)| (x[1] - x[0]) * (y[1] + y[0]) / 2.0)
        .sum();

    Some(RocCurve {
        false_positive_rate: fpr,
        true_positive_rate: tpr,
        thresholds,
        auc,
    })
}

/// ROC-AUC as the Mann-Whitney U statistic with average ranks for ties.
/// `None` when `labels` hold a single class, lengths differ or a score is not finite.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Option<f64> {
    if labels.len() != scores.len() || !scores.iter().all(|s| s.is_finite()) {
        return None;
    }
    let mut pairs: Vec<(f64, u8)> = scores.iter().copied().zip(labels.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total_pos = pairs.iter().filter(|(_, y)| *y == 1).count() as f64;
    let total_neg = pairs.len() as f64 - total_pos;
    if total_pos == 0.0 || total_neg == 0.0 {
        return None;
    }

    let n = pairs.len();
    let mut rank_sum_pos = 0.0;
    let mut seen = 0.0;
    let mut i = 0;
    while i < n {
        let value = pairs[i].0;
        let mut j = i;
        while j < n && (pairs[j].0 - value).abs() <= TIE_TOLERANCE {
            j += 1;
        }

        let group = (j - i) as f64;
        // ranks seen+1 ..= seen+group share their mean
        let avg_rank = seen + (group + 1.0) / 2.0;
        let group_pos = pairs[i..j].iter().filter(|(_, y)| *y == 1).count() as f64;
        rank_sum_pos += avg_rank * group_pos;

        seen += group;
        i = j;
    }

    let u = rank_sum_pos - total_pos * (total_pos + 1.0) / 2.0;
    Some((u / (total_pos * total_neg)).clamp(0.0, 1.0))
}
