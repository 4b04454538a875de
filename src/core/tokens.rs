//! Per-turn token usage, kept as three parallel series for charting.

use serde::{Deserialize, Serialize};

use crate::api::AskResponse;

/// Token counts for one turn, exactly as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

impl TokenUsage {
    pub fn new(prompt: u64, completion: u64, total: u64) -> Self {
        Self {
            prompt,
            completion,
            total,
        }
    }
}

impl From<&AskResponse> for TokenUsage {
    fn from(response: &AskResponse) -> Self {
        Self::new(
            response.prompt_tokens,
            response.completion_tokens,
            response.total_tokens,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSample {
    pub index: usize,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenField {
    Prompt,
    Completion,
    Total,
}

impl TokenField {
    pub const ALL: [TokenField; 3] = [TokenField::Prompt, TokenField::Completion, TokenField::Total];

    pub fn label(self) -> &'static str {
        match self {
            TokenField::Prompt => "Prompt Tokens",
            TokenField::Completion => "Completion Tokens",
            TokenField::Total => "Total Tokens",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TokenSeries {
    samples: Vec<TokenSample>,
    prompt: Vec<u64>,
    completion: Vec<u64>,
    total: Vec<u64>,
    current: TokenUsage,
}

impl TokenSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, usage: TokenUsage) {
        let index = self.samples.len();
        self.samples.push(TokenSample { index, usage });
        self.prompt.push(usage.prompt);
        self.completion.push(usage.completion);
        self.total.push(usage.total);
        self.current = usage;
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.prompt.clear();
        self.completion.clear();
        self.total.clear();
        self.current = TokenUsage::default();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TokenSample] {
        &self.samples
    }

    pub fn series(&self, field: TokenField) -> &[u64] {
        match field {
            TokenField::Prompt => &self.prompt,
            TokenField::Completion => &self.completion,
            TokenField::Total => &self.total,
        }
    }

    /// Values shown in the current-usage fields.
    pub fn current(&self) -> TokenUsage {
        self.current
    }

    pub fn points(&self, field: TokenField) -> Vec<(f64, f64)> {
        self.series(field)
            .iter()
            .enumerate()
            .map(|(index, value)| (index as f64, *value as f64))
            .collect()
    }

    /// X-axis labels, one per sample.
    pub fn labels(&self) -> Vec<String> {
        (0..self.len()).map(|index| format!("Prompt {index}")).collect()
    }

    /// Upper bound for the y axis: the largest value seen, at least 1.
    pub fn y_max(&self) -> u64 {
        TokenField::ALL
            .iter()
            .flat_map(|field| self.series(*field).iter().copied())
            .max()
            .unwrap_or(0)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_track_every_record_call() {
        let usages = [
            TokenUsage::new(5, 3, 8),
            TokenUsage::new(0, 0, 0),
            TokenUsage::new(120, 480, 600),
            TokenUsage::new(7, 2, 1),
        ];
        let mut series = TokenSeries::new();
        for usage in usages {
            series.record(usage);
        }

        assert_eq!(series.len(), usages.len());
        for field in TokenField::ALL {
            assert_eq!(series.series(field).len(), usages.len());
        }
        for (i, usage) in usages.iter().enumerate() {
            assert_eq!(series.samples()[i].index, i);
            assert_eq!(series.series(TokenField::Prompt)[i], usage.prompt);
            assert_eq!(series.series(TokenField::Completion)[i], usage.completion);
            assert_eq!(series.series(TokenField::Total)[i], usage.total);
        }
        assert_eq!(series.current(), TokenUsage::new(7, 2, 1));
    }

    #[test]
    fn inconsistent_totals_are_kept_verbatim() {
        let mut series = TokenSeries::new();
        series.record(TokenUsage::new(1, 1, 10));
        assert_eq!(series.series(TokenField::Total), &[10]);
    }

    #[test]
    fn reset_empties_series_and_zeroes_current() {
        let mut series = TokenSeries::new();
        series.record(TokenUsage::new(5, 3, 8));
        series.record(TokenUsage::new(2, 2, 4));
        series.reset();

        assert!(series.is_empty());
        for field in TokenField::ALL {
            assert!(series.series(field).is_empty());
            assert!(series.points(field).is_empty());
        }
        assert_eq!(series.current(), TokenUsage::default());
        assert!(series.labels().is_empty());
    }

    #[test]
    fn indices_restart_after_reset() {
        let mut series = TokenSeries::new();
        series.record(TokenUsage::new(1, 1, 2));
        series.reset();
        series.record(TokenUsage::new(3, 3, 6));
        assert_eq!(series.samples()[0].index, 0);
        assert_eq!(series.labels(), vec!["Prompt 0".to_string()]);
    }

    #[test]
    fn chart_points_follow_sample_order() {
        let mut series = TokenSeries::new();
        series.record(TokenUsage::new(5, 3, 8));
        series.record(TokenUsage::new(10, 20, 30));
        assert_eq!(
            series.points(TokenField::Completion),
            vec![(0.0, 3.0), (1.0, 20.0)]
        );
        assert_eq!(series.y_max(), 30);
        assert_eq!(TokenSeries::new().y_max(), 1);
    }
}
