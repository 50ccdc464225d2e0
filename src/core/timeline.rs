//! Effective-dated rate resolution
//!
//! A [`RateTimeline`] holds the admin-fee rates found around one section
//! header. Dated entries apply from their effective date until a later entry
//! supersedes them; a static entry (no date) applies from the beginning of
//! time. Nothing ever expires.

use crate::types::{Effective, PayDate, PeriodSpan, RateEntry};
use serde::Serialize;

/// How a period's rate was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    /// Latest entry effective on or before the period's start date
    StartDate,
    /// Full-month span whose month carries a mid-month effective entry
    FullMonthOverride,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedRate {
    pub rate: f64,
    pub basis: RateBasis,
}

/// Sorted rate entries with at most one static fallback
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateTimeline {
    entries: Vec<RateEntry>,
}

impl RateTimeline {
    /// Build a timeline from entries in discovery order.
    ///
    /// Non-positive rates are dropped, only the first static entry is kept and
    /// the rest are sorted ascending by effective date (static first).
    pub fn new(entries: impl IntoIterator<Item = RateEntry>) -> Self {
        let mut kept: Vec<RateEntry> = Vec::new();
        let mut has_static = false;

        for entry in entries {
            if !entry.rate.is_finite() || entry.rate <= 0.0 {
                continue;
            }
            if entry.effective == Effective::Static {
                if has_static {
                    continue;
                }
                has_static = true;
            }
            kept.push(entry);
        }

        // stable: equal dates keep discovery order, so the later one wins
        kept.sort_by_key(|e| e.effective);
        Self { entries: kept }
    }

    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn static_rate(&self) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.effective == Effective::Static)
            .map(|e| e.rate)
    }

    /// Rate in force on `date`, `0.0` when nothing applies
    pub fn rate_on(&self, date: PayDate) -> f64 {
        let mut applicable = 0.0;
        for entry in &self.entries {
            match entry.effective {
                Effective::Static => applicable = entry.rate,
                Effective::On(effective) if effective <= date => applicable = entry.rate,
                Effective::On(_) => break,
            }
        }
        applicable
    }

    /// Month-granular lookup: latest entry whose `(year, month)` is on or
    /// before the target. Diagnostic only; billing goes through
    /// [`rate_for_period`](Self::rate_for_period).
    pub fn rate_for_month(&self, month: u32, year: i32) -> f64 {
        let mut applicable = 0.0;
        for entry in &self.entries {
            match entry.effective {
                Effective::Static => applicable = entry.rate,
                Effective::On(d) if (d.year, d.month) <= (year, month) => applicable = entry.rate,
                Effective::On(_) => break,
            }
        }
        applicable
    }

    /// Rate of the latest entry effective after the 1st of `month`/`year`
    pub fn mid_month_rate(&self, month: u32, year: i32) -> Option<f64> {
        self.entries
            .iter()
            .filter_map(|e| e.effective_date().map(|d| (d, e.rate)))
            .filter(|(d, _)| d.is_in_month(month, year) && d.day > 1)
            .map(|(_, rate)| rate)
            .last()
    }

    pub fn resolve(&self, span: &PeriodSpan) -> ResolvedRate {
        if span.is_full_month() {
            if let Some(rate) = self.mid_month_rate(span.start.month, span.start.year) {
                return ResolvedRate {
                    rate,
                    basis: RateBasis::FullMonthOverride,
                };
            }
        }
        ResolvedRate {
            rate: self.rate_on(span.start),
            basis: RateBasis::StartDate,
        }
    }

    /// Rate for a whole period: the full-month override when it applies,
    /// otherwise the rate on the start date
    pub fn rate_for_period(&self, span: &PeriodSpan) -> f64 {
        self.resolve(span).rate
    }
}
