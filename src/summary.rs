use crate::model::CanonicalRecord;

/// Figures behind the four top-level widgets. Picks borrow from the
/// collection they were computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryStats<'a> {
    pub total: usize,
    pub best_roic: Option<&'a CanonicalRecord>,
    pub lowest_ev_to_ebit: Option<&'a CanonicalRecord>,
    pub top_magic_formula: Option<&'a CanonicalRecord>,
}

impl SummaryStats<'_> {
    pub const fn is_empty(&self) -> bool {
        self.best_roic.is_none()
            && self.lowest_ev_to_ebit.is_none()
            && self.top_magic_formula.is_none()
    }
}

/// Every normalized record carries both metrics, so every record takes part.
/// Each pick only skips records whose own metric is not a number; a `NaN`
/// never wins a strict comparison.
pub fn aggregate(records: &[CanonicalRecord]) -> SummaryStats<'_> {
    let numeric = move |metric: fn(&CanonicalRecord) -> f64| {
        records.iter().filter(move |record| !metric(record).is_nan())
    };

    SummaryStats {
        total: records.len(),
        best_roic: first_best(numeric(|record| record.roic), |candidate, best| {
            candidate.roic > best.roic
        }),
        lowest_ev_to_ebit: first_best(numeric(|record| record.ev_to_ebit), |candidate, best| {
            candidate.ev_to_ebit < best.ev_to_ebit
        }),
        top_magic_formula: first_best(
            numeric(|record| record.magic_formula_rank),
            |candidate, best| candidate.magic_formula_rank < best.magic_formula_rank,
        ),
    }
}

/// Left-to-right reduction that only replaces the current pick on a strict
/// improvement, so the earliest of equal records wins.
fn first_best<'a, I, F>(records: I, improves: F) -> Option<&'a CanonicalRecord>
where
    I: Iterator<Item = &'a CanonicalRecord>,
    F: Fn(&CanonicalRecord, &CanonicalRecord) -> bool,
{
    records.fold(None, |best, candidate| match best {
        Some(current) if !improves(candidate, current) => Some(current),
        _ => Some(candidate),
    })
}
