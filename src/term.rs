//! Choosing which term a request is about when the caller did not say.
//!
//! The aggregation engine always takes an explicit term id. This module is the
//! policy callers use to obtain one; it never falls back to list order.

use chrono::NaiveDate;

use crate::calc::{CalcError, Term};

/// Resolve the term a request should use.
///
/// 1. An explicit id wins, if it names a known term.
/// 2. Otherwise the single term flagged active.
/// 3. Otherwise the most recently started term that has not ended by `today`.
pub fn resolve_term<'a>(
    terms: &'a [Term],
    explicit: Option<&str>,
    today: NaiveDate,
) -> Result<&'a Term, CalcError> {
    if let Some(id) = explicit {
        return terms
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CalcError::UnknownTerm(id.to_string()));
    }

    let active: Vec<&Term> = terms.iter().filter(|t| t.is_active).collect();
    if active.len() == 1 {
        return Ok(active[0]);
    }

    match current_by_dates(terms, today) {
        Ok(t) => {
            tracing::debug!(
                term_id = %t.id,
                active = active.len(),
                "no single active term; picked by dates"
            );
            Ok(t)
        }
        Err(mut candidates) => {
            if candidates.is_empty() {
                candidates = active.iter().map(|t| t.id.clone()).collect();
            }
            candidates.sort();
            Err(CalcError::AmbiguousActiveTerm(candidates))
        }
    }
}

/// Most recently started, not yet ended term. On failure returns the ids that
/// tied for the latest start (empty when nothing is in progress).
fn current_by_dates(terms: &[Term], today: NaiveDate) -> Result<&Term, Vec<String>> {
    let in_progress: Vec<(&Term, NaiveDate)> = terms
        .iter()
        .filter_map(|t| {
            let start = t.starts_on?;
            let not_ended = t.ends_on.map(|end| end >= today).unwrap_or(true);
            (start <= today && not_ended).then_some((t, start))
        })
        .collect();

    let Some(latest) = in_progress.iter().map(|(_, start)| *start).max() else {
        return Err(Vec::new());
    };
    let newest: Vec<&Term> = in_progress
        .iter()
        .filter(|(_, start)| *start == latest)
        .map(|(t, _)| *t)
        .collect();
    if newest.len() == 1 {
        Ok(newest[0])
    } else {
        Err(newest.iter().map(|t| t.id.clone()).collect())
    }
}
