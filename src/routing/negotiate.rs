//! Method and media-type negotiation among path-matched routes.
//!
//! # Responsibilities
//! - Filter candidates by method (405 with the allowed set)
//! - Filter by `Content-Type` against `consumes` (415)
//! - Rank by `Accept` against `produces` (406 when nothing is acceptable)
//! - Break ties by path specificity, then registration order
//!
//! # Design Decisions
//! - Stages run in a fixed order so the most specific failure is reported
//! - A concrete `produces` type is scored by its governing `Accept` entry, the
//!   most precise compatible one (RFC 7231 §5.3.2); a wildcard `produces` takes
//!   the best entry it can satisfy. Score = quality × match specificity
//! - Integer scores: identical inputs always pick the same route

use crate::routing::dispatcher::HeaderText;
use crate::routing::error::DispatchError;
use crate::routing::media::{parse_accept, AcceptEntry, MatchSpecificity, MediaRange};
use crate::routing::route::Route;
use crate::routing::template::PathParams;

/// A route whose template matched the remaining path.
#[derive(Debug, Clone)]
pub struct Candidate<'r> {
    pub route: &'r Route,
    /// Position of the route inside its service.
    pub index: usize,
    pub params: PathParams,
}

/// Pick exactly one candidate for the request.
///
/// `candidates` must be non-empty and in registration order.
pub fn negotiate<'r>(
    candidates: Vec<Candidate<'r>>,
    method: &str,
    content_type: HeaderText<'_>,
    accept: HeaderText<'_>,
) -> Result<Candidate<'r>, DispatchError> {
    // 1. Method
    let (by_method, others): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| c.route.method() == method);

    if by_method.is_empty() {
        let mut allowed: Vec<String> = Vec::new();
        for candidate in &others {
            let m = candidate.route.method();
            if !allowed.iter().any(|a| a == m) {
                allowed.push(m.to_string());
            }
        }
        tracing::trace!(method = %method, allowed = ?allowed, "No route accepts method");
        return Err(DispatchError::MethodNotAllowed { allowed });
    }

    // 2. Content-Type
    let by_content: Vec<Candidate<'r>> = match request_content_type(content_type) {
        Some(requested) => by_method
            .into_iter()
            .filter(|c| consumes(c.route, &requested))
            .collect(),
        None => Vec::new(),
    };
    if by_content.is_empty() {
        tracing::trace!(content_type = ?content_type, "No route consumes content type");
        return Err(DispatchError::UnsupportedMediaType);
    }

    // 3. Accept
    // an unreadable Accept is disregarded, like a missing one
    let accepted = parse_accept(accept.text());
    let mut ranked: Vec<(u32, Candidate<'r>)> = by_content
        .into_iter()
        .map(|c| (score(c.route, &accepted), c))
        .filter(|(score, _)| *score > 0)
        .collect();
    if ranked.is_empty() {
        tracing::trace!(accept = ?accept, "No route produces an acceptable type");
        return Err(DispatchError::NotAcceptable);
    }

    // 4. Tie-breaks
    ranked.sort_by(|(score_a, a), (score_b, b)| {
        score_b
            .cmp(score_a)
            .then_with(|| {
                b.route
                    .template()
                    .specificity()
                    .cmp(&a.route.template().specificity())
            })
            .then_with(|| a.index.cmp(&b.index))
    });

    let (_, chosen) = ranked.swap_remove(0);
    Ok(chosen)
}

/// `None` when the header is present but not a readable media type.
fn request_content_type(header: HeaderText<'_>) -> Option<MediaRange> {
    match header {
        HeaderText::Absent => Some(MediaRange::any()),
        HeaderText::Text(value) if value.trim().is_empty() => Some(MediaRange::any()),
        HeaderText::Text(value) => value.parse().ok(),
        HeaderText::Unreadable => None,
    }
}

fn consumes(route: &Route, requested: &MediaRange) -> bool {
    route
        .consumes()
        .iter()
        .any(|pattern| pattern.matches(requested).is_some())
}

/// Best `quality × specificity` over the route's produces entries.
pub fn score(route: &Route, accepted: &[AcceptEntry]) -> u32 {
    route
        .produces()
        .iter()
        .filter_map(|produced| {
            let matching = accepted.iter().filter_map(|entry| {
                produced
                    .matches(&entry.range)
                    .map(|specificity| (entry, specificity))
            });
            let weigh = |(entry, specificity): (&AcceptEntry, MatchSpecificity)| {
                u32::from(entry.quality) * specificity as u32
            };

            if produced.precision() == MatchSpecificity::Exact {
                // the most precise Accept entry governs a concrete type
                matching
                    .max_by_key(|(entry, _)| (entry.range.precision(), entry.quality))
                    .map(weigh)
            } else {
                matching.map(weigh).max()
            }
        })
        .max()
        .unwrap_or(0)
}
