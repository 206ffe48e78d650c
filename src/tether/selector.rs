//! Picks the best tether target around an actor.
//!
//! One greedy pass over the broad-phase results: each candidate must be on
//! screen, within range and in clear line of sight, and the survivor with the
//! highest score wins.

use std::cmp::Ordering;

use bevy::prelude::*;
use smallvec::SmallVec;

use super::config::TargetingConfig;
use super::lease::LeaseRegistry;
use super::query::{find_in_radius, has_line_of_sight, SpatialQueries, OVERLAP_CAPACITY};
use super::visibility::{center_score, ViewportProjector};

/// Candidates closer than this are degenerate.
pub const MIN_CANDIDATE_DISTANCE: f32 = 0.001;

/// Weight of viewport centeredness against normalized distance.
pub const CENTER_WEIGHT: f32 = 3.0;

/// What a target allows an ability to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// A fixed point the actor flies to.
    Grappleable,
    /// A loose body pulled to the actor.
    Pullable,
}

/// A possible target, built fresh for each selection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetCandidate {
    /// Entity carrying the capability component.
    pub target: Entity,
    /// Rigid body that moves with the target, if any.
    pub body: Option<Entity>,
    /// World-space point the tether aims at.
    pub anchor: Vec3,
    pub capability: Capability,
    /// The target's own colliders, ignored by its line-of-sight test.
    pub colliders: SmallVec<[Entity; 4]>,
}

/// Maps broad-phase colliders to the targets that own them.
pub trait CandidateResolver {
    fn resolve(&self, collider: Entity) -> Option<TargetCandidate>;
}

/// A candidate that survived every filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: TargetCandidate,
    pub score: f32,
    pub distance: f32,
}

/// Inputs for one selection pass.
pub struct SelectionRequest<'a> {
    pub origin: Vec3,
    pub capability: Capability,
    pub targeting: &'a TargetingConfig,
    pub camera: Option<&'a dyn ViewportProjector>,
    /// The querying actor's own collider, never an obstruction.
    pub actor_collider: Option<Entity>,
    /// Bodies already held elsewhere are skipped.
    pub leases: Option<&'a LeaseRegistry>,
}

/// Score used to rank candidates. Higher is better.
pub fn score(center: f32, distance: f32, max_distance: f32) -> f32 {
    CENTER_WEIGHT * center - distance / max_distance
}

/// Higher score first; equal scores fall back to the nearer, then the lower entity.
fn outranks(a: &ScoredCandidate, b: &ScoredCandidate) -> bool {
    match a.score.partial_cmp(&b.score) {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => match a.distance.partial_cmp(&b.distance) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => a.candidate.target < b.candidate.target,
            _ => false,
        },
        _ => false,
    }
}

/// Reusable target search with a preallocated broad-phase buffer.
#[derive(Debug)]
pub struct TargetSelector {
    overlaps: Vec<Entity>,
}

impl Default for TargetSelector {
    fn default() -> Self {
        Self {
            overlaps: Vec::with_capacity(OVERLAP_CAPACITY),
        }
    }
}

impl TargetSelector {
    pub fn find_best<Q, R>(
        &mut self,
        queries: &Q,
        resolver: &R,
        request: &SelectionRequest,
    ) -> Option<ScoredCandidate>
    where
        Q: SpatialQueries + ?Sized,
        R: CandidateResolver + ?Sized,
    {
        let targeting = request.targeting;
        if !(targeting.max_distance > 0.0) {
            return None;
        }

        let colliders = find_in_radius(
            queries,
            request.origin,
            targeting.query_radius,
            targeting.target_mask,
            &mut self.overlaps,
        );

        let mut best: Option<ScoredCandidate> = None;
        let mut exclude: SmallVec<[Entity; 8]> = SmallVec::new();

        for &collider in colliders {
            let Some(candidate) = resolver.resolve(collider) else {
                continue;
            };
            if candidate.capability != request.capability {
                continue;
            }
            if let (Some(body), Some(leases)) = (candidate.body, request.leases) {
                if leases.is_leased(body) {
                    continue;
                }
            }

            let anchor = candidate.anchor;
            if targeting.visibility.require_on_screen
                && !targeting.visibility.is_visible(anchor, request.camera)
            {
                continue;
            }

            let distance = request.origin.distance(anchor);
            if distance <= MIN_CANDIDATE_DISTANCE || distance > targeting.max_distance {
                continue;
            }

            exclude.clear();
            exclude.extend(request.actor_collider);
            exclude.extend(candidate.colliders.iter().copied());
            if !has_line_of_sight(
                queries,
                request.origin,
                anchor,
                targeting.line_of_sight_radius,
                targeting.obstruction_mask,
                &exclude,
            ) {
                continue;
            }

            let center = center_score(anchor, request.camera);
            let scored = ScoredCandidate {
                score: score(center, distance, targeting.max_distance),
                distance,
                candidate,
            };

            if best.as_ref().map_or(true, |b| outranks(&scored, b)) {
                best = Some(scored);
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(target: u32, score: f32, distance: f32) -> ScoredCandidate {
        ScoredCandidate {
            candidate: TargetCandidate {
                target: Entity::from_raw(target),
                body: None,
                anchor: Vec3::ZERO,
                capability: Capability::Grappleable,
                colliders: SmallVec::new(),
            },
            score,
            distance,
        }
    }

    #[test]
    fn test_score_formula() {
        let s = score(1.0, 5.0, 12.0);
        assert!((s - 2.5833).abs() < 1e-3);
    }

    #[test]
    fn test_higher_score_wins() {
        assert!(outranks(&scored(5, 2.0, 9.0), &scored(1, 1.0, 1.0)));
        assert!(!outranks(&scored(1, 1.0, 1.0), &scored(5, 2.0, 9.0)));
    }

    #[test]
    fn test_ties_prefer_nearer_then_lower_entity() {
        assert!(outranks(&scored(9, 1.0, 2.0), &scored(1, 1.0, 3.0)));
        assert!(outranks(&scored(1, 1.0, 2.0), &scored(9, 1.0, 2.0)));
        assert!(!outranks(&scored(9, 1.0, 2.0), &scored(1, 1.0, 2.0)));
    }

    #[test]
    fn test_nan_never_outranks() {
        assert!(!outranks(&scored(1, f32::NAN, 1.0), &scored(2, 0.0, 1.0)));
    }
}
