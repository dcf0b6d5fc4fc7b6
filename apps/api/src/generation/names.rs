use rand::Rng;

use crate::models::interview::GenerationRequest;

const INTERVIEWER_FIRST_NAMES: &[&str] = &[
    "Sarah", "Michael", "Jennifer", "David", "Lisa", "James", "Emily", "Robert", "Maria", "Kevin",
];
const INTERVIEWER_LAST_NAMES: &[&str] = &[
    "Chen", "Johnson", "Williams", "Brown", "Davis", "Miller", "Wilson", "Moore", "Taylor",
    "Anderson",
];
const INTERVIEWEE_FIRST_NAMES: &[&str] = &[
    "Alex", "Jordan", "Taylor", "Casey", "Morgan", "Riley", "Avery", "Quinn", "Cameron", "Drew",
];
const INTERVIEWEE_LAST_NAMES: &[&str] = &[
    "Rodriguez", "Kim", "Patel", "Thompson", "Garcia", "Martinez", "Lee", "White", "Harris",
    "Clark",
];

/// Display names for both roles, fixed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantNames {
    pub interviewer: String,
    pub interviewee: String,
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

pub fn random_interviewer_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {}",
        pick(rng, INTERVIEWER_FIRST_NAMES),
        pick(rng, INTERVIEWER_LAST_NAMES)
    )
}

pub fn random_interviewee_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{} {}",
        pick(rng, INTERVIEWEE_FIRST_NAMES),
        pick(rng, INTERVIEWEE_LAST_NAMES)
    )
}

/// Uses the supplied names and draws random ones for any that are missing.
/// Called exactly once per request; the result is threaded through prompt
/// building and interpretation.
pub fn resolve_participants<R: Rng + ?Sized>(
    request: &GenerationRequest,
    rng: &mut R,
) -> ParticipantNames {
    ParticipantNames {
        interviewer: request
            .interviewer_name
            .clone()
            .unwrap_or_else(|| random_interviewer_name(rng)),
        interviewee: request
            .interviewee_name
            .clone()
            .unwrap_or_else(|| random_interviewee_name(rng)),
    }
}
