//! Plan grammar: parsing and serialization.
//!
//! ```text
//! plan   := phase ("," phase)*
//! phase  := number ("s" | "r")      s = stop, r = run
//! number := \d+ ("." \d*)?          seconds, fractional allowed
//! ```
//!
//! Parsing is total: either the whole string yields a validated phase
//! sequence or a single [`PlanError`] describes the first problem. A plan
//! serializes back to the same text it was parsed from, fractional seconds
//! included.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{PlanError, PlanResult};

/// Upper bound on a single stop phase, in seconds. Run phases are
/// unbounded so a plan can end in "resume and leave running".
pub const MAX_STOP_SECS: u64 = 25;

fn grammar() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+\.?\d*[sr],)*\d+\.?\d*[sr]$").expect("plan grammar"))
}

/// One timed phase of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanPhase {
    pub duration: Duration,
    /// `true` parks the entity for the phase, `false` lets it run.
    pub stopping: bool,
}

/// A validated, non-empty, ordered phase sequence, replayed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    phases: Vec<PlanPhase>,
}

impl Plan {
    /// Parse and validate plan text.
    pub fn parse(text: &str) -> PlanResult<Self> {
        if !grammar().is_match(text) {
            return Err(PlanError::Grammar {
                text: text.to_string(),
            });
        }

        let mut phases = Vec::new();
        for token in text.split(',') {
            let (number, kind) = token.split_at(token.len() - 1);
            let stopping = kind == "s";
            // The grammar guarantees a parseable non-negative decimal, but
            // not one that fits a Duration.
            let secs: f64 = number.parse().expect("grammar admits only decimals");
            let duration = Duration::try_from_secs_f64(secs).map_err(|_| {
                PlanError::PhaseOutOfRange {
                    token: token.to_string(),
                }
            })?;
            // Validate the converted value: a sub-nanosecond phase rounds
            // to zero and must be rejected like an explicit "0s".
            if duration.is_zero() {
                return Err(PlanError::NonPositivePhase {
                    token: token.to_string(),
                });
            }
            if stopping && duration > Duration::from_secs(MAX_STOP_SECS) {
                return Err(PlanError::StopPhaseTooLong {
                    token: token.to_string(),
                    max: MAX_STOP_SECS,
                });
            }
            phases.push(PlanPhase { duration, stopping });
        }

        Ok(Self { phases })
    }

    /// Phases in execution order; never empty.
    pub fn phases(&self) -> &[PlanPhase] {
        &self.phases
    }

    /// Total runtime of the plan.
    pub fn total_duration(&self) -> Duration {
        self.phases.iter().map(|p| p.duration).sum()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, phase) in self.phases.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let secs = phase.duration.as_secs_f64();
            if secs.fract() == 0.0 {
                write!(f, "{}", secs as u64)?;
            } else {
                write!(f, "{secs}")?;
            }
            f.write_str(if phase.stopping { "s" } else { "r" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stop_and_run_phases() {
        let plan = Plan::parse("2s,3r").unwrap();
        assert_eq!(
            plan.phases(),
            &[
                PlanPhase {
                    duration: Duration::from_secs(2),
                    stopping: true
                },
                PlanPhase {
                    duration: Duration::from_secs(3),
                    stopping: false
                },
            ]
        );
    }

    #[test]
    fn parses_fractional_seconds() {
        let plan = Plan::parse("0.5s,1.25r").unwrap();
        assert_eq!(plan.phases()[0].duration, Duration::from_millis(500));
        assert_eq!(plan.phases()[1].duration, Duration::from_millis(1250));
    }

    #[test]
    fn serialization_round_trips() {
        for text in ["2s,3r", "1r", "0.5s,1.25r,10s", "25s", "100r"] {
            let plan = Plan::parse(text).unwrap();
            assert_eq!(plan.to_string(), text);
            assert_eq!(Plan::parse(&plan.to_string()).unwrap(), plan);
        }
    }

    #[test]
    fn trailing_dot_number_normalizes() {
        // "2." is grammatical; it re-serializes as "2".
        let plan = Plan::parse("2.s").unwrap();
        assert_eq!(plan.to_string(), "2s");
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["", "abc", "2x", "s2", "2s,", ",2s", "2s,,3r", "-1s", "2 s", "2s 3r"] {
            assert!(
                matches!(Plan::parse(text), Err(PlanError::Grammar { .. })),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn rejects_zero_duration_phases() {
        for text in ["0s", "0r", "0.0s", "1r,0s"] {
            assert!(
                matches!(Plan::parse(text), Err(PlanError::NonPositivePhase { .. })),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn rejects_subnanosecond_phase_as_zero() {
        // Positive as written, but rounds to a zero Duration.
        assert_eq!(
            Plan::parse("0.0000000001s"),
            Err(PlanError::NonPositivePhase {
                token: "0.0000000001s".to_string()
            })
        );
    }

    #[test]
    fn rejects_duration_beyond_representable_range() {
        // Grammar-valid, but overflows what a Duration can hold; must be
        // an error, never a panic.
        let text = "1000000000000000000000r";
        assert_eq!(
            Plan::parse(text),
            Err(PlanError::PhaseOutOfRange {
                token: text.to_string()
            })
        );
    }

    #[test]
    fn rejects_stop_phase_over_cap() {
        let err = Plan::parse("30s").unwrap_err();
        assert_eq!(
            err,
            PlanError::StopPhaseTooLong {
                token: "30s".to_string(),
                max: MAX_STOP_SECS
            }
        );
        // Mid-plan violations fail the whole plan.
        assert!(Plan::parse("1r,25.5s,1r").is_err());
    }

    #[test]
    fn stop_cap_is_inclusive_and_runs_are_unbounded() {
        assert!(Plan::parse("25s").is_ok());
        assert!(Plan::parse("3600r").is_ok());
    }

    #[test]
    fn total_duration_sums_phases() {
        let plan = Plan::parse("2s,3r").unwrap();
        assert_eq!(plan.total_duration(), Duration::from_secs(5));
    }
}
