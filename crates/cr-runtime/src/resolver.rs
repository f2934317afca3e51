use cr_core::{Candidate, MatchGroups, ReplyOption, ResolutionCause, ResolutionError};
use tracing::{debug, warn};

use crate::format::format_reply;
use crate::rng::ReplyRng;

/// Turns a rule's candidate value into one reply string.
///
/// Lists are sampled uniformly unless every entry carries a weight. Weighted
/// sampling sizes the draw with `max(1, weight)` per entry but walks the
/// entries comparing against `|weight|`, so zero and negative weights skew
/// selection. That behaviour is kept as-is; a walk that selects nothing falls
/// back to a uniform draw.
pub fn choose(
    candidate: &Candidate,
    groups: &MatchGroups,
    rng: &mut ReplyRng,
) -> Result<String, ResolutionError> {
    let template = select_template(candidate, rng)?;
    Ok(format_reply(template, groups)?)
}

fn select_template<'a>(
    candidate: &'a Candidate,
    rng: &mut ReplyRng,
) -> Result<&'a str, ResolutionError> {
    let options = match candidate {
        Candidate::Empty => return Ok(""),
        Candidate::Text(text) => return Ok(text.as_str()),
        Candidate::List(options) if options.is_empty() => return Ok(""),
        Candidate::List(options) => options,
    };

    if options.iter().all(|option| option.weight().is_some()) {
        if let Some(text) = select_weighted(options, rng)? {
            return Ok(text);
        }
        warn!(
            options = options.len(),
            "weighted walk selected nothing, falling back to uniform choice"
        );
    }

    let index = rng.index(options.len());
    debug!(index, options = options.len(), "uniform reply choice");
    Ok(options[index].text())
}

fn select_weighted<'a>(
    options: &'a [ReplyOption],
    rng: &mut ReplyRng,
) -> Result<Option<&'a str>, ResolutionError> {
    let total: u128 = options
        .iter()
        .map(|option| option.weight().unwrap_or(1).max(1) as u128)
        .sum();
    let bound = u32::try_from(total)
        .map_err(|_| ResolutionError::from(ResolutionCause::WeightOverflow { total }))?;

    let mut choice = u64::from(rng.below(bound));
    debug!(choice, bound, "weighted reply draw");
    for option in options {
        let weight = option.weight().unwrap_or(1).unsigned_abs();
        if choice < weight {
            return Ok(Some(option.text()));
        }
        choice -= weight;
    }
    Ok(None)
}

#[cfg(test)]
mod resolver_tests {
    use super::*;
    use cr_core::FormatError;

    fn groups(entries: &[(&str, &str)]) -> MatchGroups {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    fn tally(candidate: &Candidate, trials: usize) -> std::collections::BTreeMap<String, usize> {
        let mut rng = ReplyRng::new(1);
        let mut counts = std::collections::BTreeMap::new();
        for _ in 0..trials {
            let reply =
                choose(candidate, &MatchGroups::new(), &mut rng).expect("choose should pass");
            *counts.entry(reply).or_insert(0usize) += 1;
        }
        counts
    }

    #[test]
    fn choose_substitutes_single_string() {
        let mut rng = ReplyRng::new(1);
        let reply = choose(
            &Candidate::from("hi {name}"),
            &groups(&[("name", "Sam")]),
            &mut rng,
        )
        .expect("choose should pass");
        assert_eq!(reply, "hi Sam");
    }

    #[test]
    fn choose_returns_empty_for_empty_candidates() {
        let mut rng = ReplyRng::new(1);
        for candidate in [
            Candidate::Empty,
            Candidate::List(Vec::new()),
            Candidate::from(""),
        ] {
            assert_eq!(
                choose(&candidate, &MatchGroups::new(), &mut rng).expect("choose should pass"),
                ""
            );
        }
    }

    #[test]
    fn choose_weighted_list_follows_weights() {
        let counts = tally(&Candidate::from(vec![("a", 1), ("b", 3)]), 4_000);
        let a = counts.get("a").copied().unwrap_or(0) as f64;
        let b = counts.get("b").copied().unwrap_or(0) as f64;
        assert_eq!(a + b, 4_000.0);
        let ratio = b / a;
        assert!((2.4..=3.7).contains(&ratio), "ratio was {}", ratio);
    }

    #[test]
    fn choose_plain_list_is_roughly_uniform() {
        let counts = tally(&Candidate::from(vec!["x", "y", "z"]), 3_000);
        assert_eq!(counts.len(), 3);
        for (reply, count) in counts {
            assert!((850..=1_150).contains(&count), "{} chosen {} times", reply, count);
        }
    }

    #[test]
    fn choose_mixed_list_samples_uniformly_using_text() {
        let candidate = Candidate::List(vec![
            ReplyOption::Weighted("a".to_string(), 100),
            ReplyOption::Plain("b".to_string()),
        ]);
        let counts = tally(&candidate, 2_000);
        let a = counts.get("a").copied().unwrap_or(0);
        assert!((850..=1_150).contains(&a), "a chosen {} times", a);
    }

    #[test]
    fn choose_negative_weight_uses_absolute_value_in_walk() {
        // total is max(1,-5) + max(1,1) = 2, but the first entry spans |-5| = 5.
        let counts = tally(&Candidate::from(vec![("a", -5), ("b", 1)]), 200);
        assert_eq!(counts.get("a"), Some(&200));
    }

    #[test]
    fn choose_zero_weights_fall_back_to_uniform_choice() {
        let counts = tally(&Candidate::from(vec![("a", 0), ("b", 0)]), 2_000);
        assert_eq!(counts.len(), 2);
        let a = counts.get("a").copied().unwrap_or(0);
        assert!((850..=1_150).contains(&a), "a chosen {} times", a);
    }

    #[test]
    fn choose_reports_weight_overflow() {
        let mut rng = ReplyRng::new(1);
        let error = choose(
            &Candidate::from(vec![("a", i64::MAX), ("b", i64::MAX)]),
            &MatchGroups::new(),
            &mut rng,
        )
        .expect_err("overflow should fail");
        assert_eq!(error.code(), "RESOLUTION_WEIGHT_OVERFLOW");
        assert_eq!(error.origin, None);
    }

    #[test]
    fn choose_surfaces_format_errors() {
        let mut rng = ReplyRng::new(1);
        let error = choose(&Candidate::from("hi {name}"), &MatchGroups::new(), &mut rng)
            .expect_err("missing key should fail");
        assert_eq!(
            error.cause,
            ResolutionCause::Format(FormatError::MissingKey {
                key: "name".to_string()
            })
        );
    }
}
