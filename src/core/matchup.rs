/// The `/matchup` command: random character pairings for the roster.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::warn;

use crate::core::grammar::{GrammarError, GrammarSet};
use crate::core::markdown::link;
use crate::schema::character::{Character, Roster};
use crate::schema::reply::{Card, Reply};

/// Probability that a matchup escalates into a battle royale.
pub const BATTLE_ROYALE_CHANCE: f64 = 0.05;
/// A battle royale adds between one and this many extra characters.
const MAX_EXTRA_CHARACTERS: usize = 7;
const SEASON_CHANCE: f64 = 0.5;
const MAX_SEASON: u32 = 4;
/// Entry rule of the series grammar.
pub const SERIES_RULE: &str = "series";

#[derive(Debug, Error)]
pub enum MatchupError {
    #[error("character catalog is empty")]
    NoCharacters,
    #[error("roster needs at least 2 participants, found {0}")]
    NotEnoughParticipants(usize),
    #[error("series name error: {0}")]
    Grammar(#[from] GrammarError),
}

/// A participant cast as a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Casting {
    pub participant: String,
    /// Markdown link to the character's article.
    pub character: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup {
    pub title: String,
    pub series: String,
    pub castings: Vec<Casting>,
}

/// Checks the data a matchup needs, so load-time problems surface before
/// any invocation.
pub fn validate(characters: &[Character], roster: &Roster) -> Result<(), MatchupError> {
    if characters.is_empty() {
        return Err(MatchupError::NoCharacters);
    }
    if roster.len() < 2 {
        return Err(MatchupError::NotEnoughParticipants(roster.len()));
    }
    Ok(())
}

/// Checks that the series grammar can always produce a name.
pub fn validate_series(grammar: &GrammarSet) -> Result<(), MatchupError> {
    Ok(grammar.validate(SERIES_RULE)?)
}

/// Expand the series grammar into a fresh series name.
pub fn series_name<R: Rng + ?Sized>(grammar: &GrammarSet, rng: &mut R) -> Result<String, GrammarError> {
    grammar.expand(SERIES_RULE, rng)
}

/// Build a matchup from the catalogs.
///
/// Characters are drawn with replacement. A battle royale can draw more
/// characters than there are participants; the cast is then cut down to
/// the roster size.
pub fn generate_matchup<R: Rng + ?Sized>(
    characters: &[Character],
    series: &str,
    roster: &Roster,
    rng: &mut R,
) -> Result<Matchup, MatchupError> {
    validate(characters, roster)?;

    let mut chosen: Vec<&Character> = Vec::with_capacity(2);
    for _ in 0..2 {
        chosen.extend(characters.choose(rng));
    }
    if rng.gen_bool(BATTLE_ROYALE_CHANCE) {
        let extra = rng.gen_range(1..=MAX_EXTRA_CHARACTERS);
        for _ in 0..extra {
            chosen.extend(characters.choose(rng));
        }
    }

    let mut participants = roster.members().to_vec();
    participants.shuffle(rng);

    if chosen.len() > participants.len() {
        warn!(
            characters = chosen.len(),
            participants = participants.len(),
            "battle royale larger than the roster, trimming the cast"
        );
        chosen.truncate(participants.len());
    }

    let castings = chosen
        .iter()
        .zip(participants)
        .map(|(character, participant)| Casting {
            participant,
            character: link(&character.label, &character.article),
        })
        .collect();

    let series = if rng.gen_bool(SEASON_CHANCE) {
        format!("{} Season {}", series, rng.gen_range(1..=MAX_SEASON))
    } else {
        series.to_string()
    };

    Ok(Matchup {
        title: format!("**{} vs {}**", chosen[0].label, chosen[1].label),
        series,
        castings,
    })
}

pub fn render_matchup(matchup: &Matchup) -> Card {
    let mut card = Card::new(matchup.title.clone()).description(matchup.series.clone());
    for casting in &matchup.castings {
        card = card.field(
            casting.participant.clone(),
            format!("as {}", casting.character),
            true,
        );
    }
    card
}

/// Run a `/matchup` invocation.
pub fn matchup<R: Rng + ?Sized>(
    characters: &[Character],
    roster: &Roster,
    grammar: &GrammarSet,
    rng: &mut R,
) -> Result<Reply, MatchupError> {
    let series = series_name(grammar, rng)?;
    let matchup = generate_matchup(characters, &series, roster, rng)?;
    Ok(Reply::Cards(vec![render_matchup(&matchup)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn characters() -> Vec<Character> {
        vec![
            Character {
                label: "Sherlock Holmes".to_string(),
                article: "https://en.wikipedia.org/wiki/Sherlock_Holmes".to_string(),
            },
            Character {
                label: "Link".to_string(),
                article: "https://en.wikipedia.org/wiki/Link_(The_Legend_of_Zelda)".to_string(),
            },
            Character {
                label: "Frodo Baggins".to_string(),
                article: "https://en.wikipedia.org/wiki/Frodo_Baggins".to_string(),
            },
        ]
    }

    fn roster(n: usize) -> Roster {
        Roster((0..n).map(|i| format!("Member{}", i)).collect())
    }

    #[test]
    fn validate_rejects_thin_data() {
        assert!(matches!(
            validate(&[], &roster(4)),
            Err(MatchupError::NoCharacters)
        ));
        assert!(matches!(
            validate(&characters(), &roster(1)),
            Err(MatchupError::NotEnoughParticipants(1))
        ));
        assert!(validate(&characters(), &roster(2)).is_ok());
    }

    #[test]
    fn validate_series_rejects_unusable_grammar() {
        assert!(validate_series(&GrammarSet::builtin_series().unwrap()).is_ok());
        assert!(matches!(
            validate_series(&GrammarSet::default()),
            Err(MatchupError::Grammar(GrammarError::RuleNotFound(_)))
        ));
    }

    #[test]
    fn matchup_casts_distinct_participants() {
        let chars = characters();
        let members = roster(12);
        for seed in 0..300 {
            let mut rng = StdRng::seed_from_u64(seed);
            let m = generate_matchup(&chars, "Epic Rap Battles", &members, &mut rng).unwrap();
            assert!((2..=9).contains(&m.castings.len()));
            let mut names: Vec<&str> = m.castings.iter().map(|c| c.participant.as_str()).collect();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), m.castings.len());
            assert!(m.title.starts_with("**") && m.title.contains(" vs "));
        }
    }

    #[test]
    fn battle_royale_happens_occasionally() {
        let chars = characters();
        let members = roster(12);
        let mut royales = 0;
        for seed in 0..2000 {
            let mut rng = StdRng::seed_from_u64(seed);
            let m = generate_matchup(&chars, "Series", &members, &mut rng).unwrap();
            if m.castings.len() > 2 {
                royales += 1;
            }
        }
        assert!(
            royales > 40 && royales < 180,
            "Expected about 5% battle royales, got {}/2000",
            royales
        );
    }

    #[test]
    fn cast_is_clamped_to_roster() {
        let chars = characters();
        let members = roster(2);
        for seed in 0..2000 {
            let mut rng = StdRng::seed_from_u64(seed);
            let m = generate_matchup(&chars, "Series", &members, &mut rng).unwrap();
            assert_eq!(m.castings.len(), 2);
        }
    }

    #[test]
    fn series_gets_optional_season() {
        let chars = characters();
        let members = roster(4);
        let mut with_season = 0;
        for seed in 0..400 {
            let mut rng = StdRng::seed_from_u64(seed);
            let m = generate_matchup(&chars, "Uber Rap Wars", &members, &mut rng).unwrap();
            assert!(m.series.starts_with("Uber Rap Wars"));
            if let Some(season) = m.series.strip_prefix("Uber Rap Wars Season ") {
                let n: u32 = season.parse().unwrap();
                assert!((1..=4).contains(&n));
                with_season += 1;
            } else {
                assert_eq!(m.series, "Uber Rap Wars");
            }
        }
        assert!(with_season > 140 && with_season < 260, "got {}/400", with_season);
    }

    #[test]
    fn render_links_escape_parentheses() {
        let m = Matchup {
            title: "**Link vs Frodo Baggins**".to_string(),
            series: "Cool Diss Clashes".to_string(),
            castings: vec![Casting {
                participant: "Ace".to_string(),
                character: link("Link", "https://en.wikipedia.org/wiki/Link_(The_Legend_of_Zelda)"),
            }],
        };
        let card = render_matchup(&m);
        assert_eq!(card.description.as_deref(), Some("Cool Diss Clashes"));
        assert_eq!(
            card.field_value("Ace"),
            Some("as [Link](https://en.wikipedia.org/wiki/Link_%28The_Legend_of_Zelda%29)")
        );
        assert!(card.fields[0].inline);
    }

    #[test]
    fn matchup_reply_uses_builtin_series() {
        let grammar = GrammarSet::builtin_series().unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let reply = matchup(&characters(), &roster(6), &grammar, &mut rng).unwrap();
        let card = &reply.cards()[0];
        let series = card.description.as_deref().unwrap();
        let battle_nouns = ["Wars", "Clashes", "Battles", "Conflicts", "Skirmishes", "Altercations"];
        assert!(battle_nouns.iter().any(|noun| series.contains(noun)), "series: {}", series);
    }
}
