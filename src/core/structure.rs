/// The `/structure` command: random verse layouts for a two-person battle.
///
/// Budgets are counted in couplets and rendered in bars (two per couplet).
/// Each rapper's couplet budget is split into verses with a uniform random
/// composition, and the two rappers' verses alternate, rapper one first.

use rand::Rng;
use thiserror::Error;

use crate::schema::command::StructureOptions;
use crate::schema::reply::Reply;

const MIN_RANDOM_COUPLETS: u32 = 4;
const MAX_RANDOM_COUPLETS: u32 = 16;
/// Per-rapper couplet budgets must stay below this.
const MAX_COUPLETS_PER_RAPPER: i64 = 500;
const BARS_PER_COUPLET: u32 = 2;
const SEPARATOR: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("Battles need at least 4 bars!")]
    TooShort,
    #[error("That's too many bars!")]
    TooLong,
    #[error("Battles need at least 2 verses!")]
    TooFewVerses,
    #[error("That's too many verses!")]
    TooManyVerses,
    #[error("cannot split {sum} into {count} positive parts")]
    ImpossiblePartition { count: u32, sum: u32 },
}

impl StructureError {
    /// True for problems with what the user asked for, as opposed to bugs.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, StructureError::ImpossiblePartition { .. })
    }
}

/// `count` random positive integers that add up to exactly `sum`.
///
/// Draws `count - 1` cut points uniformly in `0..=sum - count`, sorts them
/// between the two ends, and returns the gaps plus one.
pub fn rand_with_sum<R: Rng + ?Sized>(count: u32, sum: u32, rng: &mut R) -> Result<Vec<u32>, StructureError> {
    if count == 0 || count > sum {
        return Err(StructureError::ImpossiblePartition { count, sum });
    }
    let slack = sum - count;

    let mut cuts = Vec::with_capacity(count as usize + 1);
    cuts.push(0);
    for _ in 1..count {
        cuts.push(rng.gen_range(0..=slack));
    }
    cuts.push(slack);
    cuts.sort_unstable();

    Ok(cuts.windows(2).map(|pair| pair[1] - pair[0] + 1).collect())
}

/// Which rapper receives the odd couplet or verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rapper {
    First,
    Second,
}

/// A generated battle layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseStructure {
    pub first: Vec<u32>,
    pub second: Vec<u32>,
    /// Bar counts in performance order.
    pub bars: Vec<u32>,
}

impl VerseStructure {
    pub fn total_bars(&self) -> u32 {
        self.bars.iter().sum()
    }

    pub fn render(&self) -> String {
        self.bars
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }
}

/// Lay out a battle.
///
/// `length` is the total couplet budget (split evenly, the odd couplet
/// going to a random rapper); without it each rapper gets 4 to 16
/// couplets. `verses` is the total verse count (the odd verse goes to
/// rapper one); without it each rapper gets a count skewed towards one
/// long verse.
pub fn generate_structure<R: Rng + ?Sized>(
    opts: &StructureOptions,
    rng: &mut R,
) -> Result<VerseStructure, StructureError> {
    let (couplets_per_rapper, extra_couplet) = match opts.length {
        Some(length) => {
            let per_rapper = length.div_euclid(2);
            if per_rapper <= 0 {
                return Err(StructureError::TooShort);
            }
            if per_rapper >= MAX_COUPLETS_PER_RAPPER {
                return Err(StructureError::TooLong);
            }
            (per_rapper as u32, length.rem_euclid(2) == 1)
        }
        None => (rng.gen_range(MIN_RANDOM_COUPLETS..=MAX_RANDOM_COUPLETS), false),
    };

    let (verses_per_rapper, extra_verse) = match opts.verses {
        Some(verses) => {
            if verses < 2 {
                return Err(StructureError::TooFewVerses);
            }
            if verses > i64::from(couplets_per_rapper) * 2 + i64::from(extra_couplet) {
                return Err(StructureError::TooManyVerses);
            }
            ((verses / 2) as u32, verses % 2 == 1)
        }
        None => {
            // Squaring the draw biases towards fewer, longer verses.
            let r: f64 = rng.gen();
            let skewed = (r * r * f64::from(couplets_per_rapper)).floor() as u32;
            (skewed.min(couplets_per_rapper - 1) + 1, false)
        }
    };

    let first_verses = verses_per_rapper + u32::from(extra_verse);
    let extra_couplet_to = if !extra_couplet {
        None
    } else if first_verses > couplets_per_rapper {
        // Rapper one can only fit the odd verse with the odd couplet.
        Some(Rapper::First)
    } else if rng.gen_bool(0.5) {
        Some(Rapper::First)
    } else {
        Some(Rapper::Second)
    };

    let first_budget = couplets_per_rapper + u32::from(extra_couplet_to == Some(Rapper::First));
    let second_budget = couplets_per_rapper + u32::from(extra_couplet_to == Some(Rapper::Second));

    let first = rand_with_sum(first_verses, first_budget, rng)?;
    let second = rand_with_sum(verses_per_rapper, second_budget, rng)?;

    let mut bars = Vec::with_capacity(first.len() + second.len());
    for (a, b) in first.iter().zip(&second) {
        bars.push(a * BARS_PER_COUPLET);
        bars.push(b * BARS_PER_COUPLET);
    }
    if extra_verse {
        if let Some(last) = first.last() {
            bars.push(last * BARS_PER_COUPLET);
        }
    }

    Ok(VerseStructure { first, second, bars })
}

/// Run a `/structure` invocation.
pub fn structure<R: Rng + ?Sized>(opts: &StructureOptions, rng: &mut R) -> Result<Reply, StructureError> {
    match generate_structure(opts, rng) {
        Ok(layout) => Ok(Reply::text(layout.render())),
        Err(e) if e.is_user_facing() => Ok(Reply::text(e.to_string())),
        Err(e) => Err(e),
    }
}
